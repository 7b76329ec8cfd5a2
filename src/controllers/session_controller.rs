use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use mongodb::bson::{doc, Document};

use crate::{
    action::{Action, Resource, Shape},
    controllers::movie_controller::movie_summary_stages,
    error::ApiResult,
    models::session_model::{
        tickets_available, MovieSession, MovieSessionDetail, MovieSessionListItem, MovieSessionPayload,
        MovieSessionResponse,
    },
    query::{SessionFilter, SessionQuery},
    state::AppState,
    utils::{self, invalid_pk_message, parse_pk, Payload},
    validation::Validator,
};

fn hall_capacity() -> Document {
    doc! { "$multiply": ["$cinema_hall.rows", "$cinema_hall.seats_in_row"] }
}

/// Stages producing the summary shape, with seats left computed from the
/// tickets sold so far.
pub(crate) fn session_summary_stages() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": Resource::CinemaHall.collection(),
                "localField": "cinema_hall",
                "foreignField": "_id",
                "as": "cinema_hall"
            }
        },
        doc! { "$unwind": "$cinema_hall" },
        doc! {
            "$lookup": {
                "from": Resource::Movie.collection(),
                "localField": "movie",
                "foreignField": "_id",
                "as": "movie"
            }
        },
        doc! { "$unwind": "$movie" },
        doc! {
            "$lookup": {
                "from": Resource::Ticket.collection(),
                "localField": "_id",
                "foreignField": "movie_session",
                "as": "tickets"
            }
        },
        doc! {
            "$project": {
                "show_time": 1,
                "movie_title": "$movie.title",
                "cinema_hall_name": "$cinema_hall.name",
                "cinema_hall_capacity": hall_capacity(),
                "tickets_available": {
                    "$subtract": [hall_capacity(), { "$size": "$tickets" }]
                }
            }
        },
    ]
}

fn session_detail_stages() -> Vec<Document> {
    let mut movie_stages = vec![doc! {
        "$match": { "$expr": { "$eq": ["$_id", "$$movie_id"] } }
    }];
    movie_stages.extend(movie_summary_stages());

    vec![
        doc! {
            "$lookup": {
                "from": Resource::CinemaHall.collection(),
                "localField": "cinema_hall",
                "foreignField": "_id",
                "as": "cinema_hall"
            }
        },
        doc! { "$unwind": "$cinema_hall" },
        doc! {
            "$lookup": {
                "from": Resource::Movie.collection(),
                "let": { "movie_id": "$movie" },
                "pipeline": movie_stages,
                "as": "movie"
            }
        },
        doc! { "$unwind": "$movie" },
        doc! {
            "$lookup": {
                "from": Resource::Ticket.collection(),
                "localField": "_id",
                "foreignField": "movie_session",
                "as": "tickets"
            }
        },
        doc! {
            "$project": {
                "show_time": 1,
                "movie": 1,
                "cinema_hall": {
                    "_id": "$cinema_hall._id",
                    "name": "$cinema_hall.name",
                    "rows": "$cinema_hall.rows",
                    "seats_in_row": "$cinema_hall.seats_in_row",
                    "capacity": hall_capacity()
                },
                "taken_places": {
                    "$map": {
                        "input": "$tickets",
                        "as": "ticket",
                        "in": { "row": "$$ticket.row", "seat": "$$ticket.seat" }
                    }
                }
            }
        },
    ]
}

/// Only listings are annotated and ordered.
pub(crate) fn session_pipeline(shape: Shape, filter: &SessionFilter, id: Option<i64>) -> Vec<Document> {
    let mut matched = filter.to_match();
    if let Some(id) = id {
        matched.insert("_id", id);
    }

    let mut pipeline = vec![doc! { "$match": matched }];
    match shape {
        Shape::Summary => {
            pipeline.push(doc! { "$sort": { "_id": 1 } });
            pipeline.extend(session_summary_stages());
        }
        Shape::Detail => pipeline.extend(session_detail_stages()),
        Shape::Writable => {}
    }
    pipeline
}

/// Deletes the matching sessions and every ticket sold for them.
pub(crate) async fn delete_sessions(state: &AppState, filter: Document) -> ApiResult<u64> {
    let ids = state
        .documents(Resource::MovieSession)
        .distinct("_id", filter, None)
        .await?;
    if ids.is_empty() {
        return Ok(0);
    }

    let tickets = state
        .documents(Resource::Ticket)
        .delete_many(doc! { "movie_session": { "$in": ids.clone() } }, None)
        .await?;
    let sessions = state
        .documents(Resource::MovieSession)
        .delete_many(doc! { "_id": { "$in": ids } }, None)
        .await?;

    tracing::info!(
        sessions = sessions.deleted_count,
        tickets = tickets.deleted_count,
        "removed sessions"
    );
    Ok(sessions.deleted_count)
}

async fn validate(state: &AppState, payload: &MovieSessionPayload, action: Action) -> ApiResult<Document> {
    let mut validator = Validator::new(action);
    validator.datetime("show_time", payload.show_time);
    validator.reference("movie", payload.movie);
    validator.reference("cinema_hall", payload.cinema_hall);

    for (field, resource, id) in [
        ("movie", Resource::Movie, payload.movie),
        ("cinema_hall", Resource::CinemaHall, payload.cinema_hall),
    ] {
        if let Some(id) = id {
            if !utils::missing_ids(state, resource, &[id]).await?.is_empty() {
                validator.error(field, invalid_pk_message(id));
            }
        }
    }

    validator.finish()
}

pub async fn load_sessions(
    Query(query): Query<SessionQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<MovieSessionListItem>>> {
    let filter = SessionFilter::from_query(&query)?;
    let pipeline = session_pipeline(Resource::MovieSession.shape(Action::List), &filter, None);
    let sessions = utils::aggregate_all(&state, Resource::MovieSession, pipeline).await?;
    Ok(Json(sessions))
}

pub async fn load_session(
    Path(id_str): Path<String>,
    Query(query): Query<SessionQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<MovieSessionDetail>> {
    let id = parse_pk(&id_str)?;
    let filter = SessionFilter::from_query(&query)?;
    let pipeline = session_pipeline(Resource::MovieSession.shape(Action::Retrieve), &filter, Some(id));
    let mut session: MovieSessionDetail = utils::aggregate_one(&state, Resource::MovieSession, pipeline).await?;

    let sold = i64::try_from(session.taken_places.len()).unwrap_or(i64::MAX);
    session.tickets_available =
        tickets_available(session.cinema_hall.rows, session.cinema_hall.seats_in_row, sold);
    Ok(Json(session))
}

pub async fn add_session(
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<MovieSessionPayload>,
) -> ApiResult<(StatusCode, Json<MovieSessionResponse>)> {
    let fields = validate(&state, &payload, Action::Create).await?;
    let session = utils::insert_fields::<MovieSession>(&state, Resource::MovieSession, fields).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn update(
    state: &AppState,
    id_str: &str,
    payload: &MovieSessionPayload,
    action: Action,
) -> ApiResult<Json<MovieSessionResponse>> {
    let id = parse_pk(id_str)?;
    let fields = validate(state, payload, action).await?;
    let session =
        utils::update_fields::<MovieSession>(state, Resource::MovieSession, doc! { "_id": id }, fields).await?;
    Ok(Json(session.into()))
}

pub async fn update_session(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<MovieSessionPayload>,
) -> ApiResult<Json<MovieSessionResponse>> {
    update(&state, &id_str, &payload, Action::Update).await
}

pub async fn patch_session(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<MovieSessionPayload>,
) -> ApiResult<Json<MovieSessionResponse>> {
    update(&state, &id_str, &payload, Action::PartialUpdate).await
}

pub async fn delete_session(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&id_str)?;
    utils::delete_one(&state, Resource::MovieSession, doc! { "_id": id }).await?;
    state
        .documents(Resource::Ticket)
        .delete_many(doc! { "movie_session": id }, None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
