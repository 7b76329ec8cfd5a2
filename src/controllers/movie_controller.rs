use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use mongodb::bson::{doc, Document};

use crate::{
    action::{Action, Resource, Shape},
    controllers::session_controller::delete_sessions,
    error::ApiResult,
    models::movie_model::{Movie, MovieDetail, MovieListItem, MoviePayload, MovieResponse},
    query::{MovieFilter, MovieQuery},
    state::AppState,
    utils::{self, invalid_pk_message, parse_pk, Payload},
    validation::{Validator, MAX_NAME_LENGTH},
};

/// Stages turning stored movies into the summary shape: genre names and
/// actor full names instead of ids.
pub(crate) fn movie_summary_stages() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": Resource::Genre.collection(),
                "localField": "genres",
                "foreignField": "_id",
                "as": "genre_docs"
            }
        },
        doc! {
            "$lookup": {
                "from": Resource::Actor.collection(),
                "localField": "actors",
                "foreignField": "_id",
                "as": "actor_docs"
            }
        },
        doc! {
            "$project": {
                "title": 1,
                "description": 1,
                "duration": 1,
                "genres": "$genre_docs.name",
                "actors": {
                    "$map": {
                        "input": "$actor_docs",
                        "as": "actor",
                        "in": { "$concat": ["$$actor.first_name", " ", "$$actor.last_name"] }
                    }
                }
            }
        },
    ]
}

fn movie_detail_stages() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": Resource::Genre.collection(),
                "localField": "genres",
                "foreignField": "_id",
                "as": "genres"
            }
        },
        doc! {
            "$lookup": {
                "from": Resource::Actor.collection(),
                "localField": "actors",
                "foreignField": "_id",
                "as": "actor_docs"
            }
        },
        doc! {
            "$project": {
                "title": 1,
                "description": 1,
                "duration": 1,
                "genres": 1,
                "actors": {
                    "$map": {
                        "input": "$actor_docs",
                        "as": "actor",
                        "in": {
                            "_id": "$$actor._id",
                            "first_name": "$$actor.first_name",
                            "last_name": "$$actor.last_name",
                            "full_name": { "$concat": ["$$actor.first_name", " ", "$$actor.last_name"] }
                        }
                    }
                }
            }
        },
    ]
}

pub(crate) fn movie_pipeline(shape: Shape, filter: &MovieFilter, id: Option<i64>) -> Vec<Document> {
    let mut matched = filter.to_match();
    if let Some(id) = id {
        matched.insert("_id", id);
    }

    let mut pipeline = vec![doc! { "$match": matched }, doc! { "$sort": { "_id": 1 } }];
    match shape {
        Shape::Summary => pipeline.extend(movie_summary_stages()),
        Shape::Detail => pipeline.extend(movie_detail_stages()),
        Shape::Writable => {}
    }
    pipeline
}

async fn validate(state: &AppState, payload: &MoviePayload, action: Action) -> ApiResult<Document> {
    let mut validator = Validator::new(action);
    validator.text("title", payload.title.as_deref(), Some(MAX_NAME_LENGTH));
    validator.text("description", payload.description.as_deref(), None);
    validator.positive("duration", payload.duration);
    validator.references("genres", payload.genres.as_deref());
    validator.references("actors", payload.actors.as_deref());

    for (field, resource, ids) in [
        ("genres", Resource::Genre, payload.genres.as_deref()),
        ("actors", Resource::Actor, payload.actors.as_deref()),
    ] {
        for missing in utils::missing_ids(state, resource, ids.unwrap_or_default()).await? {
            validator.error(field, invalid_pk_message(missing));
        }
    }

    validator.finish()
}

pub async fn load_movies(
    Query(query): Query<MovieQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<MovieListItem>>> {
    let filter = MovieFilter::from_query(&query)?;
    let pipeline = movie_pipeline(Resource::Movie.shape(Action::List), &filter, None);
    let movies = utils::aggregate_all(&state, Resource::Movie, pipeline).await?;
    Ok(Json(movies))
}

pub async fn load_movie(
    Path(id_str): Path<String>,
    Query(query): Query<MovieQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<MovieDetail>> {
    let id = parse_pk(&id_str)?;
    let filter = MovieFilter::from_query(&query)?;
    let pipeline = movie_pipeline(Resource::Movie.shape(Action::Retrieve), &filter, Some(id));
    let movie = utils::aggregate_one(&state, Resource::Movie, pipeline).await?;
    Ok(Json(movie))
}

pub async fn add_movie(
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<MoviePayload>,
) -> ApiResult<(StatusCode, Json<MovieResponse>)> {
    let fields = validate(&state, &payload, Action::Create).await?;
    let movie = utils::insert_fields::<Movie>(&state, Resource::Movie, fields).await?;
    Ok((StatusCode::CREATED, Json(movie.into())))
}

async fn update(
    state: &AppState,
    id_str: &str,
    payload: &MoviePayload,
    action: Action,
) -> ApiResult<Json<MovieResponse>> {
    let id = parse_pk(id_str)?;
    let fields = validate(state, payload, action).await?;
    let movie = utils::update_fields::<Movie>(state, Resource::Movie, doc! { "_id": id }, fields).await?;
    Ok(Json(movie.into()))
}

pub async fn update_movie(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<MoviePayload>,
) -> ApiResult<Json<MovieResponse>> {
    update(&state, &id_str, &payload, Action::Update).await
}

pub async fn patch_movie(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<MoviePayload>,
) -> ApiResult<Json<MovieResponse>> {
    update(&state, &id_str, &payload, Action::PartialUpdate).await
}

pub async fn delete_movie(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&id_str)?;
    utils::delete_one(&state, Resource::Movie, doc! { "_id": id }).await?;
    delete_sessions(&state, doc! { "movie": id }).await?;
    Ok(StatusCode::NO_CONTENT)
}
