use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use mongodb::bson::{doc, Document};

use crate::{
    action::{Action, Resource},
    error::ApiResult,
    models::genre_model::{Genre, GenrePayload, GenreResponse},
    state::AppState,
    utils::{self, parse_pk, Payload},
    validation::{Validator, MAX_NAME_LENGTH},
};

fn validate(payload: &GenrePayload, action: Action) -> ApiResult<Document> {
    let mut validator = Validator::new(action);
    validator.text("name", payload.name.as_deref(), Some(MAX_NAME_LENGTH));
    validator.finish()
}

pub async fn list_genres(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<GenreResponse>>> {
    let genres = utils::list_all::<Genre>(&state, Resource::Genre).await?;
    Ok(Json(genres.into_iter().map(GenreResponse::from).collect()))
}

pub async fn get_genre(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<GenreResponse>> {
    let genre = utils::find_by_id::<Genre>(&state, Resource::Genre, parse_pk(&id_str)?).await?;
    Ok(Json(genre.into()))
}

pub async fn add_genre(
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<GenrePayload>,
) -> ApiResult<(StatusCode, Json<GenreResponse>)> {
    let fields = validate(&payload, Action::Create)?;
    let genre = utils::insert_fields::<Genre>(&state, Resource::Genre, fields).await?;
    Ok((StatusCode::CREATED, Json(genre.into())))
}

async fn update(
    state: &AppState,
    id_str: &str,
    payload: &GenrePayload,
    action: Action,
) -> ApiResult<Json<GenreResponse>> {
    let id = parse_pk(id_str)?;
    let fields = validate(payload, action)?;
    let genre = utils::update_fields::<Genre>(state, Resource::Genre, doc! { "_id": id }, fields).await?;
    Ok(Json(genre.into()))
}

pub async fn update_genre(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<GenrePayload>,
) -> ApiResult<Json<GenreResponse>> {
    update(&state, &id_str, &payload, Action::Update).await
}

pub async fn patch_genre(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<GenrePayload>,
) -> ApiResult<Json<GenreResponse>> {
    update(&state, &id_str, &payload, Action::PartialUpdate).await
}

/// Removes the genre and unlinks it from every movie.
pub async fn delete_genre(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&id_str)?;
    utils::delete_one(&state, Resource::Genre, doc! { "_id": id }).await?;

    let unlinked = state
        .documents(Resource::Movie)
        .update_many(doc! { "genres": id }, doc! { "$pull": { "genres": id } }, None)
        .await?;
    tracing::debug!(genre = id, movies = unlinked.modified_count, "genre unlinked from movies");

    Ok(StatusCode::NO_CONTENT)
}
