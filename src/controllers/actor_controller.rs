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
    models::actor_model::{Actor, ActorPayload, ActorResponse},
    state::AppState,
    utils::{self, parse_pk, Payload},
    validation::{Validator, MAX_NAME_LENGTH},
};

fn validate(payload: &ActorPayload, action: Action) -> ApiResult<Document> {
    let mut validator = Validator::new(action);
    validator.text("first_name", payload.first_name.as_deref(), Some(MAX_NAME_LENGTH));
    validator.text("last_name", payload.last_name.as_deref(), Some(MAX_NAME_LENGTH));
    validator.finish()
}

pub async fn list_actors(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<ActorResponse>>> {
    let actors = utils::list_all::<Actor>(&state, Resource::Actor).await?;
    Ok(Json(actors.into_iter().map(ActorResponse::from).collect()))
}

pub async fn get_actor(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<ActorResponse>> {
    let actor = utils::find_by_id::<Actor>(&state, Resource::Actor, parse_pk(&id_str)?).await?;
    Ok(Json(actor.into()))
}

pub async fn add_actor(
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<ActorPayload>,
) -> ApiResult<(StatusCode, Json<ActorResponse>)> {
    let fields = validate(&payload, Action::Create)?;
    let actor = utils::insert_fields::<Actor>(&state, Resource::Actor, fields).await?;
    Ok((StatusCode::CREATED, Json(actor.into())))
}

async fn update(
    state: &AppState,
    id_str: &str,
    payload: &ActorPayload,
    action: Action,
) -> ApiResult<Json<ActorResponse>> {
    let id = parse_pk(id_str)?;
    let fields = validate(payload, action)?;
    let actor = utils::update_fields::<Actor>(state, Resource::Actor, doc! { "_id": id }, fields).await?;
    Ok(Json(actor.into()))
}

pub async fn update_actor(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<ActorPayload>,
) -> ApiResult<Json<ActorResponse>> {
    update(&state, &id_str, &payload, Action::Update).await
}

pub async fn patch_actor(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<ActorPayload>,
) -> ApiResult<Json<ActorResponse>> {
    update(&state, &id_str, &payload, Action::PartialUpdate).await
}

pub async fn delete_actor(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&id_str)?;
    utils::delete_one(&state, Resource::Actor, doc! { "_id": id }).await?;

    state
        .documents(Resource::Movie)
        .update_many(doc! { "actors": id }, doc! { "$pull": { "actors": id } }, None)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn both_names_are_required() {
        let payload = ActorPayload {
            first_name: Some("Uma".into()),
            last_name: None,
        };
        let err = validate(&payload, Action::Update).unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("first_name").is_none());
        assert!(errors.get("last_name").is_some());
    }
}
