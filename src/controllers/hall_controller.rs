use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use mongodb::bson::{doc, Document};

use crate::{
    action::{Action, Resource},
    controllers::session_controller::delete_sessions,
    error::ApiResult,
    models::hall_model::{CinemaHall, CinemaHallPayload, CinemaHallResponse},
    state::AppState,
    utils::{self, parse_pk, Payload},
    validation::{Validator, MAX_NAME_LENGTH},
};

fn validate(payload: &CinemaHallPayload, action: Action) -> ApiResult<Document> {
    let mut validator = Validator::new(action);
    validator.text("name", payload.name.as_deref(), Some(MAX_NAME_LENGTH));
    validator.positive("rows", payload.rows);
    validator.positive("seats_in_row", payload.seats_in_row);
    validator.finish()
}

pub async fn load_halls(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<CinemaHallResponse>>> {
    let halls = utils::list_all::<CinemaHall>(&state, Resource::CinemaHall).await?;
    Ok(Json(halls.into_iter().map(CinemaHallResponse::from).collect()))
}

pub async fn load_hall(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<CinemaHallResponse>> {
    let hall = utils::find_by_id::<CinemaHall>(&state, Resource::CinemaHall, parse_pk(&id_str)?).await?;
    Ok(Json(hall.into()))
}

pub async fn add_hall(
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<CinemaHallPayload>,
) -> ApiResult<(StatusCode, Json<CinemaHallResponse>)> {
    let fields = validate(&payload, Action::Create)?;
    let hall = utils::insert_fields::<CinemaHall>(&state, Resource::CinemaHall, fields).await?;
    Ok((StatusCode::CREATED, Json(hall.into())))
}

async fn update(
    state: &AppState,
    id_str: &str,
    payload: &CinemaHallPayload,
    action: Action,
) -> ApiResult<Json<CinemaHallResponse>> {
    let id = parse_pk(id_str)?;
    let fields = validate(payload, action)?;
    let hall =
        utils::update_fields::<CinemaHall>(state, Resource::CinemaHall, doc! { "_id": id }, fields).await?;
    Ok(Json(hall.into()))
}

pub async fn update_hall(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<CinemaHallPayload>,
) -> ApiResult<Json<CinemaHallResponse>> {
    update(&state, &id_str, &payload, Action::Update).await
}

pub async fn patch_hall(
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<CinemaHallPayload>,
) -> ApiResult<Json<CinemaHallResponse>> {
    update(&state, &id_str, &payload, Action::PartialUpdate).await
}

/// Sessions scheduled in the hall go with it, along with their tickets.
pub async fn delete_hall(
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&id_str)?;
    utils::delete_one(&state, Resource::CinemaHall, doc! { "_id": id }).await?;
    delete_sessions(&state, doc! { "cinema_hall": id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn hall_needs_positive_dimensions() {
        let payload = CinemaHallPayload {
            name: Some("Red".into()),
            rows: Some(0),
            seats_in_row: None,
        };
        let ApiError::Validation(errors) = validate(&payload, Action::Create).unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.get("name").is_none());
        assert!(errors.get("rows").is_some());
        assert!(errors.get("seats_in_row").is_some());
    }

    #[test]
    fn valid_hall_fields() {
        let payload = CinemaHallPayload {
            name: Some("Red".into()),
            rows: Some(5),
            seats_in_row: Some(10),
        };
        let fields = validate(&payload, Action::Create).unwrap();
        assert_eq!(fields, doc! { "name": "Red", "rows": 5_i64, "seats_in_row": 10_i64 });
    }
}
