use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Json};
use mongodb::bson::doc;
use uuid::Uuid;

use crate::{
    action::{Action, Resource},
    error::{ApiError, ApiResult},
    models::user_model::{RegisterPayload, User, UserResponse},
    state::AppState,
    utils::{self, Payload},
    validation::Validator,
};

const MAX_USERNAME_LENGTH: usize = 150;
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Creates a user and issues the API token it authenticates with.
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<RegisterPayload>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let mut validator = Validator::new(Action::Create);
    validator.text("username", payload.username.as_deref(), Some(MAX_USERNAME_LENGTH));
    let mut fields = validator.finish()?;

    let username = fields.get_str("username").unwrap_or_default().to_string();
    let taken = state
        .documents(Resource::User)
        .count_documents(doc! { "username": username.as_str() }, None)
        .await?;
    if taken > 0 {
        return Err(ApiError::field("username", USERNAME_TAKEN));
    }

    fields.insert("token", Uuid::new_v4().simple().to_string());
    let user = match utils::insert_fields::<User>(&state, Resource::User, fields).await {
        Err(err) if err.is_duplicate_key() => return Err(ApiError::field("username", USERNAME_TAKEN)),
        other => other?,
    };
    tracing::info!(user = user.id, username = %user.username, "user registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}
