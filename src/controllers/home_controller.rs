use axum::response::Json;
use serde_json::{json, Value};

use crate::{action::Resource, routes::API_PREFIX};

/// Lists the collection endpoints.
pub async fn index() -> Json<Value> {
    let link = |resource: Resource| format!("{API_PREFIX}/{}", resource.collection());
    Json(json!({
        "genres": link(Resource::Genre),
        "actors": link(Resource::Actor),
        "cinema_halls": link(Resource::CinemaHall),
        "movies": link(Resource::Movie),
        "movie_sessions": link(Resource::MovieSession),
        "orders": link(Resource::Order),
    }))
}
