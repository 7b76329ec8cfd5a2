use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    controllers::{
        actor_controller::*, genre_controller::*, hall_controller::*, home_controller, movie_controller::*,
        order_controller::*, session_controller::*, user_controller,
    },
    state::AppState,
};

pub const API_PREFIX: &str = "/api/cinema";

pub fn build_router(state: Arc<AppState>) -> Router {
    let cinema = Router::new()
        .route("/genres", get(list_genres).post(add_genre))
        .route(
            "/genres/:id",
            get(get_genre).put(update_genre).patch(patch_genre).delete(delete_genre),
        )
        .route("/actors", get(list_actors).post(add_actor))
        .route(
            "/actors/:id",
            get(get_actor).put(update_actor).patch(patch_actor).delete(delete_actor),
        )
        .route("/cinema_halls", get(load_halls).post(add_hall))
        .route(
            "/cinema_halls/:id",
            get(load_hall).put(update_hall).patch(patch_hall).delete(delete_hall),
        )
        .route("/movies", get(load_movies).post(add_movie))
        .route(
            "/movies/:id",
            get(load_movie).put(update_movie).patch(patch_movie).delete(delete_movie),
        )
        .route("/movie_sessions", get(load_sessions).post(add_session))
        .route(
            "/movie_sessions/:id",
            get(load_session)
                .put(update_session)
                .patch(patch_session)
                .delete(delete_session),
        )
        .route("/orders", get(list_orders).post(add_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).patch(patch_order).delete(delete_order),
        );

    Router::new()
        .route("/", get(home_controller::index))
        .route("/api/user/register", post(user_controller::register))
        .nest(API_PREFIX, cinema)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

pub fn cors_layer(app_url: &str) -> anyhow::Result<CorsLayer> {
    let origin = app_url
        .parse::<HeaderValue>()
        .with_context(|| format!("APP_URL `{app_url}` is not a valid origin"))?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(origin)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
