//! REST API for a cinema: genres, actors, halls, movies, sessions and
//! the orders users place for tickets.

pub mod action;
pub mod auth;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod pagination;
pub mod query;
pub mod routes;
pub mod state;
pub mod utils;
pub mod validation;

pub use routes::build_router;
pub use state::AppState;
