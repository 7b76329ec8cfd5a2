pub mod actor_model;
pub mod genre_model;
pub mod hall_model;
pub mod movie_model;
pub mod order_model;
pub mod session_model;
pub mod user_model;
