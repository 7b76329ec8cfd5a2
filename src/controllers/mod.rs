pub mod actor_controller;
pub mod genre_controller;
pub mod hall_controller;
pub mod home_controller;
pub mod movie_controller;
pub mod order_controller;
pub mod session_controller;
pub mod user_controller;
