use serde::{Deserialize, Serialize};

use super::{actor_model::ActorResponse, genre_model::GenreResponse};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i64,
    #[serde(default)]
    pub genres: Vec<i64>,
    #[serde(default)]
    pub actors: Vec<i64>,
}

/// Writable shape: related objects as ids.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MovieResponse {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub genres: Vec<i64>,
    pub actors: Vec<i64>,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            duration: movie.duration,
            genres: movie.genres,
            actors: movie.actors,
        }
    }
}

/// Summary shape: genre names and actor full names.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MovieListItem {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
}

/// Detail shape: genres and actors expanded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MovieDetail {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub genres: Vec<GenreResponse>,
    pub actors: Vec<ActorResponse>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MoviePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i64>,
    pub genres: Option<Vec<i64>>,
    pub actors: Option<Vec<i64>>,
}
