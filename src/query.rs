//! Query-string filters for the movie and movie session listings.

use chrono::{Duration, NaiveDate};
use mongodb::bson::{doc, DateTime, Document, Regex};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Parses a comma separated id list such as `1,2, 3`.
pub fn parse_ids(param: &str, raw: &str) -> ApiResult<Vec<i64>> {
    raw.split(',')
        .map(|id| {
            id.trim().parse::<i64>().map_err(|_| {
                ApiError::BadRequest(format!("`{param}` must be a comma separated list of integer ids"))
            })
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub actors: Option<String>,
}

/// The filter a movie listing ends up with.
///
/// Parameters are applied in the order title, genres, actors and each one
/// present replaces whatever came before it, so `actors` wins over
/// `genres` and either wins over `title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieFilter {
    All,
    Title(String),
    Genres(Vec<i64>),
    Actors(Vec<i64>),
}

impl MovieFilter {
    pub fn from_query(query: &MovieQuery) -> ApiResult<Self> {
        let mut filter = MovieFilter::All;
        // Whitespace is a valid substring to search for.
        if let Some(title) = query.title.as_deref().filter(|title| !title.is_empty()) {
            filter = MovieFilter::Title(title.to_string());
        }
        if let Some(genres) = non_empty(&query.genres) {
            filter = MovieFilter::Genres(parse_ids("genres", genres)?);
        }
        if let Some(actors) = non_empty(&query.actors) {
            filter = MovieFilter::Actors(parse_ids("actors", actors)?);
        }
        Ok(filter)
    }

    pub fn to_match(&self) -> Document {
        match self {
            MovieFilter::All => doc! {},
            MovieFilter::Title(title) => {
                let pattern = Regex {
                    pattern: regex::escape(title),
                    options: "i".to_string(),
                };
                doc! { "title": pattern }
            }
            MovieFilter::Genres(ids) => doc! { "genres": { "$in": ids.clone() } },
            MovieFilter::Actors(ids) => doc! { "actors": { "$in": ids.clone() } },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub date: Option<String>,
    pub movie: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub date: Option<NaiveDate>,
    pub movie: Option<i64>,
}

impl SessionFilter {
    pub fn from_query(query: &SessionQuery) -> ApiResult<Self> {
        let date = non_empty(&query.date)
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    ApiError::BadRequest("`date` must be a calendar date formatted YYYY-MM-DD".into())
                })
            })
            .transpose()?;
        let movie = non_empty(&query.movie)
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ApiError::BadRequest("`movie` must be an integer id".into()))
            })
            .transpose()?;
        Ok(Self { date, movie })
    }

    /// Matches sessions whose show time falls on the UTC calendar day.
    pub fn to_match(&self) -> Document {
        let mut filter = Document::new();
        if let Some(date) = self.date {
            let start = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            let end = start.map(|dt| dt + Duration::days(1));
            if let (Some(start), Some(end)) = (start, end) {
                filter.insert(
                    "show_time",
                    doc! {
                        "$gte": DateTime::from_chrono(start),
                        "$lt": DateTime::from_chrono(end),
                    },
                );
            }
        }
        if let Some(movie) = self.movie {
            filter.insert("movie", movie);
        }
        filter
    }
}
