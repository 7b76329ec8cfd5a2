use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::serde_helpers::serialize_bson_datetime_as_rfc3339_string;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::{hall_model::CinemaHallResponse, movie_model::MovieListItem};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MovieSession {
    #[serde(rename = "_id")]
    pub id: i64,
    pub show_time: DateTime,
    pub movie: i64,
    pub cinema_hall: i64,
}

/// Writable shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSessionResponse {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub show_time: DateTime,
    pub movie: i64,
    pub cinema_hall: i64,
}

impl From<MovieSession> for MovieSessionResponse {
    fn from(session: MovieSession) -> Self {
        Self {
            id: session.id,
            show_time: session.show_time,
            movie: session.movie,
            cinema_hall: session.cinema_hall,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSessionListItem {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub show_time: DateTime,
    pub movie_title: String,
    pub cinema_hall_name: String,
    pub cinema_hall_capacity: i64,
    pub tickets_available: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TakenPlace {
    pub row: i64,
    pub seat: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSessionDetail {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub show_time: DateTime,
    pub movie: MovieListItem,
    pub cinema_hall: CinemaHallResponse,
    pub taken_places: Vec<TakenPlace>,
    #[serde(default)]
    pub tickets_available: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct MovieSessionPayload {
    pub show_time: Option<ChronoDateTime<Utc>>,
    pub movie: Option<i64>,
    pub cinema_hall: Option<i64>,
}

/// Seats left once `sold` tickets are taken from a `rows` by
/// `seats_in_row` hall.
pub fn tickets_available(rows: i64, seats_in_row: i64, sold: i64) -> i64 {
    rows.saturating_mul(seats_in_row).saturating_sub(sold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fifty_seat_hall_with_three_sold_has_forty_seven_left() {
        assert_eq!(tickets_available(5, 10, 3), 47);
        assert_eq!(tickets_available(5, 10, 0), 50);
        assert_eq!(tickets_available(i64::MAX / 2, 3, 0), i64::MAX);
    }

    #[test]
    fn show_time_serializes_as_rfc3339() {
        let show_time: ChronoDateTime<Utc> = "2024-05-01T18:30:00Z".parse().unwrap();
        let response = MovieSessionResponse {
            id: 3,
            show_time: DateTime::from_chrono(show_time),
            movie: 1,
            cinema_hall: 2,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], json!(3));
        assert_eq!(value["show_time"], json!("2024-05-01T18:30:00Z"));
    }
}
