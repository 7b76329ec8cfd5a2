use mongodb::bson::serde_helpers::serialize_bson_datetime_as_rfc3339_string;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::session_model::MovieSessionListItem;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: i64,
    pub created_at: DateTime,
    pub user: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: i64,
    pub row: i64,
    pub seat: i64,
    pub movie_session: i64,
    pub order: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TicketResponse {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    pub row: i64,
    pub seat: i64,
    pub movie_session: i64,
}

/// Writable shape of an order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderResponse {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub created_at: DateTime,
    pub tickets: Vec<TicketResponse>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TicketListItem {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    pub row: i64,
    pub seat: i64,
    pub movie_session: MovieSessionListItem,
}

/// Summary shape of an order, sessions expanded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderListItem {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub created_at: DateTime,
    pub tickets: Vec<TicketListItem>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TicketPayload {
    pub row: i64,
    pub seat: i64,
    pub movie_session: i64,
}

/// Any `user` in the body is ignored: orders belong to the requester.
#[derive(Debug, Deserialize, Default)]
pub struct OrderPayload {
    pub tickets: Option<Vec<TicketPayload>>,
}
