use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use mongodb::bson::{doc, DateTime, Document};

use crate::{
    action::{Action, Resource, Shape},
    auth::AuthUser,
    controllers::session_controller::session_summary_stages,
    error::{ApiError, ApiResult, FieldErrors},
    models::{
        hall_model::CinemaHall,
        order_model::{Order, OrderListItem, OrderPayload, OrderResponse, Ticket, TicketPayload},
        session_model::MovieSession,
    },
    pagination::{Page, PageQuery, PageRequest, RequestUrl},
    state::AppState,
    utils::{self, collect_as, invalid_pk_message, parse_pk, Payload},
    validation::REQUIRED,
};

/// (movie session, row, seat)
type Place = (i64, i64, i64);

fn tickets_lookup(shape: Shape) -> Document {
    let mut stages = vec![
        doc! { "$match": { "$expr": { "$eq": ["$order", "$$order_id"] } } },
        doc! { "$sort": { "_id": 1 } },
    ];

    if shape == Shape::Summary {
        let mut session_stages = vec![doc! {
            "$match": { "$expr": { "$eq": ["$_id", "$$session_id"] } }
        }];
        session_stages.extend(session_summary_stages());

        stages.push(doc! {
            "$lookup": {
                "from": Resource::MovieSession.collection(),
                "let": { "session_id": "$movie_session" },
                "pipeline": session_stages,
                "as": "movie_session"
            }
        });
        stages.push(doc! { "$unwind": "$movie_session" });
    }
    stages.push(doc! { "$project": { "row": 1, "seat": 1, "movie_session": 1 } });

    doc! {
        "$lookup": {
            "from": Resource::Ticket.collection(),
            "let": { "order_id": "$_id" },
            "pipeline": stages,
            "as": "tickets"
        }
    }
}

/// Orders of one user. Listings load tickets, sessions and halls in the
/// same aggregation.
pub(crate) fn order_pipeline(shape: Shape, filter: Document, page: Option<PageRequest>) -> Vec<Document> {
    let mut pipeline = vec![doc! { "$match": filter }, doc! { "$sort": { "_id": 1 } }];
    if let Some(page) = page {
        pipeline.push(doc! { "$skip": i64::try_from(page.skip()).unwrap_or(i64::MAX) });
        pipeline.push(doc! { "$limit": i64::try_from(page.page_size).unwrap_or(i64::MAX) });
    }
    pipeline.push(tickets_lookup(shape));
    pipeline.push(doc! { "$project": { "created_at": 1, "tickets": 1 } });
    pipeline
}

/// Checks requested places against hall bounds, places already sold and
/// each other. `halls` maps session ids to the hall they play in.
pub(crate) fn check_tickets(
    tickets: &[TicketPayload],
    halls: &HashMap<i64, CinemaHall>,
    taken: &HashSet<Place>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let mut requested = HashSet::new();

    for ticket in tickets {
        let Some(hall) = halls.get(&ticket.movie_session) else {
            errors.add("movie_session", invalid_pk_message(ticket.movie_session));
            continue;
        };
        if !(1..=hall.rows).contains(&ticket.row) {
            errors.add(
                "row",
                format!("row number must be in available range: (1, rows): (1, {})", hall.rows),
            );
        }
        if !(1..=hall.seats_in_row).contains(&ticket.seat) {
            errors.add(
                "seat",
                format!(
                    "seat number must be in available range: (1, seats_in_row): (1, {})",
                    hall.seats_in_row
                ),
            );
        }

        let place = (ticket.movie_session, ticket.row, ticket.seat);
        if taken.contains(&place) || !requested.insert(place) {
            errors.add(
                "tickets",
                format!(
                    "Seat {} in row {} is already taken for session {}.",
                    ticket.seat, ticket.row, ticket.movie_session
                ),
            );
        }
    }
    errors
}

/// Loads what [`check_tickets`] needs. Tickets of `order` itself do not
/// count as taken, so an order can be rewritten with the same seats.
async fn validate_tickets(state: &AppState, tickets: &[TicketPayload], order: Option<i64>) -> ApiResult<()> {
    if tickets.is_empty() {
        return Err(ApiError::field("tickets", "This list may not be empty."));
    }

    let session_ids: Vec<i64> = tickets.iter().map(|t| t.movie_session).collect();
    let sessions: Vec<MovieSession> = collect_as(
        state
            .documents(Resource::MovieSession)
            .find(doc! { "_id": { "$in": session_ids.clone() } }, None)
            .await?,
    )
    .await?;

    let hall_ids: Vec<i64> = sessions.iter().map(|s| s.cinema_hall).collect();
    let halls: HashMap<i64, CinemaHall> = collect_as::<CinemaHall>(
        state
            .documents(Resource::CinemaHall)
            .find(doc! { "_id": { "$in": hall_ids } }, None)
            .await?,
    )
    .await?
    .into_iter()
    .map(|hall| (hall.id, hall))
    .collect();
    let session_halls: HashMap<i64, CinemaHall> = sessions
        .iter()
        .filter_map(|session| halls.get(&session.cinema_hall).map(|hall| (session.id, hall.clone())))
        .collect();

    let mut sold_filter = doc! { "movie_session": { "$in": session_ids } };
    if let Some(order) = order {
        sold_filter.insert("order", doc! { "$ne": order });
    }
    let taken: HashSet<Place> = collect_as::<Ticket>(
        state.documents(Resource::Ticket).find(sold_filter, None).await?,
    )
    .await?
    .into_iter()
    .map(|ticket| (ticket.movie_session, ticket.row, ticket.seat))
    .collect();

    check_tickets(tickets, &session_halls, &taken).into_result()
}

/// Seats to add to an order and ids of its tickets to drop so that it holds
/// exactly `requested`. Tickets for places kept by the rewrite stay as they are.
pub(crate) fn ticket_changes(existing: &[Ticket], requested: &[TicketPayload]) -> (Vec<TicketPayload>, Vec<i64>) {
    let wanted: HashSet<Place> = requested
        .iter()
        .map(|t| (t.movie_session, t.row, t.seat))
        .collect();
    let held: HashSet<Place> = existing
        .iter()
        .map(|t| (t.movie_session, t.row, t.seat))
        .collect();

    let added = requested
        .iter()
        .filter(|t| !held.contains(&(t.movie_session, t.row, t.seat)))
        .cloned()
        .collect();
    let dropped = existing
        .iter()
        .filter(|t| !wanted.contains(&(t.movie_session, t.row, t.seat)))
        .map(|t| t.id)
        .collect();
    (added, dropped)
}

/// Inserts tickets for `order`. On failure every ticket written by this
/// call is removed again and the order's other tickets are left alone.
async fn insert_tickets(state: &AppState, order: i64, tickets: &[TicketPayload]) -> ApiResult<()> {
    if tickets.is_empty() {
        return Ok(());
    }
    let mut documents = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        documents.push(Ticket {
            id: utils::next_id(state, Resource::Ticket).await?,
            row: ticket.row,
            seat: ticket.seat,
            movie_session: ticket.movie_session,
            order,
        });
    }
    let ids: Vec<i64> = documents.iter().map(|t| t.id).collect();

    let Err(err) = state
        .collection::<Ticket>(Resource::Ticket)
        .insert_many(documents, None)
        .await
    else {
        return Ok(());
    };

    state
        .documents(Resource::Ticket)
        .delete_many(doc! { "_id": { "$in": ids } }, None)
        .await?;
    let err = ApiError::from(err);
    if err.is_duplicate_key() {
        tracing::warn!(order, "seat taken while inserting tickets");
        return Err(ApiError::field("tickets", "One of the requested seats was just taken."));
    }
    Err(err)
}

async fn load_order(state: &AppState, user: &AuthUser, id: i64) -> ApiResult<OrderResponse> {
    let pipeline = order_pipeline(
        Resource::Order.shape(Action::Retrieve),
        doc! { "_id": id, "user": user.id },
        None,
    );
    utils::aggregate_one(state, Resource::Order, pipeline).await
}

pub async fn list_orders(
    user: AuthUser,
    url: RequestUrl,
    Query(query): Query<PageQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Page<OrderListItem>>> {
    let page = PageRequest::from_query(&query)?;
    let filter = doc! { "user": user.id };

    let count = state
        .documents(Resource::Order)
        .count_documents(filter.clone(), None)
        .await?;
    page.ensure_exists(count)?;

    let pipeline = order_pipeline(Resource::Order.shape(Action::List), filter, Some(page));
    let orders = utils::aggregate_all(&state, Resource::Order, pipeline).await?;
    Ok(Json(Page::new(page, count, &url, orders)))
}

pub async fn get_order(
    user: AuthUser,
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<OrderResponse>> {
    let order = load_order(&state, &user, parse_pk(&id_str)?).await?;
    Ok(Json(order))
}

/// The owner is always the requester.
pub async fn add_order(
    user: AuthUser,
    Extension(state): Extension<Arc<AppState>>,
    Payload(payload): Payload<OrderPayload>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let tickets = payload
        .tickets
        .ok_or_else(|| ApiError::field("tickets", REQUIRED))?;
    validate_tickets(&state, &tickets, None).await?;

    let order = Order {
        id: utils::next_id(&state, Resource::Order).await?,
        created_at: DateTime::now(),
        user: user.id,
    };
    state
        .collection::<Order>(Resource::Order)
        .insert_one(&order, None)
        .await?;
    let id = order.id;

    if let Err(err) = insert_tickets(&state, id, &tickets).await {
        state
            .documents(Resource::Order)
            .delete_one(doc! { "_id": id }, None)
            .await?;
        return Err(err);
    }
    tracing::info!(order = id, user = user.id, tickets = tickets.len(), "order created");

    let order = load_order(&state, &user, id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn update(
    state: &AppState,
    user: &AuthUser,
    id_str: &str,
    payload: OrderPayload,
    action: Action,
) -> ApiResult<Json<OrderResponse>> {
    let id = parse_pk(id_str)?;
    let exists = state
        .documents(Resource::Order)
        .count_documents(doc! { "_id": id, "user": user.id }, None)
        .await?;
    if exists == 0 {
        return Err(ApiError::NotFound);
    }

    let tickets = match (payload.tickets, action.is_partial()) {
        (Some(tickets), _) => Some(tickets),
        (None, true) => None,
        (None, false) => return Err(ApiError::field("tickets", REQUIRED)),
    };

    if let Some(tickets) = tickets {
        validate_tickets(state, &tickets, Some(id)).await?;
        let existing: Vec<Ticket> = collect_as(
            state
                .documents(Resource::Ticket)
                .find(doc! { "order": id }, None)
                .await?,
        )
        .await?;
        let (added, dropped) = ticket_changes(&existing, &tickets);
        insert_tickets(state, id, &added).await?;
        if !dropped.is_empty() {
            state
                .documents(Resource::Ticket)
                .delete_many(doc! { "_id": { "$in": dropped } }, None)
                .await?;
        }
        tracing::info!(order = id, tickets = tickets.len(), "order tickets replaced");
    }

    Ok(Json(load_order(state, user, id).await?))
}

pub async fn update_order(
    user: AuthUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<OrderPayload>,
) -> ApiResult<Json<OrderResponse>> {
    update(&state, &user, &id_str, payload, Action::Update).await
}

pub async fn patch_order(
    user: AuthUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(payload): Payload<OrderPayload>,
) -> ApiResult<Json<OrderResponse>> {
    update(&state, &user, &id_str, payload, Action::PartialUpdate).await
}

pub async fn delete_order(
    user: AuthUser,
    Path(id_str): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&id_str)?;
    utils::delete_one(&state, Resource::Order, doc! { "_id": id, "user": user.id }).await?;
    state
        .documents(Resource::Ticket)
        .delete_many(doc! { "order": id }, None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall() -> CinemaHall {
        CinemaHall {
            id: 1,
            name: "Blue".into(),
            rows: 5,
            seats_in_row: 10,
        }
    }

    fn ticket(row: i64, seat: i64) -> TicketPayload {
        TicketPayload {
            row,
            seat,
            movie_session: 7,
        }
    }

    fn halls() -> HashMap<i64, CinemaHall> {
        HashMap::from([(7, hall())])
    }

    #[test]
    fn valid_tickets_pass() {
        let errors = check_tickets(&[ticket(1, 1), ticket(5, 10)], &halls(), &HashSet::new());
        assert!(errors.is_empty());
    }

    #[test]
    fn out_of_range_places_rejected() {
        let errors = check_tickets(&[ticket(6, 1), ticket(1, 0)], &halls(), &HashSet::new());
        assert!(errors.get("row").unwrap()[0].contains("(1, 5)"));
        assert!(errors.get("seat").unwrap()[0].contains("(1, 10)"));
    }

    #[test]
    fn sold_and_repeated_places_rejected() {
        let taken = HashSet::from([(7, 2, 3)]);
        let errors = check_tickets(&[ticket(2, 3), ticket(4, 4), ticket(4, 4)], &halls(), &taken);
        assert_eq!(errors.get("tickets").map(<[String]>::len), Some(2));
    }

    #[test]
    fn unknown_session_rejected() {
        let payload = TicketPayload {
            row: 1,
            seat: 1,
            movie_session: 99,
        };
        let errors = check_tickets(&[payload], &halls(), &HashSet::new());
        assert_eq!(errors.get("movie_session").unwrap()[0], invalid_pk_message(99));
    }

    fn stored(id: i64, row: i64, seat: i64) -> Ticket {
        Ticket {
            id,
            row,
            seat,
            movie_session: 7,
            order: 1,
        }
    }

    #[test]
    fn rewrite_keeps_shared_places_and_drops_the_rest() {
        let existing = [stored(10, 1, 1), stored(11, 2, 2)];
        let (added, dropped) = ticket_changes(&existing, &[ticket(2, 2), ticket(3, 3)]);
        assert_eq!(added, vec![ticket(3, 3)]);
        assert_eq!(dropped, vec![10]);
    }

    #[test]
    fn rewrite_with_same_places_changes_nothing() {
        let existing = [stored(10, 1, 1), stored(11, 2, 2)];
        let (added, dropped) = ticket_changes(&existing, &[ticket(2, 2), ticket(1, 1)]);
        assert!(added.is_empty());
        assert!(dropped.is_empty());
    }

    #[test]
    fn list_pipeline_pages_and_expands_sessions() {
        let page = PageRequest { page: 2, page_size: 3 };
        let pipeline = order_pipeline(Shape::Summary, doc! { "user": 5_i64 }, Some(page));

        assert_eq!(pipeline[0], doc! { "$match": { "user": 5_i64 } });
        assert_eq!(pipeline[2], doc! { "$skip": 3_i64 });
        assert_eq!(pipeline[3], doc! { "$limit": 3_i64 });

        let lookup = pipeline[4].get_document("$lookup").unwrap();
        let stages = lookup.get_array("pipeline").unwrap();
        let has_session_lookup = stages.iter().any(|stage| {
            stage
                .as_document()
                .and_then(|stage| stage.get_document("$lookup").ok())
                .is_some_and(|inner| inner.get_str("from").ok() == Some("movie_sessions"))
        });
        assert!(has_session_lookup);
    }

    #[test]
    fn writable_pipeline_keeps_session_ids() {
        let pipeline = order_pipeline(Shape::Writable, doc! { "_id": 1_i64, "user": 5_i64 }, None);
        assert_eq!(pipeline.len(), 4);

        let lookup = pipeline[2].get_document("$lookup").unwrap();
        let stages = lookup.get_array("pipeline").unwrap();
        assert_eq!(stages.len(), 3);
    }
}
