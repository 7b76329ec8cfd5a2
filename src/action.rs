//! Per-action dispatch.
//!
//! Every request is classified as an [`Action`]. Each [`Resource`] maps
//! actions to the [`Shape`] its response takes, and controllers pick their
//! aggregation pipeline from that shape.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    /// PATCH only validates the fields that are present.
    pub fn is_partial(self) -> bool {
        matches!(self, Action::PartialUpdate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Flattened representation used by collection listings.
    Summary,
    /// Nested representation with related objects expanded.
    Detail,
    /// Plain representation mirroring the stored fields, used for writes.
    Writable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Genre,
    Actor,
    CinemaHall,
    Movie,
    MovieSession,
    Order,
    Ticket,
    User,
}

impl Resource {
    pub fn collection(self) -> &'static str {
        match self {
            Resource::Genre => "genres",
            Resource::Actor => "actors",
            Resource::CinemaHall => "cinema_halls",
            Resource::Movie => "movies",
            Resource::MovieSession => "movie_sessions",
            Resource::Order => "orders",
            Resource::Ticket => "tickets",
            Resource::User => "users",
        }
    }

    pub fn shape(self, action: Action) -> Shape {
        match (self, action) {
            (Resource::Movie | Resource::MovieSession, Action::List) => Shape::Summary,
            (Resource::Movie | Resource::MovieSession, Action::Retrieve) => Shape::Detail,
            (Resource::Order, Action::List) => Shape::Summary,
            _ => Shape::Writable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 6] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::PartialUpdate,
        Action::Destroy,
    ];

    #[test]
    fn movie_and_session_shapes() {
        for resource in [Resource::Movie, Resource::MovieSession] {
            assert_eq!(resource.shape(Action::List), Shape::Summary);
            assert_eq!(resource.shape(Action::Retrieve), Shape::Detail);
            assert_eq!(resource.shape(Action::Create), Shape::Writable);
            assert_eq!(resource.shape(Action::PartialUpdate), Shape::Writable);
        }
    }

    #[test]
    fn orders_only_summarise_lists() {
        assert_eq!(Resource::Order.shape(Action::List), Shape::Summary);
        assert_eq!(Resource::Order.shape(Action::Retrieve), Shape::Writable);
        assert_eq!(Resource::Order.shape(Action::Update), Shape::Writable);
    }

    #[test]
    fn plain_resources_are_always_writable() {
        for resource in [Resource::Genre, Resource::Actor, Resource::CinemaHall] {
            for action in ALL_ACTIONS {
                assert_eq!(resource.shape(action), Shape::Writable);
            }
        }
    }

    #[test]
    fn only_patch_is_partial() {
        let partial: Vec<_> = ALL_ACTIONS.into_iter().filter(|a| a.is_partial()).collect();
        assert_eq!(partial, vec![Action::PartialUpdate]);
    }
}
