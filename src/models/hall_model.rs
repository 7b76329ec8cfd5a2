use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CinemaHall {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub rows: i64,
    pub seats_in_row: i64,
}

impl CinemaHall {
    pub fn capacity(&self) -> i64 {
        self.rows.saturating_mul(self.seats_in_row)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CinemaHallResponse {
    #[serde(rename(deserialize = "_id"))]
    pub id: i64,
    pub name: String,
    pub rows: i64,
    pub seats_in_row: i64,
    pub capacity: i64,
}

impl From<CinemaHall> for CinemaHallResponse {
    fn from(hall: CinemaHall) -> Self {
        let capacity = hall.capacity();
        Self {
            id: hall.id,
            name: hall.name,
            rows: hall.rows,
            seats_in_row: hall.seats_in_row,
            capacity,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CinemaHallPayload {
    pub name: Option<String>,
    pub rows: Option<i64>,
    pub seats_in_row: Option<i64>,
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

    #[test]
    fn capacity_is_rows_times_seats() {
        assert_eq!(hall().capacity(), 50);
        assert_eq!(CinemaHallResponse::from(hall()).capacity, 50);
    }

    #[test]
    fn huge_hall_capacity_saturates() {
        let huge = CinemaHall {
            rows: i64::MAX / 2,
            seats_in_row: 3,
            ..hall()
        };
        assert_eq!(CinemaHallResponse::from(huge).capacity, i64::MAX);
    }
}
