use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub token: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            token: user.token,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RegisterPayload {
    pub username: Option<String>,
}
