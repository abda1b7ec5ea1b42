use serde::{Deserialize, Serialize};

use super::repo::Role;

/// Request body for the admin add-user operation.
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub profile_pic: Option<String>,
}

/// Request body for the admin edit-user operation. Password is
/// optional; it is re-hashed only when non-empty.
#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Current identity, shaped like the original `/user` payload.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(rename = "Status")]
    pub status: String,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}
