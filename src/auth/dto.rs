use serde::{Deserialize, Serialize};

use crate::users::repo::Role;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for self-service registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub profile_pic: Option<String>,
}

/// Identity carried in the session token and echoed to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    pub email: String,
    pub profile_pic: Option<String>,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: String,
    pub message: String,
    pub user: SessionUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}
