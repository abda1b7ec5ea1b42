use serde::{Deserialize, Serialize};

/// JWT claims carried by the session cookie. The token signs the
/// display identity itself, so downstream handlers never need a
/// lookup just to know who is calling.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub iat: usize,
    pub exp: usize,
}
