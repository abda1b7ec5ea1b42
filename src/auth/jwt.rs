use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use super::dto::SessionUser;
use crate::{config::JwtConfig, state::AppState};

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(jwt: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(jwt.secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt.secret.as_bytes()),
            ttl: Duration::from_secs((jwt.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn sign(&self, user: &SessionUser) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            name: user.name.clone(),
            email: user.email.clone(),
            profile_pic: user.profile_pic.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(email = %user.email, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn make_keys(secret: &str, ttl_minutes: i64) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_minutes,
        })
    }

    fn session_user() -> SessionUser {
        SessionUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            profile_pic: Some("/uploads/profiles/1.png".into()),
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let keys = make_keys("dev-secret", 5);
        let token = keys.sign(&session_user()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.profile_pic.as_deref(), Some("/uploads/profiles/1.png"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = make_keys("secret-a", 5).sign(&session_user()).expect("sign");
        assert!(make_keys("secret-b", 5).verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", 5);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        // Past the default 60s leeway
        let claims = Claims {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            profile_pic: None,
            iat: (now - 600) as usize,
            exp: (now - 300) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_stays_valid_until_expiry_without_revocation() {
        // Logout only clears the client cookie; a token issued before
        // logout still verifies until its exp.
        let keys = make_keys("dev-secret", 5);
        let token = keys.sign(&session_user()).expect("sign");
        assert!(keys.verify(&token).is_ok());
        assert!(keys.verify(&token).is_ok());
    }
}
