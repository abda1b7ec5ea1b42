use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub profile_pic: Option<String>,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub profile_pic: Option<&'a str>,
}

/// Optional-field update. Only fields that are `Some` end up in the
/// UPDATE statement, so callers express partial edits without any
/// string-assembled SQL.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub profile_pic: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.profile_pic.is_none()
    }
}

/// Builds `UPDATE users SET ...` covering exactly the provided fields.
/// Returns `None` when there is nothing to update.
fn update_query(changes: &UserChanges) -> Option<QueryBuilder<'static, MySql>> {
    if changes.is_empty() {
        return None;
    }
    let mut qb: QueryBuilder<'static, MySql> = QueryBuilder::new("UPDATE users SET ");
    let mut sep = qb.separated(", ");
    if let Some(name) = &changes.name {
        sep.push("name = ");
        sep.push_bind_unseparated(name.clone());
    }
    if let Some(email) = &changes.email {
        sep.push("email = ");
        sep.push_bind_unseparated(email.clone());
    }
    if let Some(hash) = &changes.password_hash {
        sep.push("password_hash = ");
        sep.push_bind_unseparated(hash.clone());
    }
    if let Some(role) = changes.role {
        sep.push("role = ");
        sep.push_bind_unseparated(role);
    }
    if let Some(pic) = &changes.profile_pic {
        sep.push("profile_pic = ");
        sep.push_bind_unseparated(pic.clone());
    }
    Some(qb)
}

pub async fn find_by_email(db: &MySqlPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, profile_pic FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id(db: &MySqlPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, profile_pic FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_all(db: &MySqlPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, profile_pic FROM users ORDER BY id",
    )
    .fetch_all(db)
    .await
}

pub async fn insert(db: &MySqlPool, user: &NewUser<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, profile_pic) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .bind(user.profile_pic)
    .execute(db)
    .await?;
    Ok(result.last_insert_id())
}

/// Applies a partial update keyed by email. Returns affected rows;
/// zero means the user was not found or there was nothing to change.
pub async fn update_by_email(
    db: &MySqlPool,
    email: &str,
    changes: &UserChanges,
) -> Result<u64, sqlx::Error> {
    let Some(mut qb) = update_query(changes) else {
        return Ok(0);
    };
    qb.push(" WHERE email = ");
    qb.push_bind(email.to_string());
    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected())
}

pub async fn update_by_id(
    db: &MySqlPool,
    id: i64,
    changes: &UserChanges,
) -> Result<u64, sqlx::Error> {
    let Some(mut qb) = update_query(changes) else {
        return Ok(0);
    };
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_id(db: &MySqlPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_query_includes_only_present_fields() {
        let changes = UserChanges {
            name: Some("Ada".into()),
            password_hash: Some("$argon2id$...".into()),
            ..Default::default()
        };
        let qb = update_query(&changes).expect("builder");
        let sql = qb.sql();
        assert!(sql.contains("name = ?"));
        assert!(sql.contains("password_hash = ?"));
        assert!(!sql.contains("email"));
        assert!(!sql.contains("role"));
        assert!(!sql.contains("profile_pic"));
    }

    #[test]
    fn update_query_separates_fields_with_commas() {
        let changes = UserChanges {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            role: Some(Role::User),
            ..Default::default()
        };
        let qb = update_query(&changes).expect("builder");
        assert_eq!(
            qb.sql(),
            "UPDATE users SET name = ?, email = ?, role = ?"
        );
    }

    #[test]
    fn empty_changes_produce_no_query() {
        assert!(update_query(&UserChanges::default()).is_none());
        assert!(UserChanges::default().is_empty());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Admin,
            profile_pic: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
    }
}
