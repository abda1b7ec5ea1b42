use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QrRecord {
    pub id: i64,
    pub name: String,
    pub link: String,
    pub note: String,
    pub author: String,
    pub user_id: i64,
    pub video: Option<String>,
    /// Immutable once created; keys the public URL and asset files.
    pub identifier: String,
    pub png_path: String,
    pub svg_path: String,
    pub page_path: String,
    pub created_at: OffsetDateTime,
}

/// Record denormalized with the owner's display name for list views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QrRecordWithOwner {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: QrRecord,
    pub user_name: Option<String>,
}

pub struct NewQrRecord<'a> {
    pub name: &'a str,
    pub link: &'a str,
    pub note: &'a str,
    pub author: &'a str,
    pub user_id: i64,
    pub video: Option<&'a str>,
    pub identifier: &'a str,
    pub png_path: &'a str,
    pub svg_path: &'a str,
    pub page_path: &'a str,
}

/// Mutable display metadata. Identifier and PNG/SVG paths are
/// deliberately absent; they never change after creation.
pub struct QrContentUpdate<'a> {
    pub name: &'a str,
    pub link: &'a str,
    pub note: &'a str,
    pub author: &'a str,
    pub video: Option<&'a str>,
}

const SELECT_WITH_OWNER: &str = "\
    SELECT qr.id, qr.name, qr.link, qr.note, qr.author, qr.user_id, qr.video, \
           qr.identifier, qr.png_path, qr.svg_path, qr.page_path, qr.created_at, \
           u.name AS user_name \
    FROM qr_codes qr \
    LEFT JOIN users u ON qr.user_id = u.id";

pub async fn insert(db: &MySqlPool, record: &NewQrRecord<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO qr_codes \
         (name, link, note, author, user_id, video, identifier, png_path, svg_path, page_path) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.name)
    .bind(record.link)
    .bind(record.note)
    .bind(record.author)
    .bind(record.user_id)
    .bind(record.video)
    .bind(record.identifier)
    .bind(record.png_path)
    .bind(record.svg_path)
    .bind(record.page_path)
    .execute(db)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn find_by_id(db: &MySqlPool, id: i64) -> Result<Option<QrRecord>, sqlx::Error> {
    sqlx::query_as::<_, QrRecord>(
        "SELECT id, name, link, note, author, user_id, video, identifier, \
                png_path, svg_path, page_path, created_at \
         FROM qr_codes WHERE id = ?",
    )
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_with_owner(db: &MySqlPool) -> Result<Vec<QrRecordWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, QrRecordWithOwner>(SELECT_WITH_OWNER)
        .fetch_all(db)
        .await
}

pub async fn find_with_owner(
    db: &MySqlPool,
    id: i64,
) -> Result<Option<QrRecordWithOwner>, sqlx::Error> {
    let query = format!("{SELECT_WITH_OWNER} WHERE qr.id = ?");
    sqlx::query_as::<_, QrRecordWithOwner>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Updates display metadata only. The identifier and generated
/// PNG/SVG paths stay untouched by design.
pub async fn update_content(
    db: &MySqlPool,
    id: i64,
    update: &QrContentUpdate<'_>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE qr_codes SET name = ?, link = ?, note = ?, author = ?, video = ? WHERE id = ?",
    )
    .bind(update.name)
    .bind(update.link)
    .bind(update.note)
    .bind(update.author)
    .bind(update.video)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_id(db: &MySqlPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM qr_codes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
