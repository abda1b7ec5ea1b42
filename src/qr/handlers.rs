use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Html,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::assets::{self, AssetPaths};
use super::dto::{QrAddResponse, QrStatusResponse};
use super::page::{render_page, PageMeta};
use super::repo::{self, NewQrRecord, QrContentUpdate, QrRecordWithOwner};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::PAGE_DIR;

const MAX_VIDEO_UPLOAD: usize = 100 * 1024 * 1024;

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/qr/add", post(add))
        .route("/qr/get-all", get(get_all))
        .route("/qr/get-all/:id", get(get_one))
        .route("/qr/edit/:id", post(edit))
        .route("/qr/delete/:id", delete(remove))
        .route("/qr/download/:id/:kind", get(download))
        .layer(DefaultBodyLimit::max(MAX_VIDEO_UPLOAD))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/qr/:identifier", get(serve_page))
}

#[derive(Default)]
struct QrForm {
    name: Option<String>,
    link: Option<String>,
    note: Option<String>,
    author: Option<String>,
    user: Option<i64>,
    video: Option<(String, Bytes)>,
}

async fn read_qr_form(mut multipart: Multipart) -> Result<QrForm, AppError> {
    let mut form = QrForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "qr_name" => form.name = Some(field.text().await.map_err(bad_field)?),
            "qr_link" => form.link = Some(field.text().await.map_err(bad_field)?),
            "qr_not" => form.note = Some(field.text().await.map_err(bad_field)?),
            "qr_author" => form.author = Some(field.text().await.map_err(bad_field)?),
            "qr_user" => {
                let raw = field.text().await.map_err(bad_field)?;
                form.user = Some(raw.trim().parse::<i64>().map_err(|_| {
                    AppError::Validation("qr_user must be a numeric user id".into())
                })?);
            }
            "qr_video" => {
                let filename = field.file_name().unwrap_or("video.mp4").to_string();
                let data = field.bytes().await.map_err(bad_field)?;
                if !data.is_empty() {
                    form.video = Some((filename, data));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(e.to_string())
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("All fields are required (missing {field}).")))
}

#[instrument(skip(state, _auth, multipart))]
pub async fn add(
    State(state): State<AppState>,
    _auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<QrAddResponse>), AppError> {
    let form = read_qr_form(multipart).await?;
    let name = required(form.name, "qr_name")?;
    let link = required(form.link, "qr_link")?;
    let note = required(form.note, "qr_not")?;
    let author = required(form.author, "qr_author")?;
    let user_id = form
        .user
        .ok_or_else(|| AppError::Validation("All fields are required (missing qr_user).".into()))?;

    let video = match form.video {
        Some((original, data)) => Some(state.storage.save_video(&original, &data).await?),
        None => None,
    };

    // The identifier is derived exactly once here and keys the public
    // URL; it survives every later edit.
    let identifier = assets::derive_identifier(&name);
    let paths = AssetPaths::for_identifier(&identifier);
    let base = &state.config.public_base_url;
    let public_url = assets::redirect_url(base, &identifier);

    // Row first: a database failure aborts before any asset exists. A
    // file failure below leaves an orphan row pointing at missing
    // files, which is accepted and not recovered automatically.
    let qr_id = repo::insert(
        &state.db,
        &NewQrRecord {
            name: &name,
            link: &link,
            note: &note,
            author: &author,
            user_id,
            video: video.as_deref(),
            identifier: &identifier,
            png_path: &paths.png,
            svg_path: &paths.svg,
            page_path: &paths.page,
        },
    )
    .await?;

    let png = assets::render_png(&public_url)?;
    state.storage.write(&paths.png, &png).await?;
    let svg = assets::render_svg(&public_url)?;
    state.storage.write(&paths.svg, svg.as_bytes()).await?;

    let html = render_page(&PageMeta {
        name,
        note,
        author,
        link,
        video_url: video.map(|v| format!("{base}/uploads/{v}")),
    });
    state.storage.write(&paths.page, html.as_bytes()).await?;

    info!(qr_id, identifier = %identifier, "qr record created");
    Ok((
        StatusCode::CREATED,
        Json(QrAddResponse {
            status: "success".into(),
            message: "QR Code added successfully.".into(),
            qr_id,
            qr_png_path: format!("{base}/uploads/{}", paths.png),
            qr_svg_path: format!("{base}/uploads/{}", paths.svg),
            qr_page_path: public_url,
        }),
    ))
}

#[instrument(skip(state, _auth, multipart))]
pub async fn edit(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<QrStatusResponse>, AppError> {
    let form = read_qr_form(multipart).await?;
    let name = required(form.name, "qr_name")?;
    let link = required(form.link, "qr_link")?;
    let note = required(form.note, "qr_not")?;
    let author = required(form.author, "qr_author")?;

    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("QR code not found.".into()))?;

    let video = match form.video {
        Some((original, data)) => Some(state.storage.save_video(&original, &data).await?),
        None => existing.video.clone(),
    };

    repo::update_content(
        &state.db,
        id,
        &QrContentUpdate {
            name: &name,
            link: &link,
            note: &note,
            author: &author,
            video: video.as_deref(),
        },
    )
    .await?;

    // Only the page is regenerated, in place at its original path. The
    // PNG/SVG encode the identifier-derived URL, which never changes.
    let base = &state.config.public_base_url;
    let html = render_page(&PageMeta {
        name,
        note,
        author,
        link,
        video_url: video.map(|v| format!("{base}/uploads/{v}")),
    });
    state.storage.write(&existing.page_path, html.as_bytes()).await?;

    info!(qr_id = id, identifier = %existing.identifier, "qr record updated");
    Ok(Json(QrStatusResponse {
        status: "success".into(),
        message: "QR code updated successfully.".into(),
    }))
}

#[instrument(skip(state, _auth))]
pub async fn get_all(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<QrRecordWithOwner>>, AppError> {
    Ok(Json(repo::list_with_owner(&state.db).await?))
}

#[instrument(skip(state, _auth))]
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<QrRecordWithOwner>, AppError> {
    let record = repo::find_with_owner(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("QR code not found.".into()))?;
    Ok(Json(record))
}

#[instrument(skip(state, _auth))]
pub async fn remove(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<QrStatusResponse>, AppError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("QR code not found.".into()))?;

    let affected = repo::delete_by_id(&state.db, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("QR code not found.".into()));
    }

    // Best-effort file cleanup; a missing or stubborn file never
    // aborts the deletion.
    let mut targets = vec![
        existing.page_path.clone(),
        existing.png_path.clone(),
        existing.svg_path.clone(),
    ];
    if let Some(video) = &existing.video {
        targets.push(video.clone());
    }
    for relative in targets {
        if let Err(e) = state.storage.remove(&relative).await {
            warn!(path = %relative, error = %e, "failed to delete qr asset");
        }
    }

    info!(qr_id = id, "qr record deleted");
    Ok(Json(QrStatusResponse {
        status: "success".into(),
        message: "QR code deleted successfully.".into(),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Png,
    Svg,
}

/// Whitelist check, applied before any database work.
pub fn parse_download_kind(raw: &str) -> Option<DownloadKind> {
    match raw {
        "png" => Some(DownloadKind::Png),
        "svg" => Some(DownloadKind::Svg),
        _ => None,
    }
}

#[instrument(skip(state, _auth))]
pub async fn download(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, kind_raw)): Path<(i64, String)>,
) -> Result<([(header::HeaderName, String); 2], Vec<u8>), AppError> {
    let kind = parse_download_kind(&kind_raw).ok_or_else(|| {
        AppError::Validation("Invalid file type. Only 'png' and 'svg' are supported.".into())
    })?;

    let record = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("QR Code not found.".into()))?;

    let (relative, content_type) = match kind {
        DownloadKind::Png => (&record.png_path, "image/png"),
        DownloadKind::Svg => (&record.svg_path, "image/svg+xml"),
    };

    let data = state.storage.read(relative).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound("File not found.".into())
        } else {
            AppError::Internal(e.into())
        }
    })?;

    let filename = relative.rsplit('/').next().unwrap_or(relative);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    ))
}

/// Guards the public page route against path traversal; identifiers
/// only ever contain the stamp, an underscore, and the sanitized name.
fn is_safe_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

#[instrument(skip(state))]
pub async fn serve_page(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Html<String>, AppError> {
    if !is_safe_identifier(&identifier) {
        return Err(AppError::NotFound("Page not found.".into()));
    }

    let relative = format!("{PAGE_DIR}/{identifier}.html");
    let bytes = state.storage.read(&relative).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound("Page not found.".into())
        } else {
            AppError::Internal(e.into())
        }
    })?;

    Ok(Html(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_kind_rejects_anything_but_png_and_svg() {
        assert_eq!(parse_download_kind("png"), Some(DownloadKind::Png));
        assert_eq!(parse_download_kind("svg"), Some(DownloadKind::Svg));
        assert_eq!(parse_download_kind("pdf"), None);
        assert_eq!(parse_download_kind("PNG"), None);
        assert_eq!(parse_download_kind(""), None);
    }

    #[test]
    fn identifier_guard_blocks_traversal() {
        assert!(is_safe_identifier("1700000000000_My-Store"));
        assert!(!is_safe_identifier("../../etc/passwd"));
        assert!(!is_safe_identifier("a/b"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("a..b.html"));
    }

    #[tokio::test]
    async fn serve_page_reads_generated_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::fake(dir.path());
        state
            .storage
            .write("pages/123_store.html", b"<html>ok</html>")
            .await
            .unwrap();

        let Html(body) = serve_page(State(state), Path("123_store".to_string()))
            .await
            .expect("page served");
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn serve_page_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::fake(dir.path());
        let err = serve_page(State(state), Path("123_gone".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
