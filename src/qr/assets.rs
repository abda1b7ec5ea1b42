use std::io::Cursor;
use std::sync::atomic::{AtomicI64, Ordering};

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use time::OffsetDateTime;

use crate::storage::{PAGE_DIR, QR_DIR};

/// Minimum pixel width of the generated PNG/SVG.
const QR_WIDTH: u32 = 300;

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that is strictly increasing within the
/// process, so two records created in the same tick still get
/// distinct identifiers.
fn next_stamp() -> i64 {
    let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

/// Derives the permanent identifier for a new record. The identifier
/// keys the public redirect URL and all asset filenames, and must
/// never change once the code is printed.
pub fn derive_identifier(name: &str) -> String {
    format!("{}_{}", next_stamp(), sanitize(name))
}

/// Keeps the name portion of an identifier filesystem- and URL-safe.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "qr".into()
    } else {
        cleaned
    }
}

/// Relative asset paths, deterministic in the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub png: String,
    pub svg: String,
    pub page: String,
}

impl AssetPaths {
    pub fn for_identifier(identifier: &str) -> Self {
        Self {
            png: format!("{QR_DIR}/{identifier}.png"),
            svg: format!("{QR_DIR}/{identifier}.svg"),
            page: format!("{PAGE_DIR}/{identifier}.html"),
        }
    }
}

/// Public redirect URL encoded into the PNG/SVG.
pub fn redirect_url(base_url: &str, identifier: &str) -> String {
    format!("{base_url}/qr/{identifier}")
}

/// Encodes the URL as a PNG bitmap, high error-correction level.
pub fn render_png(url: &str) -> anyhow::Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::H)
        .map_err(|e| anyhow::anyhow!("qr encode failed: {e}"))?;
    let img = code
        .render::<image::Luma<u8>>()
        .min_dimensions(QR_WIDTH, QR_WIDTH)
        .build();
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Encodes the URL as vector markup.
pub fn render_svg(url: &str) -> anyhow::Result<String> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::H)
        .map_err(|e| anyhow::anyhow!("qr encode failed: {e}"))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_WIDTH, QR_WIDTH)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_unique_within_a_tick() {
        let a = derive_identifier("store");
        let b = derive_identifier("store");
        assert_ne!(a, b);

        let stamp_a: i64 = a.split('_').next().unwrap().parse().unwrap();
        let stamp_b: i64 = b.split('_').next().unwrap().parse().unwrap();
        assert!(stamp_b > stamp_a);
    }

    #[test]
    fn identifier_carries_sanitized_name() {
        let id = derive_identifier("My Store!");
        assert!(id.ends_with("_My-Store-"));
        let id = derive_identifier("../escape");
        assert!(!id.contains('/'));
        assert!(!id.contains(".."));
    }

    #[test]
    fn asset_paths_are_deterministic_in_the_identifier() {
        let paths = AssetPaths::for_identifier("1700000000000_store");
        assert_eq!(paths.png, "qr_codes/1700000000000_store.png");
        assert_eq!(paths.svg, "qr_codes/1700000000000_store.svg");
        assert_eq!(paths.page, "pages/1700000000000_store.html");
        // Re-deriving from the same identifier never moves the assets
        assert_eq!(paths, AssetPaths::for_identifier("1700000000000_store"));
    }

    #[test]
    fn redirect_url_is_identifier_keyed() {
        assert_eq!(
            redirect_url("https://example.com", "123_store"),
            "https://example.com/qr/123_store"
        );
    }

    #[test]
    fn png_output_has_png_signature() {
        let bytes = render_png("https://example.com/qr/123_store").expect("render");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn svg_output_is_vector_markup() {
        let xml = render_svg("https://example.com/qr/123_store").expect("render");
        assert!(xml.starts_with("<?xml") || xml.starts_with("<svg"));
        assert!(xml.contains("<svg"));
    }
}
