use serde::Serialize;

/// Response for a successful add; the paths are absolute public URLs.
#[derive(Debug, Serialize)]
pub struct QrAddResponse {
    pub status: String,
    pub message: String,
    pub qr_id: u64,
    #[serde(rename = "qrPngPath")]
    pub qr_png_path: String,
    #[serde(rename = "qrSvgPath")]
    pub qr_svg_path: String,
    #[serde(rename = "qrPagePath")]
    pub qr_page_path: String,
}

#[derive(Debug, Serialize)]
pub struct QrStatusResponse {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_response_uses_camel_case_path_keys() {
        let resp = QrAddResponse {
            status: "success".into(),
            message: "QR Code added successfully.".into(),
            qr_id: 7,
            qr_png_path: "https://h/uploads/qr_codes/1_a.png".into(),
            qr_svg_path: "https://h/uploads/qr_codes/1_a.svg".into(),
            qr_page_path: "https://h/qr/1_a".into(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"qrPngPath\""));
        assert!(json.contains("\"qrSvgPath\""));
        assert!(json.contains("\"qrPagePath\""));
        assert!(json.contains("\"qr_id\":7"));
    }
}
