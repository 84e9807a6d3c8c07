use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use base64ct::{Base64, Encoding};

use crate::store::model::FilePayload;

/// Decodes a stored payload. Accepts bare Base64 or a `data:...;base64,` URL
/// as produced by browser file readers.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, base64ct::Error> {
    let encoded = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Base64::decode_vec(encoded.trim())
}

/// Attachment response carrying the decoded bytes.
pub fn attachment(file: &FilePayload, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.name.replace('"', ""));
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_and_data_url() {
        assert_eq!(decode_payload("VERMIGZpbGU=").unwrap(), b"TDL file");
        assert_eq!(
            decode_payload("data:application/octet-stream;base64,VERMIGZpbGU=").unwrap(),
            b"TDL file"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_payload("***").is_err());
    }

    #[test]
    fn attachment_sets_filename() {
        let file = FilePayload {
            name: "gst.tcp".into(),
            data: String::new(),
            size: None,
        };
        let res = attachment(&file, b"x".to_vec());
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"gst.tcp\""
        );
    }
}
