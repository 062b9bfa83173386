use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AppError;

/// Decodes a captured frame sent as a data URI (`data:image/jpeg;base64,...`).
///
/// Everything after the first comma is base64; a string with no comma is
/// decoded as a whole.
pub fn decode_data_uri(captured: &str) -> Result<Vec<u8>, AppError> {
    let encoded = match captured.split_once(',') {
        Some((_, payload)) => payload,
        None => captured,
    };
    let encoded = encoded.trim();

    if encoded.is_empty() {
        return Err(AppError::Decode("captured image is empty".to_string()));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AppError::Decode(e.to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::Decode("captured image is empty".to_string()));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_uri_payload() {
        let bytes = decode_data_uri("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn splits_on_first_comma_only() {
        // the payload itself is malformed because of the second comma
        assert!(decode_data_uri("data:image/png;base64,aGVs,bG8=").is_err());
    }

    #[test]
    fn bare_base64_is_accepted() {
        assert_eq!(decode_data_uri("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(decode_data_uri(""), Err(AppError::Decode(_))));
        assert!(matches!(
            decode_data_uri("data:image/jpeg;base64,"),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode_data_uri("data:image/jpeg;base64,!!not base64!!"),
            Err(AppError::Decode(_))
        ));
    }
}
