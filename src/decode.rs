use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{wire::ApiErrorBody, Result, SharpAiError};

/// Decodes a complete non-streaming response into `T`.
///
/// Non-success statuses map to their error kind before the body is looked at
/// as a success payload. An error-shaped body under a 2xx status is treated
/// as a deserialization failure.
pub(crate) fn decode_json<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    ensure_success(status, body)?;
    reject_error_payload(body)?;
    serde_json::from_str::<T>(body).map_err(|err| SharpAiError::Deserialization {
        message: format!("invalid response JSON: {err}"),
        body: body.to_owned(),
    })
}

/// Decodes a response whose success body carries no data.
pub(crate) fn decode_empty(status: u16, body: &str) -> Result<()> {
    ensure_success(status, body)?;
    if body.trim().is_empty() {
        return Ok(());
    }
    reject_error_payload(body)
}

/// Returns the mapped error for any non-2xx status.
pub(crate) fn ensure_success(status: u16, body: &str) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(status_error(status, body))
}

/// Maps a failed status and its body to the fixed error taxonomy.
///
/// For 4xx statuses a recognized domain discriminator in the body takes
/// precedence over the generic status mapping.
pub(crate) fn status_error(status: u16, body: &str) -> SharpAiError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).unwrap_or_default();
    let message = parsed
        .message()
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| canonical_reason(status));

    if (400..500).contains(&status) {
        if let Some(err) = discriminator_error(parsed.code.as_deref(), status, &message) {
            return err;
        }
    }

    match status {
        401 => SharpAiError::Authentication { message },
        403 => SharpAiError::Authorization { message },
        404 => SharpAiError::ResourceNotFound { message },
        408 => SharpAiError::Timeout { message },
        409 => SharpAiError::Conflict { status, message },
        429 => SharpAiError::RateLimited { message },
        500..=599 => SharpAiError::Server { status, message },
        _ => SharpAiError::BadRequest { status, message },
    }
}

fn discriminator_error(code: Option<&str>, status: u16, message: &str) -> Option<SharpAiError> {
    let message = message.to_owned();
    match code? {
        "Conflict" => Some(SharpAiError::Conflict { status, message }),
        "InUse" => Some(SharpAiError::InUse { status, message }),
        "Inactive" => Some(SharpAiError::Inactive { status, message }),
        "NotEmpty" => Some(SharpAiError::NotEmpty { status, message }),
        "InvalidRange" => Some(SharpAiError::InvalidRange { status, message }),
        _ => None,
    }
}

fn reject_error_payload(body: &str) -> Result<()> {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if parsed.is_error() => Err(SharpAiError::Deserialization {
            message: format!(
                "error payload received with success status: {}",
                parsed.message().unwrap_or_default()
            ),
            body: body.to_owned(),
        }),
        _ => Ok(()),
    }
}

fn canonical_reason(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::{decode, ErrorKind, SharpAiError};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Tags {
        models: Vec<String>,
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        let cases = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Authentication),
            (403, ErrorKind::Authorization),
            (404, ErrorKind::ResourceNotFound),
            (408, ErrorKind::Timeout),
            (409, ErrorKind::Conflict),
            (413, ErrorKind::BadRequest),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::Server),
            (503, ErrorKind::Server),
        ];

        for (status, kind) in cases {
            let err = decode::decode_json::<Tags>(status, r#"{"error":"nope"}"#)
                .expect_err("non-success status must fail");
            assert_eq!(err.kind(), kind, "status {status}");
        }
    }

    #[test]
    fn server_discriminator_refines_client_errors() {
        let err = decode::status_error(409, r#"{"Error":"InUse","Description":"model loaded"}"#);
        assert_eq!(
            err,
            SharpAiError::InUse {
                status: 409,
                message: "model loaded".to_owned()
            }
        );

        let err = decode::status_error(400, r#"{"Error":"InvalidRange","Description":"n"}"#);
        assert!(matches!(err, SharpAiError::InvalidRange { status: 400, .. }));

        let err = decode::status_error(500, r#"{"Error":"InUse","Description":"x"}"#);
        assert!(matches!(err, SharpAiError::Server { status: 500, .. }));
    }

    #[test]
    fn plain_text_error_body_becomes_message() {
        let err = decode::status_error(502, "upstream exploded\n");
        assert_eq!(
            err,
            SharpAiError::Server {
                status: 502,
                message: "upstream exploded".to_owned()
            }
        );

        let err = decode::status_error(404, "");
        assert_eq!(
            err,
            SharpAiError::ResourceNotFound {
                message: "Not Found".to_owned()
            }
        );
    }

    #[test]
    fn error_shaped_success_body_is_deserialization_error() {
        let err = decode::decode_json::<Tags>(200, r#"{"error":"model not loaded"}"#)
            .expect_err("must fail");
        assert!(matches!(err, SharpAiError::Deserialization { .. }));
    }

    #[test]
    fn schema_mismatch_carries_raw_body() {
        let err = decode::decode_json::<Tags>(200, r#"{"models": 3}"#).expect_err("must fail");
        match err {
            SharpAiError::Deserialization { body, .. } => assert_eq!(body, r#"{"models": 3}"#),
            other => panic!("expected deserialization error, got {other:?}"),
        }
    }

    #[test]
    fn decoding_is_deterministic() {
        let body = r#"{"models":["a","b"]}"#;
        let first = decode::decode_json::<Tags>(200, body);
        let second = decode::decode_json::<Tags>(200, body);
        assert_eq!(first, second);
        assert_eq!(
            first.expect("must decode").models,
            vec!["a".to_owned(), "b".to_owned()]
        );
    }

    #[test]
    fn empty_success_body_is_accepted() {
        assert!(decode::decode_empty(200, "").is_ok());
        assert!(decode::decode_empty(200, "{}").is_ok());
        assert!(decode::decode_empty(404, "").is_err());
    }
}
