use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, StatusCode},
};
use serde_json::value::RawValue;

use crate::error::AppError;

/// JSON request body kept as unparsed text.
///
/// Documents nested in the body are stored as the client wrote them, so the
/// body is never decoded into a `serde_json::Value` tree.
#[derive(Debug)]
pub struct RawJson(pub Box<RawValue>);

/// `application/json` or any `application/*+json` type
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

impl<S> FromRequest<S> for RawJson
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request(
        req: Request,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let is_json = has_json_content_type(req.headers());

        async move {
            if !is_json {
                return Err(AppError::Rejected(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Expected request with `Content-Type: application/json`".to_string(),
                ));
            }

            // Applies the router's body size limit
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| AppError::Rejected(rejection.status(), rejection.body_text()))?;

            let raw = serde_json::from_slice::<Box<RawValue>>(&bytes)
                .map_err(|e| AppError::BadRequest(format!("Failed to parse the request body as JSON: {}", e)))?;

            Ok(RawJson(raw))
        }
    }
}
