// Request body extraction that fails with the API's error envelope

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body extractor whose rejection is a 400 `VALIDATION_ERROR`
///
/// Wrong field types, malformed JSON and a missing `application/json`
/// content type all render as `{success:false, errorCode, message, timestamp}`
/// instead of axum's plain-text 415/422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(BodyRejection)?;
        Ok(ApiJson(value))
    }
}

/// A request body that could not be read as the expected JSON document
#[derive(Debug)]
pub struct BodyRejection(pub JsonRejection);

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        tracing::debug!("Rejected request body: {}", self.0.body_text());
        let message = match &self.0 {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a JSON body with Content-Type: application/json.".to_string()
            }
            other => other.body_text(),
        };
        crate::error::error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}
