use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, From};
use gallery_library::error::{Error as LibraryError, ErrorKind as LibraryErrorKind};
use serde_json::json;

/// Everything a handler can fail with, rendered as `{ "error": "..." }`.
#[derive(Debug, Display, From)]
pub enum ApiError {
    #[display("{}", **_0)]
    Library(LibraryError),
    #[display("{}", _0.body_text())]
    Multipart(MultipartError),
    #[display("{}", _0.body_text())]
    MultipartRequest(MultipartRejection),
    #[display("{}", _0.body_text())]
    Json(JsonRejection),
    #[display("{}", _0.body_text())]
    Query(QueryRejection),
    #[display("bad token")]
    #[from(ignore)]
    BadToken,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Library(err) => match &**err {
                LibraryErrorKind::BadPath(_) | LibraryErrorKind::BadName(_) => StatusCode::BAD_REQUEST,
                LibraryErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                LibraryErrorKind::UploadRejected(_) => StatusCode::PAYLOAD_TOO_LARGE,
                LibraryErrorKind::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Multipart(err) => err.status(),
            Self::MultipartRequest(err) => err.status(),
            Self::Json(err) => err.status(),
            Self::Query(err) => err.status(),
            Self::BadToken => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Library(err) if status.is_server_error() => {
                tracing::error!(error = ?err, "Request failed");
            },
            _ => tracing::debug!(status = status.as_u16(), error = %self, "Request rejected"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
