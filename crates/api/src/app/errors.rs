use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bazaar_infra::CatalogError;

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Validation(v) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", v.to_string())
        }
        CatalogError::NotAuthorized(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        CatalogError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "product not found")
        }
        CatalogError::AssetIo(msg) => {
            tracing::error!(error = %msg, "image storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "asset_error",
                "failed to store images",
            )
        }
        CatalogError::Store(msg) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "server error")
        }
    }
}

pub fn multipart_error_to_response(err: MultipartError) -> axum::response::Response {
    json_error(err.status(), "invalid_multipart", err.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path identifier, answering 400 when it is malformed.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what}: {raw}")))
}
