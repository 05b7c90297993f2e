// Static plot files written by the regression script

use std::io::ErrorKind;
use std::path::Path;

use axum::extract::{Path as UrlPath, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::{message, ApiError};
use crate::state::ApiState;

fn content_type(file: &str) -> &'static str {
    let ext = Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// A plot name is a single file name inside the plots directory
fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty() && !file.contains("..") && !file.contains('/') && !file.contains('\\')
}

pub async fn plot(
    State(state): State<ApiState>,
    UrlPath(file): UrlPath<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&file) {
        return Err(ApiError::BadRequest(message::INVALID_PLOT_NAME.to_string()));
    }

    let path = state.plots_dir.join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(&file))], bytes).into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ApiError::NotFound(message::PLOT_NOT_FOUND.to_string()))
        }
        Err(e) => Err(ApiError::internal(
            message::INTERNAL,
            format!("reading {}: {}", path.display(), e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type("aqi_distribution.png"), "image/png");
        assert_eq!(content_type("residuals.JPEG"), "image/jpeg");
        assert_eq!(content_type("model.svg"), "image/svg+xml");
        assert_eq!(content_type("scores.json"), "application/json");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(is_plain_file_name("heatmap.png"));
        assert!(!is_plain_file_name("../.env"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a\\b.png"));
        assert!(!is_plain_file_name(""));
    }
}
