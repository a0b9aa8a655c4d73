use std::io;

use axum::{http::StatusCode, response::{IntoResponse, Response}};
use log::error;

use crate::components::RenderError;
use crate::services::StorageError;

/// Custom error types for the wiki application
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// No route matches the request path
    #[error("404 page not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        match self {
            WikiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            WikiError::Storage(_)
            | WikiError::Render(_)
            | WikiError::Config(_)
            | WikiError::Io(_) => {
                error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageTitle;

    #[test]
    fn route_miss_is_404() {
        assert_eq!(WikiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn backend_failures_are_500() {
        let io = WikiError::from(StorageError::io("pages/A.txt", io::Error::other("disk on fire")));
        assert_eq!(io.to_string(), "pages/A.txt: disk on fire");
        assert_eq!(io.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let render = WikiError::from(RenderError::from(minijinja::Error::new(
            minijinja::ErrorKind::TemplateNotFound,
            "view",
        )));
        assert_eq!(render.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unhandled_page_miss_is_still_a_server_error() {
        let title = PageTitle::parse("Gone").unwrap();
        let err = WikiError::from(StorageError::NotFound { title });
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
