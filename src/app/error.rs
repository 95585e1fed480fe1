use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::app::models::TodoId;

// Failures of the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("todo {0} does not exist")]
    NotFound(TodoId),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

// Failures surfaced by the HTTP handlers.
// Validation problems are not errors here: the form is re-rendered with its messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Storage(StorageError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => AppError::NotFound,
            other => AppError::Storage(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Html("<!DOCTYPE html><title>Not Found</title><h1>Not Found</h1>"),
            )
                .into_response(),
            error => {
                tracing::error!(%error, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<!DOCTYPE html><title>Server Error</title><h1>Server Error (500)</h1>"),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_todo_maps_to_404() {
        let response = AppError::from(StorageError::NotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn sqlite_failure_maps_to_500() {
        let error = StorageError::from(rusqlite::Error::QueryReturnedNoRows);
        let response = AppError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
