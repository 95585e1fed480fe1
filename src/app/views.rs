// Request handlers, one per row of the route table in `server`
use askama::Template;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::app::error::AppError;
use crate::app::forms::TodoForm;
use crate::app::models::{today, TodoId};
use crate::app::server::SharedState;
use crate::app::storage::ListFilter;
use crate::app::templates::{ConfirmDeleteTemplate, HomeTemplate, TodoFormTemplate};

const LIST_URL: &str = "/";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    hide_resolved: Option<String>,
}

impl ListParams {
    fn filter(&self) -> ListFilter {
        let hide_resolved = matches!(
            self.hide_resolved.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "1" | "on" | "yes")
        );
        ListFilter { hide_resolved }
    }
}

fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

// Ids that are not positive integers never match a todo
fn parse_id(raw: &str) -> Result<TodoId, AppError> {
    raw.parse::<TodoId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(AppError::NotFound)
}

// GET /
pub async fn list(
    State(app): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, AppError> {
    let filter = params.filter();
    let todos = app.storage.lock().await.list_todos(filter)?;
    tracing::debug!(count = todos.len(), hide_resolved = filter.hide_resolved, "listing todos");
    render(&HomeTemplate::new(&todos, filter.hide_resolved, today()))
}

// GET /new
pub async fn create_form() -> Result<Html<String>, AppError> {
    render(&TodoFormTemplate::create(&TodoForm::default(), None))
}

// POST /new
pub async fn create(
    State(app): State<SharedState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let form = TodoForm::from_urlencoded(&body);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(%errors, "rejected new todo");
            return Ok(render(&TodoFormTemplate::create(&form, Some(&errors)))?.into_response());
        }
    };

    let todo = app.storage.lock().await.insert_todo(&draft)?;
    tracing::info!(id = todo.id, "created todo");
    Ok(Redirect::to(LIST_URL).into_response())
}

// GET /:id/edit
pub async fn edit_form(
    State(app): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id)?;
    let todo = app.storage.lock().await.get_todo(id)?;
    render(&TodoFormTemplate::edit(id, &TodoForm::from_todo(&todo), None))
}

// POST /:id/edit
pub async fn edit(
    State(app): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let form = TodoForm::from_urlencoded(&body);
    let storage = app.storage.lock().await;

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            // A missing todo is reported before its form errors
            storage.get_todo(id)?;
            tracing::debug!(id, %errors, "rejected todo edit");
            return Ok(render(&TodoFormTemplate::edit(id, &form, Some(&errors)))?.into_response());
        }
    };

    storage.update_todo(id, &draft)?;
    tracing::info!(id, "updated todo");
    Ok(Redirect::to(LIST_URL).into_response())
}

// GET /:id/delete
pub async fn confirm_delete(
    State(app): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id)?;
    let todo = app.storage.lock().await.get_todo(id)?;
    render(&ConfirmDeleteTemplate {
        id,
        title: todo.title,
    })
}

// POST /:id/delete
pub async fn delete(
    State(app): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    app.storage.lock().await.delete_todo(id)?;
    tracing::info!(id, "deleted todo");
    Ok(Redirect::to(LIST_URL))
}

// POST /:id/toggle
pub async fn toggle(
    State(app): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    let todo = app.storage.lock().await.toggle_resolved(id)?;
    tracing::info!(id, resolved = todo.resolved, "toggled todo");
    Ok(Redirect::to(LIST_URL))
}

// GET /health
pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_only_positive_integers() {
        assert_eq!(parse_id("12").unwrap(), 12);
        for raw in ["0", "-3", "abc", "1.5", ""] {
            assert!(matches!(parse_id(raw), Err(AppError::NotFound)), "{raw}");
        }
    }

    #[test]
    fn hide_resolved_parameter_values() {
        let params = |value: Option<&str>| ListParams {
            hide_resolved: value.map(str::to_string),
        };
        assert!(!params(None).filter().hide_resolved);
        assert!(!params(Some("false")).filter().hide_resolved);
        assert!(params(Some("TRUE")).filter().hide_resolved);
        assert!(params(Some("1")).filter().hide_resolved);
    }
}
