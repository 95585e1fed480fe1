// View models for the HTML pages. Display formatting only, no business rules.
use askama::Template;
use chrono::NaiveDate;

use crate::app::forms::{FormErrors, TodoForm};
use crate::app::models::{Todo, TodoId};

// One todo as shown on the list page
pub struct TodoRow {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub resolved: bool,
    pub overdue: bool,
    pub status: &'static str,
    pub badge_class: &'static str,
    pub card_class: &'static str,
}

impl TodoRow {
    pub fn new(todo: &Todo, today: NaiveDate) -> TodoRow {
        let overdue = todo.is_overdue_on(today);
        let (status, badge_class, card_class) = if todo.resolved {
            ("Resolved", "bg-success", "resolved")
        } else if overdue {
            ("Overdue", "bg-danger", "overdue")
        } else if todo.due_date.is_some() {
            ("Pending", "bg-warning", "")
        } else {
            ("Open", "bg-secondary", "")
        };

        TodoRow {
            id: todo.id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo
                .due_date
                .map(|date| date.format("%b %d, %Y").to_string())
                .unwrap_or_default(),
            resolved: todo.resolved,
            overdue,
            status,
            badge_class,
            card_class,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub todos: Vec<TodoRow>,
    pub hide_resolved: bool,
    pub total: usize,
    pub open: usize,
    pub overdue: usize,
}

impl HomeTemplate {
    pub fn new(todos: &[Todo], hide_resolved: bool, today: NaiveDate) -> HomeTemplate {
        let todos: Vec<TodoRow> = todos.iter().map(|todo| TodoRow::new(todo, today)).collect();
        HomeTemplate {
            total: todos.len(),
            open: todos.iter().filter(|row| !row.resolved).count(),
            overdue: todos.iter().filter(|row| row.overdue).count(),
            todos,
            hide_resolved,
        }
    }
}

#[derive(Template)]
#[template(path = "todo_form.html")]
pub struct TodoFormTemplate {
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub resolved: bool,
    pub title_error: Option<String>,
    pub due_date_error: Option<String>,
}

impl TodoFormTemplate {
    pub fn create(form: &TodoForm, errors: Option<&FormErrors>) -> TodoFormTemplate {
        TodoFormTemplate::build("New TODO", "/new".to_string(), "Create", form, errors)
    }

    pub fn edit(id: TodoId, form: &TodoForm, errors: Option<&FormErrors>) -> TodoFormTemplate {
        TodoFormTemplate::build("Edit TODO", format!("/{id}/edit"), "Save", form, errors)
    }

    fn build(
        heading: &'static str,
        action: String,
        submit_label: &'static str,
        form: &TodoForm,
        errors: Option<&FormErrors>,
    ) -> TodoFormTemplate {
        let error_for =
            |field: &str| errors.and_then(|errors| errors.get(field)).map(str::to_string);
        TodoFormTemplate {
            heading,
            action,
            submit_label,
            title: form.title.clone(),
            description: form.description.clone(),
            due_date: form.due_date.clone(),
            resolved: form.is_checked(),
            title_error: error_for("title"),
            due_date_error: error_for("due_date"),
        }
    }
}

#[derive(Template)]
#[template(path = "todo_confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub id: TodoId,
    pub title: String,
}
