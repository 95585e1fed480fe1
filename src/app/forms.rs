// Turns untrusted form input into a validated draft, or per-field errors
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::app::models::{Todo, TodoDraft, TITLE_MAX_LENGTH};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";

// Date formats accepted for the due date, tried in order.
// Two-digit years go first, `%Y` would read "24" as the year 24.
const DATE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%d %b, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

// Raw field values as submitted by a browser (or typed into the admin dialog).
// An unchecked checkbox is not submitted at all, so `resolved` is `None` then.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub resolved: Option<String>,
}

// Field name to human-readable message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>();
        f.write_str(&messages.join("; "))
    }
}

impl TodoForm {
    // Decode an urlencoded body. Repeated fields keep their last value,
    // unknown fields are ignored and an undecodable body reads as empty.
    pub fn from_urlencoded(body: &[u8]) -> TodoForm {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
        let mut form = TodoForm::default();
        for (name, value) in pairs {
            match name.as_str() {
                "title" => form.title = value,
                "description" => form.description = value,
                "due_date" => form.due_date = value,
                "resolved" => form.resolved = Some(value),
                _ => {}
            }
        }
        form
    }

    // Pre-fill a form from a stored todo
    pub fn from_todo(todo: &Todo) -> TodoForm {
        TodoForm {
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo
                .due_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            resolved: todo.resolved.then(|| "on".to_string()),
        }
    }

    pub fn is_checked(&self) -> bool {
        checkbox_value(self.resolved.as_deref())
    }

    pub fn validate(&self) -> Result<TodoDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        let title_length = title.chars().count();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title_length > TITLE_MAX_LENGTH {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {TITLE_MAX_LENGTH} characters (it has {title_length})."
                ),
            );
        }

        let due_date = match parse_date(&self.due_date) {
            Ok(due_date) => due_date,
            Err(message) => {
                errors.add("due_date", message);
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TodoDraft {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            due_date,
            resolved: self.is_checked(),
        })
    }
}

// Empty input means "no date"
fn parse_date(raw: &str) -> Result<Option<NaiveDate>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(Some)
        .ok_or(INVALID_DATE)
}

// Anything but a missing, empty or "false" checkbox value counts as checked
fn checkbox_value(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(value) => {
            let value = value.trim();
            !(value.is_empty() || value.eq_ignore_ascii_case("false"))
        }
    }
}
