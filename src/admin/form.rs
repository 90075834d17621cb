//! Explicit form descriptors and parsing of submitted admin forms.

use std::collections::HashMap;

use sea_orm::prelude::Date;

use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    Text { max_len: usize },
    TextArea,
    /// `YYYY-MM-DD`, blank maps to null.
    Date,
    /// Blank maps to null.
    Float { min: f64, max: f64 },
    Choice(&'static [(&'static str, &'static str)]),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Submitted key/value pairs of one admin form, inline rows included.
#[derive(Clone, Debug, Default)]
pub struct FormData {
    values: HashMap<String, String>,
}

impl FormData {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { values: pairs.into_iter().collect() }
    }

    pub fn raw(&self, name: &str) -> &str {
        self.values.get(name).map(|v| v.trim()).unwrap_or("")
    }

    pub fn checked(&self, name: &str) -> bool {
        matches!(self.raw(name), "on" | "true" | "1")
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn text(&self, field: &Field) -> AppResult<String> {
        let value = self.raw(field.name);
        if field.required && value.is_empty() {
            return Err(invalid(field, "this field is required"));
        }
        if let FieldKind::Text { max_len } = field.kind
            && value.chars().count() > max_len
        {
            return Err(invalid(field, &format!("at most {max_len} characters")));
        }
        Ok(value.to_string())
    }

    pub fn date(&self, field: &Field) -> AppResult<Option<Date>> {
        let value = self.raw(field.name);
        if value.is_empty() {
            return if field.required {
                Err(invalid(field, "this field is required"))
            } else {
                Ok(None)
            };
        }
        Date::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(field, "enter a valid date (YYYY-MM-DD)"))
    }

    pub fn float(&self, field: &Field) -> AppResult<Option<f64>> {
        let value = self.raw(field.name);
        if value.is_empty() {
            return if field.required {
                Err(invalid(field, "this field is required"))
            } else {
                Ok(None)
            };
        }
        let number: f64 = value.parse().map_err(|_| invalid(field, "enter a number"))?;
        if let FieldKind::Float { min, max } = field.kind
            && !(min..=max).contains(&number)
        {
            return Err(invalid(field, &format!("must be between {min} and {max}")));
        }
        Ok(Some(number))
    }

    /// Returns the submitted code if it is one of the field's choices.
    pub fn choice(&self, field: &Field) -> AppResult<String> {
        let value = self.raw(field.name);
        let FieldKind::Choice(choices) = field.kind else {
            return self.text(field);
        };
        if value.is_empty() && !field.required {
            return Ok(String::new());
        }
        choices
            .iter()
            .find(|(code, _)| *code == value)
            .map(|(code, _)| code.to_string())
            .ok_or_else(|| invalid(field, "select a valid choice"))
    }
}

fn invalid(field: &Field, message: &str) -> AppError {
    AppError::Validation(format!("{}: {message}", field.label))
}

/// Splits an admin search query into terms, keeping double-quoted phrases
/// together.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in query.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                if !quoted && !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

/// Escape LIKE wildcard characters in a search term.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
