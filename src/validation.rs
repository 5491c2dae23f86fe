// src/validation.rs

//! Field validation with structured message lists
//!
//! Every rule that fails contributes one [`FieldMessage`]. A field that is
//! missing only reports `required`; its other rules are skipped.

use serde::Serialize;
use std::fmt;

/// Name of the rule a field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Required,
    Unique,
    Url,
    Email,
    Format,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Unique => "unique",
            Rule::Url => "url",
            Rule::Email => "email",
            Rule::Format => "format",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMessage {
    pub field: String,
    pub validation: Rule,
    pub message: String,
}

/// Ordered list of failed rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldMessage>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list holding one message
    pub fn single(field: &str, validation: Rule, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, validation, message);
        errors
    }

    pub fn push(&mut self, field: &str, validation: Rule, message: impl Into<String>) {
        self.0.push(FieldMessage {
            field: field.to_string(),
            validation,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[FieldMessage] {
        &self.0
    }

    /// True if any message was recorded for `field` with `rule`
    pub fn has(&self, field: &str, rule: Rule) -> bool {
        self.0.iter().any(|m| m.field == field && m.validation == rule)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(|m| m.message.as_str()).collect();
        write!(f, "{}", joined.join("; "))
    }
}

/// Collects failures across several fields
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-empty value; returns it when present
    pub fn required<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.errors
                    .push(field, Rule::Required, format!("{field} is required"));
                None
            }
        }
    }

    /// Require an absolute http(s) URL
    pub fn url(&mut self, field: &str, value: Option<&str>) -> Option<url::Url> {
        let value = self.required(field, value)?;
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
                Some(parsed)
            }
            _ => {
                self.errors
                    .push(field, Rule::Url, format!("{field} must be a valid URL"));
                None
            }
        }
    }

    /// Require something shaped like `local@domain.tld`
    pub fn email<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        let value = self.required(field, value)?;
        if looks_like_email(value) {
            Some(value)
        } else {
            self.errors
                .push(field, Rule::Email, format!("{field} must be a valid email address"));
            None
        }
    }

    /// Record `message` against `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, rule: Rule, message: impl Into<String>) {
        if !ok {
            self.errors.push(field, rule, message);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// `\S+@\S+\.\S+`
pub fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot + 1 < domain.len(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_empty() {
        let mut v = Validator::new();
        assert_eq!(v.required("name", Some("Foo")), Some("Foo"));
        assert_eq!(v.required("id", None), None);
        assert_eq!(v.required("author", Some("")), None);

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.messages().len(), 2);
        assert!(errors.has("id", Rule::Required));
        assert!(errors.has("author", Rule::Required));
    }

    #[test]
    fn test_url_rule() {
        let mut v = Validator::new();
        assert!(v.url("png", Some("https://example.com/icon.png")).is_some());
        assert!(v.url("svg", Some("not a url")).is_none());
        assert!(v.url("other", Some("ftp://example.com/x")).is_none());

        let errors = v.finish().unwrap_err();
        assert!(errors.has("svg", Rule::Url));
        assert!(errors.has("other", Rule::Url));
        assert!(!errors.has("png", Rule::Url));
    }

    #[test]
    fn test_missing_url_only_reports_required() {
        let mut v = Validator::new();
        v.url("png", None);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors.messages().len(), 1);
        assert!(errors.has("png", Rule::Required));
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("admin@example.com"));
        assert!(looks_like_email("a@b.c"));
        assert!(!looks_like_email("admin"));
        assert!(!looks_like_email("admin@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ad min@example.com"));
        assert!(!looks_like_email("admin@example."));
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.push("id", Rule::Required, "id is required");
        errors.push("id", Rule::Unique, "id is already taken");
        assert_eq!(errors.to_string(), "id is required; id is already taken");
    }

    #[test]
    fn test_serializes_as_list() {
        let errors = ValidationErrors::single("needle", Rule::Required, "needle is required");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"field": "needle", "validation": "required", "message": "needle is required"}
            ])
        );
    }
}
