use std::collections::HashMap;
use thiserror::Error;

/// Payload rejected before it reaches access evaluation or storage
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    pub fn field(field: impl Into<String>, problem: impl Into<String>) -> Self {
        let mut errors = Validator::new();
        errors.add(field, problem);
        Self {
            message: "Validation failed".to_string(),
            field_errors: errors.errors,
        }
    }
}

/// Typed request body that can check its own field constraints
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;

    /// Canonicalise values before validation, e.g. lowercase emails
    fn normalize(&mut self) {}
}

/// Collects every field problem so clients see them all at once
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, problem: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| problem.into());
    }

    pub fn non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "must not be empty");
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_email(value) {
            self.add(field, "must be a valid email address");
        }
        self
    }

    pub fn digits(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if !value.chars().all(|c| c.is_ascii_digit()) || len < min || len > max {
            self.add(field, format!("must be {}-{} digits", min, max));
        }
        self
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if value.chars().count() < min {
            self.add(field, format!("must be at least {} characters", min));
        }
        self
    }

    pub fn optional<T>(&mut self, value: Option<&T>, check: impl FnOnce(&mut Self, &T)) -> &mut Self
    where
        T: ?Sized,
    {
        if let Some(value) = value {
            check(self, value);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ValidationError {
            message: "Validation failed".to_string(),
            field_errors: std::mem::take(&mut self.errors),
        })
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty() && !rest.ends_with('.'))
}
