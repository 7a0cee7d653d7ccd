//! Contact form payload and validation schema

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contact payload as accepted by the contact endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub contact: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

impl ContactSubmission {
    /// Organization, if provided and non-empty
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref().filter(|s| !s.is_empty())
    }

    /// Budget, if provided and non-empty
    pub fn budget(&self) -> Option<&str> {
        self.budget.as_deref().filter(|s| !s.is_empty())
    }
}

/// Form fields, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Organization,
    Contact,
    Description,
    Budget,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Organization => "organization",
            Self::Contact => "contact",
            Self::Description => "description",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum length (in characters, surrounding whitespace ignored) and message per field
const RULES: [(Field, usize, &str); 5] = [
    (Field::Name, 2, "Name must be at least 2 characters"),
    (Field::Organization, 2, "Organization name must be at least 2 characters"),
    (Field::Contact, 3, "Email or Telegram is required"),
    (Field::Description, 10, "Please provide at least 10 characters"),
    (Field::Budget, 1, "Budget is required"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// All field errors found in one validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw form state as typed by the visitor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub organization: String,
    pub contact: String,
    pub description: String,
    pub budget: String,
}

impl ContactForm {
    fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Organization => &self.organization,
            Field::Contact => &self.contact,
            Field::Description => &self.description,
            Field::Budget => &self.budget,
        }
    }

    /// Check every field against the schema, reporting all failures at once
    pub fn validate(&self) -> Result<ContactSubmission, ValidationErrors> {
        let errors: Vec<FieldError> = RULES
            .iter()
            .filter(|(field, min, _)| self.value(*field).trim().chars().count() < *min)
            .map(|&(field, _, message)| FieldError { field, message })
            .collect();

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(ContactSubmission {
            name: self.name.trim().to_string(),
            organization: Some(self.organization.trim().to_string()),
            contact: self.contact.trim().to_string(),
            description: self.description.trim().to_string(),
            budget: Some(self.budget.trim().to_string()),
        })
    }
}
