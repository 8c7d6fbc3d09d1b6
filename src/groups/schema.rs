//! Create-group form validation
//!
//! [`GroupSchema`] validates the current form: name length plus the slug
//! blacklist, and an optional description. [`LegacyGroupSchema`] only
//! checks the name length. Both collect every error per field instead of
//! stopping at the first one.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::blacklist::{self, Blacklist};
use super::slug::slugify;

pub const GROUP_NAME_MIN_LENGTH: usize = 4;
pub const GROUP_NAME_MAX_LENGTH: usize = 25;
pub const GROUP_DESCRIPTION_MAX_LENGTH: usize = 250;

pub const BLACKLISTED_NAME_MESSAGE: &str =
    "Sorry, this group name is not allowed. Please choose another one.";
const REQUIRED_MESSAGE: &str = "Required";

/// Raw form input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GroupForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Form input that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidGroup {
    pub name: String,
    pub description: Option<String>,
}

/// Field name → error messages
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("Invalid group form: {}", summarize(.fields))]
pub struct ValidationErrors {
    #[serde(flatten)]
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn summarize(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check that the slug of `name` is not blacklisted
pub fn check_name_slug(name: &str, blacklist: &Blacklist) -> Result<(), String> {
    if blacklist.contains(&slugify(name)) {
        Err(BLACKLISTED_NAME_MESSAGE.to_string())
    } else {
        Ok(())
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    min: Option<usize>,
    max: usize,
) {
    let len = value.chars().count();
    if let Some(min) = min {
        if len < min {
            errors.add(field, format!("Shorter than minimum length {}", min));
        }
    }
    if len > max {
        errors.add(field, format!("Longer than maximum length {}", max));
    }
}

/// Returns the non-empty name, recording "Required" otherwise
fn required_name<'a>(errors: &mut ValidationErrors, form: &'a GroupForm) -> Option<&'a str> {
    match form.name.as_deref() {
        Some(name) if !name.is_empty() => Some(name),
        _ => {
            errors.add("name", REQUIRED_MESSAGE);
            None
        }
    }
}

/// Schema for the create-group form
#[derive(Debug, Clone, Default)]
pub struct GroupSchema {
    blacklist: Option<Arc<Blacklist>>,
}

impl GroupSchema {
    /// Schema using the process-wide blacklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema using an explicit blacklist
    pub fn with_blacklist(blacklist: Arc<Blacklist>) -> Self {
        Self {
            blacklist: Some(blacklist),
        }
    }

    pub fn validate(&self, form: &GroupForm) -> Result<ValidGroup, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_name(&mut errors, form);
        if let Some(name) = name {
            check_length(
                &mut errors,
                "name",
                name,
                Some(GROUP_NAME_MIN_LENGTH),
                GROUP_NAME_MAX_LENGTH,
            );
            let blacklist = self.blacklist.clone().unwrap_or_else(blacklist::global);
            if let Err(message) = check_name_slug(name, &blacklist) {
                errors.add("name", message);
            }
        }

        let description = form
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        if let Some(description) = &description {
            check_length(
                &mut errors,
                "description",
                description,
                None,
                GROUP_DESCRIPTION_MAX_LENGTH,
            );
        }

        errors.into_result(ValidGroup {
            name: name.unwrap_or_default().to_string(),
            description,
        })
    }
}

/// Schema for the legacy create-group form
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyGroupSchema;

impl LegacyGroupSchema {
    pub fn validate(&self, form: &GroupForm) -> Result<ValidGroup, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_name(&mut errors, form);
        if let Some(name) = name {
            check_length(
                &mut errors,
                "name",
                name,
                Some(GROUP_NAME_MIN_LENGTH),
                GROUP_NAME_MAX_LENGTH,
            );
        }

        errors.into_result(ValidGroup {
            name: name.unwrap_or_default().to_string(),
            description: None,
        })
    }
}
