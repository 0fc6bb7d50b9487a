use std::collections::HashSet;

use sea_orm::prelude::Json;
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed single-line field of 1..=`max` Unicode characters.
pub fn validate_text_field(name: &str, value: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{name} must be 1-{max} characters"
        )));
    }
    Ok(())
}

/// Minimal shape check for an email address.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation(format!("Invalid email '{email}'")));
    }
    Ok(())
}

/// Validate a tag list: each tag 1-64 characters, no duplicates.
pub fn validate_tags(tags: &[String]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for tag in tags {
        validate_text_field("Tag", tag, 64)?;
        if !seen.insert(tag.trim()) {
            return Err(AppError::Validation(format!("Duplicate tag '{tag}'")));
        }
    }
    Ok(())
}

/// Require every tag to appear in the course vocabulary.
pub fn ensure_tag_subset(tags: &[String], vocabulary: &[String]) -> Result<(), AppError> {
    if let Some(unknown) = tags.iter().find(|t| !vocabulary.contains(t)) {
        return Err(AppError::Validation(format!(
            "Tag '{unknown}' is not one of the course tags"
        )));
    }
    Ok(())
}

/// Trimmed copy of a tag list, in input order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| t.trim().to_string()).collect()
}

/// Decode a JSON string array column. Non-string entries are skipped.
pub fn tags_from_json(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn tags_to_json(tags: &[String]) -> Json {
    Json::from(tags.to_vec())
}
