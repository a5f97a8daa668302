//! Input validation for invention descriptions.
//!
//! A description may only be sent for analysis once its trimmed text is at
//! least [`MIN_DESCRIPTION_CHARS`] characters long. Validation never touches
//! the network.

use patentguard_model::AnalyzeRequest;
use thiserror::Error;

/// Minimum trimmed length, in characters.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter at least {min} characters describing your invention.")]
    TooShort { min: usize, actual: usize },
}

/// A description that passed validation.
///
/// Holds the text exactly as typed; trimming only applies to the length
/// check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventionDescription(String);

impl InventionDescription {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_request(self) -> AnalyzeRequest {
        AnalyzeRequest::new(self.0)
    }
}

impl AsRef<str> for InventionDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate raw user input.
pub fn validate(text: &str) -> Result<InventionDescription, ValidationError> {
    let actual = text.trim().chars().count();
    if actual < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::TooShort {
            min: MIN_DESCRIPTION_CHARS,
            actual,
        });
    }
    Ok(InventionDescription(text.to_string()))
}

/// Whether a submit control should be enabled for this input.
pub fn is_submittable(text: &str) -> bool {
    validate(text).is_ok()
}
