/// Error when parsing an invalid enum string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} '{invalid}'. Valid values: {valid}")]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, invalid: &str, valid: &[&str]) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid: valid.join(", "),
        }
    }
}
