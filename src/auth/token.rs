use crate::error::{GhAssessError, Result};

/// A credential that never shows up in logs or `Debug` output.
#[derive(Clone)]
pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Token {
    /// Builds a token from a configured value, rejecting blank input.
    pub fn require(value: &str, what: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GhAssessError::Config(format!("{what} must not be empty")));
        }
        Ok(Self::from(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
