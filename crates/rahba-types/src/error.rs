//! Common error types

/// Error parsing a closed enum value from a string
#[derive(Debug, Clone)]
pub struct EnumParseError {
    /// Name of the enum being parsed
    pub kind: &'static str,
    /// The rejected input value
    pub value: String,
}

impl EnumParseError {
    /// Create a new parse error
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}
