use std::fmt;

/// Endpoint validation error
///
/// Returned when a raw endpoint description is missing a required field or
/// carries a value of an unexpected shape. Normalization is all-or-nothing:
/// any of these aborts construction of the record and leaves no partial
/// state behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent from the raw description
    MissingField {
        /// Name of the absent field
        field: String,
    },
    /// A field is present but its value has the wrong shape
    InvalidShape {
        /// Name of the offending field
        field: String,
        /// What the normalizer expected to find
        expected: &'static str,
        /// What was actually found (JSON type or a short rendering)
        found: String,
    },
    /// A parameter declares a type string the normalizer does not know
    UnknownType {
        /// Name of the parameter carrying the type
        field: String,
        /// The unrecognized type string
        value: String,
    },
    /// A method entry does not parse as an HTTP method
    InvalidMethod {
        /// The offending method string
        value: String,
    },
    /// Two body parameters claim the same nested path with different shapes,
    /// e.g. `user` with a scalar example alongside `user.name`
    ConflictingField {
        /// The nested path where the conflict occurred
        field: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { field } => {
                write!(f, "endpoint description is missing required field '{}'", field)
            }
            ValidationError::InvalidShape {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "field '{}' has an unexpected shape: expected {}, found {}",
                    field, expected, found
                )
            }
            ValidationError::UnknownType { field, value } => {
                write!(f, "parameter '{}' declares unknown type '{}'", field, value)
            }
            ValidationError::InvalidMethod { value } => {
                write!(f, "'{}' is not a valid HTTP method", value)
            }
            ValidationError::ConflictingField { field } => {
                write!(
                    f,
                    "body parameter path '{}' is claimed both as a value and as a nested group",
                    field
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
