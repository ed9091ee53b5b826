pub mod dates;
pub mod reports;
pub mod time;
pub mod tree;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    ErrorReading(String),
    InvalidDate(String),
    InvalidTime(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::ErrorReading(path) => write!(f, "could not read file: '{}'", path),
            ParseError::InvalidDate(value) => write!(f, "invalid date format: '{}'", value),
            ParseError::InvalidTime(value) => write!(f, "invalid time format: '{}'", value),
        }
    }
}

impl std::error::Error for ParseError {}
