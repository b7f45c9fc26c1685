use std::fmt;
use std::io;

/// Kind of a script-level error, matching the taxonomy in the error handling design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptErrorKind {
    Syntax,
    UndefinedName,
    Arity,
    Type,
    Linkage,
    Overflow,
    Io,
}

/// A script-level error, carrying the source file and line of the offending program node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl ScriptError {
    pub fn new(kind: ScriptErrorKind, file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        ScriptError {
            kind,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn type_error(file: impl Into<String>, line: u32, expected: &str) -> Self {
        Self::new(ScriptErrorKind::Type, file, line, format!("must be a {expected}"))
    }

    pub fn undefined(file: impl Into<String>, line: u32, name: &str) -> Self {
        Self::new(
            ScriptErrorKind::UndefinedName,
            file,
            line,
            format!("function {name} is undefined"),
        )
    }

    pub fn arity(file: impl Into<String>, line: u32, name: &str, min: usize, max: usize, got: usize) -> Self {
        Self::new(
            ScriptErrorKind::Arity,
            file,
            line,
            format!("{name} expects between {min} and {max} arguments, got {got}"),
        )
    }

    pub fn overflow(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Overflow, file, line, message)
    }

    pub fn io(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Io, file, line, message)
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in {} at line {}: {}", self.file, self.line, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Errors that can occur while ingesting or serving a genealogical database.
#[derive(Debug)]
pub enum Error {
    /// Error reading or writing a file.
    Io(io::Error),

    /// The file path provided does not exist or cannot be accessed.
    FileNotFound(String),

    /// Error parsing a GEDCOM line or record.
    ParseError {
        line_number: Option<usize>,
        message: String,
    },

    /// Invalid GEDCOM structure (e.g., a record references a key that was never ingested).
    InvalidStructure(String),

    /// Failures raised while running a script: parse-time errors are joined together,
    /// run-time errors carry a single offending location.
    Script(Vec<ScriptError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::FileNotFound(path) => write!(f, "File not found: {path}"),
            Error::ParseError { line_number, message } => {
                if let Some(line) = line_number {
                    write!(f, "Parse error at line {line}: {message}")
                } else {
                    write!(f, "Parse error: {message}")
                }
            }
            Error::InvalidStructure(msg) => write!(f, "Invalid GEDCOM structure: {msg}"),
            Error::Script(errs) => {
                for (i, e) in errs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ScriptError> for Error {
    fn from(err: ScriptError) -> Self {
        Error::Script(vec![err])
    }
}

/// Type alias for Results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_error_display_has_file_and_line_prefix() {
        let err = ScriptError::type_error("report.ll", 12, "person");
        assert_eq!(err.to_string(), "Error in report.ll at line 12: must be a person");
    }

    #[test]
    fn file_not_found_display() {
        let err: Error = Error::FileNotFound("missing.ged".into());
        assert_eq!(err.to_string(), "File not found: missing.ged");
    }
}
