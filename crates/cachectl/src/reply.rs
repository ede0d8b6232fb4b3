//! Replies written back for each command
//!
//! One reply per command, one line per reply.

use std::fmt;

/// Reply types
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status word: OK, PONG
    Simple(String),
    /// Command failed: ERR message
    Error(String),
    /// Count or size
    Integer(i64),
    /// Stored value
    Value(String),
    /// Key not present
    Nil,
    /// `field:value` pairs, space separated
    Fields(Vec<(String, String)>),
}

impl Reply {
    /// Plain OK
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    /// Error with the ERR prefix added on output
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// True for error replies
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "{}", s),
            Reply::Error(e) => write!(f, "ERR {}", e),
            Reply::Integer(i) => write!(f, "(integer) {}", i),
            Reply::Value(v) => {
                // `"` and `\` are backslash-escaped inside the quotes
                f.write_str("\"")?;
                for c in v.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
            Reply::Nil => write!(f, "(nil)"),
            Reply::Fields(fields) => {
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", name, value)?;
                }
                Ok(())
            }
        }
    }
}
