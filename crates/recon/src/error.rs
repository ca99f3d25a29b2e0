use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// A rule line doesn't fit the `identifier, [cond,] code -> action` grammar.
    RuleSyntax { line: usize, message: String },
    /// An action token outside {append, correct, holdingpen}.
    UnknownAction { line: usize, token: String },
    /// A code token with letters outside `rca`, or empty.
    InvalidDiffCodes { line: usize, token: String },
    /// The rule table has no `default` identifier.
    MissingDefaultRule,
    /// A configured identity field path isn't `tttiic` shaped.
    InvalidFieldPath(String),
    /// The catalog search index failed; fatal for the run.
    Lookup(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleSyntax { line, message } => {
                write!(f, "rule file line {line}: {message}")
            }
            Self::UnknownAction { line, token } => {
                write!(
                    f,
                    "rule file line {line}: unknown action '{token}' (expected append, correct or holdingpen)"
                )
            }
            Self::InvalidDiffCodes { line, token } => {
                write!(
                    f,
                    "rule file line {line}: diff codes '{token}' must be a non-empty subset of 'rca'"
                )
            }
            Self::MissingDefaultRule => {
                write!(f, "rule file has no 'default' identifier")
            }
            Self::InvalidFieldPath(path) => {
                write!(
                    f,
                    "invalid identity field path '{path}' (expected tag, indicators, subfield code, e.g. 035__a)"
                )
            }
            Self::Lookup(msg) => write!(f, "catalog lookup failed: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
