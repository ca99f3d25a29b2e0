use std::fmt;

#[derive(Debug)]
pub enum RecordError {
    /// Malformed XML (tokenizer / well-formedness error).
    Xml(String),
    /// A required attribute is missing from an interchange element.
    MissingAttribute { element: String, attribute: String },
    /// An element appeared somewhere the interchange format doesn't allow.
    UnexpectedElement { element: String, context: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(msg) => write!(f, "XML parse error: {msg}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "element <{element}> is missing attribute '{attribute}'")
            }
            Self::UnexpectedElement { element, context } => {
                write!(f, "unexpected element <{element}> in {context}")
            }
        }
    }
}

impl std::error::Error for RecordError {}
