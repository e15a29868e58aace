use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    Execution,
    Io,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Internal => "Internal",
            ErrorKind::Usage => "Usage",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Execution => "Execution",
            ErrorKind::Io => "Io",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Usage" => ErrorKind::Usage,
            "NotFound" => ErrorKind::NotFound,
            "Execution" => ErrorKind::Execution,
            "Io" => ErrorKind::Io,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Message used in `"Error: ..."` envelopes; falls back to the kind label.
    pub fn description(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => match &self.source {
                Some(source) => source.to_string(),
                None => self.kind.label().to_string(),
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Execution => 4,
        ErrorKind::Io => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::Execution, 4),
            (ErrorKind::Io, 5),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn labels_parse_back_to_kinds() {
        for kind in [
            ErrorKind::Internal,
            ErrorKind::Usage,
            ErrorKind::NotFound,
            ErrorKind::Execution,
            ErrorKind::Io,
        ] {
            assert_eq!(ErrorKind::from_label(kind.label()), kind);
        }
        assert_eq!(ErrorKind::from_label("Corrupt"), ErrorKind::Internal);
    }

    #[test]
    fn description_prefers_message_then_source() {
        let err = Error::new(ErrorKind::Execution).with_message("store is full");
        assert_eq!(err.description(), "store is full");

        let io = std::io::Error::other("pipe closed");
        let err = Error::new(ErrorKind::Io).with_source(io);
        assert_eq!(err.description(), "pipe closed");

        assert_eq!(Error::new(ErrorKind::Internal).description(), "Internal");
    }
}
