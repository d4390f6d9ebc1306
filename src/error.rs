use thiserror::Error;

use crate::value::Kind;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error(
        "{kind} not supported. Convert it to and from one of: {}",
        .supported.join(", ")
    )]
    UnsupportedKind {
        kind: String,
        supported: &'static [&'static str],
    },

    #[error("{name}: Cannot parse {raw:?} as {kind}")]
    Parse {
        name: String,
        kind: Kind,
        raw: String,
    },

    #[error("Name not registered: {0}")]
    NameNotFound(String),

    #[error("Cannot register a {found} value as {expected}")]
    KindMismatch { expected: Kind, found: Kind },

    #[error("Server already started")]
    AlreadyStarted,

    #[error("Server has been stopped and cannot be restarted")]
    Stopped,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ControlError {
    /// Build the error raised for a kind outside the closed set.
    pub fn unsupported(kind: impl Into<String>) -> Self {
        ControlError::UnsupportedKind {
            kind: kind.into(),
            supported: Kind::SUPPORTED,
        }
    }

    pub fn to_error_code(&self) -> &'static str {
        match self {
            ControlError::UnsupportedKind { .. } => "UNSUPPORTED_KIND",
            ControlError::Parse { .. } => "PARSE_ERROR",
            ControlError::NameNotFound(_) => "NAME_NOT_FOUND",
            ControlError::KindMismatch { .. } => "KIND_MISMATCH",
            ControlError::AlreadyStarted => "ALREADY_STARTED",
            ControlError::Stopped => "STOPPED",
            ControlError::Bind { .. } => "BIND_FAILED",
            ControlError::Discovery(_) => "DISCOVERY_ERROR",
            ControlError::InvalidConfig(_) => "INVALID_CONFIG",
            _ => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_kind_lists_supported_kinds() {
        let err = ControlError::unsupported("complex");
        let message = err.to_string();

        assert!(message.starts_with("complex not supported"));
        for name in Kind::SUPPORTED {
            assert!(message.contains(name), "missing {} in {}", name, message);
        }
        assert_eq!(err.to_error_code(), "UNSUPPORTED_KIND");
    }

    #[test]
    fn test_parse_error_message_quotes_raw_text() {
        let err = ControlError::Parse {
            name: "count".to_string(),
            kind: Kind::Int,
            raw: "forty-two".to_string(),
        };
        assert_eq!(err.to_string(), "count: Cannot parse \"forty-two\" as int");
    }

    #[test]
    fn test_name_not_found_code() {
        let err = ControlError::NameNotFound("speed".to_string());
        assert_eq!(err.to_error_code(), "NAME_NOT_FOUND");
        assert!(err.to_string().contains("speed"));
    }

    #[test]
    fn test_io_error_maps_to_internal_code() {
        let err: ControlError =
            std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.to_error_code(), "INTERNAL_ERROR");
    }
}
