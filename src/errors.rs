use std::fmt;

use zbus::DBusError;

use crate::value::{Value, ValueType};

///
/// Catchall error type for everything between building a request and decoding the server's answer
///
/// Nothing here is retried: re-sending `Notify` can put a second notification on screen.
///
#[derive(Debug)]
pub enum NotifyError {
    /// The bus or the server rejected a call. `name` is the D-Bus error name when there is one.
    Transport { name: Option<String>, message: String },
    /// The server answered with something the protocol does not allow.
    ProtocolViolation { message: String },
    /// A value was read or written with the wrong payload type.
    TypeMismatch { expected: ValueType, found: ValueType },
    /// A struct or array had the wrong number of elements.
    MalformedPayload { message: String },
    Zvariant(zvariant::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

impl NotifyError {
    pub(crate) fn type_mismatch(expected: ValueType, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.value_type(),
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Folds local decode failures into a protocol violation; used on data that came from the server.
    pub(crate) fn from_server(self, context: &str) -> Self {
        match self {
            Self::TypeMismatch { .. } | Self::MalformedPayload { .. } => {
                Self::protocol(format!("{}: {}", context, self))
            }
            other => other,
        }
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { name: Some(name), message } => write!(f, "{}: {}", name, message),
            Self::Transport { name: None, message } => write!(f, "transport error: {}", message),
            Self::ProtocolViolation { message } => write!(f, "protocol violation: {}", message),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::MalformedPayload { message } => write!(f, "malformed payload: {}", message),
            Self::Zvariant(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Zvariant(e) => Some(e),
            _ => None,
        }
    }
}

impl From<zbus::Error> for NotifyError {
    fn from(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, message, _) => Self::Transport {
                name: Some(name.to_string()),
                message: message.unwrap_or_default(),
            },
            zbus::Error::FDO(e) => Self::from(*e),
            zbus::Error::Variant(e) => Self::Zvariant(e),
            _ => Self::Transport {
                name: None,
                message: err.to_string(),
            },
        }
    }
}

impl From<zbus::fdo::Error> for NotifyError {
    fn from(err: zbus::fdo::Error) -> Self {
        Self::Transport {
            name: Some(err.name().to_string()),
            message: err.description().unwrap_or_default().to_string(),
        }
    }
}

impl From<zvariant::Error> for NotifyError {
    fn from(err: zvariant::Error) -> Self {
        Self::Zvariant(err)
    }
}
