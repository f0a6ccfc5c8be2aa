use std::fmt;

use crate::errors::{NotifyError, Result};
use crate::value::{HintPayload, Value};

pub const NOTIFICATIONS_BUS: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
pub const NOTIFICATIONS_INTERFACE: &str = "org.freedesktop.Notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbusMethod {
    Notify,
    CloseNotification,
    GetCapabilities,
    GetServerInformation,
    Inhibit,
    UnInhibit,
}

impl DbusMethod {
    pub fn member(&self) -> &'static str {
        match self {
            DbusMethod::Notify => "Notify",
            DbusMethod::CloseNotification => "CloseNotification",
            DbusMethod::GetCapabilities => "GetCapabilities",
            DbusMethod::GetServerInformation => "GetServerInformation",
            DbusMethod::Inhibit => "Inhibit",
            DbusMethod::UnInhibit => "UnInhibit",
        }
    }
}

impl fmt::Display for DbusMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.member())
    }
}

/// Reason code carried by `NotificationClosed`.
///
/// Servers disagree on what the numbers mean, so the raw value is kept and never reinterpreted.
/// The constants are the usual convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseReason(pub u32);

impl CloseReason {
    pub const EXPIRED: CloseReason = CloseReason(1);
    pub const DISMISSED: CloseReason = CloseReason(2);
    pub const CLOSED_BY_CALL: CloseReason = CloseReason(3);
    pub const UNDEFINED: CloseReason = CloseReason(4);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbusSignal {
    NotificationClosed { notification_id: u32, reason: CloseReason },
    ActionInvoked { notification_id: u32, action: String },
    ActivationToken { notification_id: u32, token: String },
    /// KDE inline reply; only sent by servers advertising `inline-reply`.
    NotificationReplied { notification_id: u32, message: String },
}

impl DbusSignal {
    pub fn notification_id(&self) -> u32 {
        match self {
            DbusSignal::NotificationClosed { notification_id, .. }
            | DbusSignal::ActionInvoked { notification_id, .. }
            | DbusSignal::ActivationToken { notification_id, .. }
            | DbusSignal::NotificationReplied { notification_id, .. } => *notification_id,
        }
    }

    pub fn member(&self) -> &'static str {
        match self {
            DbusSignal::NotificationClosed { .. } => "NotificationClosed",
            DbusSignal::ActionInvoked { .. } => "ActionInvoked",
            DbusSignal::ActivationToken { .. } => "ActivationToken",
            DbusSignal::NotificationReplied { .. } => "NotificationReplied",
        }
    }

    /// Decodes a signal of the notifications interface.
    ///
    /// Members this crate doesn't know give `Ok(None)`; known members with the wrong payload are
    /// a protocol violation.
    pub fn decode(member: &str, args: Vec<Value>) -> Result<Option<Self>> {
        let decoded = match member {
            "NotificationClosed" => {
                let (notification_id, reason) = pair::<u32>(member, args)?;
                DbusSignal::NotificationClosed {
                    notification_id,
                    reason: CloseReason(reason),
                }
            }
            "ActionInvoked" => {
                let (notification_id, action) = pair::<String>(member, args)?;
                DbusSignal::ActionInvoked { notification_id, action }
            }
            "ActivationToken" => {
                let (notification_id, token) = pair::<String>(member, args)?;
                DbusSignal::ActivationToken { notification_id, token }
            }
            "NotificationReplied" => {
                let (notification_id, message) = pair::<String>(member, args)?;
                DbusSignal::NotificationReplied { notification_id, message }
            }
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    /// Positional payload, the inverse of [`DbusSignal::decode`].
    pub fn to_args(&self) -> Vec<Value> {
        let id = Value::UInt32(self.notification_id());
        let second = match self {
            DbusSignal::NotificationClosed { reason, .. } => Value::UInt32(reason.0),
            DbusSignal::ActionInvoked { action: s, .. }
            | DbusSignal::ActivationToken { token: s, .. }
            | DbusSignal::NotificationReplied { message: s, .. } => Value::Str(s.clone()),
        };
        vec![id, second]
    }
}

/// Every signal of the interface is `(u32, T)`.
fn pair<T: HintPayload>(member: &str, args: Vec<Value>) -> Result<(u32, T)> {
    let decode = || -> Result<(u32, T)> {
        let [id, second]: [Value; 2] = args.try_into().map_err(|args: Vec<Value>| {
            NotifyError::MalformedPayload {
                message: format!("expected 2 arguments, got {}", args.len()),
            }
        })?;
        Ok((u32::from_value(id)?, T::from_value(second)?))
    };
    decode().map_err(|e| e.from_server(member))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_signals() {
        let closed = DbusSignal::decode(
            "NotificationClosed",
            vec![Value::UInt32(7), Value::UInt32(2)],
        )
        .unwrap();
        assert_eq!(
            closed,
            Some(DbusSignal::NotificationClosed {
                notification_id: 7,
                reason: CloseReason::DISMISSED
            })
        );

        let replied = DbusSignal::decode(
            "NotificationReplied",
            vec![Value::UInt32(3), Value::Str("on my way".into())],
        )
        .unwrap()
        .unwrap();
        assert_eq!(replied.notification_id(), 3);
        assert_eq!(replied.member(), "NotificationReplied");
    }

    #[test]
    fn unknown_reason_codes_pass_through() {
        let closed = DbusSignal::decode(
            "NotificationClosed",
            vec![Value::UInt32(1), Value::UInt32(99)],
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            closed,
            DbusSignal::NotificationClosed { notification_id: 1, reason: CloseReason(99) }
        );
    }

    #[test]
    fn unknown_members_are_skipped() {
        assert_eq!(DbusSignal::decode("SomethingElse", vec![]).unwrap(), None);
    }

    #[test]
    fn bad_payloads_are_protocol_violations() {
        let err = DbusSignal::decode("ActionInvoked", vec![Value::UInt32(1)]).unwrap_err();
        assert!(matches!(err, NotifyError::ProtocolViolation { .. }));

        let err = DbusSignal::decode(
            "ActionInvoked",
            vec![Value::UInt32(1), Value::UInt32(2)],
        )
        .unwrap_err();
        assert!(matches!(err, NotifyError::ProtocolViolation { .. }));
    }

    #[test]
    fn payload_round_trip() {
        let signal = DbusSignal::ActivationToken { notification_id: 5, token: "xdg-token".into() };
        let decoded = DbusSignal::decode(signal.member(), signal.to_args()).unwrap();
        assert_eq!(decoded, Some(signal));
    }
}
