use std::env;

use crate::dbus_signal::{NOTIFICATIONS_BUS, NOTIFICATIONS_INTERFACE, NOTIFICATIONS_PATH};

pub const BUS_VAR: &str = "NOTIFY_BUS";
pub const DESTINATION_VAR: &str = "NOTIFY_DESTINATION";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BusKind {
    #[default]
    Session,
    System,
    /// A D-Bus address such as `unix:path=/run/user/1000/bus`.
    Address(String),
}

impl BusKind {
    fn parse(value: &str) -> BusKind {
        match value.trim() {
            "" | "session" => BusKind::Session,
            "system" => BusKind::System,
            address => BusKind::Address(address.to_owned()),
        }
    }
}

/// Where to find the notification server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bus: BusKind,
    pub destination: String,
    pub path: String,
    pub interface: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus: BusKind::Session,
            destination: NOTIFICATIONS_BUS.to_owned(),
            path: NOTIFICATIONS_PATH.to_owned(),
            interface: NOTIFICATIONS_INTERFACE.to_owned(),
        }
    }
}

impl Settings {
    /// Defaults, overridden by `NOTIFY_BUS` (`session`, `system` or an address) and `NOTIFY_DESTINATION`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();
        if let Some(bus) = lookup(BUS_VAR) {
            settings.bus = BusKind::parse(&bus);
        }
        if let Some(destination) = lookup(DESTINATION_VAR).filter(|d| !d.is_empty()) {
            settings.destination = destination;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_session_service() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.destination, "org.freedesktop.Notifications");
    }

    #[test]
    fn environment_overrides() {
        let settings = Settings::from_lookup(|name| match name {
            BUS_VAR => Some("unix:path=/tmp/bus".to_owned()),
            DESTINATION_VAR => Some("org.example.Notifier".to_owned()),
            _ => None,
        });
        assert_eq!(settings.bus, BusKind::Address("unix:path=/tmp/bus".to_owned()));
        assert_eq!(settings.destination, "org.example.Notifier");

        let settings = Settings::from_lookup(|name| (name == BUS_VAR).then(|| "system".to_owned()));
        assert_eq!(settings.bus, BusKind::System);
    }
}
