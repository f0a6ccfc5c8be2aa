use std::collections::HashSet;

use tracing::warn;

pub const ACTION_ICONS: &str = "action-icons";
pub const ACTIONS: &str = "actions";
pub const BODY: &str = "body";
pub const BODY_HYPERLINKS: &str = "body-hyperlinks";
pub const BODY_IMAGES: &str = "body-images";
pub const BODY_MARKUP: &str = "body-markup";
/// Mutually exclusive with [`ICON_STATIC`].
pub const ICON_MULTI: &str = "icon-multi";
pub const ICON_STATIC: &str = "icon-static";
pub const PERSISTENCE: &str = "persistence";
/// Servers advertising this must honour the `sound-file` and `suppress-sound` hints.
pub const SOUND: &str = "sound";
pub const X_KDE_URLS: &str = "x-kde-urls";
pub const X_KDE_ORIGIN_NAME: &str = "x-kde-origin-name";
pub const X_KDE_DISPLAY_APPNAME: &str = "x-kde-display-appname";
/// An action with this identifier gets an input field; replies arrive as `NotificationReplied`.
pub const INLINE_REPLY: &str = "inline-reply";

/// What a server said it supports in `GetCapabilities`.
///
/// Servers may change this at runtime, so don't keep one around longer than the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    tokens: HashSet<String>,
}

impl Capabilities {
    pub fn contains(&self, token: &str) -> bool {
        match token {
            ICON_MULTI => self.icon_multi(),
            _ => self.tokens.contains(token),
        }
    }

    /// Advertising both icon modes is a protocol error; treat such a server as static-only.
    pub fn icon_multi(&self) -> bool {
        self.tokens.contains(ICON_MULTI) && !self.tokens.contains(ICON_STATIC)
    }

    pub fn icon_static(&self) -> bool {
        self.tokens.contains(ICON_STATIC)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let tokens: HashSet<String> = iter.into_iter().map(Into::into).collect();
        if tokens.contains(ICON_MULTI) && tokens.contains(ICON_STATIC) {
            warn!("server advertises both icon-multi and icon-static, treating it as icon-static");
        }
        Capabilities { tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let caps: Capabilities = ["body", "actions", "persistence"].into_iter().collect();
        assert!(caps.contains(BODY));
        assert!(caps.contains(ACTIONS));
        assert!(!caps.contains(SOUND));
    }

    #[test]
    fn duplicates_collapse() {
        let caps: Capabilities = ["body", "body", "sound"].into_iter().collect();
        assert_eq!(caps.len(), 2);
    }

    #[test]
    fn conflicting_icon_modes_resolve_to_static() {
        let caps: Capabilities = [ICON_MULTI, ICON_STATIC].into_iter().collect();
        assert!(caps.icon_static());
        assert!(!caps.icon_multi());
        assert!(!caps.contains(ICON_MULTI));

        let caps: Capabilities = [ICON_MULTI].into_iter().collect();
        assert!(caps.contains(ICON_MULTI));
    }
}
