use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::errors::{NotifyError, Result};
use crate::notification::ImageData;
use crate::value::{HintPayload, Value, ValueType};

/// Protocol version a hint first appeared in.
///
/// Vendor hints are not part of any published version and sort after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    Spec { major: u16, minor: u16 },
    Vendor,
}

impl Version {
    pub const V1_0: Version = Version::Spec { major: 1, minor: 0 };
    pub const V1_2: Version = Version::Spec { major: 1, minor: 2 };

    /// Whether something introduced in `self` can be used against a server speaking `server`.
    ///
    /// Vendor entries are always allowed; the matching capability is what gates them.
    pub fn available_in(&self, server: Version) -> bool {
        match self {
            Version::Vendor => true,
            spec => *spec <= server,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Spec { major, minor } => write!(f, "{}.{}", major, minor),
            Version::Vendor => f.write_str("vendor"),
        }
    }
}

impl FromStr for Version {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NotifyError::protocol(format!("invalid spec version {:?}", s));
        let (major, minor) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        Ok(Version::Spec {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Low = 0,
    Normal = 1,
    Critical = 2,
}

impl HintPayload for Urgency {
    const TYPE: ValueType = ValueType::Byte;

    fn into_value(self) -> Value {
        Value::Byte(self as u8)
    }

    fn from_value(value: Value) -> Result<Self> {
        match u8::from_value(value)? {
            0 => Ok(Urgency::Low),
            1 => Ok(Urgency::Normal),
            2 => Ok(Urgency::Critical),
            other => Err(NotifyError::protocol(format!("unknown urgency level {}", other))),
        }
    }
}

/// Typed accessor for one hint.
///
/// The payload type is fixed at compile time, so `hints.set(&URGENCY, "high")` does not build.
pub struct HintKey<T> {
    name: &'static str,
    version: Version,
    payload: PhantomData<fn() -> T>,
}

impl<T: HintPayload> HintKey<T> {
    pub const fn new(name: &'static str, version: Version) -> Self {
        Self {
            name,
            version,
            payload: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn payload_type(&self) -> ValueType {
        T::TYPE
    }

    pub fn info(&self) -> HintInfo {
        HintInfo {
            name: self.name,
            payload_type: T::TYPE,
            version: self.version,
        }
    }
}

impl<T> fmt::Debug for HintKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintKey")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish()
    }
}

/// Untyped registry entry for a known hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintInfo {
    pub name: &'static str,
    pub payload_type: ValueType,
    pub version: Version,
}

pub const ACTION_ICONS: HintKey<bool> = HintKey::new("action-icons", Version::V1_2);
pub const CATEGORY: HintKey<String> = HintKey::new("category", Version::V1_0);
pub const DESKTOP_ENTRY: HintKey<String> = HintKey::new("desktop-entry", Version::V1_0);
pub const IMAGE_DATA: HintKey<ImageData> = HintKey::new("image-data", Version::V1_2);
pub const IMAGE_PATH: HintKey<String> = HintKey::new("image-path", Version::V1_2);
pub const RESIDENT: HintKey<bool> = HintKey::new("resident", Version::V1_2);
pub const SOUND_FILE: HintKey<String> = HintKey::new("sound-file", Version::V1_0);
pub const SOUND_NAME: HintKey<String> = HintKey::new("sound-name", Version::V1_0);
pub const SUPPRESS_SOUND: HintKey<bool> = HintKey::new("suppress-sound", Version::V1_0);
pub const TRANSIENT: HintKey<bool> = HintKey::new("transient", Version::V1_2);
pub const X: HintKey<i32> = HintKey::new("x", Version::V1_0);
pub const Y: HintKey<i32> = HintKey::new("y", Version::V1_0);
pub const URGENCY: HintKey<Urgency> = HintKey::new("urgency", Version::V1_0);
pub const X_KDE_URLS: HintKey<Vec<String>> = HintKey::new("x-kde-urls", Version::Vendor);
pub const X_KDE_ORIGIN_NAME: HintKey<String> = HintKey::new("x-kde-origin-name", Version::Vendor);
pub const X_KDE_DISPLAY_APPNAME: HintKey<String> =
    HintKey::new("x-kde-display-appname", Version::Vendor);

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, HintInfo> = [
        ACTION_ICONS.info(),
        CATEGORY.info(),
        DESKTOP_ENTRY.info(),
        IMAGE_DATA.info(),
        IMAGE_PATH.info(),
        RESIDENT.info(),
        SOUND_FILE.info(),
        SOUND_NAME.info(),
        SUPPRESS_SOUND.info(),
        TRANSIENT.info(),
        X.info(),
        Y.info(),
        URGENCY.info(),
        X_KDE_URLS.info(),
        X_KDE_ORIGIN_NAME.info(),
        X_KDE_DISPLAY_APPNAME.info(),
    ]
    .into_iter()
    .map(|info| (info.name, info))
    .collect();
}

/// Looks up a known hint by wire name.
pub fn lookup(name: &str) -> Option<&'static HintInfo> {
    REGISTRY.get(name)
}

/// All known hints, in no particular order.
pub fn registry() -> impl Iterator<Item = &'static HintInfo> {
    REGISTRY.values()
}

/// The `a{sv}` hint dictionary sent with `Notify` and `Inhibit`.
///
/// Keys the registry doesn't know are kept as-is, so a dictionary read from somewhere else can
/// be merged and forwarded without losing anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hints {
    entries: HashMap<String, Value>,
}

impl Hints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: HintPayload>(&mut self, key: &HintKey<T>, value: T) {
        self.entries.insert(key.name.to_owned(), value.into_value());
    }

    pub fn with<T: HintPayload>(mut self, key: &HintKey<T>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Returns `Ok(None)` when the hint is absent and an error when it is stored with another type.
    pub fn get<T: HintPayload>(&self, key: &HintKey<T>) -> Result<Option<T>> {
        self.entries
            .get(key.name)
            .cloned()
            .map(T::from_value)
            .transpose()
    }

    pub fn insert_raw(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Copies every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Hints) {
        self.entries
            .extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn raw_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keys with no registry entry, typically vendor extensions this crate doesn't model.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.raw_keys().filter(|name| lookup(name).is_none())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HintPayload for Hints {
    const TYPE: ValueType = ValueType::Dict;

    fn into_value(self) -> Value {
        Value::Dict(self.entries)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Dict(entries) => Ok(Hints { entries }),
            other => Err(NotifyError::protocol(format!(
                "hints must be a dict, got {}",
                other.value_type()
            ))),
        }
    }
}
