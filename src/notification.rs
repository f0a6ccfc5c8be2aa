use crate::errors::{NotifyError, Result};
use crate::hints::{HintKey, Hints};
use crate::value::{HintPayload, Value, ValueType};

/// Raw pixel data for the `image-data` hint, sent as `(iiibiiay)`.
///
/// Nothing checks that `rowstride`, `width` and `channels` agree; the server gets what it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: i32,
    pub height: i32,
    pub rowstride: i32,
    pub has_alpha: bool,
    pub bits_per_sample: i32,
    pub channels: i32,
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn new(
        width: i32,
        height: i32,
        rowstride: i32,
        has_alpha: bool,
        bits_per_sample: i32,
        channels: i32,
        data: Vec<u8>) -> ImageData {
        ImageData {
            width,
            height,
            rowstride,
            has_alpha,
            bits_per_sample,
            channels,
            data,
        }
    }
}

impl HintPayload for ImageData {
    const TYPE: ValueType = ValueType::Struct;

    fn into_value(self) -> Value {
        Value::Struct(vec![
            Value::Int32(self.width),
            Value::Int32(self.height),
            Value::Int32(self.rowstride),
            Value::Bool(self.has_alpha),
            Value::Int32(self.bits_per_sample),
            Value::Int32(self.channels),
            Value::Bytes(self.data),
        ])
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut fields = value.into_fields(7)?.into_iter();
        let mut next = || fields.next().ok_or_else(|| NotifyError::MalformedPayload {
            message: "image-data ended early".to_owned(),
        });

        Ok(ImageData {
            width: i32::from_value(next()?)?,
            height: i32::from_value(next()?)?,
            rowstride: i32::from_value(next()?)?,
            has_alpha: bool::from_value(next()?)?,
            bits_per_sample: i32::from_value(next()?)?,
            channels: i32::from_value(next()?)?,
            data: Vec::<u8>::from_value(next()?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub identifier: String,
    pub text: String,
}

impl Action {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
        }
    }
}

/// Ordered action list. Many servers treat the first entry as the default action, so order matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    actions: Vec<Action>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, identifier: impl Into<String>, text: impl Into<String>) {
        self.actions.push(Action::new(identifier, text));
    }

    pub fn with(mut self, identifier: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(identifier, text);
        self
    }

    pub fn find(&self, identifier: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.identifier == identifier)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Interleaves identifiers and texts: `[id0, text0, id1, text1, ...]`.
    pub fn flatten(&self) -> Vec<String> {
        self.actions
            .iter()
            .flat_map(|a| [a.identifier.clone(), a.text.clone()])
            .collect()
    }

    pub fn unflatten(flat: &[String]) -> Result<Self> {
        if flat.len() % 2 != 0 {
            return Err(NotifyError::MalformedPayload {
                message: format!("action array has odd length {}", flat.len()),
            });
        }

        Ok(flat
            .chunks_exact(2)
            .map(|pair| Action::new(pair[0].clone(), pair[1].clone()))
            .collect())
    }
}

impl FromIterator<Action> for Actions {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl<I: Into<String>, T: Into<String>> FromIterator<(I, T)> for Actions {
    fn from_iter<It: IntoIterator<Item = (I, T)>>(iter: It) -> Self {
        iter.into_iter().map(|(i, t)| Action::new(i, t)).collect()
    }
}

impl<'a> IntoIterator for &'a Actions {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

/// Expiration timeout as understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Let the server decide.
    #[default]
    Default,
    Never,
    Milliseconds(u32),
}

impl Timeout {
    pub fn as_millis(&self) -> i32 {
        match self {
            Timeout::Default => -1,
            Timeout::Never => 0,
            Timeout::Milliseconds(ms) => i32::try_from(*ms).unwrap_or(i32::MAX),
        }
    }
}

impl From<i32> for Timeout {
    fn from(ms: i32) -> Self {
        match ms {
            ms if ms < 0 => Timeout::Default,
            0 => Timeout::Never,
            ms => Timeout::Milliseconds(ms as u32),
        }
    }
}

/// One `Notify` request.
#[derive(Debug, Clone, Default)]
pub struct Notification {
    pub app_name: String,
    pub replaces_id: u32,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Actions,
    pub hints: Hints,
    pub expire_timeout: Timeout,
}

impl Notification {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Updates the notification `id` in place instead of creating a new one.
    pub fn replaces_id(mut self, id: u32) -> Self {
        self.replaces_id = id;
        self
    }

    pub fn app_icon(mut self, app_icon: impl Into<String>) -> Self {
        self.app_icon = app_icon.into();
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn action(mut self, identifier: impl Into<String>, text: impl Into<String>) -> Self {
        self.actions.push(identifier, text);
        self
    }

    pub fn actions(mut self, actions: Actions) -> Self {
        self.actions = actions;
        self
    }

    pub fn hint<T: HintPayload>(mut self, key: &HintKey<T>, value: T) -> Self {
        self.hints.set(key, value);
        self
    }

    /// Merges `hints` over whatever was already set.
    pub fn hints(mut self, hints: &Hints) -> Self {
        self.hints.merge(hints);
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.expire_timeout = timeout.into();
        self
    }

    /// Positional `Notify` arguments: `susssasa{sv}i`.
    pub(crate) fn to_args(&self) -> Vec<Value> {
        vec![
            Value::Str(self.app_name.clone()),
            Value::UInt32(self.replaces_id),
            Value::Str(self.app_icon.clone()),
            Value::Str(self.summary.clone()),
            Value::Str(self.body.clone()),
            Value::StrArray(self.actions.flatten()),
            self.hints.clone().into_value(),
            Value::Int32(self.expire_timeout.as_millis()),
        ]
    }
}
