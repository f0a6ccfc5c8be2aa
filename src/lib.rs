//! Typed client for the freedesktop.org desktop notifications interface.
//!
//! Build a [`Notification`] with typed hints and ordered actions, send it with
//! [`Notifications::open`], then follow what happens to it through the [`SignalCorrelator`].
//!
//! ```no_run
//! use fdo_notify::{hints, Notification, Notifications, Settings, Timeout};
//!
//! # async fn run() -> fdo_notify::Result<()> {
//! let client = Notifications::connect(&Settings::default()).await?;
//! let caps = client.capabilities().await?;
//!
//! let mut notification = Notification::new("Backup finished")
//!     .app_name("backup")
//!     .body("42 files copied")
//!     .hint(&hints::URGENCY, hints::Urgency::Low)
//!     .timeout(Timeout::Milliseconds(5000));
//! if caps.contains(fdo_notify::capabilities::ACTIONS) {
//!     notification = notification.action("default", "Open folder");
//! }
//!
//! let id = client.open(&notification).await?;
//! let mut signals = client.correlator().register_channel(id);
//! while let Some(signal) = signals.recv().await {
//!     println!("{:?}", signal);
//! }
//! # Ok(())
//! # }
//! ```

pub mod capabilities;
pub mod client;
pub mod correlator;
pub mod dbus_signal;
pub mod errors;
pub mod hints;
pub mod notification;
pub mod settings;
pub mod transport;
pub mod value;

pub use capabilities::Capabilities;
pub use client::{Notifications, ServerInformation};
pub use correlator::{NotificationState, SignalCorrelator};
pub use dbus_signal::{CloseReason, DbusMethod, DbusSignal};
pub use errors::{NotifyError, Result};
pub use hints::{HintKey, Hints, Urgency, Version};
pub use notification::{Action, Actions, ImageData, Notification, Timeout};
pub use settings::{BusKind, Settings};
pub use transport::{RawSignal, SignalSink, Transport, ZbusTransport};
pub use value::{HintPayload, Value, ValueType};
