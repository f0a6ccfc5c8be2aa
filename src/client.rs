use std::sync::Arc;

use tracing::{debug, warn};

use crate::capabilities::Capabilities;
use crate::correlator::SignalCorrelator;
use crate::dbus_signal::{DbusMethod, DbusSignal};
use crate::errors::{NotifyError, Result};
use crate::hints::{Hints, Version};
use crate::notification::Notification;
use crate::settings::Settings;
use crate::transport::{RawSignal, Transport, ZbusTransport};
use crate::value::{HintPayload, Value};

/// Reply of `GetServerInformation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInformation {
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub spec_version: String,
}

impl ServerInformation {
    /// The protocol version the server implements, if it reports one that parses.
    pub fn spec_version(&self) -> Option<Version> {
        self.spec_version.parse().ok()
    }
}

/// Client side of `org.freedesktop.Notifications`.
///
/// Every method is exactly one call on the transport. Nothing is retried: a repeated `Notify`
/// shows a second notification unless `replaces_id` is set.
#[derive(Debug)]
pub struct Notifications<T> {
    transport: T,
    correlator: SignalCorrelator,
}

impl Notifications<ZbusTransport> {
    /// Connects as described by `settings` and starts routing signals into [`Self::correlator`].
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let client = Self::new(ZbusTransport::connect(settings).await?);
        client.listen().await?;
        Ok(client)
    }
}

impl<T: Transport> Notifications<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            correlator: SignalCorrelator::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn correlator(&self) -> &SignalCorrelator {
        &self.correlator
    }

    /// Subscribes the correlator to the transport's signals.
    pub async fn listen(&self) -> Result<()> {
        let correlator = self.correlator.clone();
        let sink = Arc::new(move |raw: RawSignal| {
            match DbusSignal::decode(&raw.member, raw.args) {
                Ok(Some(signal)) => {
                    correlator.dispatch(&signal);
                }
                Ok(None) => debug!(member = %raw.member, "ignoring unknown signal"),
                Err(err) => warn!(member = %raw.member, %err, "dropping malformed signal"),
            }
        });
        self.transport.subscribe(sink).await
    }

    /// Sends `Notify` and returns the id the server assigned.
    pub async fn open(&self, notification: &Notification) -> Result<u32> {
        let reply = self
            .transport
            .call(DbusMethod::Notify, notification.to_args())
            .await?;
        let id = single::<u32>(DbusMethod::Notify, reply)?;
        debug!(id, summary = %notification.summary, "notification opened");
        Ok(id)
    }

    pub async fn close(&self, id: u32) -> Result<()> {
        let reply = self
            .transport
            .call(DbusMethod::CloseNotification, vec![Value::UInt32(id)])
            .await?;
        empty(DbusMethod::CloseNotification, reply)
    }

    pub async fn capabilities(&self) -> Result<Capabilities> {
        let reply = self.transport.call(DbusMethod::GetCapabilities, Vec::new()).await?;
        let tokens = single::<Vec<String>>(DbusMethod::GetCapabilities, reply)?;
        Ok(tokens.into_iter().collect())
    }

    pub async fn server_information(&self) -> Result<ServerInformation> {
        let method = DbusMethod::GetServerInformation;
        let reply = self.transport.call(method, Vec::new()).await?;
        let [name, vendor, version, spec_version]: [Value; 4] =
            reply.try_into().map_err(|reply: Vec<Value>| {
                NotifyError::protocol(format!("{} returned {} values, expected 4", method, reply.len()))
            })?;
        let string = |value| String::from_value(value).map_err(|e| e.from_server(method.member()));

        Ok(ServerInformation {
            name: string(name)?,
            vendor: string(vendor)?,
            version: string(version)?,
            spec_version: string(spec_version)?,
        })
    }

    /// Asks the server to hold back notifications. Keep the cookie for [`Self::release`].
    pub async fn inhibit(&self, desktop_entry: &str, reason: &str, hints: &Hints) -> Result<u32> {
        let args = vec![
            Value::Str(desktop_entry.to_owned()),
            Value::Str(reason.to_owned()),
            hints.clone().into_value(),
        ];
        let reply = self.transport.call(DbusMethod::Inhibit, args).await?;
        single::<u32>(DbusMethod::Inhibit, reply)
    }

    pub async fn release(&self, cookie: u32) -> Result<()> {
        let reply = self
            .transport
            .call(DbusMethod::UnInhibit, vec![Value::UInt32(cookie)])
            .await?;
        empty(DbusMethod::UnInhibit, reply)
    }
}

fn single<R: HintPayload>(method: DbusMethod, reply: Vec<Value>) -> Result<R> {
    let [value]: [Value; 1] = reply.try_into().map_err(|reply: Vec<Value>| {
        NotifyError::protocol(format!("{} returned {} values, expected 1", method, reply.len()))
    })?;
    R::from_value(value).map_err(|e| e.from_server(method.member()))
}

fn empty(method: DbusMethod, reply: Vec<Value>) -> Result<()> {
    if reply.is_empty() {
        Ok(())
    } else {
        Err(NotifyError::protocol(format!(
            "{} returned {} values, expected none",
            method,
            reply.len()
        )))
    }
}
