use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use zbus::{Connection, ConnectionBuilder, Message, Proxy};
use zvariant::{Array, Dict, StructureBuilder};

use crate::dbus_signal::DbusMethod;
use crate::errors::{NotifyError, Result};
use crate::settings::{BusKind, Settings};
use crate::value::Value;

/// A signal as the bus delivered it: member name plus positional payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignal {
    pub member: String,
    pub args: Vec<Value>,
}

pub type SignalSink = Arc<dyn Fn(RawSignal) + Send + Sync>;

/// The RPC channel to a notification server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one method call and returns the reply's positional values.
    async fn call(&self, method: DbusMethod, args: Vec<Value>) -> Result<Vec<Value>>;

    /// Starts delivering the interface's signals to `sink`, in bus order.
    async fn subscribe(&self, sink: SignalSink) -> Result<()>;
}

/// [`Transport`] over a zbus connection.
#[derive(Debug, Clone)]
pub struct ZbusTransport {
    connection: Connection,
    destination: String,
    path: String,
    interface: String,
}

impl ZbusTransport {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let connection = match &settings.bus {
            BusKind::Session => Connection::session().await?,
            BusKind::System => Connection::system().await?,
            BusKind::Address(address) => ConnectionBuilder::address(address.as_str())?.build().await?,
        };
        info!(bus = ?settings.bus, destination = %settings.destination, "connected to D-Bus");
        Ok(Self::with_connection(connection, settings))
    }

    pub fn with_connection(connection: Connection, settings: &Settings) -> Self {
        Self {
            connection,
            destination: settings.destination.clone(),
            path: settings.path.clone(),
            interface: settings.interface.clone(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

#[async_trait]
impl Transport for ZbusTransport {
    async fn call(&self, method: DbusMethod, args: Vec<Value>) -> Result<Vec<Value>> {
        debug!(%method, args = args.len(), "calling notification server");

        let destination = Some(self.destination.as_str());
        let interface = Some(self.interface.as_str());
        let reply = if args.is_empty() {
            self.connection
                .call_method(destination, self.path.as_str(), interface, method.member(), &())
                .await?
        } else {
            let body = args
                .iter()
                .fold(StructureBuilder::new(), |builder, arg| builder.append_field(to_zvariant(arg)))
                .build();
            self.connection
                .call_method(destination, self.path.as_str(), interface, method.member(), &body)
                .await?
        };

        body_values(&reply)
    }

    async fn subscribe(&self, sink: SignalSink) -> Result<()> {
        let proxy = Proxy::new(
            &self.connection,
            self.destination.clone(),
            self.path.clone(),
            self.interface.clone(),
        )
        .await?;
        let mut signals = proxy.receive_all_signals().await?;

        tokio::spawn(async move {
            while let Some(message) = signals.next().await {
                let Some(member) = message.member() else {
                    continue;
                };
                match body_values(&message) {
                    Ok(args) => sink(RawSignal { member: member.to_string(), args }),
                    Err(err) => warn!(%member, %err, "dropping undecodable signal"),
                }
            }
            drop(proxy);
            debug!("notification signal stream ended");
        });

        Ok(())
    }
}

fn body_values(message: &Message) -> Result<Vec<Value>> {
    match message.body_signature() {
        Ok(signature) if signature.as_str().is_empty() => return Ok(Vec::new()),
        Err(zbus::Error::NoBodySignature) => return Ok(Vec::new()),
        Ok(_) => {}
        Err(err) => return Err(err.into()),
    }

    let body: zvariant::Structure<'_> = message.body()?;
    body.fields().iter().map(from_zvariant).collect()
}

fn to_zvariant(value: &Value) -> zvariant::Value<'static> {
    match value {
        Value::Bool(v) => zvariant::Value::Bool(*v),
        Value::Byte(v) => zvariant::Value::U8(*v),
        Value::Int32(v) => zvariant::Value::I32(*v),
        Value::UInt32(v) => zvariant::Value::U32(*v),
        Value::Int64(v) => zvariant::Value::I64(*v),
        Value::UInt64(v) => zvariant::Value::U64(*v),
        Value::Str(v) => zvariant::Value::from(v.clone()),
        Value::StrArray(v) => zvariant::Value::Array(Array::from(v.clone())),
        Value::Bytes(v) => zvariant::Value::Array(Array::from(v.clone())),
        Value::Struct(fields) => zvariant::Value::Structure(
            fields
                .iter()
                .fold(StructureBuilder::new(), |builder, field| builder.append_field(to_zvariant(field)))
                .build(),
        ),
        Value::Dict(entries) => {
            let entries: HashMap<String, zvariant::Value<'static>> = entries
                .iter()
                .map(|(key, value)| (key.clone(), to_zvariant(value)))
                .collect();
            zvariant::Value::Dict(Dict::from(entries))
        }
    }
}

fn from_zvariant(value: &zvariant::Value<'_>) -> Result<Value> {
    Ok(match value {
        zvariant::Value::Bool(v) => Value::Bool(*v),
        zvariant::Value::U8(v) => Value::Byte(*v),
        zvariant::Value::I32(v) => Value::Int32(*v),
        zvariant::Value::U32(v) => Value::UInt32(*v),
        zvariant::Value::I64(v) => Value::Int64(*v),
        zvariant::Value::U64(v) => Value::UInt64(*v),
        zvariant::Value::Str(v) => Value::Str(v.as_str().to_owned()),
        zvariant::Value::Value(inner) => from_zvariant(inner)?,
        zvariant::Value::Structure(s) => {
            Value::Struct(s.fields().iter().map(from_zvariant).collect::<Result<_>>()?)
        }
        zvariant::Value::Array(array) => match array.element_signature().as_str() {
            "s" => Value::StrArray(
                array
                    .get()
                    .iter()
                    .map(|item| match item {
                        zvariant::Value::Str(s) => Ok(s.as_str().to_owned()),
                        other => Err(unsupported(other)),
                    })
                    .collect::<Result<_>>()?,
            ),
            "y" => Value::Bytes(
                array
                    .get()
                    .iter()
                    .map(|item| match item {
                        zvariant::Value::U8(b) => Ok(*b),
                        other => Err(unsupported(other)),
                    })
                    .collect::<Result<_>>()?,
            ),
            _ => return Err(unsupported(value)),
        },
        other => return Err(unsupported(other)),
    })
}

fn unsupported(value: &zvariant::Value<'_>) -> NotifyError {
    NotifyError::protocol(format!("unsupported wire type {}", value.value_signature()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::{Hints, Urgency, URGENCY};
    use crate::notification::ImageData;
    use crate::value::HintPayload;

    #[test]
    fn values_survive_the_zvariant_mapping() {
        let values = vec![
            Value::Bool(true),
            Value::Byte(2),
            Value::Int32(-5),
            Value::UInt32(5),
            Value::Int64(-1 << 40),
            Value::UInt64(1 << 40),
            Value::Str("hello".into()),
            Value::StrArray(vec!["ok".into(), "OK".into()]),
            ImageData::new(1, 1, 3, false, 8, 3, vec![1, 2, 3]).into_value(),
        ];
        for value in values {
            assert_eq!(from_zvariant(&to_zvariant(&value)).unwrap(), value);
        }
    }

    #[test]
    fn hints_become_a_string_variant_dict() {
        let hints = Hints::new().with(&URGENCY, Urgency::Critical);
        let value = to_zvariant(&hints.into_value());
        assert_eq!(value.value_signature().as_str(), "a{sv}");
    }

    #[test]
    fn unsupported_types_are_protocol_violations() {
        let value = zvariant::Value::F64(1.5);
        assert!(matches!(from_zvariant(&value), Err(NotifyError::ProtocolViolation { .. })));
    }
}
