use std::collections::HashMap;
use std::fmt;

use crate::errors::{NotifyError, Result};

/// Type tag of a [`Value`], used to check a stored value against the type a hint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Byte,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Str,
    StrArray,
    Bytes,
    Struct,
    Dict,
}

impl ValueType {
    /// D-Bus signature of the tag. Structs have no fixed signature and report the bare delimiters.
    pub fn signature(&self) -> &'static str {
        match self {
            ValueType::Bool => "b",
            ValueType::Byte => "y",
            ValueType::Int32 => "i",
            ValueType::UInt32 => "u",
            ValueType::Int64 => "x",
            ValueType::UInt64 => "t",
            ValueType::Str => "s",
            ValueType::StrArray => "as",
            ValueType::Bytes => "ay",
            ValueType::Struct => "()",
            ValueType::Dict => "a{sv}",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Byte => "byte",
            ValueType::Int32 => "int32",
            ValueType::UInt32 => "uint32",
            ValueType::Int64 => "int64",
            ValueType::UInt64 => "uint64",
            ValueType::Str => "string",
            ValueType::StrArray => "string array",
            ValueType::Bytes => "byte array",
            ValueType::Struct => "struct",
            ValueType::Dict => "dict",
        };
        write!(f, "{} ({})", name, self.signature())
    }
}

/// A single wire value of the notifications interface.
///
/// This only covers the shapes the interface actually uses; it is not a general D-Bus value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Str(String),
    StrArray(Vec<String>),
    Bytes(Vec<u8>),
    Struct(Vec<Value>),
    Dict(HashMap<String, Value>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Int32(_) => ValueType::Int32,
            Value::UInt32(_) => ValueType::UInt32,
            Value::Int64(_) => ValueType::Int64,
            Value::UInt64(_) => ValueType::UInt64,
            Value::Str(_) => ValueType::Str,
            Value::StrArray(_) => ValueType::StrArray,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Struct(_) => ValueType::Struct,
            Value::Dict(_) => ValueType::Dict,
        }
    }

    /// Unpacks a struct that must have exactly `arity` fields.
    pub fn into_fields(self, arity: usize) -> Result<Vec<Value>> {
        match self {
            Value::Struct(fields) if fields.len() == arity => Ok(fields),
            Value::Struct(fields) => Err(NotifyError::MalformedPayload {
                message: format!("expected a struct of {} fields, got {}", arity, fields.len()),
            }),
            other => Err(NotifyError::type_mismatch(ValueType::Struct, &other)),
        }
    }
}

/// A Rust type with a fixed wire representation.
///
/// Every hint payload goes through this trait, so a [`crate::hints::HintKey`] can only ever be
/// paired with the one type its wire name expects.
pub trait HintPayload: Sized {
    const TYPE: ValueType;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! payload {
    ($ty:ty => $variant:ident) => {
        impl HintPayload for $ty {
            const TYPE: ValueType = ValueType::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(NotifyError::type_mismatch(ValueType::$variant, &other)),
                }
            }
        }
    };
}

payload!(bool => Bool);
payload!(u8 => Byte);
payload!(i32 => Int32);
payload!(u32 => UInt32);
payload!(i64 => Int64);
payload!(u64 => UInt64);
payload!(String => Str);
payload!(Vec<String> => StrArray);
payload!(Vec<u8> => Bytes);
payload!(HashMap<String, Value> => Dict);

/// Encodes `value`, failing if its wire type is not `expected`.
pub fn encode<T: HintPayload>(value: T, expected: ValueType) -> Result<Value> {
    let value = value.into_value();
    if value.value_type() != expected {
        return Err(NotifyError::type_mismatch(expected, &value));
    }
    Ok(value)
}

/// Decodes `value` as `T`. No widening or narrowing is attempted.
pub fn decode<T: HintPayload>(value: Value) -> Result<T> {
    T::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_other_tags() {
        let err = decode::<u32>(Value::Int32(3)).unwrap_err();
        assert!(matches!(
            err,
            NotifyError::TypeMismatch { expected: ValueType::UInt32, found: ValueType::Int32 }
        ));
    }

    #[test]
    fn decode_does_not_widen() {
        assert!(decode::<i64>(Value::Int32(3)).is_err());
        assert!(decode::<u8>(Value::UInt32(1)).is_err());
    }

    #[test]
    fn encode_checks_expected_type() {
        assert_eq!(encode(true, ValueType::Bool).unwrap(), Value::Bool(true));
        assert!(matches!(
            encode("x".to_string(), ValueType::Bool),
            Err(NotifyError::TypeMismatch { expected: ValueType::Bool, found: ValueType::Str })
        ));
    }

    #[test]
    fn into_fields_checks_arity() {
        let value = Value::Struct(vec![Value::Int32(1), Value::Bool(false)]);
        assert_eq!(value.clone().into_fields(2).unwrap().len(), 2);
        assert!(matches!(value.into_fields(3), Err(NotifyError::MalformedPayload { .. })));
        assert!(matches!(
            Value::Str("no".into()).into_fields(1),
            Err(NotifyError::TypeMismatch { .. })
        ));
    }
}
