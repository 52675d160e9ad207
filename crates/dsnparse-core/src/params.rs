//! Decoding DSN query parameters into typed settings.
//!
//! Query parameters are plain `String -> String` pairs. [`decode_params`]
//! feeds them through `serde` so callers can describe their options as a
//! struct and let the text be coerced into each field's type:
//!
//! ```
//! use dsnparse_core::Dsn;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, PartialEq)]
//! #[serde(default)]
//! struct MysqlOptions {
//!     charset: String,
//!     parse_time: bool,
//!     timeout_ms: Option<u64>,
//! }
//!
//! let dsn = Dsn::parse("mysql://h/db?charset=utf8mb4&parse_time=true&timeout_ms=500");
//! let opts: MysqlOptions = dsn.decode_params().unwrap();
//! assert_eq!(opts.charset, "utf8mb4");
//! assert!(opts.parse_time);
//! assert_eq!(opts.timeout_ms, Some(500));
//! ```
//!
//! # Matching
//!
//! A key fills the field with the same name. When no field matches
//! exactly, an ASCII case-insensitive match is tried, so `parseTime=true`
//! fills a field named `parsetime`. Keys with no matching field are
//! ignored unless the target uses `#[serde(deny_unknown_fields)]`.
//!
//! # Coercions
//!
//! | target | accepted text |
//! |---|---|
//! | `String`, `&str`, `char` | any (one character for `char`) |
//! | `bool` | `1 t T true TRUE True on` / `0 f F false FALSE False` |
//! | integers, floats | Rust's `FromStr` syntax |
//! | `Option<T>` | empty text is `None` |
//! | `bool`, numbers, `char` with empty text | the type's zero value |
//! | `Vec<T>` | one value becomes a one-element list, empty text an empty one |
//! | unit enum variants | the variant name |
//!
//! Nested maps, structs and tuples have no text form and fail with
//! [`DecodeError::UnsupportedType`].

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt::Display;

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess,
    SeqAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use thiserror::Error;
use tracing::debug;

use crate::dsn::Dsn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("parameter `{field}`: {ty} values cannot be decoded from text")]
    UnsupportedType { field: String, ty: &'static str },

    #[error("parameter `{field}`: cannot convert `{value}` to {expected}")]
    TypeMismatch {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Message(String),
}

impl de::Error for DecodeError {
    fn custom<T: Display>(msg: T) -> Self {
        DecodeError::Message(msg.to_string())
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Decode a parameter map into `T`.
pub fn decode_params<T: DeserializeOwned>(
    params: &BTreeMap<String, String>,
) -> DecodeResult<T> {
    T::deserialize(ParamsDeserializer { params }).inspect_err(|e| {
        debug!(error = %e, params = params.len(), "parameter decode failed")
    })
}

impl Dsn {
    /// Decode this DSN's query parameters into `T`. See [`decode_params`].
    pub fn decode_params<T: DeserializeOwned>(&self) -> DecodeResult<T> {
        decode_params(self.params())
    }
}

// =============================================================================
// Map level
// =============================================================================

struct ParamsDeserializer<'de> {
    params: &'de BTreeMap<String, String>,
}

impl<'de> de::Deserializer<'de> for ParamsDeserializer<'de> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_map(ParamsAccess::new(self.params, &[]))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_map(ParamsAccess::new(self.params, fields))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

struct ParamsAccess<'de> {
    iter: btree_map::Iter<'de, String, String>,
    fields: &'static [&'static str],
    pending: Option<(&'de str, &'de str)>,
}

impl<'de> ParamsAccess<'de> {
    fn new(
        params: &'de BTreeMap<String, String>,
        fields: &'static [&'static str],
    ) -> Self {
        Self {
            iter: params.iter(),
            fields,
            pending: None,
        }
    }

    /// Field name a parameter key resolves to.
    fn resolve(&self, key: &'de str) -> &'de str {
        if self.fields.iter().any(|field| *field == key) {
            return key;
        }
        self.fields
            .iter()
            .find(|field| field.eq_ignore_ascii_case(key))
            .copied()
            .unwrap_or(key)
    }
}

impl<'de> MapAccess<'de> for ParamsAccess<'de> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> DecodeResult<Option<K::Value>> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        let field = self.resolve(key.as_str());
        self.pending = Some((field, value.as_str()));
        seed.deserialize(BorrowedStrDeserializer::new(field)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> DecodeResult<V::Value> {
        let (field, value) = self.pending.take().ok_or_else(|| {
            DecodeError::Message("value requested before key".into())
        })?;
        seed.deserialize(ValueDeserializer { field, value })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

// =============================================================================
// Value level
// =============================================================================

#[derive(Clone, Copy)]
struct ValueDeserializer<'de> {
    field: &'de str,
    value: &'de str,
}

impl<'de> ValueDeserializer<'de> {
    fn mismatch(&self, expected: &'static str) -> DecodeError {
        DecodeError::TypeMismatch {
            field: self.field.to_owned(),
            value: self.value.to_owned(),
            expected,
        }
    }

    fn unsupported(&self, ty: &'static str) -> DecodeError {
        DecodeError::UnsupportedType {
            field: self.field.to_owned(),
            ty,
        }
    }

    fn parse_bool(&self) -> DecodeResult<bool> {
        match self.value {
            "1" | "t" | "T" | "true" | "TRUE" | "True" | "on" => Ok(true),
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(self.mismatch("a boolean")),
        }
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident : $ty:ty, $expected:literal;)*) => {
        $(
            fn $method<V: Visitor<'de>>(
                self,
                visitor: V,
            ) -> DecodeResult<V::Value> {
                if self.value.is_empty() {
                    return visitor.$visit(<$ty>::default());
                }
                let parsed = self
                    .value
                    .parse::<$ty>()
                    .map_err(|_| self.mismatch($expected))?;
                visitor.$visit(parsed)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_bool<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_bool(self.parse_bool()?)
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8: i8, "an 8-bit integer";
        deserialize_i16 => visit_i16: i16, "a 16-bit integer";
        deserialize_i32 => visit_i32: i32, "a 32-bit integer";
        deserialize_i64 => visit_i64: i64, "a 64-bit integer";
        deserialize_i128 => visit_i128: i128, "a 128-bit integer";
        deserialize_u8 => visit_u8: u8, "an unsigned 8-bit integer";
        deserialize_u16 => visit_u16: u16, "an unsigned 16-bit integer";
        deserialize_u32 => visit_u32: u32, "an unsigned 32-bit integer";
        deserialize_u64 => visit_u64: u64, "an unsigned 64-bit integer";
        deserialize_u128 => visit_u128: u128, "an unsigned 128-bit integer";
        deserialize_f32 => visit_f32: f32, "a 32-bit float";
        deserialize_f64 => visit_f64: f64, "a 64-bit float";
        deserialize_char => visit_char: char, "a single character";
    }

    fn deserialize_str<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_string<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_bytes<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_borrowed_bytes(self.value.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_borrowed_bytes(self.value.as_bytes())
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if self.value.is_empty() {
            visitor.visit_unit()
        } else {
            Err(self.mismatch("an empty value"))
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        let item = (!self.value.is_empty()).then_some(self);
        visitor.visit_seq(SingleValueSeq { item })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> DecodeResult<V::Value> {
        Err(self.unsupported("tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> DecodeResult<V::Value> {
        Err(self.unsupported("tuple struct"))
    }

    fn deserialize_map<V: Visitor<'de>>(
        self,
        _visitor: V,
    ) -> DecodeResult<V::Value> {
        Err(self.unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> DecodeResult<V::Value> {
        Err(self.unsupported("struct"))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_enum(BorrowedStrDeserializer::<DecodeError>::new(
            self.value,
        ))
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_unit()
    }
}

impl<'de> IntoDeserializer<'de, DecodeError> for ValueDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

/// A parameter value seen as a list of at most one element.
struct SingleValueSeq<'de> {
    item: Option<ValueDeserializer<'de>>,
}

impl<'de> SeqAccess<'de> for SingleValueSeq<'de> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> DecodeResult<Option<T::Value>> {
        self.item.take().map(|item| seed.deserialize(item)).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(usize::from(self.item.is_some()))
    }
}
