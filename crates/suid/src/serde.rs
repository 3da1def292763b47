//! Serde support for [`Suid`].
//!
//! By default a [`Suid`] serializes as its base-36 string and deserializes
//! from either a base-36 string or a non-negative integer, which is what the
//! allocator and older clients put on the wire.
//!
//! Use the `with` modules to pin one representation:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use suid::Suid;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Row {
//!     #[serde(with = "suid::serde::as_native")]
//!     id: Suid,
//!     #[serde(with = "suid::serde::as_base36")]
//!     parent: Suid,
//! }
//! ```

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Suid;

impl Serialize for Suid {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Suid {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(SuidVisitor { allow_int: true })
    }
}

struct SuidVisitor {
    allow_int: bool,
}

impl de::Visitor<'_> for SuidVisitor {
    type Value = Suid;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        if self.allow_int {
            formatter.write_str("a base-36 string or a non-negative integer")
        } else {
            formatter.write_str("a lower-case base-36 string of at most 11 digits")
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if !self.allow_int && !Suid::looks_valid(v) {
            return Err(de::Error::invalid_value(de::Unexpected::Str(v), &self));
        }
        Suid::decode(v).map_err(de::Error::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        if self.allow_int {
            Ok(Suid::from_raw(v))
        } else {
            Err(de::Error::invalid_type(de::Unexpected::Unsigned(v), &self))
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(de::Error::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }
}

pub mod as_native {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::Suid;

    /// Serialize an identifier as its integer value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S: Serializer>(id: &Suid, s: S) -> Result<S::Ok, S::Error> {
        id.to_raw().serialize(s)
    }

    /// Deserialize an identifier from its integer value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Suid, D::Error> {
        u64::deserialize(d).map(Suid::from_raw)
    }
}

pub mod as_base36 {
    use super::{Deserializer, Serializer, SuidVisitor};
    use crate::Suid;

    /// Serialize an identifier as base-36 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S: Serializer>(id: &Suid, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.encode())
    }

    /// Deserialize an identifier from base-36 text only.
    ///
    /// Text is screened with [`Suid::looks_valid`] first, so only lower-case
    /// values of up to eleven digits are admitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a string or does not look like an
    /// identifier.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Suid, D::Error> {
        d.deserialize_str(SuidVisitor { allow_int: false })
    }
}
