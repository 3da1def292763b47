use core::{cmp::Ordering, fmt, str::FromStr};

use crate::id::{Base36Error, decode_base36, encode_base36, looks_valid};

/// A service-unique identifier.
///
/// A `Suid` is an immutable wrapper around a `u64`. Its text form is base-36,
/// which keeps identifiers short: `1903154` is written `14she`.
///
/// Two identifiers are equal if and only if their values are equal, and they
/// are ordered by value.
///
/// # Example
///
/// ```
/// use suid::Suid;
///
/// let id: Suid = "14she".parse().unwrap();
/// assert_eq!(id.to_raw(), 1_903_154);
/// assert_eq!(id.to_string(), "14she");
/// assert_eq!(Suid::default(), Suid::from_raw(0));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Suid(u64);

impl Suid {
    /// The zero identifier.
    pub const ZERO: Self = Self(0);

    /// Creates an identifier from its integer value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the integer value of this identifier.
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// Encodes this identifier as base-36 text.
    pub fn encode(&self) -> String {
        encode_base36(self.0)
    }

    /// Decodes an identifier from base-36 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty, contains characters outside the
    /// base-36 alphabet, or overflows 64 bits.
    pub fn decode(text: &str) -> Result<Self, Base36Error> {
        decode_base36(text).map(Self)
    }

    /// Indicates whether `text` *probably* is an encoded identifier.
    ///
    /// See [`looks_valid`](crate::looks_valid).
    pub fn looks_valid(text: &str) -> bool {
        looks_valid(text)
    }

    /// Compares this identifier with `other` by value.
    pub fn compare(&self, other: impl Into<Self>) -> Ordering {
        self.0.cmp(&other.into().0)
    }

    /// Indicates whether this identifier and `other` have the same value.
    pub fn equals(&self, other: impl Into<Self>) -> bool {
        self.0 == other.into().0
    }
}

impl From<u64> for Suid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Suid> for u64 {
    fn from(id: Suid) -> Self {
        id.0
    }
}

impl FromStr for Suid {
    type Err = Base36Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for Suid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Suid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Suid")
            .field(&format_args!("{} ({})", self.encode(), self.0))
            .finish()
    }
}
