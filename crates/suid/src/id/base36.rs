//! Base-36 text form of identifiers.
//!
//! Encoding uses the lower-case alphabet `0-9a-z` with no padding, so the
//! text is as short as the value allows. Decoding is case-insensitive.

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const NO_VALUE: u8 = 255;
const RADIX: u64 = 36;

/// Number of base-36 digits needed for `u64::MAX` (`3w5e11264sgsf`).
pub const MAX_ENCODED_LEN: usize = 13;

/// Longest text [`looks_valid`] admits. Eleven digits with a leading digit of
/// at most `2` stay close to the 53-bit integer range that JavaScript peers
/// can represent exactly.
pub const SAFE_ENCODED_LEN: usize = 11;

/// Lookup table for base-36 decoding
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    while i < 36 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_lowercase() {
            lut[(c - 32) as usize] = i; // upper-case letter
        }
        i += 1;
    }
    lut
};

/// Errors produced while decoding base-36 text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Base36Error {
    #[error("invalid length: {len}")]
    InvalidLen { len: usize },
    #[error("invalid ascii byte {byte} at index {index}")]
    InvalidAscii { byte: u8, index: usize },
    #[error("value does not fit in 64 bits")]
    Overflow,
}

/// Encodes `value` as base-36 text.
///
/// ```
/// assert_eq!(suid::encode_base36(0), "0");
/// assert_eq!(suid::encode_base36(1_903_154), "14she");
/// ```
pub fn encode_base36(mut value: u64) -> String {
    let mut buf = [0_u8; MAX_ENCODED_LEN];
    let mut start = MAX_ENCODED_LEN;
    loop {
        start -= 1;
        buf[start] = ALPHABET[(value % RADIX) as usize];
        value /= RADIX;
        if value == 0 {
            break;
        }
    }
    buf[start..].iter().copied().map(char::from).collect()
}

/// Decodes base-36 text into its integer value.
///
/// # Errors
///
/// Returns an error if the text is empty, contains a byte outside the base-36
/// alphabet, or denotes a value larger than `u64::MAX`.
pub fn decode_base36(encoded: &str) -> Result<u64, Base36Error> {
    if encoded.is_empty() {
        return Err(Base36Error::InvalidLen { len: 0 });
    }
    let mut acc = 0_u64;
    for (index, byte) in encoded.bytes().enumerate() {
        let val = LOOKUP[byte as usize];
        if val == NO_VALUE {
            return Err(Base36Error::InvalidAscii { byte, index });
        }
        acc = acc
            .checked_mul(RADIX)
            .and_then(|acc| acc.checked_add(u64::from(val)))
            .ok_or(Base36Error::Overflow)?;
    }
    Ok(acc)
}

/// Indicates whether `text` looks like an encoded identifier.
///
/// A `true` answer only means the text is *probably* an identifier: it is
/// non-empty, at most [`SAFE_ENCODED_LEN`] characters long, made only of the
/// lower-case alphabet, and when exactly eleven characters long starts with
/// `0`, `1` or `2`. Use it to screen candidates, never to prove validity.
pub fn looks_valid(text: &str) -> bool {
    let bytes = text.as_bytes();
    let len = bytes.len();
    if len == 0 || len > SAFE_ENCODED_LEN {
        return false;
    }
    if len == SAFE_ENCODED_LEN && !matches!(bytes[0], b'0'..=b'2') {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_values() {
        assert_eq!(encode_base36(0), "0");
        assert_eq!(encode_base36(35), "z");
        assert_eq!(encode_base36(36), "10");
        assert_eq!(encode_base36(100), "2s");
        assert_eq!(encode_base36(1_903_154), "14she");
        assert_eq!(encode_base36(u64::MAX), "3w5e11264sgsf");
    }

    #[test]
    fn decodes_known_values() {
        assert_eq!(decode_base36("0"), Ok(0));
        assert_eq!(decode_base36("14she"), Ok(1_903_154));
        assert_eq!(decode_base36("14sky"), Ok(1_903_282));
        assert_eq!(decode_base36("3w5e11264sgsf"), Ok(u64::MAX));
    }

    #[test]
    fn decode_is_case_insensitive_and_ignores_leading_zeros() {
        assert_eq!(decode_base36("14SHE"), Ok(1_903_154));
        assert_eq!(decode_base36("0000000014she"), Ok(1_903_154));
    }

    #[test]
    fn encode_decode_preserves_values() {
        for v in [
            0,
            1,
            35,
            36,
            1_295,
            1_296,
            9_007_199_254_740_991,
            u64::from(u32::MAX),
            u64::MAX - 1,
            u64::MAX,
        ] {
            let text = encode_base36(v);
            assert_eq!(decode_base36(&text), Ok(v), "roundtrip for {v} ({text})");
        }
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(decode_base36(""), Err(Base36Error::InvalidLen { len: 0 }));
        assert_eq!(
            decode_base36("14-he"),
            Err(Base36Error::InvalidAscii {
                byte: b'-',
                index: 2
            })
        );
        assert_eq!(
            decode_base36(" 1"),
            Err(Base36Error::InvalidAscii {
                byte: b' ',
                index: 0
            })
        );
        assert_eq!(decode_base36("3w5e11264sgsg"), Err(Base36Error::Overflow));
        assert_eq!(decode_base36("zzzzzzzzzzzzzz"), Err(Base36Error::Overflow));
    }

    #[test]
    fn looks_valid_screens_candidates() {
        assert!(looks_valid("0"));
        assert!(looks_valid("14she"));
        assert!(looks_valid("2zzzzzzzzzz"));
        assert!(looks_valid("zzzzzzzzzz"));

        assert!(!looks_valid(""));
        assert!(!looks_valid("3zzzzzzzzzz"));
        assert!(!looks_valid("100000000000"));
        assert!(!looks_valid("14SHE"));
        assert!(!looks_valid("14 he"));
        assert!(!looks_valid("Example"));
    }
}
