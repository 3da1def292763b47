use core::future::Future;

use serde::Deserialize;

use crate::{Error, Result, Suid};

/// What the allocator answered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Retry-After` header value, if any.
    pub retry_after: Option<String>,
    pub body: String,
}

impl FetchResponse {
    /// A `200 OK` carrying `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    /// A failure with `status` and an optional `Retry-After` hint.
    pub fn failed(status: u16, retry_after: Option<&str>) -> Self {
        Self {
            status,
            retry_after: retry_after.map(str::to_owned),
            body: String::new(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parses the body into block starts.
    ///
    /// # Errors
    ///
    /// See [`parse_block_starts`].
    pub fn block_starts(&self) -> Result<Vec<Suid>> {
        parse_block_starts(&self.body)
    }
}

/// The network side of the allocator client.
///
/// Implementations issue one request for `blocks` reservations against
/// `server` and report the outcome. A returned `Err` means no response was
/// received at all; any response, including error statuses, is `Ok`.
pub trait AllocatorTransport: Send + Sync + 'static {
    fn request_blocks(
        &self,
        server: &str,
        blocks: usize,
    ) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// Builds the request URL: `server` with a `blocks=<n>` query parameter.
///
/// ```
/// assert_eq!(suid::blocks_url("/suid/suid.json", 2), "/suid/suid.json?blocks=2");
/// assert_eq!(suid::blocks_url("http://ids/next?zone=eu", 1), "http://ids/next?zone=eu&blocks=1");
/// ```
pub fn blocks_url(server: &str, blocks: usize) -> String {
    let sep = if server.contains('?') { '&' } else { '?' };
    format!("{server}{sep}blocks={blocks}")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBlocks {
    One(Suid),
    Many(Vec<Suid>),
}

/// Parses an allocator response body.
///
/// The body is JSON: one block start or an array of them, each either a
/// base-36 string or an integer.
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] for anything else, including an empty
/// array.
pub fn parse_block_starts(body: &str) -> Result<Vec<Suid>> {
    let starts = match serde_json::from_str::<WireBlocks>(body) {
        Ok(WireBlocks::One(start)) => vec![start],
        Ok(WireBlocks::Many(starts)) => starts,
        Err(e) => {
            return Err(Error::InvalidResponse {
                reason: e.to_string(),
            });
        }
    };
    if starts.is_empty() {
        return Err(Error::InvalidResponse {
            reason: "no blocks in response".into(),
        });
    }
    Ok(starts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_multiple_starts() {
        assert_eq!(parse_block_starts(r#""14she""#).unwrap(), [Suid::from_raw(1_903_154)]);
        assert_eq!(parse_block_starts("1903154").unwrap(), [Suid::from_raw(1_903_154)]);
        assert_eq!(
            parse_block_starts(r#"["14she", 1903282]"#).unwrap(),
            [Suid::from_raw(1_903_154), Suid::from_raw(1_903_282)]
        );
    }

    #[test]
    fn rejects_unusable_bodies() {
        for body in ["", "[]", "{}", "null", r#""14 she""#, "-3", "[true]", "<html>"] {
            assert!(
                matches!(parse_block_starts(body), Err(Error::InvalidResponse { .. })),
                "{body}"
            );
        }
    }

    #[test]
    fn success_is_any_2xx() {
        assert!(FetchResponse::ok("1").is_success());
        assert!(FetchResponse::failed(204, None).is_success());
        assert!(!FetchResponse::failed(304, None).is_success());
        assert!(!FetchResponse::failed(503, Some("10")).is_success());
        assert_eq!(
            FetchResponse::failed(503, Some("10")).retry_after.as_deref(),
            Some("10")
        );
    }
}
