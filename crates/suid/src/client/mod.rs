//! The allocator client: fetches blocks from the remote allocator, throttles
//! redundant requests and retries transient failures.
//!
//! ## States
//!
//! - `Idle`: no fetch in flight.
//! - `Fetching`: a request (or a scheduled retry) is outstanding. Entered
//!   when the pool drops below `min`, left on success or when giving up.
//!
//! A fetch request while `Fetching` is ignored when the outstanding fetch is
//! younger than [`THROTTLE_WINDOW`], or when the held block still has more
//! than half of its identifiers left.

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
mod http;
mod retry;
mod transport;

#[cfg(feature = "http")]
pub use http::*;
pub use retry::*;
pub use transport::*;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{Error, PoolStore, Result, Suid, state::Shared};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchPhase {
    Idle,
    Fetching { started: Instant, retries_left: u32 },
}

/// A planned request.
#[derive(Clone, Debug)]
struct Attempt {
    server: String,
    blocks: usize,
}

pub(crate) struct AllocatorClient<S, T> {
    shared: Arc<Shared<S>>,
    transport: T,
    phase: Mutex<FetchPhase>,
}

impl<S, T> AllocatorClient<S, T>
where
    S: PoolStore,
    T: AllocatorTransport,
{
    pub(crate) fn new(shared: Arc<Shared<S>>, transport: T) -> Self {
        Self {
            shared,
            transport,
            phase: Mutex::new(FetchPhase::Idle),
        }
    }

    pub(crate) fn is_fetching(&self) -> bool {
        matches!(*self.phase.lock(), FetchPhase::Fetching { .. })
    }

    /// Starts replenishing the pool unless that is pointless or redundant.
    ///
    /// Never waits on the network; the request runs on the scheduler.
    pub(crate) fn fetch(self: &Arc<Self>) {
        if self.shared.scheduler.is_shut_down() {
            return;
        }
        let config = self.shared.config();
        let Some(server) = config.server else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "No suid server configured. Configure a server before generating IDs."
            );
            return;
        };

        let mut phase = self.phase.lock();
        if let FetchPhase::Fetching { started, .. } = *phase {
            if started.elapsed() < THROTTLE_WINDOW
                || self.shared.state().has_plenty(&self.shared.layout)
            {
                return;
            }
        }

        let available = match self.shared.pool.len() {
            Ok(len) => len,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Unable to read the suid block pool: {_e}");
                return;
            }
        };
        if available >= config.min {
            return;
        }

        *phase = FetchPhase::Fetching {
            started: Instant::now(),
            retries_left: RETRY_BUDGET,
        };
        drop(phase);

        let attempt = Attempt {
            server,
            blocks: blocks_wanted(config.max, available),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Fetching {} suid blocks from {}",
            attempt.blocks,
            attempt.server
        );
        let client = Arc::clone(self);
        self.shared.scheduler.defer(async move {
            client.attempt(attempt).await;
        });
    }

    /// Reports whether the pool holds a block.
    ///
    /// When it does, the registered listeners are run on the scheduler, never
    /// on this call stack. When it does not, a fetch is scheduled after
    /// [`READY_GRACE`].
    pub(crate) fn ready(self: &Arc<Self>, listener: Option<crate::state::Listener>) -> bool {
        let ready = matches!(self.shared.pool.len(), Ok(len) if len > 0);
        if let Some(listener) = listener {
            self.shared.listeners.lock().push_back(listener);
        }
        if ready {
            let shared = Arc::clone(&self.shared);
            self.shared.scheduler.defer(async move {
                shared.fire_listeners();
            });
        } else {
            let client = Arc::clone(self);
            self.shared.scheduler.defer_after(READY_GRACE, async move {
                client.fetch();
            });
        }
        ready
    }

    async fn attempt(self: Arc<Self>, attempt: Attempt) {
        let outcome = self
            .transport
            .request_blocks(&attempt.server, attempt.blocks)
            .await;
        let _failure = match outcome {
            Ok(response) if response.is_success() => {
                self.on_success(response.block_starts());
                return;
            }
            Ok(response) if is_retryable(response.status) => {
                self.retry(response.retry_after.as_deref());
                return;
            }
            Ok(response) => Error::FetchFailed {
                status: response.status,
            },
            Err(e) => e,
        };
        #[cfg(feature = "tracing")]
        tracing::error!(
            "Unable to fetch suid data from server {}: {_failure}",
            attempt.server
        );
        self.give_up();
    }

    fn on_success(self: &Arc<Self>, starts: Result<Vec<Suid>>) {
        let stored = starts.and_then(|starts| {
            let count = starts.len();
            self.shared.pool.extend(starts).map(|()| count)
        });
        match stored {
            Ok(_count) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Received {_count} suid blocks");
                *self.phase.lock() = FetchPhase::Idle;
                self.ready(None);
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Unable to store suid blocks: {_e}");
                self.give_up();
            }
        }
    }

    fn retry(self: &Arc<Self>, retry_after: Option<&str>) {
        {
            let mut phase = self.phase.lock();
            match &mut *phase {
                FetchPhase::Fetching { retries_left, .. } if *retries_left > 0 => {
                    *retries_left -= 1;
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Giving up fetching suid data from server");
                    *phase = FetchPhase::Idle;
                    return;
                }
            }
        }

        let delay = retry_delay(retry_after, self.urgency());
        #[cfg(feature = "tracing")]
        tracing::info!("Retrying suid fetch in {delay:?}");
        let client = Arc::clone(self);
        self.shared.scheduler.defer_after(delay, async move {
            let Some(attempt) = client.plan_retry() else {
                *client.phase.lock() = FetchPhase::Idle;
                return;
            };
            client.attempt(attempt).await;
        });
    }

    fn give_up(&self) {
        *self.phase.lock() = FetchPhase::Idle;
    }

    /// Re-reads config and pool, as either may have changed while waiting.
    fn plan_retry(&self) -> Option<Attempt> {
        let config = self.shared.config();
        let server = config.server?;
        let available = self.shared.pool.len().ok()?;
        Some(Attempt {
            server,
            blocks: blocks_wanted(config.max, available),
        })
    }

    fn urgency(&self) -> Urgency {
        let state = self.shared.state();
        Urgency {
            // An unreadable pool counts as empty.
            pool_empty: self.shared.pool.is_empty().unwrap_or(true),
            block_half_consumed: state.is_half_consumed(&self.shared.layout),
            no_block_held: !state.is_holding(),
        }
    }
}

/// Blocks to request so the pool reaches `max`, but always at least one.
const fn blocks_wanted(max: usize, available: usize) -> usize {
    let wanted = max.saturating_sub(available);
    if wanted == 0 { 1 } else { wanted }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asks_for_the_gap_to_max() {
        assert_eq!(blocks_wanted(4, 0), 4);
        assert_eq!(blocks_wanted(4, 3), 1);
        assert_eq!(blocks_wanted(4, 4), 1);
        assert_eq!(blocks_wanted(2, 5), 1);
    }
}
