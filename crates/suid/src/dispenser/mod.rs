//! The identifier dispenser.
//!
//! A [`Dispenser`] turns reserved blocks into individual identifiers. It is
//! the only component callers talk to: [`Dispenser::next`] issues an
//! identifier from local reserve and, when the pool runs low, asks the
//! allocator client to replenish in the background.

mod builder;

pub use builder::*;

use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    AllocatorTransport, BlockLayout, BlockPool, Config, ConfigUpdate, Error, PoolStore, Result,
    Suid,
    client::AllocatorClient,
    state::{DispenserState, Shared},
};

/// Issues service-unique identifiers from blocks reserved by a remote
/// allocator.
///
/// Cloning is cheap and clones share all state. Independent dispensers (for
/// example one per pool key) never interfere with each other.
///
/// ## Example
///
/// ```
/// use suid::{AllocatorTransport, ConfigUpdate, Dispenser, FetchResponse, MemoryStore, Result, Suid};
///
/// struct Offline;
/// impl AllocatorTransport for Offline {
///     async fn request_blocks(&self, _server: &str, _blocks: usize) -> Result<FetchResponse> {
///         Ok(FetchResponse::failed(404, None))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let dispenser = Dispenser::builder(MemoryStore::new(), Offline)
///     .config(ConfigUpdate::default().with_seed([Suid::from_raw(100)]))
///     .build()?;
///
/// assert_eq!(dispenser.next()?, Suid::from_raw(100));
/// assert_eq!(dispenser.next()?, Suid::from_raw(102));
/// # Ok(())
/// # }
/// ```
pub struct Dispenser<S, T> {
    shared: Arc<Shared<S>>,
    client: Arc<AllocatorClient<S, T>>,
}

impl<S, T> Clone for Dispenser<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            client: Arc::clone(&self.client),
        }
    }
}

impl<S, T> Dispenser<S, T>
where
    S: PoolStore,
    T: AllocatorTransport,
{
    /// Starts building a dispenser over `store` that fetches blocks through
    /// `transport`.
    pub fn builder(store: S, transport: T) -> DispenserBuilder<S, T> {
        DispenserBuilder::new(store, transport)
    }

    /// Issues the next identifier.
    ///
    /// When the pool is below `min`, or exactly at `min` while no block is
    /// held, a background fetch is requested first. This call never waits for
    /// it.
    ///
    /// # Errors
    ///
    /// - [`Error::BlockPoolExhausted`] if no block is held and the pool is
    ///   empty.
    /// - [`Error::BlockOverflow`] if the block taken yields values beyond
    ///   `u64::MAX`; that block is discarded.
    /// - [`Error::Store`] or [`Error::Format`] if the pool cannot be read or
    ///   written.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next(&self) -> Result<Suid> {
        let available = self.shared.pool.len()?;
        let holding = self.shared.state().is_holding();
        let min = self.shared.config.read().min;
        if available < min || (available == min && !holding) {
            self.client.fetch();
        }

        let layout = self.shared.layout;
        let mut state = self.shared.state.lock();
        let (start, offset) = match *state {
            DispenserState::HoldingBlock { start, offset } => (start, offset),
            DispenserState::NoBlock => match self.shared.pool.take_next() {
                Ok(start) => (start, 0),
                Err(Error::EmptyPool) => return Err(Error::BlockPoolExhausted),
                Err(e) => return Err(e),
            },
        };

        let id = match layout.id_at(start, offset) {
            Ok(id) => id,
            Err(e) => {
                *state = DispenserState::NoBlock;
                return Err(e);
            }
        };
        let offset = offset + 1;
        *state = if offset >= layout.capacity() {
            DispenserState::NoBlock
        } else {
            DispenserState::HoldingBlock { start, offset }
        };
        Ok(id)
    }

    /// Reports whether the pool holds at least one block.
    ///
    /// When it does, registered [`on_ready`](Self::on_ready) callbacks are
    /// run. When it does not, a fetch is scheduled after a short grace
    /// period, so configuration applied right after this call still takes
    /// effect.
    pub fn ready(&self) -> bool {
        self.client.ready(None)
    }

    /// Like [`ready`](Self::ready), registering `callback` to run once the
    /// pool holds a block.
    ///
    /// The callback always runs asynchronously, after this call returns, even
    /// when the pool is ready already. Callbacks run once each, in
    /// registration order.
    pub fn on_ready<F>(&self, callback: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.client.ready(Some(Box::new(callback)))
    }

    /// Reports whether the pool holds at least one block, without side
    /// effects.
    pub fn is_ready(&self) -> bool {
        matches!(self.shared.pool.len(), Ok(len) if len > 0)
    }

    /// Resolves once the pool holds at least one block.
    pub async fn ready_async(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.on_ready(move || {
            let _ = tx.send(());
        });
        let _ = rx.await;
    }

    /// Merges `update` over the current configuration and pushes its seed
    /// blocks, if any, into the pool. Returns the resulting configuration.
    ///
    /// # Errors
    ///
    /// Returns a store error if the seed blocks cannot be persisted. The
    /// configuration is merged regardless.
    pub fn configure(&self, update: ConfigUpdate) -> Result<Config> {
        self.shared.config.write().merge(&update);
        if let Some(seed) = update.seed {
            self.shared.pool.extend(seed)?;
        }
        self.client.ready(None);
        Ok(self.config())
    }

    /// Applies options in the attribute syntax accepted by
    /// [`ConfigUpdate::from_options`].
    ///
    /// A malformed payload is logged and ignored; the last good configuration
    /// stays in effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for a malformed payload, or a store error
    /// as for [`Dispenser::configure`].
    pub fn configure_options(&self, options: &str) -> Result<Config> {
        match ConfigUpdate::from_options(options) {
            Ok(update) => self.configure(update),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("{e}");
                Err(e)
            }
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> Config {
        self.shared.config()
    }

    /// Returns what the dispenser currently holds.
    pub fn state(&self) -> DispenserState {
        self.shared.state()
    }

    pub fn layout(&self) -> BlockLayout {
        self.shared.layout
    }

    pub fn pool(&self) -> &BlockPool<S> {
        &self.shared.pool
    }

    /// Whether a fetch or a retry is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.client.is_fetching()
    }

    /// Cancels pending timers and stops starting new fetches. Identifiers
    /// already in reserve can still be issued.
    pub fn shutdown(&self) {
        self.shared.scheduler.shutdown();
    }
}
