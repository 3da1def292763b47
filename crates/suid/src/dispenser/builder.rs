use std::{collections::VecDeque, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;

use crate::{
    AllocatorTransport, BlockLayout, BlockPool, Config, ConfigUpdate, DEFAULT_POOL_KEY, Dispenser,
    PoolStore, Result,
    client::AllocatorClient,
    scheduler::Scheduler,
    state::{DispenserState, Shared},
};

/// Builder for [`Dispenser`].
///
/// Defaults: pool key [`DEFAULT_POOL_KEY`], [`BlockLayout::default`],
/// [`Config::default`] and the tokio runtime current at [`build`] time.
///
/// [`build`]: DispenserBuilder::build
pub struct DispenserBuilder<S, T> {
    store: S,
    transport: T,
    pool_key: String,
    layout: BlockLayout,
    update: ConfigUpdate,
    runtime: Option<Handle>,
}

impl<S, T> DispenserBuilder<S, T>
where
    S: PoolStore,
    T: AllocatorTransport,
{
    pub fn new(store: S, transport: T) -> Self {
        Self {
            store,
            transport,
            pool_key: DEFAULT_POOL_KEY.to_owned(),
            layout: BlockLayout::default(),
            update: ConfigUpdate::default(),
            runtime: None,
        }
    }

    /// Key the pool is stored under. Dispensers sharing a store need
    /// distinct keys.
    #[must_use]
    pub fn pool_key(mut self, key: impl Into<String>) -> Self {
        self.pool_key = key.into();
        self
    }

    /// Block shape; must match what the allocator hands out.
    #[must_use]
    pub const fn layout(mut self, layout: BlockLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Initial configuration, merged over the defaults. Repeated calls merge
    /// in order; seeds accumulate.
    #[must_use]
    pub fn config(mut self, update: ConfigUpdate) -> Self {
        let seed = match (self.update.seed.take(), update.seed.clone()) {
            (Some(mut earlier), Some(later)) => {
                earlier.extend(later);
                Some(earlier)
            }
            (earlier, later) => later.or(earlier),
        };
        self.update = ConfigUpdate {
            server: update.server.or(self.update.server),
            min: update.min.or(self.update.min),
            max: update.max.or(self.update.max),
            seed,
        };
        self
    }

    /// Runtime for background work, instead of the current one.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Builds the dispenser, stores any seed blocks, and checks readiness,
    /// which schedules the first fetch when the pool is empty.
    ///
    /// # Errors
    ///
    /// - [`Error::NoRuntime`](crate::Error::NoRuntime) if no runtime was
    ///   given and none is current.
    /// - A store error if seed blocks cannot be persisted.
    pub fn build(self) -> Result<Dispenser<S, T>> {
        let scheduler = Scheduler::new(self.runtime)?;

        let mut config = Config::default();
        config.merge(&self.update);

        let pool = BlockPool::new(self.store, self.pool_key);
        if let Some(seed) = self.update.seed {
            pool.extend(seed)?;
        }

        let shared = Arc::new(Shared {
            pool,
            layout: self.layout,
            config: RwLock::new(config),
            state: Mutex::new(DispenserState::NoBlock),
            listeners: Mutex::new(VecDeque::new()),
            scheduler,
        });
        let client = Arc::new(AllocatorClient::new(Arc::clone(&shared), self.transport));
        client.ready(None);

        Ok(Dispenser { shared, client })
    }
}
