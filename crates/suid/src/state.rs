use std::collections::VecDeque;

use parking_lot::{Mutex, RwLock};

use crate::{BlockLayout, BlockPool, Config, Suid, scheduler::Scheduler};

/// A one-shot readiness callback.
pub(crate) type Listener = Box<dyn FnOnce() + Send + 'static>;

/// What the dispenser currently holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispenserState {
    /// No block is held; the next identifier needs a block from the pool.
    #[default]
    NoBlock,
    /// A block taken from the pool, of which `offset` identifiers were issued.
    HoldingBlock { start: Suid, offset: u64 },
}

impl DispenserState {
    pub const fn is_holding(&self) -> bool {
        matches!(self, Self::HoldingBlock { .. })
    }

    /// A block is held and more than half of it is still left.
    pub(crate) const fn has_plenty(&self, layout: &BlockLayout) -> bool {
        match self {
            Self::HoldingBlock { offset, .. } => (*offset).saturating_mul(2) < layout.capacity(),
            Self::NoBlock => false,
        }
    }

    /// A block is held and more than half of it was issued.
    pub(crate) const fn is_half_consumed(&self, layout: &BlockLayout) -> bool {
        match self {
            Self::HoldingBlock { offset, .. } => (*offset).saturating_mul(2) > layout.capacity(),
            Self::NoBlock => false,
        }
    }
}

/// State shared by a dispenser and its allocator client.
pub(crate) struct Shared<S> {
    pub(crate) pool: BlockPool<S>,
    pub(crate) layout: BlockLayout,
    pub(crate) config: RwLock<Config>,
    pub(crate) state: Mutex<DispenserState>,
    pub(crate) listeners: Mutex<VecDeque<Listener>>,
    pub(crate) scheduler: Scheduler,
}

impl<S> Shared<S> {
    pub(crate) fn state(&self) -> DispenserState {
        *self.state.lock()
    }

    pub(crate) fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Runs every registered listener once, in registration order.
    pub(crate) fn fire_listeners(&self) {
        loop {
            let next = self.listeners.lock().pop_front();
            let Some(listener) = next else {
                break;
            };
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_thresholds_follow_the_layout() {
        let layout = BlockLayout::new(2, 64);
        let at = |offset| DispenserState::HoldingBlock {
            start: Suid::ZERO,
            offset,
        };

        assert!(at(31).has_plenty(&layout));
        assert!(!at(32).has_plenty(&layout));
        assert!(!at(32).is_half_consumed(&layout));
        assert!(at(33).is_half_consumed(&layout));

        // Odd capacity: one of three issued leaves more than half.
        let odd = BlockLayout::new(1, 3);
        assert!(at(1).has_plenty(&odd));
        assert!(!at(1).is_half_consumed(&odd));
        assert!(!at(2).has_plenty(&odd));
        assert!(at(2).is_half_consumed(&odd));

        assert!(!DispenserState::NoBlock.has_plenty(&layout));
        assert!(!DispenserState::NoBlock.is_half_consumed(&layout));
        assert!(!DispenserState::default().is_holding());
    }
}
