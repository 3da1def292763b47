use core::{future::Future, time::Duration};

use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Deferred execution on a tokio runtime.
///
/// Everything the client does in the background goes through here: readiness
/// callbacks, the grace-period fetch and retry timers. Timers race a shared
/// [`CancellationToken`] so [`Scheduler::shutdown`] stops all pending work.
#[derive(Clone, Debug)]
pub(crate) struct Scheduler {
    runtime: Handle,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub(crate) fn new(runtime: Option<Handle>) -> Result<Self> {
        let runtime = match runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };
        Ok(Self {
            runtime,
            shutdown: CancellationToken::new(),
        })
    }

    /// Runs `task` on the runtime, never on the caller's stack.
    pub(crate) fn defer<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task)
    }

    /// Runs `task` once `delay` has elapsed, unless shut down first.
    pub(crate) fn defer_after<F>(&self, delay: Duration, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep(delay) => task.await,
            }
        })
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
