use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Exit status of a process ended by SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// A running build was cancelled.
    Build,
    /// Nothing was running.
    Idle,
}

/// Routes Ctrl-C to the build that is currently running, if any.
///
/// Listening for Ctrl-C replaces the default handler for the rest of the
/// process, so one listener serves a whole interactive session.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    running: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Listens for Ctrl-C: a running build is cancelled, otherwise the
    /// process exits with status 130.
    pub fn install() -> Self {
        let interrupts = Interrupts::default();
        let listener = interrupts.clone();

        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if listener.interrupt() == Interrupted::Idle {
                    log::info!("Interrupted");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        });

        interrupts
    }

    pub fn interrupt(&self) -> Interrupted {
        match self.running().as_ref() {
            Some(cancel) => {
                cancel.cancel();
                Interrupted::Build
            }
            None => Interrupted::Idle,
        }
    }

    /// Registers a running build until the returned guard is dropped.
    pub fn attach(&self, cancel: CancellationToken) -> Attached<'_> {
        *self.running() = Some(cancel);
        Attached(self)
    }

    fn running(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct Attached<'a>(&'a Interrupts);

impl Drop for Attached<'_> {
    fn drop(&mut self) {
        *self.0.running() = None;
    }
}
