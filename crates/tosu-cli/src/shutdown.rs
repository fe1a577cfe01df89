//! Ctrl+C driven shutdown flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use parking_lot::{Condvar, Mutex};

#[derive(Default)]
pub struct ShutdownSignal {
    flag: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the Ctrl+C handler.
    pub fn install() -> Result<Arc<Self>> {
        let shutdown = Arc::new(Self::new());
        let shutdown_ctrlc = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            eprintln!("\nShutting down...");
            shutdown_ctrlc.trigger();
        })?;
        Ok(shutdown)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _guard = self.lock.lock();
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn flag(&self) -> &AtomicBool {
        &self.flag
    }

    /// Sleep for `timeout` or until triggered. Returns true when triggered.
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        if self.is_shutdown() {
            return true;
        }
        self.condvar.wait_for(&mut guard, timeout);
        self.is_shutdown()
    }
}
