//! Attached client lifecycle.
//!
//! An [`Instance`] owns the reader and snapshots of one process and runs three
//! threads against them: the regular loop, the precise loop and a health
//! watch. Each loop pass holds the snapshot lock for its whole duration.
//! Instances report their end to the manager through an [`InstanceEvent`]
//! channel instead of holding a reference back to it.

pub mod answer;
mod cycle;
mod report;

pub use cycle::{Cycle, InstanceCore, InstanceInfo};
pub use report::{ErrorReporter, ErrorSite};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::calculator::DifficultyCalculator;
use crate::config::Config;
use crate::config::timing::HEALTH_CHECK_INTERVAL;
use crate::error::Result;
use crate::game::ClientType;
use crate::memory::GameMemory;
use crate::process::ProcessInfo;
use crate::retry::{FixedDelay, RetryStrategy};

/// Notification sent to the owner of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceEvent {
    /// The process exited or the client reported shutdown.
    Destroyed(u32),
    /// Addresses could not be resolved within the configured attempts.
    ResolveFailed(u32),
}

/// Destroy flag and event channel shared by the instance threads.
#[derive(Clone)]
struct Lifecycle {
    pid: u32,
    destroyed: Arc<AtomicBool>,
    events: Sender<InstanceEvent>,
}

impl Lifecycle {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Mark destroyed and notify once.
    fn end(&self, event: InstanceEvent) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        // The receiver is gone when the manager itself is shutting down.
        let _ = self.events.send(event);
    }
}

pub struct Instance {
    info: InstanceInfo,
    core: Arc<Mutex<InstanceCore>>,
    process: Arc<dyn ProcessInfo + Send + Sync>,
    lifecycle: Lifecycle,
    poll_rate: Duration,
    precise_rate: Duration,
    resolve_retry: FixedDelay,
    threads: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Instance {
    pub fn new(
        info: InstanceInfo,
        memory: Box<dyn GameMemory>,
        process: Arc<dyn ProcessInfo + Send + Sync>,
        config: &Config,
        calculator: Arc<dyn DifficultyCalculator>,
        events: Sender<InstanceEvent>,
    ) -> Self {
        let lifecycle = Lifecycle {
            pid: info.pid,
            destroyed: Arc::new(AtomicBool::new(false)),
            events,
        };
        let core = InstanceCore::new(info.clone(), memory, config.clone(), calculator);

        Self {
            info,
            core: Arc::new(Mutex::new(core)),
            process,
            lifecycle,
            poll_rate: config.poll_interval(),
            precise_rate: config.precise_interval(),
            resolve_retry: FixedDelay::new(config.resolve_attempts, config.resolve_delay()),
            threads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn pid(&self) -> u32 {
        self.info.pid
    }

    pub fn client(&self) -> ClientType {
        self.info.client
    }

    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    /// Run `f` against the snapshots under the instance lock.
    pub fn with_core<R>(&self, f: impl FnOnce(&InstanceCore) -> R) -> R {
        f(&self.core.lock())
    }

    /// One domain snapshot as JSON.
    pub fn domain(&self, name: &str) -> Result<serde_json::Value> {
        self.core.lock().states.domain(name)
    }

    /// Resolve addresses, then start the loops.
    ///
    /// Resolution runs on the regular loop thread so the caller never waits
    /// for the retry delays.
    pub fn start(&self) -> Result<()> {
        let core = Arc::clone(&self.core);
        let process = Arc::clone(&self.process);
        let lifecycle = self.lifecycle.clone();
        let threads = Arc::clone(&self.threads);
        let retry = self.resolve_retry.clone();
        let rates = (self.poll_rate, self.precise_rate);
        let spectating = self.info.is_tourney_spectator;
        let label = format!("{}-{}", self.info.client, self.info.pid);

        let handle = thread::Builder::new()
            .name(format!("{}-regular", label))
            .spawn(move || {
                let should_continue = || !lifecycle.is_destroyed();
                let resolved = retry.execute(
                    |attempt| {
                        debug!("[{}] resolving addresses (attempt {})", label, attempt + 1);
                        core.lock().memory.resolve(spectating)
                    },
                    should_continue,
                );
                if let Err(e) = resolved {
                    warn!("[{}] address resolution failed: {}", label, e);
                    lifecycle.end(InstanceEvent::ResolveFailed(lifecycle.pid));
                    return;
                }
                info!("[{}] attached", label);

                if let Err(e) = spawn_watchers(&label, &core, process, &lifecycle, rates.1, &threads) {
                    warn!("[{}] can't start loops: {}", label, e);
                    lifecycle.end(InstanceEvent::Destroyed(lifecycle.pid));
                    return;
                }
                run_loop(&core, &lifecycle, rates.0, InstanceCore::regular_cycle);
            })?;

        self.threads.lock().push(handle);
        Ok(())
    }

    /// Stop the loops. The owner is notified once.
    pub fn destroy(&self) {
        if !self.is_destroyed() {
            debug!("[{}] {} destroyed", self.info.client, self.info.pid);
        }
        self.lifecycle.end(InstanceEvent::Destroyed(self.info.pid));
    }

    /// Destroy and wait for every thread to finish.
    pub fn join(&self) {
        self.destroy();
        loop {
            let Some(handle) = self.threads.lock().pop() else {
                break;
            };
            if handle.join().is_err() {
                warn!("[{}] {} loop thread panicked", self.info.client, self.info.pid);
            }
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.lifecycle.destroyed.store(true, Ordering::SeqCst);
    }
}

fn spawn_watchers(
    label: &str,
    core: &Arc<Mutex<InstanceCore>>,
    process: Arc<dyn ProcessInfo + Send + Sync>,
    lifecycle: &Lifecycle,
    precise_rate: Duration,
    threads: &Mutex<Vec<JoinHandle<()>>>,
) -> Result<()> {
    let precise = {
        let core = Arc::clone(core);
        let lifecycle = lifecycle.clone();
        thread::Builder::new()
            .name(format!("{}-precise", label))
            .spawn(move || run_loop(&core, &lifecycle, precise_rate, InstanceCore::precise_cycle))?
    };

    let health = {
        let lifecycle = lifecycle.clone();
        let label = label.to_string();
        thread::Builder::new()
            .name(format!("{}-health", label))
            .spawn(move || watch_health(&label, process.as_ref(), &lifecycle))?
    };

    threads.lock().extend([precise, health]);
    Ok(())
}

fn run_loop(
    core: &Mutex<InstanceCore>,
    lifecycle: &Lifecycle,
    rate: Duration,
    cycle: fn(&mut InstanceCore) -> Cycle,
) {
    while !lifecycle.is_destroyed() {
        // A cycle that panics on garbage memory is skipped, not fatal.
        match panic::catch_unwind(AssertUnwindSafe(|| cycle(&mut core.lock()))) {
            Ok(Cycle::Exit) => {
                info!("Client {} is exiting", lifecycle.pid);
                lifecycle.end(InstanceEvent::Destroyed(lifecycle.pid));
                break;
            }
            Ok(Cycle::Continue) => {}
            Err(_) => warn!("Client {} cycle panicked, skipping it", lifecycle.pid),
        }
        thread::sleep(rate);
    }
}

fn watch_health(label: &str, process: &(dyn ProcessInfo + Send + Sync), lifecycle: &Lifecycle) {
    while !lifecycle.is_destroyed() {
        if !process.is_alive() {
            info!("[{}] process exited", label);
            lifecycle.end(InstanceEvent::Destroyed(lifecycle.pid));
            break;
        }
        thread::sleep(HEALTH_CHECK_INTERVAL);
    }
}
