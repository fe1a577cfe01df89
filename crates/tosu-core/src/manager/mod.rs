//! Process discovery and the instance registry.
//!
//! The manager owns every [`Instance`]. Discovery runs on the caller's thread
//! (see [`InstanceManager::run`]); it registers new client processes and
//! drains the end-of-life events the instances send back.

mod args;
pub mod tourney;

pub use args::ClientArgs;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::calculator::{DifficultyCalculator, NoopCalculator};
use crate::config::Config;
use crate::error::Result;
use crate::game::ClientType;
use crate::instance::{Instance, InstanceEvent, InstanceInfo, answer};
use crate::memory::{GameMemory, LazerMemory, StableMemory};
use crate::offset::{PatternTable, lazer_patterns, stable_patterns};
use crate::process::{ProcessInfo, ProcessProvider};

pub const STABLE_EXECUTABLE: &str = "osu!.exe";
pub const LAZER_EXECUTABLE: &str = "osulazer.exe";
/// Wine and native builds on Linux.
pub const LINUX_EXECUTABLE: &str = "osu!";

/// Pattern tables handed to new instances.
#[derive(Debug, Clone)]
pub struct PatternTables {
    pub stable: PatternTable,
    pub lazer: PatternTable,
}

impl Default for PatternTables {
    fn default() -> Self {
        Self {
            stable: stable_patterns(),
            lazer: lazer_patterns(),
        }
    }
}

/// Which answer shape to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    V1,
    V2,
    Precise,
}

pub struct InstanceManager<P: ProcessProvider> {
    provider: P,
    config: Config,
    patterns: PatternTables,
    calculator: Arc<dyn DifficultyCalculator>,
    instances: RwLock<BTreeMap<u32, Arc<Instance>>>,
    focused_client: Mutex<Option<ClientType>>,
    events: Sender<InstanceEvent>,
    receiver: Mutex<Receiver<InstanceEvent>>,
}

impl<P: ProcessProvider> InstanceManager<P> {
    pub fn new(provider: P, config: Config) -> Self {
        let (events, receiver) = mpsc::channel();
        Self {
            provider,
            config,
            patterns: PatternTables::default(),
            calculator: Arc::new(NoopCalculator),
            instances: RwLock::new(BTreeMap::new()),
            focused_client: Mutex::new(None),
            events,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn with_patterns(mut self, patterns: PatternTables) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn DifficultyCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tracked instances in pid order.
    pub fn instances(&self) -> Vec<Arc<Instance>> {
        self.instances.read().values().cloned().collect()
    }

    pub fn instance(&self, pid: u32) -> Option<Arc<Instance>> {
        self.instances.read().get(&pid).cloned()
    }

    /// Drop instances that reported their end.
    pub fn drain_events(&self) {
        let receiver = self.receiver.lock();
        while let Ok(event) = receiver.try_recv() {
            let pid = match event {
                InstanceEvent::Destroyed(pid) => {
                    info!("Client {} detached", pid);
                    pid
                }
                InstanceEvent::ResolveFailed(pid) => {
                    warn!("Client {} could not be resolved, retrying on next discovery", pid);
                    pid
                }
            };
            self.instances.write().remove(&pid);
        }
    }

    /// One discovery pass. Returns the pids registered by this pass.
    pub fn discover(&self) -> Vec<u32> {
        self.drain_events();

        let linux = self.provider.is_linux();
        let mut pids = self.provider.find_processes(STABLE_EXECUTABLE);
        pids.extend(self.provider.find_processes(LAZER_EXECUTABLE));

        let mut lazer_on_linux = false;
        if linux {
            let native = self.provider.find_processes(LINUX_EXECUTABLE);
            // Only the native name running means lazer.
            lazer_on_linux = pids.is_empty() && !native.is_empty();
            pids.extend(native);
        }
        pids.sort_unstable();
        pids.dedup();

        let mut registered = Vec::new();
        for pid in pids {
            if self.instances.read().contains_key(&pid) {
                continue;
            }
            match self.attach(pid, linux, lazer_on_linux) {
                Ok(Some(instance)) => {
                    if let Err(e) = instance.start() {
                        warn!("Can't start instance {}: {}", pid, e);
                        continue;
                    }
                    self.instances.write().insert(pid, instance);
                    registered.push(pid);
                }
                Ok(None) => {}
                Err(e) => debug!("Skipping process {}: {}", pid, e),
            }
        }
        registered
    }

    /// Build an instance for `pid`, or `None` for clients that are not tracked.
    fn attach(&self, pid: u32, linux: bool, lazer_on_linux: bool) -> Result<Option<Arc<Instance>>> {
        if !self.provider.process_exists(pid) {
            return Ok(None);
        }
        let process = Arc::new(self.provider.open_process(pid)?);

        let args = ClientArgs::parse(&process.command_line().unwrap_or_default());
        if args.has("tournament") {
            debug!("Skipping lazer tournament client {}", pid);
            return Ok(None);
        }
        if args.has("debug-client-id") {
            debug!("Skipping lazer debug client {}", pid);
            return Ok(None);
        }

        let lazer = lazer_on_linux || (!linux && process.is_64bit()?);
        let client = if lazer {
            ClientType::Lazer
        } else {
            ClientType::Stable
        };

        let game_folder = match process.executable_path() {
            Ok(path) => path.parent().map(PathBuf::from).unwrap_or_default(),
            Err(e) => {
                warn!("[{}] {} executable path unavailable: {}", client, pid, e);
                PathBuf::new()
            }
        };

        let ipc_id = args.number("spectateclient");
        let info = InstanceInfo {
            pid,
            client,
            game_folder,
            is_tourney_spectator: ipc_id.is_some(),
            ipc_id: ipc_id.unwrap_or_default(),
            custom_server_endpoint: args.get("devserver").filter(|v| !v.is_empty()).map(str::to_string),
        };
        info!(
            "Found {} client {} (spectator: {})",
            client, pid, info.is_tourney_spectator
        );

        let memory: Box<dyn GameMemory> = match client {
            ClientType::Stable => Box::new(StableMemory::new(Arc::clone(&process), self.patterns.stable.clone())),
            ClientType::Lazer => Box::new(LazerMemory::new(Arc::clone(&process), self.patterns.lazer.clone())),
        };

        Ok(Some(Arc::new(Instance::new(
            info,
            memory,
            process,
            &self.config,
            Arc::clone(&self.calculator),
            self.events.clone(),
        ))))
    }

    /// The tournament manager client if one matches `client`, then the first
    /// instance of `client`, then the first instance.
    pub fn get_instance(&self, client: Option<ClientType>) -> Option<Arc<Instance>> {
        let instances = self.instances.read();
        let matches = |instance: &Arc<Instance>| client.is_none_or(|c| instance.client() == c);

        if let Some(manager) = instances
            .values()
            .find(|i| matches(i) && i.with_core(|core| core.is_tourney_manager()))
        {
            return Some(Arc::clone(manager));
        }
        match client {
            Some(_) => instances.values().find(|i| matches(i)).cloned(),
            None => instances.values().next().cloned(),
        }
    }

    /// Follow the foreground window.
    pub fn update_focus(&self) {
        let focused = self
            .provider
            .focused_pid()
            .and_then(|pid| self.instance(pid))
            .map(|instance| instance.client());

        let mut current = self.focused_client.lock();
        if let Some(client) = focused {
            *current = Some(client);
        } else if current.is_none() {
            *current = self.get_instance(None).map(|i| i.client());
        }
    }

    pub fn focused_client(&self) -> ClientType {
        self.focused_client.lock().unwrap_or_default()
    }

    /// Instance answers follow the focused client.
    pub fn focused_instance(&self) -> Option<Arc<Instance>> {
        self.get_instance(Some(self.focused_client()))
            .or_else(|| self.get_instance(None))
    }

    /// JSON answer for the focused instance.
    pub fn answer(&self, kind: AnswerKind) -> Value {
        let Some(instance) = self.focused_instance() else {
            return answer::not_ready();
        };

        let mut value = instance.with_core(|core| match kind {
            AnswerKind::V1 => answer::v1(core),
            AnswerKind::V2 => answer::v2(core),
            AnswerKind::Precise => answer::precise(core),
        });
        if kind != AnswerKind::Precise {
            if let Some(tourney) = tourney::aggregate(&self.instances()) {
                value["tourney"] = tourney;
            }
        }
        value
    }

    /// Discover and follow focus until `shutdown` is set.
    pub fn run(&self, shutdown: &AtomicBool) {
        let mut last_discovery: Option<Instant> = None;

        while !shutdown.load(Ordering::SeqCst) {
            if last_discovery.is_none_or(|at| at.elapsed() >= self.config.discovery_period()) {
                self.discover();
                last_discovery = Some(Instant::now());
            }
            if !self.provider.is_linux() {
                self.update_focus();
            }
            thread::sleep(self.config.focus_period());
        }
        debug!("Discovery stopped");
    }

    /// Stop every instance and wait for its threads.
    pub fn shutdown(&self) {
        let instances: Vec<Arc<Instance>> = std::mem::take(&mut *self.instances.write()).into_values().collect();
        for instance in instances {
            instance.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockMemoryBuilder, MockProcessProvider};

    /// Keeps unresolvable mock clients registered for the length of a test.
    fn config() -> Config {
        Config {
            resolve_attempts: 10_000,
            resolve_retry_delay: 20,
            ..Config::default()
        }
    }

    fn stable(pid: u32, command_line: &str) -> crate::process::MockMemoryReader {
        MockMemoryBuilder::new()
            .pid(pid)
            .command_line(command_line)
            .executable_path("/games/osu!/osu!.exe")
            .build()
    }

    fn lazer(pid: u32, command_line: &str) -> crate::process::MockMemoryReader {
        MockMemoryBuilder::new()
            .pid(pid)
            .x64(true)
            .command_line(command_line)
            .build()
    }

    #[test]
    fn test_discovery_registers_clients_once() {
        let provider = MockProcessProvider::new()
            .with_linux(false)
            .with_process(STABLE_EXECUTABLE, stable(10, "osu!.exe"))
            .with_process(LAZER_EXECUTABLE, lazer(11, "osulazer.exe"));
        let manager = InstanceManager::new(provider, config());

        assert_eq!(manager.discover(), vec![10, 11]);
        assert_eq!(manager.instance(10).map(|i| i.client()), Some(ClientType::Stable));
        assert_eq!(manager.instance(11).map(|i| i.client()), Some(ClientType::Lazer));
        assert_eq!(
            manager.instance(10).map(|i| i.info().game_folder.clone()),
            Some(PathBuf::from("/games/osu!"))
        );

        assert!(manager.discover().is_empty());
        assert_eq!(manager.instances().len(), 2);
        manager.shutdown();
        assert!(manager.instances().is_empty());
    }

    #[test]
    fn test_discovery_skips_tournament_and_debug_clients() {
        let provider = MockProcessProvider::new()
            .with_linux(false)
            .with_process(LAZER_EXECUTABLE, lazer(20, "osulazer.exe --tournament"))
            .with_process(LAZER_EXECUTABLE, lazer(21, "osulazer.exe --debug-client-id=1"));
        let manager = InstanceManager::new(provider, config());

        assert!(manager.discover().is_empty());
        assert!(manager.instances().is_empty());
    }

    #[test]
    fn test_spectator_flags() {
        let provider = MockProcessProvider::new().with_linux(false).with_process(
            STABLE_EXECUTABLE,
            stable(30, "osu!.exe -spectateclient 2 -devserver example.org"),
        );
        let manager = InstanceManager::new(provider, config());
        manager.discover();

        let instance = manager.instance(30).unwrap();
        assert!(instance.info().is_tourney_spectator);
        assert_eq!(instance.info().ipc_id, 2);
        assert_eq!(instance.info().custom_server_endpoint.as_deref(), Some("example.org"));
        manager.shutdown();
    }

    #[test]
    fn test_linux_native_name_means_lazer() {
        let provider = MockProcessProvider::new()
            .with_linux(true)
            .with_process(LINUX_EXECUTABLE, stable(40, "osu!"));
        let manager = InstanceManager::new(provider, config());
        manager.discover();

        assert_eq!(manager.instance(40).map(|i| i.client()), Some(ClientType::Lazer));
        manager.shutdown();
    }

    #[test]
    fn test_linux_wine_stable_with_spectators() {
        let provider = MockProcessProvider::new()
            .with_linux(true)
            .with_process(STABLE_EXECUTABLE, stable(50, "osu!.exe"))
            .with_process(LINUX_EXECUTABLE, stable(51, "osu! -spectateclient 0"));
        let manager = InstanceManager::new(provider, config());
        manager.discover();

        assert_eq!(manager.instance(50).map(|i| i.client()), Some(ClientType::Stable));
        assert_eq!(manager.instance(51).map(|i| i.client()), Some(ClientType::Stable));
        manager.shutdown();
    }

    #[test]
    fn test_get_instance_client_filter() {
        let provider = MockProcessProvider::new()
            .with_linux(false)
            .with_process(STABLE_EXECUTABLE, stable(60, "osu!.exe"))
            .with_process(LAZER_EXECUTABLE, lazer(61, "osulazer.exe"));
        let manager = InstanceManager::new(provider, config());
        manager.discover();

        assert_eq!(manager.get_instance(None).map(|i| i.pid()), Some(60));
        assert_eq!(manager.get_instance(Some(ClientType::Lazer)).map(|i| i.pid()), Some(61));
        manager.shutdown();
    }

    #[test]
    fn test_focus_follows_foreground_window() {
        let provider = MockProcessProvider::new()
            .with_linux(false)
            .with_process(STABLE_EXECUTABLE, stable(70, "osu!.exe"))
            .with_process(LAZER_EXECUTABLE, lazer(71, "osulazer.exe"));
        let manager = InstanceManager::new(provider.clone(), config());
        manager.discover();

        manager.update_focus();
        assert_eq!(manager.focused_client(), ClientType::Stable);

        provider.set_focused(Some(71));
        manager.update_focus();
        assert_eq!(manager.focused_client(), ClientType::Lazer);
        assert_eq!(manager.focused_instance().map(|i| i.pid()), Some(71));
        manager.shutdown();
    }

    #[test]
    fn test_answer_without_instances() {
        let manager = InstanceManager::new(MockProcessProvider::new(), config());
        assert_eq!(manager.answer(AnswerKind::V2)["error"], "not_ready");
    }

    #[test]
    fn test_resolve_failure_unregisters() {
        let provider = MockProcessProvider::new()
            .with_linux(false)
            .with_process(STABLE_EXECUTABLE, stable(80, "osu!.exe"));
        let config = Config {
            resolve_attempts: 1,
            resolve_retry_delay: 1,
            ..Config::default()
        };
        let manager = InstanceManager::new(provider, config);
        manager.discover();
        let instance = manager.instance(80).unwrap();

        // The mock image holds no patterns.
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        while manager.instance(80).is_some() && Instant::now() < deadline {
            thread::sleep(std::time::Duration::from_millis(5));
            manager.drain_events();
        }
        assert!(instance.is_destroyed());
        assert!(manager.instance(80).is_none());
    }
}
