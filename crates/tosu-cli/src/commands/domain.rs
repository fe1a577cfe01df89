//! Single domain dump.

use std::time::Duration;

use anyhow::{Result, bail};
use tosu_core::{Config, InstanceManager, PatternTables, SystemProcessProvider};

use crate::shutdown::ShutdownSignal;

/// Attach, let the loops run for `wait` ms, then print one domain snapshot.
pub fn run(config: Config, patterns: PatternTables, name: &str, pid: Option<u32>, wait: u64) -> Result<()> {
    let shutdown = ShutdownSignal::install()?;
    let discovery = config.discovery_period();
    let manager = InstanceManager::new(SystemProcessProvider, config).with_patterns(patterns);

    match pid {
        Some(pid) => eprintln!("Waiting for osu! process {}...", pid),
        None => eprintln!("Waiting for osu!..."),
    }

    let instance = loop {
        manager.discover();
        manager.update_focus();
        let found = match pid {
            Some(pid) => manager.instance(pid),
            None => manager.focused_instance(),
        };
        if let Some(instance) = found {
            break instance;
        }
        if shutdown.wait(discovery) {
            return Ok(());
        }
    };

    let interrupted = shutdown.wait(Duration::from_millis(wait));
    let snapshot = instance.domain(name);
    manager.shutdown();
    if interrupted {
        return Ok(());
    }

    match snapshot {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => bail!("Can't read {} from client {}: {}", name, instance.pid(), e),
    }
}
