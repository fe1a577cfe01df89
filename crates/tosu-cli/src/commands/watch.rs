//! Answer printing mode.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tosu_core::{AnswerKind, Config, InstanceManager, PatternTables, SystemProcessProvider};
use tracing::info;

use crate::cli::AnswerFormat;
use crate::shutdown::ShutdownSignal;

/// Print the focused client's answer every `interval` ms until Ctrl+C.
///
/// With `once`, waits for the first ready answer, prints it and exits.
pub fn run(config: Config, patterns: PatternTables, format: AnswerFormat, interval: u64, once: bool) -> Result<()> {
    let shutdown = ShutdownSignal::install()?;
    let manager = InstanceManager::new(SystemProcessProvider, config).with_patterns(patterns);
    let kind = AnswerKind::from(format);
    let interval = Duration::from_millis(interval.max(1));

    eprintln!("Waiting for osu!... (Press Ctrl+C to quit)");

    let printed = thread::scope(|scope| -> Result<()> {
        scope.spawn(|| manager.run(shutdown.flag()));

        let result = print_loop(&manager, &shutdown, kind, interval, once);
        shutdown.trigger();
        result
    });

    manager.shutdown();
    info!("Shutdown complete");
    printed
}

fn print_loop(
    manager: &InstanceManager<SystemProcessProvider>,
    shutdown: &ShutdownSignal,
    kind: AnswerKind,
    interval: Duration,
    once: bool,
) -> Result<()> {
    while !shutdown.wait(interval) {
        let answer = manager.answer(kind);
        let ready = answer.get("error").is_none();
        if once && !ready {
            continue;
        }
        println!("{}", serde_json::to_string(&answer)?);
        if once {
            break;
        }
    }
    Ok(())
}
