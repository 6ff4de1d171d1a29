/// tangle-replay: replay a recorded visualizer frame log and print the
/// final observation and canonical hash.
///
/// Usage: tangle-replay <frames.jsonl> [config.json]

use std::env;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

use tangle_runtime::config::RuntimeConfig;
use tangle_runtime::replay;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(frames) = args.first() else {
        eprintln!("usage: tangle-replay <frames.jsonl> [config.json]");
        return ExitCode::from(2);
    };

    let config = match args.get(1) {
        Some(path) => match RuntimeConfig::from_file(Path::new(path)) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("invalid configuration {}: {}", path, err);
                return ExitCode::from(2);
            }
        },
        None => RuntimeConfig::default(),
    };

    let level = config.level().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let subscription = match config.subscription() {
        Ok(subscription) => subscription,
        Err(err) => {
            error!(%err, "invalid subscription");
            return ExitCode::from(2);
        }
    };

    let session = match replay::replay_file(&config.engine, subscription, Path::new(frames)) {
        Ok(session) => session,
        Err(err) => {
            error!(%err, "replay failed");
            return ExitCode::FAILURE;
        }
    };

    let stats = session.stats();
    info!(frames = stats.frames, events = stats.events, evicted = stats.evicted, "replay finished");

    let output = serde_json::json!({
        "observation": session.observe(),
        "stats": stats,
        "hash": session.current_hash(),
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "failed to encode output");
            ExitCode::FAILURE
        }
    }
}
