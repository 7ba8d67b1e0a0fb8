use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};

use emotion_adaptive_engine::adaptive::{
    load_snapshot, save_snapshot, Action, AdaptationEngine, EmotionState, Observation, ValueStore,
};
use emotion_adaptive_engine::config::Config;
use emotion_adaptive_engine::logging;

#[derive(Debug, Deserialize)]
struct ReplayLine {
    facial: Option<String>,
    voice: Option<String>,
    confidence: Option<f64>,
    reward: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AdaptationLine {
    cycle: u64,
    state: EmotionState,
    action: Action,
    description: &'static str,
    explored: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let log_guard = logging::init_tracing(&config.logging);
    tracing::debug!(file_logs = log_guard.writes_file(), "logging initialized");

    let store = match config.snapshot_path.as_ref() {
        Some(path) if path.exists() => match load_snapshot(path).await.and_then(|s| s.to_store()) {
            Ok(store) => store,
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "failed to restore snapshot");
                return ExitCode::FAILURE;
            }
        },
        _ => ValueStore::initialized(),
    };

    let mut engine = match AdaptationEngine::new(&config.engine, store) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(error = %err, "invalid engine configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = false;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "failed to read observation stream");
                failed = true;
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let replay: ReplayLine = match serde_json::from_str(&line) {
            Ok(replay) => replay,
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed observation line");
                continue;
            }
        };
        let observation = Observation {
            facial: replay.facial,
            voice: replay.voice,
            voice_confidence: replay.confidence,
        };

        match engine.observe(&observation, replay.reward) {
            Ok(outcome) => {
                let out = AdaptationLine {
                    cycle: engine.stats().cycles,
                    state: outcome.state,
                    action: outcome.action,
                    description: outcome.action.description(),
                    explored: outcome.explored,
                };
                match serde_json::to_string(&out) {
                    Ok(json) => println!("{json}"),
                    Err(err) => tracing::warn!(error = %err, "failed to encode adaptation"),
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "session halted");
                failed = true;
                break;
            }
        }
    }

    let stats = engine.stats();
    tracing::info!(
        cycles = stats.cycles,
        explorations = stats.explorations,
        updates_applied = stats.updates_applied,
        updates_rejected = stats.updates_rejected,
        "replay finished"
    );

    if !failed {
        if let Some(path) = config.snapshot_path.as_ref() {
            if let Err(err) = save_snapshot(path, &engine.snapshot()).await {
                tracing::error!(error = %err, path = %path.display(), "failed to save snapshot");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
