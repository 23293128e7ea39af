pub mod alignment;
pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod logging;
pub mod playback;
pub mod render;
pub mod replay;
pub mod report;
pub mod selection;
pub mod session;
pub mod source;
pub mod storage;
pub use error::{AppError, AppResult};

use std::path::Path;

/// Entrypoint used by the replay binary: runs one scripted session headlessly.
pub fn run(script_path: &Path) -> AppResult<replay::ReplayReport> {
    logging::init();
    tracing::info!(script = %script_path.display(), "starting cropview replay");

    let script = replay::read_replay_script(script_path)?;
    let report = replay::run_script(&script)?;

    tracing::info!(
        depth = report.history.len(),
        frames = report.frames_presented,
        "replay complete"
    );
    Ok(report)
}
