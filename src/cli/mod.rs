pub mod doctor;
pub mod export;
pub mod generate;
pub mod places;
pub mod regenerate;
pub mod render;
pub mod saved;

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use memory_palace::config::PalaceConfig;
use memory_palace::controller::PalaceController;
use memory_palace::error::PalaceError;
use memory_palace::generation::{GeminiBackend, GenerationClient};
use memory_palace::store::SqliteStore;

pub type AppController = PalaceController<GeminiBackend, SqliteStore>;

/// Wire the Gemini backend and the SQLite store into a controller and load
/// the saved-palace list.
pub async fn open_controller(config: &PalaceConfig) -> Result<AppController> {
    let backend = GeminiBackend::from_config(&config.generation)?;
    let store = SqliteStore::new(config.resolved_db_path());
    let mut controller = PalaceController::new(GenerationClient::new(backend), store, config);
    controller.load_saved().await.map_err(user_facing)?;
    Ok(controller)
}

/// Turn a controller failure into the message shown to the user. The full
/// error has already been logged.
pub fn user_facing(e: PalaceError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

/// Await `task` behind a spinner on stderr.
pub async fn with_spinner<F: Future>(message: &str, task: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    let output = task.await;
    pb.finish_and_clear();
    output
}
