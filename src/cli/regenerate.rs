//! CLI `regenerate` command: edit one image of a saved palace and re-derive
//! its scenes.

use anyhow::{bail, Result};
use memory_palace::config::PalaceConfig;

use super::{open_controller, render, user_facing, with_spinner};

/// `generation` and `image` are 1-based, as shown to the user.
pub async fn regenerate(
    config: &PalaceConfig,
    id: i64,
    prompt: &str,
    generation: Option<usize>,
    image: usize,
    items: &[String],
) -> Result<()> {
    let mut controller = open_controller(config).await?;
    controller.load_palace(id).map_err(user_facing)?;

    let Some(active) = controller.active() else {
        bail!("palace #{id} could not be loaded");
    };
    let generations = active.palace().image_generations.len();
    let items = if items.is_empty() {
        active.palace().recap_items()
    } else {
        items.to_vec()
    };
    let generation = generation.unwrap_or(generations);
    if generation == 0 || image == 0 {
        bail!("--generation and --image count from 1");
    }

    controller.set_items(&items.join("\n")).map_err(user_facing)?;

    with_spinner(
        "Editing image and re-deriving scenes",
        controller.regenerate(prompt, generation - 1, image - 1),
    )
    .await
    .map_err(user_facing)?;

    if let Some(active) = controller.active() {
        render::print_palace(active);
    }
    Ok(())
}
