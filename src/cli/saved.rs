//! CLI commands over saved palaces: `list`, `show`, `rename`, `delete`.

use std::io::Write;

use anyhow::{bail, Result};
use memory_palace::config::PalaceConfig;

use super::{open_controller, render, user_facing};

pub async fn list(config: &PalaceConfig) -> Result<()> {
    let controller = open_controller(config).await?;
    render::print_saved_list(controller.saved());
    Ok(())
}

pub async fn show(config: &PalaceConfig, id: i64) -> Result<()> {
    let mut controller = open_controller(config).await?;
    controller.load_palace(id).map_err(user_facing)?;
    if let Some(active) = controller.active() {
        render::print_palace(active);
    }
    Ok(())
}

pub async fn rename(config: &PalaceConfig, id: i64, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        bail!("title must not be empty");
    }
    let mut controller = open_controller(config).await?;
    controller.load_palace(id).map_err(user_facing)?;
    controller.update_title(title).await.map_err(user_facing)?;
    println!("Palace #{id} renamed to \"{title}\"");
    Ok(())
}

/// Delete a saved palace, asking for confirmation unless `yes` is set.
pub async fn delete(config: &PalaceConfig, id: i64, yes: bool) -> Result<()> {
    let mut controller = open_controller(config).await?;
    let Some(palace) = controller.saved().iter().find(|p| p.id == id) else {
        bail!("No saved palace with id {id}.");
    };

    if !yes {
        println!("Delete \"{}\"? This action cannot be undone.", palace.palace.title);
        print!("Type YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "YES" {
            bail!("delete cancelled");
        }
    }

    controller.delete_palace(id).await.map_err(user_facing)?;
    println!("Palace #{id} deleted.");
    Ok(())
}
