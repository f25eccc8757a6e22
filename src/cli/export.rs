//! CLI `export-images` command: decode a palace's images to files.

use std::path::Path;

use anyhow::{Context, Result};
use memory_palace::config::PalaceConfig;
use memory_palace::palace::image::ImagePayload;
use memory_palace::palace::types::MemoryPalace;

use super::{open_controller, user_facing};

pub async fn export_images(config: &PalaceConfig, id: i64, dir: &Path) -> Result<()> {
    let mut controller = open_controller(config).await?;
    controller.load_palace(id).map_err(user_facing)?;
    let Some(active) = controller.active() else {
        return Ok(());
    };

    let written = write_images(active.palace(), dir)?;
    println!("Wrote {written} image(s) to {}", dir.display());
    Ok(())
}

/// Write every image as `gen<N>_img<M>.<ext>` (1-based). Returns the count.
pub fn write_images(palace: &MemoryPalace, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut written = 0;
    for (g, batch) in palace.image_generations.iter().enumerate() {
        for (i, url) in batch.iter().enumerate() {
            let image = ImagePayload::from_data_url(url)
                .with_context(|| format!("image {} of generation {} is not a data URL", i + 1, g + 1))?;
            let path = dir.join(format!("gen{}_img{}.{}", g + 1, i + 1, image.extension()));
            std::fs::write(&path, &image.data)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written += 1;
        }
    }
    Ok(written)
}
