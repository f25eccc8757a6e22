//! CLI `generate` command: build a palace from an anchor and items.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use memory_palace::config::PalaceConfig;
use memory_palace::controller::PalaceController;
use memory_palace::generation::GenerationBackend;
use memory_palace::palace::image::ImagePayload;
use memory_palace::palace::types::AnchorType;
use memory_palace::store::PalaceStore;

use super::{open_controller, render, user_facing, with_spinner};

pub struct GenerateArgs {
    pub anchor_type: AnchorType,
    pub anchor: Option<String>,
    pub image: Option<PathBuf>,
    pub items: Vec<String>,
    pub save: bool,
    pub out: Option<PathBuf>,
}

pub async fn generate(config: &PalaceConfig, args: GenerateArgs) -> Result<()> {
    let mut controller = open_controller(config).await?;

    match (&args.image, args.anchor_type) {
        (Some(path), _) => {
            let image = ImagePayload::from_path(path).map_err(user_facing)?;
            controller.set_anchor_image(image);
        }
        (None, AnchorType::Upload) => bail!("an upload anchor needs --image <path>"),
        (None, anchor_type) => {
            controller.set_anchor_type(anchor_type);
            if let Some(anchor) = &args.anchor {
                controller.set_anchor_value(anchor).map_err(user_facing)?;
            }
        }
    }

    apply_items(&mut controller, &args.items)?;

    with_spinner("Building your memory palace", controller.generate())
        .await
        .map_err(user_facing)?;

    let Some(active) = controller.active() else {
        bail!("generation finished without a palace");
    };
    render::print_palace(active);

    if let Some(dir) = &args.out {
        let written = super::export::write_images(active.palace(), dir)?;
        println!("Wrote {written} image(s) to {}", dir.display());
    }

    if args.save {
        let id = controller.save().await.map_err(user_facing)?;
        println!("Saved as palace #{id}");
    } else {
        println!("Not saved. Re-run with --save to keep it.");
    }

    Ok(())
}

/// Replace the controller's list with the `--item` values, in order. Repeats
/// are kept; only the length limit applies. No values keeps the default list.
fn apply_items<B: GenerationBackend, S: PalaceStore>(
    controller: &mut PalaceController<B, S>,
    items: &[String],
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    controller.set_items(&items.join("\n")).map_err(user_facing)
}

/// Resolve `--anchor-type`, accepting the image flag as an implicit upload.
pub fn resolve_anchor_type(raw: &str, image: Option<&Path>) -> Result<AnchorType> {
    if image.is_some() {
        return Ok(AnchorType::Upload);
    }
    raw.parse::<AnchorType>().map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_palace::generation::{GeminiBackend, GenerationClient};
    use memory_palace::store::SqliteStore;

    fn offline_controller() -> PalaceController<GeminiBackend, SqliteStore> {
        let config = PalaceConfig::default();
        let backend = GeminiBackend::from_config(&config.generation).unwrap();
        // Nothing touches the database until the first store call.
        let store = SqliteStore::new("unused-palaces.db");
        PalaceController::new(GenerationClient::new(backend), store, &config)
    }

    #[test]
    fn item_flags_keep_repeats_in_order() {
        let mut controller = offline_controller();
        let items: Vec<String> = ["Red", "Red", "red"].iter().map(|s| s.to_string()).collect();

        apply_items(&mut controller, &items).unwrap();

        assert_eq!(controller.items(), vec!["Red", "Red", "red"]);
    }

    #[test]
    fn no_item_flags_keep_the_default_list() {
        let mut controller = offline_controller();
        apply_items(&mut controller, &[]).unwrap();
        assert_eq!(controller.items(), vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn item_flags_still_respect_the_length_limit() {
        let mut controller = offline_controller();
        assert!(apply_items(&mut controller, &["x".repeat(1001)]).is_err());
    }

    #[test]
    fn image_flag_implies_upload() {
        let anchor_type = resolve_anchor_type("place", Some(Path::new("desk.jpg"))).unwrap();
        assert_eq!(anchor_type, AnchorType::Upload);
        assert!(resolve_anchor_type("castle", None).is_err());
    }
}
