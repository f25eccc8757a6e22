mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use memory_palace::config::PalaceConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "palace", version, about = "Build memory palaces from an anchor and a list of items")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new memory palace
    Generate {
        /// Anchor type: default, place or upload
        #[arg(long, default_value = "default")]
        anchor_type: String,
        /// Object or place name (defaults to the first built-in option)
        #[arg(long)]
        anchor: Option<String>,
        /// Photo to use as the anchor (implies --anchor-type upload)
        #[arg(long)]
        image: Option<PathBuf>,
        /// Item to memorize; repeat for each item
        #[arg(long = "item")]
        items: Vec<String>,
        /// Save the palace after generating it
        #[arg(long)]
        save: bool,
        /// Write the generated images into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List saved palaces, newest first
    List,
    /// Show a saved palace
    Show { id: i64 },
    /// Rename a saved palace
    Rename { id: i64, title: String },
    /// Edit one image of a saved palace and re-derive its scenes
    Regenerate {
        id: i64,
        /// Edit instruction, e.g. "make it night time"
        #[arg(long)]
        prompt: String,
        /// Generation to edit, counting from 1 (defaults to the latest)
        #[arg(long)]
        generation: Option<usize>,
        /// Image within the generation, 1-4
        #[arg(long, default_value_t = 1)]
        image: usize,
        /// Items to memorize (defaults to the palace's quick recap)
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Delete a saved palace
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write all images of a saved palace to a directory
    ExportImages {
        id: i64,
        #[arg(long)]
        dir: PathBuf,
    },
    /// List built-in place anchors
    Places { query: Option<String> },
    /// Check configuration and database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = PalaceConfig::load()?;

    // Log to stderr so stdout stays clean for palace output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Generate {
            anchor_type,
            anchor,
            image,
            items,
            save,
            out,
        } => {
            let anchor_type = cli::generate::resolve_anchor_type(&anchor_type, image.as_deref())?;
            cli::generate::generate(
                &config,
                cli::generate::GenerateArgs {
                    anchor_type,
                    anchor,
                    image,
                    items,
                    save,
                    out,
                },
            )
            .await?;
        }
        Command::List => cli::saved::list(&config).await?,
        Command::Show { id } => cli::saved::show(&config, id).await?,
        Command::Rename { id, title } => cli::saved::rename(&config, id, &title).await?,
        Command::Regenerate {
            id,
            prompt,
            generation,
            image,
            items,
        } => {
            cli::regenerate::regenerate(&config, id, &prompt, generation, image, &items).await?;
        }
        Command::Delete { id, yes } => cli::saved::delete(&config, id, yes).await?,
        Command::ExportImages { id, dir } => cli::export::export_images(&config, id, &dir).await?,
        Command::Places { query } => cli::places::places(&config, query.as_deref()),
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
