//! Terminal rendering of palaces and the saved list.

use std::io::IsTerminal;

use memory_palace::palace::emphasis::{segments, Segment};
use memory_palace::palace::types::{ActivePalace, SavedMemoryPalace};

/// Highlight `**term**` spans: bold on a terminal, the bare term otherwise.
fn emphasize(text: &str) -> String {
    let bold = std::io::stdout().is_terminal();
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(s) => s.to_string(),
            Segment::Emphasis(s) if bold => format!("\x1b[1m{s}\x1b[0m"),
            Segment::Emphasis(s) => s.to_uppercase(),
        })
        .collect()
}

pub fn print_palace(active: &ActivePalace) {
    let palace = active.palace();

    println!("{}", palace.title);
    println!("{}", "=".repeat(palace.title.chars().count().max(10)));
    match active {
        ActivePalace::Saved(saved) => println!("Saved palace #{} ({})", saved.id, saved.saved_at),
        ActivePalace::Draft(_) => println!("Unsaved palace"),
    }
    println!();

    println!("Scenes:");
    for (n, scene) in palace.scenes.iter().enumerate() {
        println!("  {}. {}", n + 1, scene.locus);
        println!("     {}", emphasize(&scene.description));
    }
    println!();

    println!("Quick recap:");
    for entry in &palace.quick_recap {
        println!("  - {:<24} {}", emphasize(&entry.item), entry.locus_hint);
    }
    println!();

    println!(
        "Images: {} generation(s) of {} each",
        palace.image_generations.len(),
        palace.latest_batch().map(|b| b.len()).unwrap_or(0)
    );
}

pub fn print_saved_list(palaces: &[SavedMemoryPalace]) {
    if palaces.is_empty() {
        println!("You have no saved palaces.");
        return;
    }

    println!("{:<15} {:<12} {}", "ID", "SAVED", "TITLE");
    for palace in palaces {
        let date = palace
            .saved_at_time()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| palace.saved_at.clone());
        println!("{:<15} {:<12} {}", palace.id, date, palace.palace.title);
    }
}
