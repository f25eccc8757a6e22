//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};
use memory_palace::config::PalaceConfig;
use memory_palace::db;

pub fn doctor(config: &PalaceConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("Palace Health Report");
    println!("====================");
    println!();
    println!(
        "API key:           {}",
        if config.generation.api_key.is_empty() { "MISSING (set GEMINI_API_KEY)" } else { "configured" }
    );
    println!("Text model:        {}", config.generation.text_model);
    println!("Image model:       {}", config.generation.image_model);
    println!(
        "Place anchors:     {}",
        if config.maps_enabled() { "autocomplete" } else { "built-in list" }
    );
    println!();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("It is created on the first save.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Saved palaces:     {}", report.palace_count);
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
