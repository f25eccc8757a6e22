use memory_palace::config::PalaceConfig;
use memory_palace::palace::anchors;

/// Print the built-in place list, filtered by `query`.
pub fn places(config: &PalaceConfig, query: Option<&str>) {
    if config.maps_enabled() {
        println!("Place autocomplete is configured; any place name is accepted as an anchor.");
        return;
    }
    for place in anchors::place_suggestions(query.unwrap_or_default()) {
        println!("{place}");
    }
}
