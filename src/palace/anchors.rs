//! Built-in anchor choices offered when the user has not typed their own.

/// Everyday settings offered for the `default` anchor type.
pub const DEFAULT_OPTIONS: [&str; 3] = ["A cozy desk", "The inside of a car", "A trusty backpack"];

/// Fallback list for `place` anchors when no maps autocomplete is configured.
pub const FAMOUS_PLACES: [&str; 20] = [
    "Utsav Chowk, Kharghar",
    "Eiffel Tower, Paris",
    "Statue of Liberty, New York",
    "The Colosseum, Rome",
    "Great Wall of China",
    "Taj Mahal, Agra",
    "Sydney Opera House",
    "Pyramids of Giza",
    "Machu Picchu, Peru",
    "Burj Khalifa, Dubai",
    "Times Square, New York",
    "Buckingham Palace, London",
    "Golden Gate Bridge, San Francisco",
    "Christ the Redeemer, Rio de Janeiro",
    "Mount Fuji, Japan",
    "Stonehenge, UK",
    "Niagara Falls",
    "The Louvre Museum, Paris",
    "Red Square, Moscow",
    "Petra, Jordan",
];

/// Famous places whose name contains `query`, case-insensitively.
/// An empty query returns the whole list.
pub fn place_suggestions(query: &str) -> Vec<&'static str> {
    let needle = query.trim().to_lowercase();
    FAMOUS_PLACES
        .iter()
        .copied()
        .filter(|place| needle.is_empty() || place.to_lowercase().contains(&needle))
        .collect()
}
