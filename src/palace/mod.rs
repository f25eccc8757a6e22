pub mod anchors;
pub mod emphasis;
pub mod image;
pub mod types;
