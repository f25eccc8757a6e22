//! Memory palace builder: turns an anchor and a list of items into narrated
//! mnemonic scenes, composite images and a quick recap.
//!
//! The anchor is an everyday object, a real-world place or an uploaded photo.
//! Text and images come from a multimodal model service (Gemini by default);
//! saved palaces live in a local SQLite database as whole-record snapshots.
//!
//! | Anchor type | Value | Recorded as `originalAnchor` |
//! |-------------|-------|------------------------------|
//! | **default** | object or setting, e.g. "A cozy desk" | the text |
//! | **place** | place name, e.g. "Eiffel Tower, Paris" | the text |
//! | **upload** | a photo | a `data:` URI of the photo |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`controller`]: Application state and user actions
//! - [`db`]: SQLite initialization, schema and health checks
//! - [`error`]: Error taxonomy and user-facing messages
//! - [`generation`]: Prompt shaping, schema validation and the model backend
//! - [`palace`]: Palace types, emphasis markers, images and built-in anchors
//! - [`store`]: Persistence of saved palaces

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod generation;
pub mod palace;
pub mod store;
