//! # colloquy-settings
//!
//! Configuration management with layered sources for the Colloquy pipeline.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`ColloquySettings::default()`], which carries
//!    the full intent rule table, suggestion tables, and sentiment lexicons
//! 2. **User file** — `~/.colloquy/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `COLLOQUY_*` overrides (highest priority)
//!
//! There is no global singleton: the orchestrator takes an owned
//! [`ColloquySettings`] at construction, so tests build their own instance.
//! [`ColloquySettings::validate`] enforces the fatal configuration-error
//! class at startup — a provider without credentials, a zero history bound,
//! or a zero timeout refuses to initialize rather than degrade silently.
//!
//! # Usage
//!
//! ```no_run
//! use colloquy_settings::load_settings;
//!
//! let settings = load_settings().expect("settings readable");
//! settings.validate().expect("settings valid");
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
