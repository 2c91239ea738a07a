//! CLI flags plus TOML settings. Parsing is covered by unit tests; see
//! `bin/settings_demo.rs` to load a settings file by hand.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
