// src/display/mod.rs
//! Output of assembled fixes

pub mod terminal;

use serde::{Deserialize, Serialize};

/// How fixes are written to the terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One colored, human readable line per fix
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
