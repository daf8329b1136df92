//! Common test infrastructure
//!
//! Builds temporary song/log data trees and a warehouse location for
//! end-to-end runs. Tests should only import from this module.

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{log_line, non_play_line, song_document, TestWorkspace};
