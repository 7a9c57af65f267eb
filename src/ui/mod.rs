//! Terminal presentation for the CLI: progress lines, report views and
//! error rendering. Library code never prints; everything user-facing
//! goes through here.

pub mod blocks;
pub mod context;
pub mod error;
pub mod output;
pub mod primitives;
pub mod progress;
pub mod terminal;
pub mod theme;
pub mod views;
