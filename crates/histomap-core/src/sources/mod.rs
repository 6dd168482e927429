//! # Sources Module
//!
//! Adapters for the three inputs of a render pass: the country geometry and
//! the two spreadsheet tables. Fetching the remote tables is left to the
//! caller; this module only parses what it is given.

mod geometry;
mod tables;

pub use geometry::*;
pub use tables::*;
