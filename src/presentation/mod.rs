//! Presentation layer handling terminal UI and user input.
//!
//! This module draws the open tables with ratatui, maps screen positions
//! back to grid lanes and translates keyboard and mouse events into
//! editor operations.

pub mod input;
pub mod layout;
pub mod ui;

pub use input::*;
pub use layout::*;
pub use ui::*;
