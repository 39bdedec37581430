//! mdedit - master data editor
//!
//! A terminal editor for master-data tables: a JSON schema plus a CSV body
//! per table, edited as a grid with undo history, fill series, structural
//! edits and clipboard interchange.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
