//! Infrastructure layer providing external service integrations.
//!
//! Table files on disk, the system clipboard and the settings file.

pub mod persistence;
pub mod clipboard;
pub mod settings;

pub use persistence::*;
pub use clipboard::*;
pub use settings::*;
