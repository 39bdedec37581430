//! Application layer managing state and editing workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! one [`EditorSession`] per open table, gathered into tabs by [`App`].

pub mod session;
pub mod state;

pub use session::*;
pub use state::*;
