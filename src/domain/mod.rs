pub mod models;
pub mod errors;
pub mod command;
pub mod history;
pub mod selection;
pub mod fill_series;
pub mod clipboard;

pub use models::*;
pub use errors::*;
pub use command::*;
pub use history::*;
pub use selection::*;
pub use fill_series::*;
pub use clipboard::*;
