//! CLI command handling

pub mod output;
pub mod settings;
pub mod setup;

pub use output::*;
pub use settings::*;
pub use setup::*;
