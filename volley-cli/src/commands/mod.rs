//! CLI command implementations

pub mod config;
pub mod payloads;
pub mod plan;
pub mod presets;
pub mod run;

pub use config::*;
pub use payloads::*;
pub use plan::*;
pub use presets::*;
pub use run::*;
