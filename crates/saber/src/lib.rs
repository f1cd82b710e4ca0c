//! Saber core: configuration model, persistence, assembly and blade sequencing.

pub mod assembly;
pub mod config;
pub mod error;
pub mod sequencer;
pub mod store;

pub use assembly::*;
pub use config::*;
pub use error::*;
pub use sequencer::*;
pub use store::*;
