//! Settings and dependency wiring.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{LogFormat, Settings, DEFAULT_SNAPSHOT_PATH};
