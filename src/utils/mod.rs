//! Terminal output, progress and logging helpers

pub mod logging;
pub mod progress;
pub mod styling;

pub use logging::init_logging;
pub use progress::*;
pub use styling::*;
