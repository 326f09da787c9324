//! CLI command implementations

mod diff;
mod health;
mod pr;
mod render;
mod stats;

pub use diff::DiffArgs;
pub use health::health;
pub use pr::PrArgs;
pub use stats::StatsArgs;
