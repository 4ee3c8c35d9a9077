//! Command-line entry points. Each builds its [`Config`](config::Config)
//! from [`Settings`] and prints its result.

mod cache;
pub mod config;
mod detect;
mod downloads;
mod stats;

pub use cache::{cache_clear, cache_show};
pub use config::Settings;
pub use detect::detect;
pub use downloads::downloads;
pub use stats::stats;
