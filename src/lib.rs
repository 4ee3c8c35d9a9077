pub mod cache;
pub mod commands;
pub mod http;
pub mod observe;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod source;
pub mod stats;
