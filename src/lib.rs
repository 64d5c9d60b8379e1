pub mod app;
pub mod core;
pub mod notifications;
pub mod plugin;

// Used by `builtin_plugin!` expansions in downstream crates
#[doc(hidden)]
pub use inventory;
