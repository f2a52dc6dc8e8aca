pub mod config;
pub mod error;
pub mod host;
pub mod location;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod updater;
