pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{load_or_default, resolve_config_path};
pub use wiring::{wire_backend, wire_orchestrator, BackendClients};
