pub mod config;
pub mod consumer;
pub mod debounce;
pub mod handler;
pub mod registry;
pub mod selection;
pub mod server;

pub use config::{Config, Mode};
pub use debounce::DebounceGate;
pub use handler::{Outcome, SkipReason, TelemetryHandler};
pub use registry::{DeviceRegistry, HttpDeviceRegistry};
