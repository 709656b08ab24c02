//! # beaconpost
//!
//! Embeddable analytics and device telemetry client for the Beaconpost API.
//!
//! Applications create a [`Dispatcher`], configure it once with an API key,
//! and then report events, register the installation, and check backend
//! connectivity. Every network operation is fire-and-forget: it never blocks
//! the caller, never retries, and reports its outcome only through the log
//! and an optional completion callback.
//!
//! ## Example
//!
//! ```rust,no_run
//! use beaconpost::{AppInfo, Dispatcher, FileDeviceIdStore};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> beaconpost::Result<()> {
//!     let dispatcher = Dispatcher::new(
//!         FileDeviceIdStore::in_data_dir("my-app"),
//!         AppInfo {
//!             bundle_id: "com.example.my-app".into(),
//!             version: "1.4.0".into(),
//!             build: "210".into(),
//!         },
//!     )?;
//!
//!     dispatcher.configure("bp_live_xxxxxxxx");
//!     dispatcher.track("app_open", HashMap::new());
//!     Ok(())
//! }
//! ```

// Re-export commonly used items at the crate root
pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use config::{ConfigStore, Configuration};
pub use dispatcher::{Completion, Dispatcher, HeartbeatHandle};
pub use error::{Error, Result};
pub use events::{DevicePayload, Event, EventPayload, PLATFORM};
pub use host::{AppInfo, AppInfoProvider, DeviceIdStore, FileDeviceIdStore};
pub use logging::{LogCategory, LogLevel, Logger};

// Public modules
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod host;
pub mod logging;
