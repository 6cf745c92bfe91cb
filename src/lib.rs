//! # mobeacon
//!
//! Offline-queueing activity beacon agent for resource-constrained
//! applications.
//!
//! The agent records page views and custom events, encodes them as
//! `__utm.gif` GET beacons, and either dispatches them immediately or parks
//! them in a durable queue that a host-driven pump drains sequentially.
//! Visitor identity survives restarts through a persisted session record.
//!
//! ## Architecture
//!
//! - **beacon**: pure URL and query-string encoding
//! - **session**: visitor identity, advanced once per process start
//! - **store**: durable FIFO queue plus the session row (SQLite)
//! - **transport**: one-shot GET dispatch (reqwest)
//! - **agent**: the coordinator gluing the above behind one lock
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mobeacon::{AgentCell, Config, DeviceProfile, HttpTransport, SqliteStore};
//!
//! static AGENT: AgentCell = AgentCell::new();
//!
//! fn main() -> mobeacon::Result<()> {
//!     let config = Config::load()?;
//!     let device = DeviceProfile {
//!         screen_width: 240,
//!         screen_height: 320,
//!         color_depth: 16,
//!         locale: "en-US".to_string(),
//!         hostname: "device.local".to_string(),
//!         platform: "ExamplePhone".to_string(),
//!         profile: "MIDP-2.0".to_string(),
//!         configuration: "CLDC-1.1".to_string(),
//!         encoding: "UTF-8".to_string(),
//!     };
//!
//!     let store = Arc::new(SqliteStore::open(&Config::database_path())?);
//!     let transport = Arc::new(HttpTransport::new(&device.user_agent(), &config.collector)?);
//!     let agent = AGENT.initialize("MO-123456-7", device, &config.collector, store, transport)?;
//!
//!     agent.track_page_view("/home");
//!
//!     // drain the queue, e.g. from an app-pause hook
//!     while agent.read_and_dispatch() {}
//!     Ok(())
//! }
//! ```

// Re-export commonly used items at the crate root
pub use agent::{AgentCell, DispatchStats, TrackingAgent};
pub use config::Config;
pub use device::DeviceProfile;
pub use error::{Error, Result};
pub use session::SessionRecord;
pub use store::{QueuedEvent, SqliteStore, Store};
pub use transport::{HttpTransport, Transport};

// Public modules
pub mod agent;
pub mod beacon;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod session;
pub mod store;
pub mod transport;
