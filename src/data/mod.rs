//! Data models and processing for device telemetry.
//!
//! This module owns everything between a decoded event and the screen:
//! the device store, liveness classification, ordering, and the derived
//! rollups the views render.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "30s", "2m")
//! - [`groups`]: Prefix-group rollups for the Groups view
//! - [`history`]: Per-device sample history and sparkline helpers
//! - [`metric`]: The fixed metric vocabulary ([`Metric`], [`Reading`])
//! - [`order`]: Deterministic display ordering of device addresses
//! - [`store`]: Core state ([`DeviceStore`], [`DeviceState`], the liveness sweep)
//! - [`summary`]: Fleet-wide online/offline accounting
//!
//! ## Data Flow
//!
//! ```text
//! UpdateEvent (decoded envelope)
//!        │
//!        ▼
//! DeviceStore::apply()          DeviceStore::sweep()  (every sweep_interval)
//!        │                              │
//!        ├──▶ DeviceState (bounded history, receipt clock)
//!        │                              │
//!        └──────────────┬───────────────┘
//!                       ▼
//!     FleetSummary / GroupRollup / display_order  (derived on demand)
//! ```

pub mod duration;
pub mod groups;
pub mod history;
pub mod metric;
pub mod order;
pub mod store;
pub mod summary;

pub use groups::GroupRollup;
pub use history::HistoryEntry;
pub use metric::{Metric, Reading};
pub use store::{DeviceState, DeviceStore, Liveness, LivenessPolicy, HISTORY_LIMIT};
pub use summary::FleetSummary;
