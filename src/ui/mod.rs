//! Terminal UI rendering.
//!
//! Each view gets its own submodule:
//! - [`devices`]: the full fleet table with the latest reading per metric
//! - [`offline`]: devices that have gone silent, sorted by silence
//! - [`groups`]: rollups per address prefix group with a member list
//! - [`detail`]: modal overlay with one device's history
//! - [`common`]: header, tab bar, status bar and help overlay shared by all views
//! - [`theme`]: color palette with light/dark background detection

pub mod common;
pub mod detail;
pub mod devices;
pub mod groups;
pub mod offline;
pub mod theme;

pub use devices::SortColumn;
pub use offline::OfflineSortColumn;
pub use theme::Theme;
