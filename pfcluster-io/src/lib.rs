//! pfcluster-io: Event input, option files and cluster output.
//!
//! Events are read as JSON lines, one [`EventRecords`] object per line.
//! Option files use the historical `clustering` option keys. Clusters are
//! written as CSV rows or JSON lines.
//!
//! [`EventRecords`]: pfcluster_core::EventRecords

mod error;
pub mod options;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use options::{load_options, options_from_str, options_from_value};
pub use reader::{read_events, EventReader};
pub use writer::{ClusterWriter, CSV_HEADER};
