pub mod config;
pub mod dataset;
pub mod dialect;
pub mod error;
pub mod fragments;
pub mod models;
pub mod query_builder;
pub mod registry;

pub use config::{ComposeConfig, QuerycraftConfig};
pub use dataset::{DatasetSchema, DatasetTable, Relationship};
pub use dialect::{Dialect, Vendor};
pub use error::{QuerycraftError, Result};
pub use models::{Dimension, Measure, Query};
pub use query_builder::{compose, QueryComposer};
pub use registry::DatasetRegistry;
