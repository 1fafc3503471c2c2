pub mod combine;
pub mod dataset;
pub mod fetcher;
pub mod ports;
pub mod query;

pub use dataset::{Dataset, Record};
pub use fetcher::PagedFetcher;
pub use ports::{ConfigProvider, DataSource, Storage};
pub use query::{AreaType, FieldMap, Query};

pub use crate::utils::error::Result;
