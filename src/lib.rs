pub mod config;
pub mod core;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig, FetchTarget};

pub use config::query_file::QueryFile;
pub use core::{
    combine, AreaType, DataSource, Dataset, FieldMap, PagedFetcher, Query, Record, Storage,
};
pub use utils::error::{CovidError, Result};
