pub mod cli;
pub mod query_file;

use crate::core::ports::ConfigProvider;
use crate::core::query::ENDPOINT;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum FetchTarget {
    National,
    Regional,
    Local,
    Uk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "covidata"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Fetch UK coronavirus statistics from the gov.uk API as CSV")
)]
pub struct CliConfig {
    #[cfg_attr(feature = "cli", arg(long, value_enum, default_value = "national"))]
    pub target: FetchTarget,

    #[cfg_attr(feature = "cli", arg(long, default_value = "england"))]
    pub nation: String,

    #[cfg_attr(
        feature = "cli",
        arg(long, help = "Restrict local-authority data to one YYYY-MM-DD date")
    )]
    pub date: Option<String>,

    #[cfg_attr(
        feature = "cli",
        arg(long, help = "TOML file overriding the default field map")
    )]
    pub query_file: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = ENDPOINT))]
    pub endpoint: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./output"))]
    pub output_path: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "30"))]
    pub timeout_seconds: u64,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        &self.endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", &self.endpoint)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        if self.target == FetchTarget::National {
            validation::validate_non_empty_string("nation", &self.nation)?;
        }
        Ok(())
    }
}
