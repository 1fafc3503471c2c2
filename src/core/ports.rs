use crate::core::dataset::Dataset;
use crate::core::query::Query;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Anything that can resolve a query into a complete dataset. Lets the
/// combination layer and tests run against stub sources instead of HTTP.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, query: &Query) -> Result<Dataset>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
}
