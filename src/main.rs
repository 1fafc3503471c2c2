use clap::Parser;
use covidata::core::combine;
use covidata::utils::{logger, validation::Validate};
use covidata::{CliConfig, Dataset, FetchTarget, LocalStorage, PagedFetcher, Query, QueryFile, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting covidata CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let fetcher = PagedFetcher::from_config(&config)?;

    let (dataset, filename) = match fetch(&fetcher, &config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Fetch failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let storage = LocalStorage::new(config.output_path.clone());
    let csv = dataset.to_csv()?;
    storage.write_file(&filename, csv.as_bytes()).await?;

    tracing::info!(records = dataset.len(), file = %filename, "dataset written");
    println!(
        "✅ Wrote {} records to {}/{}",
        dataset.len(),
        config.output_path,
        filename
    );

    Ok(())
}

async fn fetch(
    fetcher: &PagedFetcher,
    config: &CliConfig,
) -> covidata::Result<(Dataset, String)> {
    if let Some(path) = &config.query_file {
        let query = QueryFile::load(path)?.into_query()?;
        let dataset = fetcher.fetch(&query).await?;
        return Ok((dataset, "custom_query.csv".to_string()));
    }

    match config.target {
        FetchTarget::National => {
            let query = Query::national(&config.nation)?;
            let dataset = fetcher.fetch(&query).await?;
            let filename = format!("national_{}.csv", config.nation.to_lowercase().replace(' ', "_"));
            Ok((dataset, filename))
        }
        FetchTarget::Regional => {
            let dataset = fetcher.fetch(&Query::regional()).await?;
            Ok((dataset, "regional.csv".to_string()))
        }
        FetchTarget::Local => {
            let query = Query::local(config.date.as_deref())?;
            let dataset = fetcher.fetch(&query).await?;
            Ok((dataset, "local_authorities.csv".to_string()))
        }
        FetchTarget::Uk => {
            let dataset = combine::fetch_uk(fetcher).await?;
            Ok((dataset, "united_kingdom.csv".to_string()))
        }
    }
}
