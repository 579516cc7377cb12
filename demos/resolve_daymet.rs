//! Resolves the Daymet v4 variables used for the NHM region 19 runs and prints
//! what each one maps to in the catalogs.

use catalog_agg::{Aggregator, CatalogAggError, RunConfig};

#[tokio::main]
async fn main() -> Result<(), CatalogAggError> {
    let config = RunConfig::daymet_nhm19("data");
    let aggregator = Aggregator::from_config(&config).await?;

    let rows = aggregator
        .catalogs()
        .params
        .dataset(&config.dataset, config.grid_id);
    println!("{} has {} parameter rows", config.dataset, rows.len());

    let resolved = aggregator.resolve_config(&config)?;
    for (variable, params) in resolved.params.iter() {
        let grids = resolved.grids.get(variable).unwrap_or_default();
        println!(
            "{variable}: {} parameter row(s), grid {:?}, {} grid row(s)",
            params.len(),
            params.first().and_then(|p| p.grid_id),
            grids.len()
        );
    }

    let segments = config.segments()?;
    for segment in segments.iter() {
        println!(
            "{} .. {} -> {}",
            segment.start,
            segment.end,
            config.output_prefix(&segment)
        );
    }

    Ok(())
}
