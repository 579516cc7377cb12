//! Resolves TerraClimate PDSI and prints the grid it is served on.

use catalog_agg::{Aggregator, CatalogAggError};

#[tokio::main]
async fn main() -> Result<(), CatalogAggError> {
    let aggregator = Aggregator::new().await?;

    let resolved = aggregator
        .resolve()
        .dataset("terraclim")
        .variables(&["PDSI"])
        .call()?;

    let (params, grids) = resolved.get("PDSI")?;
    println!("{:#?}", params[0]);
    println!("{:#?}", grids[0]);
    println!(
        "grid {} is {} x {} cells",
        resolved.params.grid_id("PDSI")?,
        grids[0].ncols.unwrap_or_default(),
        grids[0].nrows.unwrap_or_default()
    );

    Ok(())
}
