pub mod graph;
pub mod import;

use anyhow::{Context, Result};
use geogrid_cli::InputArgs;
use geogrid_core::DistributionModel;
use geogrid_io::{GeoJsonReader, ModelReader, ParseReport, ReaderInputs, ReaderOptions};
use tracing::info;

/// Resolve command-line inputs against an optional config file.
pub fn reader_inputs(args: &InputArgs) -> Result<ReaderInputs> {
    let mut inputs = ReaderInputs {
        geojson_file: args.geojson.clone(),
        equipment_file: args.equipment.clone(),
        load_file: args.loads.clone(),
        options: ReaderOptions::default(),
    };
    if let Some(config) = &args.config {
        let file = ReaderInputs::load_from(config)
            .with_context(|| format!("loading reader config {}", config.display()))?;
        inputs.options = file.options.clone();
        inputs = inputs.merge_missing(file);
    }
    if args.strict {
        inputs.options.strict = true;
    }
    Ok(inputs)
}

/// Read the urban network into a fresh model.
pub fn load_model(args: &InputArgs) -> Result<(DistributionModel, ParseReport)> {
    let mut reader = GeoJsonReader::new(reader_inputs(args)?)?;
    let mut model = DistributionModel::new();
    let report = reader.parse(&mut model)?;
    info!("{}", model.stats());
    Ok((model, report))
}
