use std::io::{self, Write};

use anyhow::Result;
use geogrid_cli::{ImportArgs, OutputFormat};
use geogrid_core::DistributionModel;
use geogrid_io::ParseReport;
use serde_json::json;
use tabwriter::TabWriter;

use super::load_model;

pub fn handle(args: &ImportArgs) -> Result<()> {
    let (model, report) = load_model(&args.inputs)?;
    match args.format {
        OutputFormat::Plain => print_summary(&model, &report, args.verbose),
        OutputFormat::Json => print_json(&model, &report),
    }
}

fn print_summary(model: &DistributionModel, report: &ParseReport, verbose: bool) -> Result<()> {
    let stats = model.stats();
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "ELEMENT\tCOUNT")?;
    writeln!(writer, "buses\t{}", stats.buses)?;
    writeln!(writer, "lines\t{}", stats.lines)?;
    writeln!(writer, "transformers\t{}", stats.transformers)?;
    writeln!(writer, "capacitors\t{}", stats.capacitors)?;
    writeln!(writer, "loads\t{}", stats.loads)?;
    writeln!(writer, "generators\t{}", stats.generators)?;
    writer.flush()?;

    println!();
    if let Some(feeder) = &report.feeder {
        println!(
            "Feeder {} (source {}, {} island(s))",
            feeder.name,
            feeder.source_bus.as_deref().unwrap_or("none"),
            feeder.islands
        );
    }
    println!(
        "Total load {:.1} kW / {:.1} kvar, generation {:.1} kW, line length {:.0} m",
        stats.total_load_kw,
        stats.total_load_kvar,
        stats.total_generation_kw,
        stats.total_line_length_m
    );
    println!(
        "Inserted {} element(s), {} already present",
        report.inserted, report.duplicates
    );
    println!("{}", report.diagnostics.summary());

    if verbose {
        for issue in &report.diagnostics.issues {
            println!("  {issue}");
        }
    }
    Ok(())
}

fn print_json(model: &DistributionModel, report: &ParseReport) -> Result<()> {
    let payload = json!({
        "stats": model.stats(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
