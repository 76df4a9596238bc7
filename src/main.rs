use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use g85map::summary::bin_tallies;
use g85map::{parse_wafer_map_file, ParseConfig, WaferMapModel};

/// Inspect a SEMI G85 wafer map from the command line.
#[derive(Parser, Debug)]
#[command(name = "g85map", version, about = "Parse a SEMI G85-1101 wafer map and report its contents.")]
struct Cli {
    /// Wafer map file (.xml or .xml.gz)
    path: PathBuf,

    /// Additional accepted FormatRevision values
    #[arg(long = "revision")]
    revisions: Vec<String>,

    /// Wafer diameter in millimeters when the document omits WaferSize
    #[arg(long)]
    default_wafer_size: Option<f64>,

    /// Exit with an error when the format revision is not supported
    #[arg(long)]
    strict: bool,

    /// Dump the whole model as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> ParseConfig {
        let mut config = ParseConfig::default();
        for revision in &self.revisions {
            config = config.with_supported_revision(revision.clone());
        }
        if let Some(size) = self.default_wafer_size {
            config = config.with_default_wafer_size(size);
        }
        config
    }

    fn run(self) -> Result<()> {
        let config = self.config();
        tracing::info!("Parsing wafer map {}", self.path.display());

        let model = parse_wafer_map_file(&self.path, &config)
            .with_context(|| format!("failed to parse '{}'", self.path.display()))?;

        if self.strict && !model.is_valid {
            bail!(
                "unsupported format revision {:?}",
                model.format_revision.as_deref().unwrap_or("<none>")
            );
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&model)?);
        } else {
            print_report(&model);
        }
        Ok(())
    }
}

fn print_report(model: &WaferMapModel) {
    let attrs = &model.device_attributes;
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    println!(
        "Format      : {} ({})",
        model.format_revision.as_deref().unwrap_or("-"),
        if model.is_valid { "supported" } else { "unsupported" }
    );
    println!("Wafer ID    : {}", opt(&attrs.wafer_id));
    println!("Lot ID      : {}", opt(&attrs.lot_id));
    println!("Product ID  : {}", opt(&attrs.product_id));
    println!("Created     : {}", opt(&attrs.created));
    println!("Wafer size  : {}", attrs.wafer_size);
    println!("Chip size   : {}, {}", model.die_size.0, model.die_size.1);
    println!("Grid        : {} rows x {} cols", attrs.rows, attrs.cols);

    let summary = model.summary();
    println!("Total die   : {}", summary.total_die);
    println!("Pass        : {}", summary.pass);
    println!("Fail        : {}", summary.fail);
    match summary.yield_percent {
        Some(y) => println!("Yield       : {y} %"),
        None => println!("Yield       : -"),
    }

    println!();
    println!("{:<6} {:<8} {:>8} {:>8}  Description", "Code", "Status", "Declared", "Found");
    for (code, found) in bin_tallies(model) {
        let Some(def) = model.bin(&code) else { continue };
        let status = match def.status {
            Some(true) => "pass",
            Some(false) => "fail",
            None => "null",
        };
        println!(
            "{:<6} {:<8} {:>8} {:>8}  {}",
            code,
            status,
            def.count.as_deref().unwrap_or("-"),
            found,
            def.description.as_deref().unwrap_or("")
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("g85map=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run()
}
