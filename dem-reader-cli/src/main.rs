use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dem_reader::points::{random_points, read_points_file};
use dem_reader::{read_dem, ElevationUnit, Interpolation, LonDomain, Method, SampleOptions, TableWriter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// DEM file (.tif, .tiff, .grd, .nc)
    #[arg(value_name = "DEM")]
    dem: PathBuf,

    /// Sampling methods to compare, comma separated (grid, track)
    #[arg(short, long, value_delimiter = ',')]
    methods: Vec<Method>,

    /// Number of random query points
    #[arg(short = 'n', long, default_value_t = 100_000)]
    samples: usize,

    /// Seed for the random query points
    #[arg(long)]
    seed: Option<u64>,

    /// Read query points from a "lon lat" file instead of drawing random ones
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["samples", "seed"])]
    points: Option<PathBuf>,

    /// Interpolation kernel (nearest, linear, cubic)
    #[arg(short, long, default_value_t = Interpolation::Linear)]
    interpolation: Interpolation,

    /// Output elevation unit (m, km, ft)
    #[arg(short, long, default_value_t = ElevationUnit::Kilometers)]
    unit: ElevationUnit,

    /// Force the longitude domain instead of inferring it from the DEM
    #[arg(long, value_name = "DOMAIN", value_parser = parse_lon_domain)]
    lon_domain: Option<LonDomain>,

    /// Name of the elevation column
    #[arg(long, default_value = "z")]
    column: String,

    /// Write one CSV per method into this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
}

fn parse_lon_domain(s: &str) -> Result<LonDomain, String> {
    match s {
        "360" | "positive" => Ok(LonDomain::Positive),
        "180" | "signed" => Ok(LonDomain::Signed),
        other => Err(format!("expected 360 or 180, got {other:?}")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let points = match &args.points {
        Some(path) => read_points_file(path)
            .with_context(|| format!("Failed to read query points from {path:?}"))?,
        None => {
            info!("Drawing {} random query points", args.samples);
            random_points(args.samples, args.seed)
        }
    };

    let methods = if args.methods.is_empty() {
        Method::ALL.to_vec()
    } else {
        args.methods.clone()
    };

    let options = SampleOptions {
        interpolation: args.interpolation,
        lon_domain: args.lon_domain,
        output_unit: args.unit,
        column_name: args.column.clone(),
    };
    let writer = TableWriter::new();

    for method in methods {
        let (table, elapsed) = read_dem(&args.dem, method, &points, &options)
            .with_context(|| format!("Failed to sample {:?} using {method}", args.dem))?;

        if table.valid_count() < table.len() {
            warn!(
                "{} of {} points fell outside the DEM",
                table.len() - table.valid_count(),
                table.len()
            );
        }

        println!("{table}");
        println!(
            "## Reading/interpolation of {} samples finished after {} sec using method {}!",
            table.len(),
            elapsed.as_secs_f64(),
            method
        );

        if let Some(dir) = &args.output {
            let stem = args
                .dem
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("dem");
            writer.write(&table, &dir.join(format!("{stem}_{method}.csv")))?;
        }
    }

    Ok(())
}
