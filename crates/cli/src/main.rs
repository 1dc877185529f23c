use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use coregen_core::{
    builtin_units, collect_inventory, generate_groups, generate_units, load_unit_catalog,
    GenerateOptions, DEFAULT_TECHNOLOGY,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "coregen",
    version,
    about = "Generate FuseSoC CAPI-2 core files for basejump_stl."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write one core file per catalogued unit.
    Units(UnitsArgs),
    /// Scan the source tree and write the rtl, nonsynth and hardened group cores.
    Groups(GroupsArgs),
    /// Print how every scanned file was classified, as JSON.
    Inventory(InventoryArgs),
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Directory where core files will be written.
    #[arg(long, value_name = "DIR")]
    cores_root: PathBuf,

    /// Print core files to stdout instead of writing them.
    #[arg(long)]
    preview: bool,
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Root of the basejump_stl checkout.
    #[arg(long, value_name = "DIR")]
    source_root: PathBuf,

    /// Technology directory under `hard/` used for the hardened view.
    #[arg(long, default_value = DEFAULT_TECHNOLOGY, value_name = "NAME")]
    technology: String,

    /// Exclude glob patterns (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", num_args = 1.., action = ArgAction::Append)]
    exclude: Vec<String>,
}

#[derive(Debug, Args)]
struct UnitsArgs {
    #[command(flatten)]
    output: OutputArgs,

    /// JSON unit catalog replacing the built-in one.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct GroupsArgs {
    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    scan: ScanArgs,

    /// Fail when any scanned file matches no classification rule.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Args)]
struct InventoryArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Module directories to scan, relative to the source root (repeatable).
    /// Defaults to every known module.
    #[arg(long = "module", value_name = "PATH", num_args = 1.., action = ArgAction::Append)]
    modules: Vec<String>,

    /// Optional JSON output file. Defaults to stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Units(args) => run_units_command(args),
        Commands::Groups(args) => run_groups_command(args),
        Commands::Inventory(args) => run_inventory_command(args),
    }
}

fn run_units_command(args: UnitsArgs) -> Result<()> {
    let units = match &args.catalog {
        Some(path) => load_unit_catalog(path)
            .with_context(|| format!("failed to load unit catalog {}", path.display()))?,
        None => builtin_units(),
    };

    let options = GenerateOptions {
        cores_root: args.output.cores_root,
        preview: args.output.preview,
        ..GenerateOptions::default()
    };
    let written = generate_units(&units, &options).context("failed to generate unit cores")?;
    info!("generated {} unit core file(s)", written.len());
    Ok(())
}

fn run_groups_command(args: GroupsArgs) -> Result<()> {
    let GroupsArgs {
        output,
        scan,
        strict,
    } = args;

    let options = GenerateOptions {
        cores_root: output.cores_root,
        preview: output.preview,
        strict,
        excludes: scan.exclude,
        technology: scan.technology,
        ..GenerateOptions::default()
    };
    let written = generate_groups(&scan.source_root, &options).with_context(|| {
        format!(
            "failed to generate group cores from {}",
            scan.source_root.display()
        )
    })?;
    info!("generated {} group core file(s)", written.len());
    Ok(())
}

fn run_inventory_command(args: InventoryArgs) -> Result<()> {
    let options = GenerateOptions {
        excludes: args.scan.exclude,
        technology: args.scan.technology,
        ..GenerateOptions::default()
    };
    let inventories = collect_inventory(&args.scan.source_root, &args.modules, &options)
        .with_context(|| format!("failed to scan {}", args.scan.source_root.display()))?;

    let payload =
        serde_json::to_string_pretty(&inventories).context("failed to serialize inventory")?;
    match args.output {
        Some(output) => fs::write(&output, payload)
            .with_context(|| format!("failed to write inventory to {}", output.display()))?,
        None => println!("{payload}"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
