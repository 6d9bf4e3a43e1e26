use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use ww_core::{Key, KeyStyle, Value};
use ww_engine::Flow;
use ww_graph::Waterwork;
use ww_project::{ProjectResult, read_values, values_to_json};
use ww_tanks::Registry;

#[derive(Parser)]
#[command(name = "ww-cli")]
#[command(about = "Waterworks CLI - build and run reversible dataflow graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a definition and list its funnels and taps
    Validate {
        /// Path to the definition file (YAML, or JSON with a .json extension)
        def_path: PathBuf,
    },
    /// List the registered tank types
    Types,
    /// Run a definition forward and print the taps as JSON
    Pour {
        /// Path to the definition file
        def_path: PathBuf,
        /// JSON object of funnel values keyed by port path
        #[arg(short, long)]
        inputs: Option<PathBuf>,
        /// Address ports by handle instead of path while evaluating
        #[arg(long)]
        handles: bool,
    },
    /// Run a definition backwards and print the funnels as JSON
    Pump {
        /// Path to the definition file
        def_path: PathBuf,
        /// JSON object of every tap value keyed by port path
        #[arg(short, long)]
        taps: PathBuf,
    },
}

fn main() -> ProjectResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let registry = Registry::with_builtins();

    match cli.command {
        Commands::Validate { def_path } => cmd_validate(&registry, &def_path),
        Commands::Types => {
            cmd_types(&registry);
            Ok(())
        }
        Commands::Pour {
            def_path,
            inputs,
            handles,
        } => cmd_pour(&registry, &def_path, inputs.as_deref(), handles),
        Commands::Pump { def_path, taps } => cmd_pump(&registry, &def_path, &taps),
    }
}

fn load_waterwork(registry: &Registry, def_path: &Path) -> ProjectResult<Waterwork> {
    let def = ww_project::load(def_path)?;
    info!(name = %def.name, tanks = def.tanks.len(), "loaded definition");
    def.build(registry)
}

fn cmd_validate(registry: &Registry, def_path: &Path) -> ProjectResult<()> {
    println!("Validating definition: {}", def_path.display());
    let ww = load_waterwork(registry, def_path)?;
    println!("✓ Definition is valid ({} tanks)", ww.tanks().len());
    println!("Funnels:");
    for key in ww.funnels() {
        let state = match ww.funnel_fill(key) {
            Some(ww_core::Fill::Value(_)) => "set",
            Some(ww_core::Fill::Empty) => "empty",
            None => "unset",
        };
        println!("  {key} ({state})");
    }
    println!("Taps:");
    for key in ww.taps() {
        println!("  {key}");
    }
    Ok(())
}

fn cmd_types(registry: &Registry) {
    for name in registry.type_names() {
        if let Some(op) = registry.get(name) {
            let sig = op.signature();
            println!(
                "  {name}: slots [{}] -> tubes [{}]",
                sig.slots().join(", "),
                sig.tubes().join(", ")
            );
        }
    }
}

fn cmd_pour(
    registry: &Registry,
    def_path: &Path,
    inputs: Option<&Path>,
    handles: bool,
) -> ProjectResult<()> {
    let ww = load_waterwork(registry, def_path)?;
    let mut values = match inputs {
        Some(path) => read_values(path)?,
        None => Vec::new(),
    };
    let style = if handles {
        values = values
            .into_iter()
            .map(|(key, value)| Ok((Key::Handle(key.resolve()?), value)))
            .collect::<ProjectResult<Vec<(Key, Value)>>>()?;
        KeyStyle::Handle
    } else {
        KeyStyle::Path
    };

    let report = ww.pour_report(values, style)?;
    for key in &report.absent {
        info!(tap = %key, "tap not computed");
    }
    println!("{}", values_to_json(&report.taps)?);
    Ok(())
}

fn cmd_pump(registry: &Registry, def_path: &Path, taps: &Path) -> ProjectResult<()> {
    let ww = load_waterwork(registry, def_path)?;
    let funnels = ww.pump(read_values(taps)?, KeyStyle::Path)?;
    println!("{}", values_to_json(&funnels)?);
    Ok(())
}
