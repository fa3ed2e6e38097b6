//! Gas-network federate entry point: CLI wiring and replay-driven execution.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use ng_federate::config::{FederateConfig, HeatRateConfig};
use ng_federate::fed::{ExchangeLoop, FederateParams, NodeCoupling, ReplayRuntime};
use ng_federate::io::export::export_csv;
use ng_federate::model::HeatRateCurve;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    telemetry_out: Option<String>,
    quiet: bool,
}

fn print_help() {
    eprintln!("ng-federate — Gas-network federate for transmission co-simulation");
    eprintln!();
    eprintln!("Usage: ng-federate [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, stressed)");
    eprintln!("  --telemetry-out <path>   Export exchange records to CSV");
    eprintln!("  --quiet                  Suppress per-exchange stdout lines");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
    eprintln!("Set RUST_LOG=debug for per-exchange protocol logging.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        telemetry_out: None,
        quiet: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            "--quiet" => {
                cli.quiet = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn curve_from(config: &HeatRateConfig) -> HeatRateCurve {
    HeatRateCurve::new(config.hr0, config.hr1, config.hr2)
}

/// Builds the exchange loop and its replay runtime from a validated config.
fn build_federate(cfg: &FederateConfig) -> (ExchangeLoop, ReplayRuntime) {
    let c = &cfg.conversion;
    let params = FederateParams::new(
        c.unit_factor,
        c.gcv_mj_m3,
        c.flow_min_m3s,
        c.flow_max_m3s,
        cfg.federate.total_interval,
    );

    let mut runtime = ReplayRuntime::new(cfg.federate.update_interval);
    let mut nodes = Vec::with_capacity(cfg.nodes.len());
    for node in &cfg.nodes {
        let curve = curve_from(node.heat_rate.as_ref().unwrap_or(&cfg.heat_rate));
        let coupling = NodeCoupling::new(&node.id, curve);
        runtime.add_schedule(coupling.input_channel(), node.requested_mw.clone());
        nodes.push(coupling);
    }

    (ExchangeLoop::new(params, nodes), runtime)
}

fn main() {
    let cli = parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config: --config takes priority, then --preset, then baseline
    let scenario = if let Some(ref path) = cli.config_path {
        match FederateConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match FederateConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        FederateConfig::baseline()
    };

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    tracing::info!(
        federate = scenario.federate.name.as_str(),
        inputs = scenario.nodes.len(),
        outputs = scenario.nodes.len(),
        "configured federate"
    );

    // Build and run
    let (federate, mut runtime) = build_federate(&scenario);
    let records = match federate.run(&mut runtime) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Print per-exchange records
    if !cli.quiet {
        for r in &records {
            println!("{r}");
        }
    }

    // Export CSV if requested
    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
