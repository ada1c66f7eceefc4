use clap::Parser;
use std::io;
use std::path::PathBuf;
use symna::analysis;
use symna::output;
use symna::stats::Stats;
use symna::transfer;
use symna::RationalFunction;

/// Symbolic netlist to state-space converter
#[derive(Parser)]
#[command(name = "symna", version)]
struct Cli {
    /// SPICE-style netlist file to convert
    netlist: PathBuf,

    /// Input symbol forming the input vector (repeatable)
    #[arg(short, long = "input")]
    input: Vec<String>,

    /// Output measurement such as VnN1, VdR1 or IdL1 (repeatable)
    #[arg(short, long = "output")]
    output: Vec<String>,

    /// Also print the transfer function of every output/input pair
    #[arg(long)]
    tf: bool,

    /// Print performance stats to stderr
    #[arg(long)]
    stats: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut stats = if cli.stats { Some(Stats::new()) } else { None };

    let source = cli.netlist.display().to_string();
    let netlist = std::fs::read_to_string(&cli.netlist).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", source, e);
        std::process::exit(1);
    });

    let model = analysis::convert_with::<RationalFunction, _, _>(
        &netlist,
        cli.input.as_slice(),
        cli.output.as_slice(),
        stats.as_mut(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Conversion error: {}", e);
        std::process::exit(1);
    });

    let mut stdout = io::stdout();
    output::write_state_space(&model, &mut stdout).unwrap_or_else(|e| {
        eprintln!("Output error: {}", e);
        std::process::exit(1);
    });

    if cli.tf {
        let h = transfer::transfer_function(&model, "s").unwrap_or_else(|e| {
            eprintln!("Transfer function error: {}", e);
            std::process::exit(1);
        });
        if let Some(s) = stats.as_mut() {
            s.eliminations += 1;
        }
        for (i, out) in model.outputs.iter().enumerate() {
            for (j, inp) in model.inputs.iter().enumerate() {
                println!();
                output::write_transfer_function(&h[(i, j)], &source, inp, out, "s", &mut stdout)
                    .unwrap_or_else(|e| {
                        eprintln!("Output error: {}", e);
                        std::process::exit(1);
                    });
            }
        }
    }

    if let Some(ref stats) = stats {
        stats.display();
    }
}
