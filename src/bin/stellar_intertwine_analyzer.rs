use structopt::StructOpt;

use std::path::PathBuf;

use stellar_intertwine_analyzer::{
    find_optimal_overlay, stellarbeat, AnalyzerError, Deadline, IntertwineAnalyzer,
    OverlayOutcome,
};

/// Static analyzer for Stellar-style quorum configurations
#[derive(Debug, StructOpt)]
#[structopt(name = "stellar-intertwine-analyzer")]
struct Cli {
    /// Path of the cached validators JSON document
    #[structopt(long, default_value = "validators.json", parse(from_os_str))]
    cache: PathBuf,

    /// Give up and report "unknown" after this many milliseconds of solving
    #[structopt(long)]
    timeout_ms: Option<u64>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Check whether every pair of validators is intertwined
    Check {
        /// Refetch the network from stellarbeat before analyzing
        #[structopt(long)]
        update: bool,
    },
    /// Synthesize a minimum-edge overlay graph of diameter at most two
    Overlay {
        /// Only build the overlay for the network's top tier
        #[structopt(long = "top-tier-only")]
        top_tier_only: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::from_args();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AnalyzerError> {
    let deadline = match cli.timeout_ms {
        Some(ms) => Deadline::after_millis(ms),
        None => Deadline::unlimited(),
    };
    match cli.command {
        Command::Check { update } => {
            if !update {
                eprintln!(
                    "Loading data from {}. Use --update to get fresh data from stellarbeat.",
                    cli.cache.display()
                );
            }
            let network = stellarbeat::get_network(update, &cli.cache)?;
            eprintln!("There are {} validators", network.len());
            eprintln!(
                "There are {} different quorum sets",
                network.distinct_qset_count()
            );
            let analyzer = IntertwineAnalyzer::new(network, deadline);
            println!("{}", analyzer.check_network_intertwined()?);
        }
        Command::Overlay { top_tier_only } => {
            let network = stellarbeat::get_network(false, &cli.cache)?;
            let network = if top_tier_only {
                network.top_tier()?
            } else {
                network
            };
            eprintln!("Building overlay over {} validators", network.len());
            match find_optimal_overlay(&network, &deadline)? {
                OverlayOutcome::Optimal(edges) => {
                    for (u, v) in &edges {
                        println!("({}, {})", u, v);
                    }
                }
                OverlayOutcome::Unsatisfiable => {
                    return Err(AnalyzerError::InternalError(
                        "overlay constraints are unsatisfiable",
                    ))
                }
                OverlayOutcome::Unknown => println!("unknown"),
            }
        }
    }
    Ok(())
}
