use clap::Parser;
use tracing::error;

use shardroute::cli::{self, Cli, Commands};
use shardroute::logger;

fn main() {
    let args = Cli::parse();
    logger::init(args.json);

    let result: Result<(), Box<dyn std::error::Error>> = match args.command {
        Commands::Route { .. } => cli::route(&args.config, args.command.clone()),
        Commands::Configcheck => cli::config_check(&args.config).map_err(|err| err.into()),
    };

    if let Err(err) = result {
        error!("{}", err);
        std::process::exit(1);
    }
}
