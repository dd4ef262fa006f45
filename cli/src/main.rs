mod commands;
mod terminal;

use commands::{CommandLine, Commands, discover, info};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    match commands.command {
        Commands::Info(args) => {
            print::header("about this network");
            info::info(&args).await
        }
        Commands::Discover(args) => {
            print::header("getting ready for discovery");
            discover::discover(&args).await
        }
    }
}
