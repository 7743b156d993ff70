use crate::demo::{print_plans, run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_market::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Real Estate Market Place",
    about = "Run the real-estate marketplace API or walk through it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print subscription plans with their listing and boost limits
    Plans,
    /// Run an in-memory walkthrough: signup, approval, listing, inquiry, viewing
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Plans => {
            print_plans();
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}
