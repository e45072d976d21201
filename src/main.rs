use backtester::cli::{run, setup_logging, Cli};
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);
    run(cli)
}
