use brvmta::cli::{run, Cli};
use clap::Parser;

fn main() -> std::process::ExitCode {
    brvmta::logging::init_logging();
    run(Cli::parse())
}
