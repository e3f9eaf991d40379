use anyhow::Result;
use clap::Parser;
use search::Cli;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    for line in search::run(&cli)? {
        println!("{line}");
    }
    Ok(())
}
