use clap::Parser;
use std::error::Error;

use static_server::args::Args;
use static_server::logging::setup_logging;
use static_server::{start_server, ServerConfig};

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();
    let args = Args::parse();
    let config = ServerConfig::load(&args)?;
    start_server(config)?;
    Ok(())
}
