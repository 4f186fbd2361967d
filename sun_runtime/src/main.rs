use anyhow::Result;
use clap::Parser;

use sun_runtime::cli::Args;
use sun_runtime::runtime;

fn main() -> Result<()> {
    let args = Args::parse();
    runtime::execute(args)
}
