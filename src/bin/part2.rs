use anyhow::{Context, Result};
use clap::Parser;
use hike_maze::{CLIArgs, TraversalRule};

fn main() -> Result<()> {
    let _logger = hike_maze::logging::init()?;
    let args = CLIArgs::parse();
    let map = hike_maze::read_map(&args.input_path).with_context(|| {
        format!(
            "Failed to read map from given file({}).",
            args.input_path.display()
        )
    })?;

    let hike = hike_maze::longest_hike(&map, TraversalRule::TwoWay, args.parallel)
        .context("Failed to find a hike from entrance to exit.")?;
    println!(
        "The longest hike through given map is {} steps long if slopes are as easy as plain paths.",
        hike.length()
    );

    Ok(())
}
