//! Replay command - re-run a saved game record move by move

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use garrison_core::{GameRecord, Viewer};

use crate::render::{describe, render};

#[derive(Args)]
pub struct ReplayArgs {
    /// Game record JSON file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the board after every move
    #[arg(long)]
    pub show: bool,
}

pub fn run(args: ReplayArgs) -> Result<()> {
    let record = GameRecord::load(&args.file)
        .with_context(|| format!("Failed to load game record: {}", args.file.display()))?;

    if args.show {
        show_moves(&record)?;
    }

    let game = record
        .replay()
        .with_context(|| format!("{} does not replay", args.file.display()))?;

    println!(
        "{} vs {} on '{}': {} moves",
        record.bottom_name,
        record.top_name,
        record.rules.name,
        game.history().len()
    );
    println!("{}", game.status_text());
    Ok(())
}

/// Print every move with the board it leaves behind
fn show_moves(record: &GameRecord) -> Result<()> {
    let opening = GameRecord {
        moves: Vec::new(),
        surrendered: None,
        outcome: None,
        ..record.clone()
    };
    let mut game = opening.replay().context("Deployments do not replay")?;
    print!("{}", render(&game.snapshot(Viewer::Omniscient)));

    for (index, &mv) in record.moves.iter().enumerate() {
        let side = game
            .to_move()
            .with_context(|| format!("Move {} comes after the game ended", index + 1))?;
        let report = game
            .submit_move(side, mv)
            .with_context(|| format!("Move {} is illegal", index + 1))?;
        println!("{}", describe(index + 1, &report));
        print!("{}", render(&game.snapshot(Viewer::Omniscient)));
    }
    Ok(())
}
