//! Robot self-play driver.
//!
//! ```text
//! selfplay --games 8 --robot greedy --variation plateau-5
//! RUST_LOG=plateau=debug selfplay --games 1 --records
//! ```

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use plateau::{
    self_play_many, EngineConfig, GreedyRobot, PlateauResult, PlayerId, RandomRobot, Robot, RobotConfig,
    Variation,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RobotKind {
    Random,
    Greedy,
}

/// Play Plateau games between robots and report the results.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Board variation.
    #[arg(long, default_value_t = Variation::Plateau)]
    variation: Variation,

    /// Number of games to play.
    #[arg(long, default_value_t = 1)]
    games: usize,

    /// Base seed; game `i` uses `seed + i`.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Moves after which a game is abandoned.
    #[arg(long, default_value_t = 400)]
    max_moves: usize,

    /// Robot for the first player.
    #[arg(long, value_enum, default_value_t = RobotKind::Greedy)]
    first: RobotKind,

    /// Robot for the second player.
    #[arg(long, value_enum, default_value_t = RobotKind::Random)]
    second: RobotKind,

    /// Both players open with a pair.
    #[arg(long)]
    paired_opening: bool,

    /// Let robots consider flips that reveal nothing.
    #[arg(long)]
    redundant_flips: bool,

    /// Print each game's record.
    #[arg(long)]
    records: bool,
}

fn build(kind: RobotKind, config: &RobotConfig) -> Box<dyn Robot> {
    match kind {
        RobotKind::Random => Box::new(RandomRobot::new(config)),
        RobotKind::Greedy => Box::new(GreedyRobot::new(config)),
    }
}

fn main() -> PlateauResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::new(cli.variation).with_paired_opening(cli.paired_opening);
    let robot_config = RobotConfig::new(cli.seed)
        .with_max_moves(cli.max_moves)
        .with_redundant_flips(cli.redundant_flips);

    info!(variation = %cli.variation, games = cli.games, "starting self-play");
    let outcomes = self_play_many(&config, &robot_config, cli.games, |rc| {
        let second = RobotConfig::new(rc.seed.wrapping_mul(31).wrapping_add(7))
            .with_redundant_flips(rc.include_redundant_flips);
        [build(cli.first, rc), build(cli.second, &second)]
    })?;

    let mut wins = [0usize; 2];
    let mut unfinished = 0;
    for (index, outcome) in outcomes.iter().enumerate() {
        match outcome.winner {
            Some(p) => wins[p.index()] += 1,
            None => unfinished += usize::from(!outcome.finished),
        }
        if cli.records {
            println!("# game {index}: {} moves", outcome.moves);
            println!("{}", outcome.record.to_text());
        }
    }

    let draws = outcomes.len() - wins[0] - wins[1] - unfinished;
    println!(
        "{} {:?}: {}  {} {:?}: {}  draws: {}  unfinished: {}",
        PlayerId::FIRST,
        cli.first,
        wins[0],
        PlayerId::SECOND,
        cli.second,
        wins[1],
        draws,
        unfinished
    );
    Ok(())
}
