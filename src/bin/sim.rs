use broadside::{run_session_with, MatchOptions, Side, StrategyRegistry, Verbosity, DEFAULT_BOARD_SIZE};
use broadside::standard_ship_lengths;
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        eprintln!("Usage: {} <strategy_a> <strategy_b> <seed_a> <seed_b>", args[0]);
        std::process::exit(1);
    }
    let seed_a: u64 = args[3].parse()?;
    let seed_b: u64 = args[4].parse()?;

    let registry = StrategyRegistry::with_builtin();
    let lengths = standard_ship_lengths();
    let a = Side::prepare(&registry, &args[1], DEFAULT_BOARD_SIZE, &lengths, SmallRng::seed_from_u64(seed_a))?;
    let b = Side::prepare(&registry, &args[2], DEFAULT_BOARD_SIZE, &lengths, SmallRng::seed_from_u64(seed_b))?;

    let opts = MatchOptions {
        strategy_a: args[1].clone(),
        strategy_b: args[2].clone(),
        verbosity: Verbosity::Silent,
        ..MatchOptions::default()
    };
    let report = run_session_with(a, b, opts).await?;
    let r = &report.result;

    let result = json!({
        "player_a": {"strategy": r.strategy_a, "shots": r.shots_a, "hits": r.hits_a},
        "player_b": {"strategy": r.strategy_b, "shots": r.shots_b, "hits": r.hits_b},
        "winner": r.winner,
        "turns": r.turns,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
