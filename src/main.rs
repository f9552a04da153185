use broadside::{
    init_logging, run_session, CellState, MatchOptions, MatchResult, Orchestrator, Peer, PeerId,
    ShotEvent, Side, SimConfig, StrategyRegistry, SummaryRecord, TcpTransport, TrialRun, Verbosity,
    DEFAULT_BOARD_SIZE,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VerbosityArg {
    All,
    HitsOnly,
    Silent,
}

impl From<VerbosityArg> for Verbosity {
    fn from(v: VerbosityArg) -> Self {
        match v {
            VerbosityArg::All => Verbosity::All,
            VerbosityArg::HitsOnly => Verbosity::HitsOnly,
            VerbosityArg::Silent => Verbosity::Silent,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct Common {
    #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
    board_size: usize,
    #[arg(long, value_enum, default_value_t = VerbosityArg::Silent)]
    verbosity: VerbosityArg,
    /// Attach a board snapshot to every kept shot event.
    #[arg(long)]
    record_boards: bool,
    #[arg(long, help = "Fix RNG seed for reproducible runs (e.g., --seed 12345)")]
    seed: Option<u64>,
    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl Common {
    fn config(&self, trials_per_pair: usize) -> SimConfig {
        SimConfig {
            board_size: self.board_size,
            trials_per_pair,
            verbosity: self.verbosity.into(),
            record_boards: self.record_boards,
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play every ordered pairing of strategies against each other.
    Tournament {
        #[arg(long, default_value_t = 1)]
        trials: usize,
        /// Comma-separated strategy names; all registered strategies when omitted.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,
        #[command(flatten)]
        common: Common,
    },
    /// Play a single match on this machine.
    Match {
        #[arg(long, default_value = "hunt")]
        a: String,
        #[arg(long, default_value = "hunt")]
        b: String,
        #[command(flatten)]
        common: Common,
    },
    /// Host one match as peer A and wait for peer B to connect.
    TcpHost {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, default_value = "hunt")]
        strategy: String,
        /// Strategy name the remote peer plays, for the result record.
        #[arg(long, default_value = "hunt")]
        opponent: String,
        #[command(flatten)]
        common: Common,
    },
    /// Join a hosted match as peer B.
    TcpJoin {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[arg(long, default_value = "hunt")]
        strategy: String,
        #[command(flatten)]
        common: Common,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let registry = StrategyRegistry::with_builtin();

    match cli.command {
        Commands::Tournament {
            trials,
            strategies,
            common,
        } => {
            let orchestrator = Orchestrator::new(registry, common.config(trials));
            let pairs = if strategies.is_empty() {
                orchestrator.all_pairings()
            } else {
                strategies
                    .iter()
                    .flat_map(|a| strategies.iter().map(move |b| (a.clone(), b.clone())))
                    .collect()
            };
            let run = orchestrator.run_trials(&pairs, trials).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                print_run(&run);
            }
        }
        Commands::Match { a, b, common } => {
            let config = common.config(1);
            let result = run_session(&registry, &config, &a, &b).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::TcpHost {
            bind,
            strategy,
            opponent,
            common,
        } => {
            let config = common.config(1);
            let listener = TcpListener::bind(&bind).await?;
            println!("Waiting for peer B on {}...", bind);
            let (stream, addr) = listener.accept().await?;
            println!("Peer B connected from {}", addr);
            stream.set_nodelay(true)?;

            let side = prepare(&registry, &config, &strategy, PeerId::A)?;
            let opts = MatchOptions {
                strategy_a: strategy,
                strategy_b: opponent,
                verbosity: config.verbosity,
                record_boards: config.record_boards,
                ..MatchOptions::default()
            };
            let mut peer = Peer::new(PeerId::A, Box::new(TcpTransport::new(stream)));
            let outcome = peer.play_match(side, &opts).await?;
            match outcome.result {
                Some(result) if common.json => println!("{}", serde_json::to_string_pretty(&result)?),
                Some(result) => print_result(&result),
                None => anyhow::bail!("match ended without a result"),
            }
        }
        Commands::TcpJoin {
            connect,
            strategy,
            common,
        } => {
            let config = common.config(1);
            let transport = TcpTransport::connect(&connect).await?;
            println!("Connected to {}", connect);

            let side = prepare(&registry, &config, &strategy, PeerId::B)?;
            let opts = MatchOptions {
                strategy_b: strategy,
                verbosity: config.verbosity,
                record_boards: config.record_boards,
                ..MatchOptions::default()
            };
            let mut peer = Peer::new(PeerId::B, Box::new(transport));
            let outcome = peer.play_match(side, &opts).await?;
            let verdict = if outcome.winner == PeerId::B { "won" } else { "lost" };
            println!(
                "Peer B {} after {} half-turns ({} shots, {} hits)",
                verdict, outcome.tally.turns, outcome.tally.shots, outcome.tally.hits
            );
        }
    }
    Ok(())
}

fn prepare(registry: &StrategyRegistry, config: &SimConfig, strategy: &str, id: PeerId) -> anyhow::Result<Side> {
    Side::prepare(
        registry,
        strategy,
        config.board_size,
        &config.ship_lengths,
        broadside::peer::peer_rng(config.seed, id),
    )
}

fn print_result(result: &MatchResult) {
    for event in &result.events {
        print_event(event);
    }
    println!(
        "{} (A) vs {} (B): peer {} wins after {} half-turns in {:.3}s",
        result.strategy_a,
        result.strategy_b,
        result.winner,
        result.turns,
        result.duration.as_secs_f64()
    );
    println!(
        "  shots A={} B={}, hits A={} B={}",
        result.shots_a, result.shots_b, result.hits_a, result.hits_b
    );
}

fn print_event(event: &ShotEvent) {
    println!(
        "[turn {:>3}] peer {} fires at {} -> {:?}",
        event.turn, event.shooter, event.coord, event.outcome
    );
    if let Some(board) = &event.board {
        for row in board.cells.chunks(board.size) {
            let line: String = row
                .iter()
                .map(|c| match c {
                    CellState::Empty => " . ",
                    CellState::ShipPresent => " B ",
                    CellState::Hit => " X ",
                    CellState::Miss => " O ",
                })
                .collect();
            println!("    {}", line);
        }
    }
}

fn print_run(run: &TrialRun) {
    for result in &run.results {
        if !result.events.is_empty() {
            print_result(result);
        }
    }
    for summary in &run.summaries {
        print_summary(summary);
    }
    for failure in &run.failures {
        println!(
            "trial {} ({} vs {}) failed: {}",
            failure.trial, failure.strategy_a, failure.strategy_b, failure.reason
        );
    }

    let matrix = run.win_matrix();
    if matrix.names.len() > 1 || run.summaries.iter().any(|s| s.completed > 1) {
        println!("\nSecond-player win rate (rows: A, columns: B)");
        let width = matrix.names.iter().map(|n| n.len()).max().unwrap_or(0).max(8);
        print!("{:>width$}", "A \\ B");
        for name in &matrix.names {
            print!(" {:>width$}", name);
        }
        println!();
        for (name, row) in matrix.names.iter().zip(&matrix.rates) {
            print!("{:>width$}", name);
            for rate in row {
                match rate {
                    Some(r) => print!(" {:>width$}", format!("{r:.1}%")),
                    None => print!(" {:>width$}", "-"),
                }
            }
            println!();
        }
    }
}

fn print_summary(s: &SummaryRecord) {
    println!("{} vs {}:", s.strategy_a, s.strategy_b);
    println!(
        "  - A wins {}/{}, B wins {}/{}",
        s.wins_a, s.completed, s.wins_b, s.completed
    );
    println!("  - avg. half-turns: {:.1}", s.avg_turns);
    println!("  - avg. duration: {:.3}s", s.avg_duration_secs);
    println!(
        "  - accuracy A: {:.1}%, accuracy B: {:.1}%",
        s.accuracy_a, s.accuracy_b
    );
    println!(
        "  - shots per match: A={:.1}, B={:.1}",
        s.avg_shots_a, s.avg_shots_b
    );
    if s.failed > 0 {
        println!("  - failed trials: {}", s.failed);
    }
    println!();
}
