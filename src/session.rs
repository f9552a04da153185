//! Running a single match between two peers, each in its own task.

use log::info;

use crate::common::SessionError;
use crate::config::SimConfig;
use crate::peer::{peer_rng, MatchOptions, MatchOutcome, Peer, Side};
use crate::protocol::PeerId;
use crate::stats::MatchResult;
use crate::strategy::StrategyRegistry;
use crate::transport::{InMemoryTransport, Transport};

/// A finished match together with what each peer saw at the barriers.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub result: MatchResult,
    pub barriers_a: Vec<u32>,
    pub barriers_b: Vec<u32>,
}

/// Play one match between two registered strategies on fresh random fleets.
pub async fn run_session(
    registry: &StrategyRegistry,
    config: &SimConfig,
    strategy_a: &str,
    strategy_b: &str,
) -> anyhow::Result<MatchResult> {
    let a = Side::prepare(
        registry,
        strategy_a,
        config.board_size,
        &config.ship_lengths,
        peer_rng(config.seed, PeerId::A),
    )?;
    let b = Side::prepare(
        registry,
        strategy_b,
        config.board_size,
        &config.ship_lengths,
        peer_rng(config.seed, PeerId::B),
    )?;
    let opts = MatchOptions {
        trial: 0,
        strategy_a: strategy_a.to_string(),
        strategy_b: strategy_b.to_string(),
        verbosity: config.verbosity,
        record_boards: config.record_boards,
    };
    let report = run_session_with(a, b, opts).await?;
    info!(
        "{} vs {}: {} wins after {} half-turns",
        strategy_a,
        strategy_b,
        report.result.strategy(report.result.winner),
        report.result.turns
    );
    Ok(report.result)
}

/// Play one match between two prepared sides over an in-process link.
pub async fn run_session_with(a: Side, b: Side, opts: MatchOptions) -> anyhow::Result<SessionReport> {
    let (link_a, link_b) = InMemoryTransport::pair();
    run_session_over(a, b, Box::new(link_a), Box::new(link_b), opts).await
}

/// Play one match over caller-supplied links, e.g. the two ends of a TCP
/// connection.
pub async fn run_session_over(
    a: Side,
    b: Side,
    link_a: Box<dyn Transport>,
    link_b: Box<dyn Transport>,
    opts: MatchOptions,
) -> anyhow::Result<SessionReport> {
    let opts_b = opts.clone();
    let task_a = tokio::spawn(async move {
        let mut peer = Peer::new(PeerId::A, link_a);
        peer.play_match(a, &opts).await
    });
    let task_b = tokio::spawn(async move {
        let mut peer = Peer::new(PeerId::B, link_b);
        peer.play_match(b, &opts_b).await
    });
    let (joined_a, joined_b) = tokio::join!(task_a, task_b);
    let (oa, ob) = settle(joined_a?, joined_b?)?;

    if oa.winner != ob.winner {
        return Err(SessionError::StatsMismatch(format!(
            "peer A saw {} win, peer B saw {} win",
            oa.winner, ob.winner
        ))
        .into());
    }
    let result = oa
        .result
        .ok_or_else(|| anyhow::anyhow!("authoritative peer returned no result"))?;
    Ok(SessionReport {
        result,
        barriers_a: oa.barrier_turns,
        barriers_b: ob.barrier_turns,
    })
}

/// Pick the error that caused a failed match. When one peer breaks the
/// protocol the other only sees its link close, so a closed channel is the
/// least informative error.
fn settle(
    a: anyhow::Result<MatchOutcome>,
    b: anyhow::Result<MatchOutcome>,
) -> anyhow::Result<(MatchOutcome, MatchOutcome)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(ea), Err(eb)) => {
            if is_closed(&ea) && !is_closed(&eb) {
                Err(eb)
            } else {
                Err(ea)
            }
        }
    }
}

pub(crate) fn is_closed(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<SessionError>(),
        Some(SessionError::ChannelClosed(_))
    )
}
