//! The coordinating role: hands trials to a pair of peer tasks and folds
//! their reports into per-pairing summaries.
//!
//! The two peers and the coordinator only ever talk through transports.
//! Each trial starts with an `Assign` to both peers and ends with a
//! `Report` from each. A trial that fails is recorded and skipped; since a
//! failed match leaves its peers without a partner, the coordinator
//! replaces the pair before the next trial. `Stop` is sent once all
//! trials are done.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::common::{SessionError, StrategyError};
use crate::config::SimConfig;
use crate::peer::Peer;
use crate::protocol::{Assignment, Message, MessageKind, PeerId, Report, ReportStatus};
use crate::stats::{win_matrix, MatchResult, PairTally, SummaryRecord, TrialFailure, WinMatrix};
use crate::strategy::StrategyRegistry;
use crate::transport::{InMemoryTransport, Transport};

/// How long a retired peer may take to honor `Stop`.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Everything a batch of trials produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialRun {
    pub results: Vec<MatchResult>,
    pub failures: Vec<TrialFailure>,
    /// One record per pairing, in the order the pairings were run.
    pub summaries: Vec<SummaryRecord>,
}

impl TrialRun {
    pub fn win_matrix(&self) -> WinMatrix {
        win_matrix(&self.summaries)
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: StrategyRegistry,
    config: SimConfig,
}

impl Orchestrator {
    pub fn new(registry: StrategyRegistry, config: SimConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Every ordered pair of registered strategies, self-pairings included.
    pub fn all_pairings(&self) -> Vec<(String, String)> {
        let names = self.registry.names();
        names
            .iter()
            .flat_map(|a| names.iter().map(move |b| (a.clone(), b.clone())))
            .collect()
    }

    /// Run every pairing for the configured number of trials.
    pub async fn run(&self) -> anyhow::Result<TrialRun> {
        self.run_trials(&self.all_pairings(), self.config.trials_per_pair)
            .await
    }

    /// Run `trials_per_pair` matches for each pairing in `pairs`.
    ///
    /// Unknown strategy names are rejected up front. Past that point a
    /// failing trial never aborts the run.
    pub async fn run_trials(&self, pairs: &[(String, String)], trials_per_pair: usize) -> anyhow::Result<TrialRun> {
        for name in pairs.iter().flat_map(|(a, b)| [a, b]) {
            if !self.registry.contains(name) {
                return Err(StrategyError::UnknownStrategy(name.clone()).into());
            }
        }

        let mut run = TrialRun::default();
        let mut peers = PeerPair::spawn(&self.registry);
        let mut trial = 0;

        for (strategy_a, strategy_b) in pairs {
            info!(
                "pairing {} vs {}: {} trials",
                strategy_a, strategy_b, trials_per_pair
            );
            let mut tally = PairTally::new(strategy_a.as_str(), strategy_b.as_str());
            for _ in 0..trials_per_pair {
                let assignment = self.assignment(trial, strategy_a, strategy_b);
                match peers.play(assignment).await {
                    Ok(result) => {
                        tally.record(&result);
                        run.results.push(result);
                    }
                    Err(reason) => {
                        warn!(
                            "trial {} ({} vs {}) failed: {}",
                            trial, strategy_a, strategy_b, reason
                        );
                        tally.record_failure();
                        run.failures.push(TrialFailure {
                            trial,
                            strategy_a: strategy_a.clone(),
                            strategy_b: strategy_b.clone(),
                            reason,
                        });
                        std::mem::replace(&mut peers, PeerPair::spawn(&self.registry))
                            .abandon()
                            .await;
                    }
                }
                trial += 1;
            }
            let summary = tally.finish();
            info!(
                "pairing {} vs {} done: {}/{} wins, {} failed",
                summary.strategy_a, summary.strategy_b, summary.wins_a, summary.wins_b, summary.failed
            );
            run.summaries.push(summary);
        }

        peers.stop().await;
        Ok(run)
    }

    fn assignment(&self, trial: usize, strategy_a: &str, strategy_b: &str) -> Assignment {
        Assignment {
            trial,
            strategy_a: strategy_a.to_string(),
            strategy_b: strategy_b.to_string(),
            board_size: self.config.board_size,
            ship_lengths: self.config.ship_lengths.clone(),
            verbosity: self.config.verbosity,
            record_boards: self.config.record_boards,
            seed: self.config.seed.map(|s| s.wrapping_add(trial as u64)),
        }
    }
}

/// Coordinator-side handles to two serving peers.
struct PeerPair {
    control_a: Box<dyn Transport>,
    control_b: Box<dyn Transport>,
    tasks: Vec<JoinHandle<anyhow::Result<()>>>,
}

impl PeerPair {
    fn spawn(registry: &StrategyRegistry) -> Self {
        let (link_a, link_b) = InMemoryTransport::pair();
        let (control_a, serve_a) = InMemoryTransport::pair();
        let (control_b, serve_b) = InMemoryTransport::pair();
        let peer_a = Peer::new(PeerId::A, Box::new(link_a));
        let peer_b = Peer::new(PeerId::B, Box::new(link_b));
        let tasks = vec![
            tokio::spawn(peer_a.serve(Box::new(serve_a), registry.clone())),
            tokio::spawn(peer_b.serve(Box::new(serve_b), registry.clone())),
        ];
        Self {
            control_a: Box::new(control_a),
            control_b: Box::new(control_b),
            tasks,
        }
    }

    /// Run one trial. A failure comes back as a human-readable reason.
    async fn play(&mut self, assignment: Assignment) -> Result<MatchResult, String> {
        let trial = assignment.trial;
        let sent = async {
            self.control_a.send(Message::Assign(assignment.clone())).await?;
            self.control_b.send(Message::Assign(assignment)).await
        };
        if let Err(e) = sent.await {
            return Err(format!("could not assign trial: {e:#}"));
        }

        let report_a = report(self.control_a.as_mut(), trial).await;
        let report_b = report(self.control_b.as_mut(), trial).await;
        match (report_a, report_b) {
            (Ok(ReportStatus::Completed(Some(result))), Ok(ReportStatus::Completed(_))) => Ok(result),
            (Ok(ReportStatus::Completed(None)), Ok(ReportStatus::Completed(_))) => {
                Err("authoritative peer reported no result".to_string())
            }
            (a, b) => Err(failure_reason(a, b)),
        }
    }

    /// Send `Stop` to both peers and wait for them to leave.
    async fn stop(mut self) {
        let _ = self.control_a.send(Message::Stop).await;
        let _ = self.control_b.send(Message::Stop).await;
        for task in self.tasks.drain(..) {
            if let Ok(Err(e)) = task.await {
                warn!("peer exited with error: {:#}", e);
            }
        }
    }

    /// Retire a pair after a failed trial. Peers still serving get `Stop`;
    /// any task that has not finished within the grace period is aborted.
    /// Returns how many peers left their serve loop cleanly.
    async fn abandon(mut self) -> usize {
        let _ = self.control_a.send(Message::Stop).await;
        let _ = self.control_b.send(Message::Stop).await;
        let mut stopped = 0;
        for mut task in self.tasks.drain(..) {
            match timeout(STOP_GRACE, &mut task).await {
                Ok(Ok(Ok(()))) => stopped += 1,
                Ok(_) => {}
                Err(_) => task.abort(),
            }
        }
        stopped
    }
}

async fn report(control: &mut dyn Transport, trial: usize) -> anyhow::Result<ReportStatus> {
    match control.recv(MessageKind::Report).await? {
        Message::Report(Report {
            trial: t, status, ..
        }) if t == trial => Ok(status),
        Message::Report(Report { trial: t, .. }) => Err(SessionError::desync(
            format!("report for trial {trial}"),
            format!("report for trial {t}"),
        )
        .into()),
        other => Err(SessionError::desync(MessageKind::Report, other.kind()).into()),
    }
}

/// Prefer the report that names the actual fault over one that only saw
/// its partner disappear.
fn failure_reason(a: anyhow::Result<ReportStatus>, b: anyhow::Result<ReportStatus>) -> String {
    let describe = |peer: PeerId, r: anyhow::Result<ReportStatus>| match r {
        Ok(ReportStatus::Aborted { reason, partner_lost }) => Some((partner_lost, format!("peer {peer}: {reason}"))),
        Ok(ReportStatus::Completed(_)) => None,
        Err(e) => Some((true, format!("peer {peer} vanished: {e:#}"))),
    };
    let mut reasons: Vec<(bool, String)> = [describe(PeerId::A, a), describe(PeerId::B, b)]
        .into_iter()
        .flatten()
        .collect();
    reasons.sort_by_key(|(secondary, _)| *secondary);
    reasons
        .into_iter()
        .next()
        .map(|(_, reason)| reason)
        .unwrap_or_else(|| "trial failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairings_are_ordered_and_include_self_play() {
        let mut registry = StrategyRegistry::new();
        registry.register("x", |n| Box::new(crate::strategy::RandomStrategy::new(n)));
        registry.register("y", |n| Box::new(crate::strategy::RandomStrategy::new(n)));
        let o = Orchestrator::new(registry, SimConfig::default());
        let pairs = o.all_pairings();
        let expected: Vec<(String, String)> = [("x", "x"), ("x", "y"), ("y", "x"), ("y", "y")]
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert_eq!(pairs, expected);
    }

    #[tokio::test]
    async fn retired_pair_is_stopped_not_killed() {
        let peers = PeerPair::spawn(&StrategyRegistry::with_builtin());
        assert_eq!(peers.abandon().await, 2);
    }

    #[test]
    fn root_cause_wins_over_lost_partner() {
        let a = Ok(ReportStatus::Aborted {
            reason: "partner closed the turn-sync channel".into(),
            partner_lost: true,
        });
        let b = Ok(ReportStatus::Aborted {
            reason: "protocol desynchronization".into(),
            partner_lost: false,
        });
        assert_eq!(failure_reason(a, b), "peer B: protocol desynchronization");
    }

    #[test]
    fn assignments_derive_distinct_seeds() {
        let config = SimConfig {
            seed: Some(10),
            ..SimConfig::default()
        };
        let o = Orchestrator::new(StrategyRegistry::with_builtin(), config);
        assert_eq!(o.assignment(0, "hunt", "random").seed, Some(10));
        assert_eq!(o.assignment(3, "hunt", "random").seed, Some(13));
        assert_eq!(o.assignment(3, "hunt", "random").strategy_for(PeerId::B), "random");
    }
}
