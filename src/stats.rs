//! Match records and the per-pairing aggregates built from them.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::BoardSnapshot;
use crate::common::{Coord, ShotOutcome};
use crate::config::Verbosity;
use crate::protocol::PeerId;

/// One shot as seen by the peer that absorbed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotEvent {
    pub turn: u32,
    pub shooter: PeerId,
    pub coord: Coord,
    pub outcome: ShotOutcome,
    /// Receiving board right after the shot, when boards are recorded.
    pub board: Option<BoardSnapshot>,
}

/// Decides which absorbed shots end up in the event log.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    verbosity: Verbosity,
    after_sink: bool,
    hunting: bool,
}

impl EventFilter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            after_sink: false,
            hunting: false,
        }
    }

    /// Whether the shot absorbed on `turn` with `outcome` is kept. Must be
    /// called for every absorbed shot, kept or not, in turn order.
    pub fn keep(&mut self, turn: u32, outcome: ShotOutcome) -> bool {
        let keep = match self.verbosity {
            Verbosity::All => true,
            Verbosity::Silent => false,
            Verbosity::HitsOnly => turn < 2 || outcome.is_hit() || self.after_sink || self.hunting,
        };
        self.after_sink = outcome.is_sink();
        match outcome {
            ShotOutcome::Hit => self.hunting = true,
            ShotOutcome::Sunk | ShotOutcome::FleetDestroyed => self.hunting = false,
            ShotOutcome::Miss => {}
        }
        keep
    }
}

/// Outcome of one completed match. Built once by the authoritative peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub trial: usize,
    pub strategy_a: String,
    pub strategy_b: String,
    pub winner: PeerId,
    /// Half-turns played, i.e. the final value of the shared turn counter.
    /// Both peers' shots count here; use [`MatchResult::rounds`] for the
    /// number of shots the winner needed.
    pub turns: u32,
    pub shots_a: u32,
    pub hits_a: u32,
    pub shots_b: u32,
    pub hits_b: u32,
    pub duration: Duration,
    /// Kept shot events from both boards, in turn order.
    pub events: Vec<ShotEvent>,
}

impl MatchResult {
    pub fn strategy(&self, peer: PeerId) -> &str {
        match peer {
            PeerId::A => &self.strategy_a,
            PeerId::B => &self.strategy_b,
        }
    }

    pub fn shots(&self, peer: PeerId) -> u32 {
        match peer {
            PeerId::A => self.shots_a,
            PeerId::B => self.shots_b,
        }
    }

    pub fn hits(&self, peer: PeerId) -> u32 {
        match peer {
            PeerId::A => self.hits_a,
            PeerId::B => self.hits_b,
        }
    }

    /// Full turns taken by the winner, which equals the winner's shot count.
    pub fn rounds(&self) -> u32 {
        self.shots(self.winner)
    }
}

/// A trial that did not complete. Excluded from every aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub trial: usize,
    pub strategy_a: String,
    pub strategy_b: String,
    pub reason: String,
}

/// Running totals for one ordered strategy pairing.
#[derive(Debug, Clone, Default)]
pub struct PairTally {
    strategy_a: String,
    strategy_b: String,
    completed: usize,
    failed: usize,
    wins_a: usize,
    wins_b: usize,
    turns: u64,
    duration: Duration,
    shots_a: u64,
    hits_a: u64,
    shots_b: u64,
    hits_b: u64,
}

impl PairTally {
    pub fn new(strategy_a: impl Into<String>, strategy_b: impl Into<String>) -> Self {
        Self {
            strategy_a: strategy_a.into(),
            strategy_b: strategy_b.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: &MatchResult) {
        self.completed += 1;
        match result.winner {
            PeerId::A => self.wins_a += 1,
            PeerId::B => self.wins_b += 1,
        }
        self.turns += u64::from(result.turns);
        self.duration += result.duration;
        self.shots_a += u64::from(result.shots_a);
        self.hits_a += u64::from(result.hits_a);
        self.shots_b += u64::from(result.shots_b);
        self.hits_b += u64::from(result.hits_b);
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Freeze the totals into averages.
    pub fn finish(self) -> SummaryRecord {
        let n = self.completed;
        let avg = |total: f64| if n == 0 { 0.0 } else { total / n as f64 };
        let pct = |part: f64, whole: f64| if whole == 0.0 { 0.0 } else { part / whole * 100.0 };
        SummaryRecord {
            win_rate_a: pct(self.wins_a as f64, n as f64),
            win_rate_b: pct(self.wins_b as f64, n as f64),
            avg_turns: avg(self.turns as f64),
            avg_duration_secs: avg(self.duration.as_secs_f64()),
            avg_shots_a: avg(self.shots_a as f64),
            avg_shots_b: avg(self.shots_b as f64),
            avg_hits_a: avg(self.hits_a as f64),
            avg_hits_b: avg(self.hits_b as f64),
            accuracy_a: pct(self.hits_a as f64, self.shots_a as f64),
            accuracy_b: pct(self.hits_b as f64, self.shots_b as f64),
            strategy_a: self.strategy_a,
            strategy_b: self.strategy_b,
            completed: n,
            failed: self.failed,
            wins_a: self.wins_a,
            wins_b: self.wins_b,
        }
    }
}

/// Aggregate over every completed trial of one ordered pairing.
/// Rates and accuracies are percentages in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub strategy_a: String,
    pub strategy_b: String,
    pub completed: usize,
    pub failed: usize,
    pub wins_a: usize,
    pub wins_b: usize,
    pub win_rate_a: f64,
    pub win_rate_b: f64,
    pub avg_turns: f64,
    pub avg_duration_secs: f64,
    pub avg_shots_a: f64,
    pub avg_shots_b: f64,
    pub avg_hits_a: f64,
    pub avg_hits_b: f64,
    pub accuracy_a: f64,
    pub accuracy_b: f64,
}

/// Second-player win rates, rows indexed by the first player's strategy and
/// columns by the second's. Pairings that never ran are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinMatrix {
    pub names: Vec<String>,
    pub rates: Vec<Vec<Option<f64>>>,
}

impl WinMatrix {
    pub fn get(&self, strategy_a: &str, strategy_b: &str) -> Option<f64> {
        let row = self.names.iter().position(|n| n == strategy_a)?;
        let col = self.names.iter().position(|n| n == strategy_b)?;
        self.rates[row][col]
    }
}

pub fn win_matrix(summaries: &[SummaryRecord]) -> WinMatrix {
    let mut index = BTreeMap::new();
    for s in summaries {
        index.insert(s.strategy_a.clone(), 0);
        index.insert(s.strategy_b.clone(), 0);
    }
    for (i, slot) in index.values_mut().enumerate() {
        *slot = i;
    }
    let mut rates = vec![vec![None; index.len()]; index.len()];
    for s in summaries {
        if s.completed > 0 {
            rates[index[&s.strategy_a]][index[&s.strategy_b]] = Some(s.win_rate_b);
        }
    }
    WinMatrix {
        names: index.into_keys().collect(),
        rates,
    }
}
