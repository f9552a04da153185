//! One side of a match: a board, a fleet and a strategy driven over a
//! transport to the partner peer.
//!
//! Per half-turn the shooter asks its strategy for a cell and sends a
//! `ShotRequest`; the receiver applies it to its board and answers with a
//! `ShotOutcome`; then both meet at the turn barrier. At the barrier peer
//! `A` sends the incremented counter as `TurnSync` and waits for `B` to
//! echo it, so neither peer starts the next half-turn until both agree on
//! its number. Any message carrying the wrong turn or cell ends the match
//! with [`SessionError::ProtocolDesynchronization`].

use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::board::Board;
use crate::common::{Coord, SessionError, ShotOutcome};
use crate::config::Verbosity;
use crate::fleet::place_fleet;
use crate::protocol::{Assignment, Message, MessageKind, PeerId, PeerTally, Report, ReportStatus};
use crate::session::is_closed;
use crate::stats::{EventFilter, MatchResult, ShotEvent};
use crate::strategy::{Strategy, StrategyRegistry};
use crate::transport::Transport;

/// Everything one peer owns for the duration of a match.
pub struct Side {
    pub board: Board,
    pub strategy: Box<dyn Strategy>,
    pub rng: SmallRng,
}

impl Side {
    /// Place a fresh random fleet and instantiate the named strategy.
    pub fn prepare(
        registry: &StrategyRegistry,
        strategy: &str,
        board_size: usize,
        ship_lengths: &[usize],
        mut rng: SmallRng,
    ) -> anyhow::Result<Self> {
        let fleet = place_fleet(&mut rng, board_size, ship_lengths)?;
        let board = Board::new(board_size, fleet)?;
        let strategy = registry.create(strategy, board_size)?;
        Ok(Self { board, strategy, rng })
    }
}

/// Per-match settings shared by both peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    pub trial: usize,
    pub strategy_a: String,
    pub strategy_b: String,
    pub verbosity: Verbosity,
    pub record_boards: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            trial: 0,
            strategy_a: String::new(),
            strategy_b: String::new(),
            verbosity: Verbosity::Silent,
            record_boards: false,
        }
    }
}

impl From<&Assignment> for MatchOptions {
    fn from(a: &Assignment) -> Self {
        Self {
            trial: a.trial,
            strategy_a: a.strategy_a.clone(),
            strategy_b: a.strategy_b.clone(),
            verbosity: a.verbosity,
            record_boards: a.record_boards,
        }
    }
}

/// What [`Peer::play_match`] hands back.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub winner: PeerId,
    pub tally: PeerTally,
    /// Counter value this peer observed after each barrier.
    pub barrier_turns: Vec<u32>,
    /// Present on the authoritative peer only.
    pub result: Option<MatchResult>,
}

pub struct Peer {
    id: PeerId,
    partner: Box<dyn Transport>,
}

impl Peer {
    pub fn new(id: PeerId, partner: Box<dyn Transport>) -> Self {
        Self { id, partner }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Play one match to the end. Returns only once a fleet is destroyed or
    /// the protocol breaks down.
    pub async fn play_match(&mut self, mut side: Side, opts: &MatchOptions) -> anyhow::Result<MatchOutcome> {
        let started = Instant::now();
        let mut turn: u32 = 0;
        let mut tally = PeerTally::default();
        let mut filter = EventFilter::new(opts.verbosity);
        let mut barrier_turns = Vec::new();

        let winner = loop {
            let shooter = PeerId::shooter_for(turn);
            let outcome = if shooter == self.id {
                self.fire(turn, &mut side, &mut tally).await?
            } else {
                self.absorb(turn, &mut side, &mut filter, &mut tally, opts).await?
            };

            turn = self.barrier(turn + 1).await?;
            tally.barriers += 1;
            barrier_turns.push(turn);

            if outcome == ShotOutcome::FleetDestroyed {
                break shooter;
            }
        };
        tally.turns = turn;

        let result = if self.id.is_authoritative() {
            Some(self.collect(winner, &tally, started, opts).await?)
        } else {
            self.partner.send(Message::Tally(tally.clone())).await?;
            None
        };
        debug!(
            "[Peer {}] trial {} over after {} half-turns, winner {}",
            self.id, opts.trial, turn, winner
        );
        Ok(MatchOutcome {
            winner,
            tally,
            barrier_turns,
            result,
        })
    }

    async fn fire(&mut self, turn: u32, side: &mut Side, tally: &mut PeerTally) -> anyhow::Result<ShotOutcome> {
        let coord = side.strategy.next_shot(&mut side.rng)?;
        self.partner.send(Message::ShotRequest { turn, coord }).await?;

        let outcome = match self.partner.recv(MessageKind::ShotOutcome).await? {
            Message::ShotOutcome {
                turn: t,
                coord: c,
                outcome,
            } if t == turn && c == coord => outcome,
            Message::ShotOutcome { turn: t, coord: c, .. } => {
                warn!("[Peer {}] outcome for turn {} at {}, fired {} on turn {}", self.id, t, c, coord, turn);
                return Err(SessionError::desync(
                    format!("outcome for {coord} on turn {turn}"),
                    format!("outcome for {c} on turn {t}"),
                )
                .into());
            }
            other => return Err(SessionError::desync(MessageKind::ShotOutcome, other.kind()).into()),
        };

        side.strategy.record_result(coord, outcome);
        tally.shots += 1;
        if outcome.is_hit() {
            tally.hits += 1;
        }
        debug!(
            "[Peer {}] turn {}: fired {} -> {:?} ({:?})",
            self.id,
            turn,
            coord,
            outcome,
            side.strategy.mode()
        );
        Ok(outcome)
    }

    async fn absorb(
        &mut self,
        turn: u32,
        side: &mut Side,
        filter: &mut EventFilter,
        tally: &mut PeerTally,
        opts: &MatchOptions,
    ) -> anyhow::Result<ShotOutcome> {
        let coord = match self.partner.recv(MessageKind::ShotRequest).await? {
            Message::ShotRequest { turn: t, coord } if t == turn => coord,
            Message::ShotRequest { turn: t, .. } => {
                warn!("[Peer {}] shot request for turn {} while on turn {}", self.id, t, turn);
                return Err(SessionError::desync(format!("shot on turn {turn}"), format!("shot on turn {t}")).into());
            }
            other => return Err(SessionError::desync(MessageKind::ShotRequest, other.kind()).into()),
        };

        let outcome = side.board.receive_shot(coord)?;
        if filter.keep(turn, outcome) {
            tally.events.push(event(turn, self.id.other(), coord, outcome, &side.board, opts));
        }
        self.partner
            .send(Message::ShotOutcome { turn, coord, outcome })
            .await?;
        Ok(outcome)
    }

    /// Advance the shared counter to `next`. Returns the agreed value.
    async fn barrier(&mut self, next: u32) -> anyhow::Result<u32> {
        if self.id.is_authoritative() {
            self.partner.send(Message::TurnSync { turn: next }).await?;
            match self.partner.recv(MessageKind::TurnSync).await? {
                Message::TurnSync { turn } if turn == next => Ok(turn),
                Message::TurnSync { turn } => Err(SessionError::desync(
                    format!("turn sync echo {next}"),
                    format!("turn sync echo {turn}"),
                )
                .into()),
                other => Err(SessionError::desync(MessageKind::TurnSync, other.kind()).into()),
            }
        } else {
            match self.partner.recv(MessageKind::TurnSync).await? {
                Message::TurnSync { turn } if turn == next => {
                    self.partner.send(Message::TurnSync { turn }).await?;
                    Ok(turn)
                }
                Message::TurnSync { turn } => {
                    warn!("[Peer {}] turn sync {} while expecting {}", self.id, turn, next);
                    Err(SessionError::desync(format!("turn sync {next}"), format!("turn sync {turn}")).into())
                }
                other => Err(SessionError::desync(MessageKind::TurnSync, other.kind()).into()),
            }
        }
    }

    /// Merge the partner's tally into the final result.
    async fn collect(
        &mut self,
        winner: PeerId,
        own: &PeerTally,
        started: Instant,
        opts: &MatchOptions,
    ) -> anyhow::Result<MatchResult> {
        let remote = match self.partner.recv(MessageKind::Tally).await? {
            Message::Tally(t) => t,
            other => return Err(SessionError::desync(MessageKind::Tally, other.kind()).into()),
        };
        if remote.turns != own.turns || remote.barriers != own.barriers {
            return Err(SessionError::StatsMismatch(format!(
                "turns {} vs {}, barriers {} vs {}",
                own.turns, remote.turns, own.barriers, remote.barriers
            ))
            .into());
        }
        if own.shots + remote.shots != own.turns {
            return Err(SessionError::StatsMismatch(format!(
                "{} + {} shots over {} half-turns",
                own.shots, remote.shots, own.turns
            ))
            .into());
        }

        let mut events = own.events.clone();
        events.extend(remote.events);
        events.sort_by_key(|e| e.turn);

        Ok(MatchResult {
            trial: opts.trial,
            strategy_a: opts.strategy_a.clone(),
            strategy_b: opts.strategy_b.clone(),
            winner,
            turns: own.turns,
            shots_a: own.shots,
            hits_a: own.hits,
            shots_b: remote.shots,
            hits_b: remote.hits,
            duration: started.elapsed(),
            events,
        })
    }

    /// Serve assignments from the coordinator until told to stop.
    ///
    /// A match that fails is reported as aborted and ends the loop; the
    /// partner link is dropped with it so the partner cannot stay blocked.
    pub async fn serve(mut self, mut coordinator: Box<dyn Transport>, registry: StrategyRegistry) -> anyhow::Result<()> {
        loop {
            let assignment = match coordinator.recv_any(&[MessageKind::Assign, MessageKind::Stop]).await? {
                Message::Assign(a) => a,
                Message::Stop => {
                    debug!("[Peer {}] stop received", self.id);
                    return Ok(());
                }
                other => return Err(SessionError::desync(MessageKind::Assign, other.kind()).into()),
            };
            let trial = assignment.trial;

            match self.run_assignment(&assignment, &registry).await {
                Ok(outcome) => {
                    let report = Report {
                        trial,
                        peer: self.id,
                        status: ReportStatus::Completed(outcome.result),
                    };
                    coordinator.send(Message::Report(report)).await?;
                }
                Err(e) => {
                    warn!("[Peer {}] trial {} aborted: {:#}", self.id, trial, e);
                    let report = Report {
                        trial,
                        peer: self.id,
                        status: ReportStatus::Aborted {
                            reason: format!("{e:#}"),
                            partner_lost: is_closed(&e),
                        },
                    };
                    // the coordinator may already be gone
                    let _ = coordinator.send(Message::Report(report)).await;
                    return Err(e);
                }
            }
        }
    }

    async fn run_assignment(&mut self, a: &Assignment, registry: &StrategyRegistry) -> anyhow::Result<MatchOutcome> {
        let rng = peer_rng(a.seed, self.id);
        let side = Side::prepare(registry, a.strategy_for(self.id), a.board_size, &a.ship_lengths, rng)?;
        if self.id.is_authoritative() {
            info!(
                "trial {}: {} vs {} on {}x{}",
                a.trial, a.strategy_a, a.strategy_b, a.board_size, a.board_size
            );
        }
        self.play_match(side, &MatchOptions::from(a)).await
    }
}

fn event(turn: u32, shooter: PeerId, coord: Coord, outcome: ShotOutcome, board: &Board, opts: &MatchOptions) -> ShotEvent {
    ShotEvent {
        turn,
        shooter,
        coord,
        outcome,
        board: opts.record_boards.then(|| board.snapshot()),
    }
}

/// RNG for one peer. A fixed seed gives the two peers distinct streams.
pub fn peer_rng(seed: Option<u64>, id: PeerId) -> SmallRng {
    match (seed, id) {
        (Some(seed), PeerId::A) => SmallRng::seed_from_u64(seed),
        (Some(seed), PeerId::B) => SmallRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
        (None, _) => SmallRng::from_rng(&mut rand::rng()),
    }
}
