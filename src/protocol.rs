//! Messages exchanged between the two peers of a match and between each
//! peer and the coordinator.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Coord, ShotOutcome};
use crate::config::Verbosity;
use crate::stats::{MatchResult, ShotEvent};

/// The two seats of a match. `A` shoots on even turns and owns the turn
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerId {
    A,
    B,
}

impl PeerId {
    /// Peer that fires on `turn`.
    pub fn shooter_for(turn: u32) -> Self {
        if turn % 2 == 0 {
            PeerId::A
        } else {
            PeerId::B
        }
    }

    pub fn other(self) -> Self {
        match self {
            PeerId::A => PeerId::B,
            PeerId::B => PeerId::A,
        }
    }

    /// Whether this peer owns the turn counter.
    pub fn is_authoritative(self) -> bool {
        self == PeerId::A
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerId::A => f.write_str("A"),
            PeerId::B => f.write_str("B"),
        }
    }
}

/// Work order sent by the coordinator to both peers before each trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub trial: usize,
    pub strategy_a: String,
    pub strategy_b: String,
    pub board_size: usize,
    pub ship_lengths: Vec<usize>,
    pub verbosity: Verbosity,
    pub record_boards: bool,
    pub seed: Option<u64>,
}

impl Assignment {
    pub fn strategy_for(&self, peer: PeerId) -> &str {
        match peer {
            PeerId::A => &self.strategy_a,
            PeerId::B => &self.strategy_b,
        }
    }
}

/// What a peer observed over one match. The non-authoritative peer sends
/// its tally to the authoritative one once the fleet is destroyed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerTally {
    pub shots: u32,
    pub hits: u32,
    /// Turn counter after the last barrier.
    pub turns: u32,
    pub barriers: u32,
    pub events: Vec<ShotEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// The match finished. Only the authoritative peer carries the result.
    Completed(Option<MatchResult>),
    Aborted {
        reason: String,
        /// The failure was only the partner's link closing.
        partner_lost: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub trial: usize,
    pub peer: PeerId,
    pub status: ReportStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Coordinator → peer: play one match.
    Assign(Assignment),
    /// Shooter → receiver.
    ShotRequest { turn: u32, coord: Coord },
    /// Receiver → shooter.
    ShotOutcome {
        turn: u32,
        coord: Coord,
        outcome: ShotOutcome,
    },
    /// Turn counter barrier. Sent by the authoritative peer after every
    /// half-turn and echoed back by its partner.
    TurnSync { turn: u32 },
    /// Final per-peer counters and events.
    Tally(PeerTally),
    /// Peer → coordinator after every assignment.
    Report(Report),
    /// Coordinator → peer: leave the serve loop.
    Stop,
}

/// Logical channel a message travels on. Each kind is its own FIFO lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Assign,
    ShotRequest,
    ShotOutcome,
    TurnSync,
    Tally,
    Report,
    Stop,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::Assign,
        MessageKind::ShotRequest,
        MessageKind::ShotOutcome,
        MessageKind::TurnSync,
        MessageKind::Tally,
        MessageKind::Report,
        MessageKind::Stop,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Assign => "assign",
            MessageKind::ShotRequest => "shot-request",
            MessageKind::ShotOutcome => "shot-outcome",
            MessageKind::TurnSync => "turn-sync",
            MessageKind::Tally => "tally",
            MessageKind::Report => "report",
            MessageKind::Stop => "stop",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Assign(_) => MessageKind::Assign,
            Message::ShotRequest { .. } => MessageKind::ShotRequest,
            Message::ShotOutcome { .. } => MessageKind::ShotOutcome,
            Message::TurnSync { .. } => MessageKind::TurnSync,
            Message::Tally(_) => MessageKind::Tally,
            Message::Report(_) => MessageKind::Report,
            Message::Stop => MessageKind::Stop,
        }
    }
}
