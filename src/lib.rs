mod bitboard;
mod board;
mod common;
mod config;
mod fleet;
mod logging;
pub mod orchestrator;
pub mod peer;
pub mod protocol;
pub mod session;
mod ship;
pub mod stats;
pub mod strategy;
pub mod transport;

pub use bitboard::BitBoard;
pub use board::*;
pub use common::*;
pub use config::*;
pub use fleet::*;
pub use logging::{init_logging, LOG_ENV};
pub use orchestrator::{Orchestrator, TrialRun};
pub use peer::{MatchOptions, MatchOutcome, Peer, Side};
pub use protocol::*;
pub use session::{run_session, run_session_over, run_session_with, SessionReport};
pub use ship::*;
pub use stats::*;
pub use strategy::{Mode, Strategy, StrategyRegistry};
pub use transport::{InMemoryTransport, TcpTransport, Transport};
