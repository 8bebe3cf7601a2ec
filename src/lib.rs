//! Parlay - Wagering Game Engine
//!
//! Round state machines for five chance-based games (dice, crash, plinko,
//! mines, roulette), a fixed-point session ledger, and an autoplay
//! orchestrator, wired together behind one command-in/event-out engine.
//! Rendering, navigation and real chain connectivity live elsewhere; the
//! engine only emits events and notifies a mocked ledger-recording sink.

pub mod autoplay;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod games;
pub mod ledger;
pub mod money;
pub mod rng;

pub use autoplay::{AutoplayHandle, AutoplayPlan, AutoplayReport, StopReason};
pub use config::EngineConfig;
pub use engine::{CrashProgress, GameEngine, MinesProgress};
pub use errors::{EngineError, EngineResult};
pub use events::{ChainRecorder, EngineEvent, MockChainRecorder};
pub use games::types::{
    CrashConfig, DiceConfig, DiceDirection, GameKind, MinesConfig, Outcome, PlinkoConfig,
    PlinkoTier, RoundConfig, RoundPhase, RouletteBet, RouletteConfig, RouletteWager,
};
pub use ledger::{LedgerSnapshot, SessionLedger, SessionStats};
pub use money::Amount;
pub use rng::DrawRng;
