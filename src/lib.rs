//! Suzerain adjudication core.
//!
//! Exposes the map/rules engine, order validation, turn adjudication, the
//! turn/phase state machine, the persistence seam, and the orchestrating
//! game service for use by integration tests and embedding servers.

pub mod error;
pub mod game;
pub mod phase;
pub mod resolve;
pub mod rules;
pub mod service;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
pub use game::{
    Game, GameStatus, Order, OrderKind, OrderResult, OrderStatus, Outcome, Phase, Player,
    PlayerStatus, Season, Turn, TurnStatus, Unit, UnitKind,
};
pub use rules::{load_rules, Rules};
pub use service::{Conflict, GameService, OrderDraft};
pub use store::{MemoryStore, Store};
