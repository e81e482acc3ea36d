//! Persisted game data model.
//!
//! Games, players, units, orders, turns, and per-order resolution results.
//! Every record derives `Serialize`/`Deserialize`; the transport layer is
//! responsible for putting them on the wire, this crate only hands over
//! in-memory values. String enum representations match the persisted wire
//! values (`"army"`, `"spring"`, `"civil_disorder"`, ...).

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Lifecycle of a game: forming (accepting players), active, completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Forming,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Eliminated,
    CivilDisorder,
}

/// The two unit kinds. Armies occupy land territories; fleets occupy sea
/// territories and coast variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Army,
    Fleet,
}

impl UnitKind {
    /// Lowercase name used in rejection reasons.
    pub const fn name(self) -> &'static str {
        match self {
            UnitKind::Army => "army",
            UnitKind::Fleet => "fleet",
        }
    }
}

/// The closed set of order kinds. Adding a kind is a compile-time-checked
/// change: every match over `OrderKind` is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Move,
    Hold,
    Support,
    Convoy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Submitted,
    Cancelled,
}

/// Outcome of one order after adjudication.
///
/// `Cut` belongs to the persisted vocabulary but is never produced by this
/// resolver: support is never cut in this ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
    Bounced,
    Cut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Movement,
    Retreat,
    Build,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub status: GameStatus,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub game_id: String,
    pub nation: String,
    pub status: PlayerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub game_id: String,
    pub owner_id: String,
    pub kind: UnitKind,
    pub territory_id: String,
}

/// One submitted order. Belongs to exactly one turn; a cancelled order is
/// excluded from adjudication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub game_id: String,
    pub turn_id: u64,
    pub player_id: String,
    pub unit_id: String,
    pub kind: OrderKind,
    pub from_territory: String,
    pub to_territory: Option<String>,
    pub support_unit: Option<String>,
    pub status: OrderStatus,
    pub created_at: SystemTime,
}

/// Per-order adjudication outcome. `new_position` is set only on a
/// successful move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub outcome: Outcome,
    pub reason: String,
    pub new_position: Option<String>,
}

/// One turn of one game. A game has at most one active turn at a time;
/// ids assigned by the store form a strictly increasing sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: u64,
    pub game_id: String,
    pub year: u16,
    pub season: Season,
    pub phase: Phase,
    pub status: TurnStatus,
    pub deadline: SystemTime,
    pub created_at: SystemTime,
}

/// Generates a random 128-bit identifier as 32 hex characters.
pub fn generate_id() -> String {
    let bytes: [u8; 16] = rand::random();
    let mut out = String::with_capacity(32);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
