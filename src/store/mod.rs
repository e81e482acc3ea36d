//! Persistence seam.
//!
//! The core talks to durable storage through the [`Store`] trait, which
//! names exactly the operations adjudication and turn management need. A
//! production embedder supplies a database-backed implementation; the
//! bundled [`MemoryStore`] serves tests and in-process use.

pub mod memory;

pub use memory::MemoryStore;

use std::time::SystemTime;

use crate::error::Result;
use crate::game::{Game, GameStatus, Order, OrderStatus, Player, Turn, TurnStatus, Unit};

/// Storage operations required by the service layer.
///
/// Implementations take `&self` and must be safe to call from concurrent
/// requests; the service serializes same-game mutation sequences itself.
pub trait Store: Send + Sync {
    fn create_game(&self, game: &Game) -> Result<()>;
    fn game(&self, game_id: &str) -> Result<Game>;
    fn update_game_status(&self, game_id: &str, status: GameStatus) -> Result<()>;

    fn create_player(&self, player: &Player) -> Result<()>;
    fn players_by_game(&self, game_id: &str) -> Result<Vec<Player>>;
    /// Nations already claimed by players of a game.
    fn assigned_nations(&self, game_id: &str) -> Result<Vec<String>>;

    fn create_unit(&self, unit: &Unit) -> Result<()>;
    fn unit(&self, unit_id: &str) -> Result<Unit>;
    fn units_by_game(&self, game_id: &str) -> Result<Vec<Unit>>;
    fn update_unit_position(&self, unit_id: &str, territory_id: &str) -> Result<()>;

    fn create_order(&self, order: &Order) -> Result<()>;
    fn order(&self, order_id: &str) -> Result<Order>;
    fn orders_by_turn(&self, game_id: &str, turn_id: u64) -> Result<Vec<Order>>;
    fn orders_by_player(&self, game_id: &str, turn_id: u64, player_id: &str)
        -> Result<Vec<Order>>;
    fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()>;

    /// Persists a new turn, assigning its id; returns the stored turn.
    fn create_turn(&self, turn: &Turn) -> Result<Turn>;
    /// The game's single active turn.
    fn current_turn(&self, game_id: &str) -> Result<Turn>;
    fn turns_by_game(&self, game_id: &str) -> Result<Vec<Turn>>;
    fn update_turn_status(&self, turn_id: u64, status: TurnStatus) -> Result<()>;
    /// Turns still active whose deadline lies strictly before `now`.
    fn expired_turns(&self, now: SystemTime) -> Result<Vec<Turn>>;
}
