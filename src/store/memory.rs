//! In-memory store.
//!
//! A `Mutex`-guarded map per record type, mirroring the relational layout
//! a database-backed implementation would use. Turn ids auto-increment;
//! list queries return deterministic orderings so callers and tests can
//! rely on them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::game::{Game, GameStatus, Order, OrderStatus, Player, Turn, TurnStatus, Unit};
use crate::store::Store;

#[derive(Default)]
struct Inner {
    games: HashMap<String, Game>,
    players: HashMap<String, Player>,
    units: HashMap<String, Unit>,
    orders: HashMap<String, Order>,
    turns: HashMap<u64, Turn>,
    next_turn_id: u64,
}

/// In-process [`Store`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another request panicked mid-write;
        // the data itself is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn create_game(&self, game: &Game) -> Result<()> {
        let mut inner = self.lock();
        if inner.games.contains_key(&game.id) {
            return Err(Error::Storage(format!("duplicate game id: {}", game.id)));
        }
        inner.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    fn game(&self, game_id: &str) -> Result<Game> {
        self.lock()
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| Error::not_found("game", game_id))
    }

    fn update_game_status(&self, game_id: &str, status: GameStatus) -> Result<()> {
        let mut inner = self.lock();
        let game = inner
            .games
            .get_mut(game_id)
            .ok_or_else(|| Error::not_found("game", game_id))?;
        game.status = status;
        Ok(())
    }

    fn create_player(&self, player: &Player) -> Result<()> {
        let mut inner = self.lock();
        if inner.players.contains_key(&player.id) {
            return Err(Error::Storage(format!("duplicate player id: {}", player.id)));
        }
        inner.players.insert(player.id.clone(), player.clone());
        Ok(())
    }

    fn players_by_game(&self, game_id: &str) -> Result<Vec<Player>> {
        let inner = self.lock();
        let mut players: Vec<Player> = inner
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(players)
    }

    fn assigned_nations(&self, game_id: &str) -> Result<Vec<String>> {
        Ok(self
            .players_by_game(game_id)?
            .into_iter()
            .map(|p| p.nation)
            .collect())
    }

    fn create_unit(&self, unit: &Unit) -> Result<()> {
        let mut inner = self.lock();
        if inner.units.contains_key(&unit.id) {
            return Err(Error::Storage(format!("duplicate unit id: {}", unit.id)));
        }
        inner.units.insert(unit.id.clone(), unit.clone());
        Ok(())
    }

    fn unit(&self, unit_id: &str) -> Result<Unit> {
        self.lock()
            .units
            .get(unit_id)
            .cloned()
            .ok_or_else(|| Error::not_found("unit", unit_id))
    }

    fn units_by_game(&self, game_id: &str) -> Result<Vec<Unit>> {
        let inner = self.lock();
        let mut units: Vec<Unit> = inner
            .units
            .values()
            .filter(|u| u.game_id == game_id)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(units)
    }

    fn update_unit_position(&self, unit_id: &str, territory_id: &str) -> Result<()> {
        let mut inner = self.lock();
        let unit = inner
            .units
            .get_mut(unit_id)
            .ok_or_else(|| Error::not_found("unit", unit_id))?;
        unit.territory_id = territory_id.to_string();
        Ok(())
    }

    fn create_order(&self, order: &Order) -> Result<()> {
        let mut inner = self.lock();
        if inner.orders.contains_key(&order.id) {
            return Err(Error::Storage(format!("duplicate order id: {}", order.id)));
        }
        inner.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    fn order(&self, order_id: &str) -> Result<Order> {
        self.lock()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| Error::not_found("order", order_id))
    }

    fn orders_by_turn(&self, game_id: &str, turn_id: u64) -> Result<Vec<Order>> {
        let inner = self.lock();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.game_id == game_id && o.turn_id == turn_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    fn orders_by_player(
        &self,
        game_id: &str,
        turn_id: u64,
        player_id: &str,
    ) -> Result<Vec<Order>> {
        Ok(self
            .orders_by_turn(game_id, turn_id)?
            .into_iter()
            .filter(|o| o.player_id == player_id)
            .collect())
    }

    fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()> {
        let mut inner = self.lock();
        let order = inner
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Error::not_found("order", order_id))?;
        order.status = status;
        Ok(())
    }

    fn create_turn(&self, turn: &Turn) -> Result<Turn> {
        let mut inner = self.lock();
        inner.next_turn_id += 1;
        let mut stored = turn.clone();
        stored.id = inner.next_turn_id;
        inner.turns.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn current_turn(&self, game_id: &str) -> Result<Turn> {
        let inner = self.lock();
        inner
            .turns
            .values()
            .filter(|t| t.game_id == game_id && t.status == TurnStatus::Active)
            .max_by_key(|t| t.id)
            .cloned()
            .ok_or_else(|| Error::not_found("active turn", game_id))
    }

    fn turns_by_game(&self, game_id: &str) -> Result<Vec<Turn>> {
        let inner = self.lock();
        let mut turns: Vec<Turn> = inner
            .turns
            .values()
            .filter(|t| t.game_id == game_id)
            .cloned()
            .collect();
        turns.sort_by_key(|t| t.id);
        Ok(turns)
    }

    fn update_turn_status(&self, turn_id: u64, status: TurnStatus) -> Result<()> {
        let mut inner = self.lock();
        let turn = inner
            .turns
            .get_mut(&turn_id)
            .ok_or_else(|| Error::not_found("turn", turn_id.to_string()))?;
        turn.status = status;
        Ok(())
    }

    fn expired_turns(&self, now: SystemTime) -> Result<Vec<Turn>> {
        let inner = self.lock();
        let mut turns: Vec<Turn> = inner
            .turns
            .values()
            .filter(|t| t.status == TurnStatus::Active && t.deadline < now)
            .cloned()
            .collect();
        turns.sort_by_key(|t| t.id);
        Ok(turns)
    }
}
