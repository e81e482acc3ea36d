//! Map data records and the derived rules lookup structure.
//!
//! `Rules` is built once at startup from raw territory, edge, and nation
//! records, and is immutable afterwards; share it by reference (or `Arc`)
//! across concurrent readers. All queries answer false/`None` for unknown
//! ids rather than panicking, so callers must check `territory_exists`
//! before treating a negative adjacency answer as "not adjacent".

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::game::UnitKind;

/// Classification of a territory. `Coast` only appears on the synthetic
/// coast children generated for split-coast territories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerritoryKind {
    Land,
    Sea,
    Coast,
}

/// Movement mode of an edge: passable by armies, fleets, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    Land,
    Sea,
    Both,
}

/// A territory as it appears in the variant's map data, keyed by id.
#[derive(Debug, Clone, Deserialize)]
pub struct TerritoryRecord {
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: TerritoryKind,
    #[serde(default)]
    pub home_country: Option<String>,
    #[serde(default)]
    pub has_coast: bool,
    #[serde(default)]
    pub is_supply_center: bool,
    /// Coast codes (`"nc"`, `"sc"`, ...) for split-coast territories.
    #[serde(default)]
    pub coasts: Vec<String>,
}

/// An undirected adjacency between two territory ids.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub mode: EdgeMode,
}

/// A playable nation.
#[derive(Debug, Clone, Deserialize)]
pub struct NationRecord {
    pub id: String,
    pub display_name: String,
}

/// One outgoing adjacency in the per-territory neighbor list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    pub to: String,
    pub mode: EdgeMode,
}

/// Immutable map and rules tables for one variant.
///
/// The per-unit-kind reachability tables turn the list-scan adjacency check
/// into a constant-time membership test; they are populated from the edge
/// modes (`land`/`both` feeds the army table, `sea`/`both` the fleet table).
#[derive(Debug)]
pub struct Rules {
    pub(crate) territory_ids: HashSet<String>,
    pub(crate) supply_centers: HashSet<String>,
    pub(crate) home_centers: HashMap<String, Vec<String>>,
    pub(crate) territory_names: HashMap<String, String>,
    pub(crate) nation_names: HashMap<String, String>,
    pub(crate) territory_kinds: HashMap<String, TerritoryKind>,
    pub(crate) has_coast: HashSet<String>,
    pub(crate) parent_to_coasts: HashMap<String, Vec<String>>,
    pub(crate) coast_to_parent: HashMap<String, String>,
    pub(crate) adjacency: HashMap<String, Vec<Adjacency>>,
    pub(crate) army_reach: HashMap<String, HashSet<String>>,
    pub(crate) fleet_reach: HashMap<String, HashSet<String>>,
}

impl Rules {
    /// Returns true if the id names a territory, including generated
    /// coast variants.
    pub fn territory_exists(&self, id: &str) -> bool {
        self.territory_ids.contains(id)
    }

    pub fn is_supply_center(&self, id: &str) -> bool {
        self.supply_centers.contains(id)
    }

    /// Returns the kind of a territory, or `None` for unknown ids.
    pub fn territory_kind(&self, id: &str) -> Option<TerritoryKind> {
        self.territory_kinds.get(id).copied()
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.territory_names.get(id).map(String::as_str)
    }

    pub fn nation_name(&self, id: &str) -> Option<&str> {
        self.nation_names.get(id).map(String::as_str)
    }

    /// Home territories of a nation, empty for unknown nations.
    pub fn home_centers(&self, nation: &str) -> &[String] {
        self.home_centers.get(nation).map_or(&[], Vec::as_slice)
    }

    pub fn nation_ids(&self) -> impl Iterator<Item = &str> {
        self.nation_names.keys().map(String::as_str)
    }

    pub fn has_coast(&self, id: &str) -> bool {
        self.has_coast.contains(id)
    }

    /// Coast variants of a split-coast territory, empty otherwise.
    pub fn coasts_of(&self, id: &str) -> &[String] {
        self.parent_to_coasts.get(id).map_or(&[], Vec::as_slice)
    }

    /// Parent territory of a coast variant, `None` for non-coast ids.
    pub fn coast_parent(&self, id: &str) -> Option<&str> {
        self.coast_to_parent.get(id).map(String::as_str)
    }

    /// Outgoing adjacencies of a territory, empty for unknown ids.
    pub fn neighbors(&self, id: &str) -> &[Adjacency] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    /// Returns true if a unit of the given kind may occupy the territory:
    /// armies on land, fleets on sea or coast variants.
    pub fn can_occupy(&self, kind: UnitKind, territory: &str) -> bool {
        match (kind, self.territory_kind(territory)) {
            (UnitKind::Army, Some(TerritoryKind::Land)) => true,
            (UnitKind::Fleet, Some(TerritoryKind::Sea | TerritoryKind::Coast)) => true,
            _ => false,
        }
    }

    /// Returns true if a unit of the given kind may move from `from`
    /// to `to` in one step.
    pub fn can_move(&self, kind: UnitKind, from: &str, to: &str) -> bool {
        let reach = match kind {
            UnitKind::Army => &self.army_reach,
            UnitKind::Fleet => &self.fleet_reach,
        };
        reach.get(from).is_some_and(|set| set.contains(to))
    }
}
