//! Map and rules engine.
//!
//! Loads a variant's territory, edge, and nation records once, derives O(1)
//! lookup tables, and answers legality, occupancy, and adjacency queries.

pub mod loader;
pub mod types;

pub use loader::{build_rules, load_rules};
pub use types::{
    Adjacency, EdgeMode, EdgeRecord, NationRecord, Rules, TerritoryKind, TerritoryRecord,
};
