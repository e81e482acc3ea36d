//! Variant loading and rules table construction.
//!
//! Map data for the classic variant is embedded at compile time as three
//! JSON documents: a territory map, an undirected edge list, and a nation
//! list. `build_rules` derives every lookup table the engine needs,
//! including the synthetic coast territories and the per-unit-kind
//! reachability tables.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::rules::types::{
    Adjacency, EdgeMode, EdgeRecord, NationRecord, Rules, TerritoryKind, TerritoryRecord,
};

static CLASSIC_TERRITORIES: &str = include_str!("../../data/classic/world/territories.json");
static CLASSIC_EDGES: &str = include_str!("../../data/classic/world/edges.json");
static CLASSIC_NATIONS: &str = include_str!("../../data/classic/world/nations.json");

/// Loads the rules for a named variant. Only `"classic"` is shipped.
pub fn load_rules(variant: &str) -> Result<Rules> {
    match variant {
        "classic" => load_classic_rules(),
        other => Err(Error::not_found("variant", other)),
    }
}

fn load_classic_rules() -> Result<Rules> {
    // BTreeMap keeps territory iteration deterministic.
    let territories: BTreeMap<String, TerritoryRecord> = serde_json::from_str(CLASSIC_TERRITORIES)
        .map_err(|e| Error::Storage(format!("failed to parse territories.json: {e}")))?;
    let edges: Vec<EdgeRecord> = serde_json::from_str(CLASSIC_EDGES)
        .map_err(|e| Error::Storage(format!("failed to parse edges.json: {e}")))?;
    let nations: Vec<NationRecord> = serde_json::from_str(CLASSIC_NATIONS)
        .map_err(|e| Error::Storage(format!("failed to parse nations.json: {e}")))?;
    Ok(build_rules(&territories, &edges, &nations))
}

/// Builds the immutable rules tables from raw records.
pub fn build_rules(
    territories: &BTreeMap<String, TerritoryRecord>,
    edges: &[EdgeRecord],
    nations: &[NationRecord],
) -> Rules {
    let mut territory_ids = HashSet::new();
    let mut supply_centers = HashSet::new();
    let mut home_centers: HashMap<String, Vec<String>> = HashMap::new();
    let mut territory_names = HashMap::new();
    let mut territory_kinds = HashMap::new();
    let mut has_coast = HashSet::new();
    let mut parent_to_coasts: HashMap<String, Vec<String>> = HashMap::new();
    let mut coast_to_parent = HashMap::new();

    for (tid, territory) in territories {
        territory_ids.insert(tid.clone());
        territory_names.insert(tid.clone(), territory.display_name.clone());
        territory_kinds.insert(tid.clone(), territory.kind);

        if territory.is_supply_center {
            supply_centers.insert(tid.clone());
        }
        if territory.has_coast {
            has_coast.insert(tid.clone());
        }
        if let Some(nation) = &territory.home_country {
            home_centers
                .entry(nation.clone())
                .or_default()
                .push(tid.clone());
        }

        // Each coast code spawns a synthetic fleet-occupiable child
        // territory named `{parent}_{code}`.
        for code in &territory.coasts {
            let coast_id = format!("{tid}_{code}");
            territory_ids.insert(coast_id.clone());
            territory_kinds.insert(coast_id.clone(), TerritoryKind::Coast);
            territory_names.insert(
                coast_id.clone(),
                format!("{} ({})", territory.display_name, code.to_uppercase()),
            );
            parent_to_coasts
                .entry(tid.clone())
                .or_default()
                .push(coast_id.clone());
            coast_to_parent.insert(coast_id, tid.clone());
        }
    }

    let mut nation_names = HashMap::new();
    for nation in nations {
        nation_names.insert(nation.id.clone(), nation.display_name.clone());
    }

    // Edges are undirected in the data; register both directions.
    let mut adjacency: HashMap<String, Vec<Adjacency>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.from.clone()).or_default().push(Adjacency {
            to: edge.to.clone(),
            mode: edge.mode,
        });
        adjacency.entry(edge.to.clone()).or_default().push(Adjacency {
            to: edge.from.clone(),
            mode: edge.mode,
        });
    }

    let (army_reach, fleet_reach) = build_reachability(&territory_ids, &adjacency);

    Rules {
        territory_ids,
        supply_centers,
        home_centers,
        territory_names,
        nation_names,
        territory_kinds,
        has_coast,
        parent_to_coasts,
        coast_to_parent,
        adjacency,
        army_reach,
        fleet_reach,
    }
}

/// Precomputes the boolean reachability table for each unit kind, so that
/// `can_move` is a constant-time membership test instead of a list scan.
fn build_reachability(
    territory_ids: &HashSet<String>,
    adjacency: &HashMap<String, Vec<Adjacency>>,
) -> (
    HashMap<String, HashSet<String>>,
    HashMap<String, HashSet<String>>,
) {
    let mut army_reach: HashMap<String, HashSet<String>> = HashMap::new();
    let mut fleet_reach: HashMap<String, HashSet<String>> = HashMap::new();
    for tid in territory_ids {
        army_reach.insert(tid.clone(), HashSet::new());
        fleet_reach.insert(tid.clone(), HashSet::new());
    }

    for (tid, neighbors) in adjacency {
        for adj in neighbors {
            match adj.mode {
                EdgeMode::Land => {
                    army_reach.entry(tid.clone()).or_default().insert(adj.to.clone());
                }
                EdgeMode::Sea => {
                    fleet_reach.entry(tid.clone()).or_default().insert(adj.to.clone());
                }
                EdgeMode::Both => {
                    army_reach.entry(tid.clone()).or_default().insert(adj.to.clone());
                    fleet_reach.entry(tid.clone()).or_default().insert(adj.to.clone());
                }
            }
        }
    }

    (army_reach, fleet_reach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::UnitKind;

    #[test]
    fn unknown_variant_is_not_found() {
        let err = load_rules("chaos").unwrap_err();
        assert_eq!(err.to_string(), "variant not found: chaos");
    }

    #[test]
    fn classic_map_counts() {
        let rules = load_rules("classic").unwrap();
        // 75 territories plus 6 generated coast variants.
        assert_eq!(rules.territory_ids.len(), 81);
        assert_eq!(rules.supply_centers.len(), 34);
        assert_eq!(rules.nation_names.len(), 7);
        assert_eq!(rules.coast_to_parent.len(), 6);
    }

    #[test]
    fn coast_variants_map_back_to_parents() {
        let rules = load_rules("classic").unwrap();
        for coast in ["bul_ec", "bul_sc", "spa_nc", "spa_sc", "stp_nc", "stp_sc"] {
            assert!(rules.territory_exists(coast), "{coast} missing");
            assert_eq!(rules.territory_kind(coast), Some(TerritoryKind::Coast));
            let parent = rules.coast_parent(coast).unwrap();
            assert!(rules.coasts_of(parent).contains(&coast.to_string()));
        }
        assert_eq!(rules.coast_parent("spa_nc"), Some("spa"));
        assert_eq!(rules.display_name("spa_nc"), Some("Spain (NC)"));
    }

    #[test]
    fn home_centers_cover_all_nations() {
        let rules = load_rules("classic").unwrap();
        for nation in [
            "austria", "england", "france", "germany", "italy", "turkey",
        ] {
            assert_eq!(rules.home_centers(nation).len(), 3, "{nation}");
        }
        assert_eq!(rules.home_centers("russia").len(), 4);
        assert!(rules.home_centers("atlantis").is_empty());
    }

    #[test]
    fn reachability_tables_follow_edge_modes() {
        let rules = load_rules("classic").unwrap();
        // Land edge: armies only.
        assert!(rules.can_move(UnitKind::Army, "boh", "mun"));
        assert!(!rules.can_move(UnitKind::Fleet, "boh", "mun"));
        // Sea edge: fleets only.
        assert!(rules.can_move(UnitKind::Fleet, "nth", "eng"));
        assert!(!rules.can_move(UnitKind::Army, "nth", "eng"));
        // Both: either kind.
        assert!(rules.can_move(UnitKind::Army, "ber", "kie"));
        assert!(rules.can_move(UnitKind::Fleet, "ber", "kie"));
    }

    #[test]
    fn reachability_is_symmetric() {
        let rules = load_rules("classic").unwrap();
        for (from, neighbors) in &rules.adjacency {
            for adj in neighbors {
                for kind in [UnitKind::Army, UnitKind::Fleet] {
                    assert_eq!(
                        rules.can_move(kind, from, &adj.to),
                        rules.can_move(kind, &adj.to, from),
                        "asymmetric reachability {from} <-> {}",
                        adj.to
                    );
                }
            }
        }
    }

    #[test]
    fn split_coast_fleet_routes() {
        let rules = load_rules("classic").unwrap();
        // Fleets enter Spain through its coast variants, not the parent.
        assert!(rules.can_move(UnitKind::Fleet, "mao", "spa_nc"));
        assert!(rules.can_move(UnitKind::Fleet, "mar", "spa_sc"));
        assert!(!rules.can_move(UnitKind::Fleet, "mao", "spa"));
        // Armies use the parent id.
        assert!(rules.can_move(UnitKind::Army, "gas", "spa"));
    }

    #[test]
    fn occupancy_by_kind() {
        let rules = load_rules("classic").unwrap();
        assert!(rules.can_occupy(UnitKind::Army, "ber"));
        assert!(!rules.can_occupy(UnitKind::Fleet, "ber"));
        assert!(rules.can_occupy(UnitKind::Fleet, "nth"));
        assert!(!rules.can_occupy(UnitKind::Army, "nth"));
        assert!(rules.can_occupy(UnitKind::Fleet, "stp_sc"));
        assert!(!rules.can_occupy(UnitKind::Army, "stp_sc"));
        // Unknown territory: nobody.
        assert!(!rules.can_occupy(UnitKind::Army, "xyz"));
        assert!(!rules.can_occupy(UnitKind::Fleet, "xyz"));
    }

    #[test]
    fn unknown_territory_queries_answer_negative() {
        let rules = load_rules("classic").unwrap();
        assert!(!rules.territory_exists("xyz"));
        assert!(!rules.is_supply_center("xyz"));
        assert_eq!(rules.territory_kind("xyz"), None);
        assert_eq!(rules.display_name("xyz"), None);
        assert!(rules.neighbors("xyz").is_empty());
        assert!(!rules.can_move(UnitKind::Army, "xyz", "ber"));
        assert!(!rules.can_move(UnitKind::Army, "ber", "xyz"));
    }

    #[test]
    fn known_supply_centers() {
        let rules = load_rules("classic").unwrap();
        for sc in ["ber", "mun", "par", "lon", "mos", "vie", "con"] {
            assert!(rules.is_supply_center(sc), "{sc} should be a supply center");
        }
        assert!(!rules.is_supply_center("ruh"));
        assert!(!rules.is_supply_center("nth"));
    }
}
