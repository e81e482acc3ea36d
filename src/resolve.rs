//! Turn adjudication.
//!
//! Resolves one turn's full order set against the current unit positions
//! using support-weighted strength comparison. The ruleset is deliberately
//! simplified: two or more movers contesting the same destination all
//! bounce regardless of their individual support, support is never cut,
//! and hold/convoy orders always succeed. Changing any of these changes
//! observable game outcomes, so they are deliberate rules, not bugs.

use std::collections::{BTreeMap, HashMap};

use crate::error::Error;
use crate::game::{Order, OrderKind, OrderResult, OrderStatus, Outcome, Unit};
use crate::rules::Rules;
use crate::validate::validate_move;

/// Resolves every non-cancelled order of a turn, producing exactly one
/// result per order. Unit positions are read, never written; apply the
/// side effects afterwards with [`apply_results`].
pub fn resolve_orders(rules: &Rules, orders: &[Order], units: &[Unit]) -> Vec<OrderResult> {
    let unit_by_id: HashMap<&str, &Unit> =
        units.iter().map(|u| (u.id.as_str(), u)).collect();

    let mut moves: Vec<&Order> = Vec::new();
    let mut supports: Vec<&Order> = Vec::new();
    let mut holds: Vec<&Order> = Vec::new();
    let mut convoys: Vec<&Order> = Vec::new();
    for order in orders {
        if order.status == OrderStatus::Cancelled {
            continue;
        }
        match order.kind {
            OrderKind::Move => moves.push(order),
            OrderKind::Support => supports.push(order),
            OrderKind::Hold => holds.push(order),
            OrderKind::Convoy => convoys.push(order),
        }
    }

    let mut results = Vec::with_capacity(moves.len() + supports.len() + holds.len() + convoys.len());

    // Screen each move independently; invalid moves fail here and never
    // reach contention.
    let mut valid_moves: Vec<&Order> = Vec::new();
    for order in &moves {
        let verdict = match unit_by_id.get(order.unit_id.as_str()) {
            Some(unit) => validate_move(rules, order, unit),
            None => Err(Error::not_found("unit", order.unit_id.clone())),
        };
        match verdict {
            Ok(()) => valid_moves.push(order),
            Err(err) => results.push(OrderResult {
                order_id: order.id.clone(),
                outcome: Outcome::Failed,
                reason: rejection_reason(err),
                new_position: None,
            }),
        }
    }

    // Group survivors by destination; sorted so output order is stable.
    let mut by_destination: BTreeMap<&str, Vec<&Order>> = BTreeMap::new();
    for order in &valid_moves {
        if let Some(dest) = order.to_territory.as_deref() {
            by_destination.entry(dest).or_default().push(order);
        }
    }

    let attack_support = support_strength(&moves, &supports);

    for (destination, contenders) in &by_destination {
        if let [mover] = contenders.as_slice() {
            let strength = 1 + attack_support.get(mover.id.as_str()).copied().unwrap_or(0);
            let defense = defending_strength(destination, &supports, units);
            if strength > defense {
                results.push(OrderResult {
                    order_id: mover.id.clone(),
                    outcome: Outcome::Success,
                    reason: "move successful".into(),
                    new_position: Some((*destination).to_string()),
                });
            } else {
                results.push(OrderResult {
                    order_id: mover.id.clone(),
                    outcome: Outcome::Failed,
                    reason: "insufficient strength to dislodge defender".into(),
                    new_position: None,
                });
            }
        } else {
            // Standoff: every contender bounces, support notwithstanding.
            for mover in contenders {
                results.push(OrderResult {
                    order_id: mover.id.clone(),
                    outcome: Outcome::Bounced,
                    reason: "multiple units attempted to move to the same territory".into(),
                    new_position: None,
                });
            }
        }
    }

    for order in &supports {
        results.push(OrderResult {
            order_id: order.id.clone(),
            outcome: Outcome::Success,
            reason: "support provided".into(),
            new_position: None,
        });
    }
    for order in &holds {
        results.push(OrderResult {
            order_id: order.id.clone(),
            outcome: Outcome::Success,
            reason: "unit held position".into(),
            new_position: None,
        });
    }
    for order in &convoys {
        results.push(OrderResult {
            order_id: order.id.clone(),
            outcome: Outcome::Success,
            reason: "convoy provided".into(),
            new_position: None,
        });
    }

    results
}

/// Applies successful moves to the in-memory unit set. Orders without a new
/// position leave their unit where it stands.
pub fn apply_results(results: &[OrderResult], orders: &[Order], units: &mut [Unit]) {
    let unit_of_order: HashMap<&str, &str> = orders
        .iter()
        .map(|o| (o.id.as_str(), o.unit_id.as_str()))
        .collect();
    for result in results {
        let Some(new_position) = &result.new_position else {
            continue;
        };
        if result.outcome != Outcome::Success {
            continue;
        }
        if let Some(unit_id) = unit_of_order.get(result.order_id.as_str()) {
            if let Some(unit) = units.iter_mut().find(|u| u.id == *unit_id) {
                unit.territory_id = new_position.clone();
            }
        }
    }
}

/// Counts supports per move order id. A support counts only when it names
/// both the moving unit and that move's declared destination.
fn support_strength(moves: &[&Order], supports: &[&Order]) -> HashMap<String, u32> {
    let mut strength: HashMap<String, u32> = HashMap::new();
    for support in supports {
        let (Some(supported_unit), Some(dest)) =
            (support.support_unit.as_deref(), support.to_territory.as_deref())
        else {
            continue;
        };
        for mv in moves {
            if mv.unit_id == supported_unit && mv.to_territory.as_deref() == Some(dest) {
                *strength.entry(mv.id.clone()).or_insert(0) += 1;
                break;
            }
        }
    }
    strength
}

/// Strength of the destination's occupant: 0 when empty, otherwise 1 plus
/// every support naming the occupant. The defender is not moving, so no
/// destination match is required.
fn defending_strength(territory: &str, supports: &[&Order], units: &[Unit]) -> u32 {
    let Some(occupant) = units.iter().find(|u| u.territory_id == territory) else {
        return 0;
    };
    let backing = supports
        .iter()
        .filter(|s| s.support_unit.as_deref() == Some(occupant.id.as_str()))
        .count() as u32;
    1 + backing
}

fn rejection_reason(err: Error) -> String {
    match err {
        Error::RuleViolation(reason) => reason,
        other => other.to_string(),
    }
}
