//! Order validation.
//!
//! Two layers: structural completeness of a single order (does the order
//! kind carry the fields it needs), and move legality against the rules
//! engine plus the unit's actual stored position. Each check fails with a
//! distinct `RuleViolation` reason and short-circuits; a rejected move
//! never reaches the adjudicator's contention step.

use crate::error::{Error, Result};
use crate::game::{Order, OrderKind, Unit};
use crate::rules::Rules;

/// Checks that the order carries every field its kind requires.
pub fn validate_structure(order: &Order) -> Result<()> {
    match order.kind {
        OrderKind::Move => {
            if order.to_territory.is_none() {
                return Err(Error::RuleViolation(
                    "move orders require a destination territory".into(),
                ));
            }
        }
        OrderKind::Hold => {}
        OrderKind::Support => {
            if order.support_unit.is_none() {
                return Err(Error::RuleViolation(
                    "support orders require a unit to support".into(),
                ));
            }
        }
        OrderKind::Convoy => {
            if order.to_territory.is_none() || order.support_unit.is_none() {
                return Err(Error::RuleViolation(
                    "convoy orders require a destination and a unit to convoy".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Checks a move order's legality: origin and destination exist, the unit
/// is actually at the stated origin (catches stale or duplicate
/// submissions), both ends are occupiable by the unit's kind, and the step
/// is adjacent for that kind.
pub fn validate_move(rules: &Rules, order: &Order, unit: &Unit) -> Result<()> {
    let from = order.from_territory.as_str();
    let to = order
        .to_territory
        .as_deref()
        .ok_or_else(|| Error::RuleViolation("move orders require a destination territory".into()))?;

    if !rules.territory_exists(from) {
        return Err(Error::RuleViolation(format!(
            "invalid origin territory: {from}"
        )));
    }
    if !rules.territory_exists(to) {
        return Err(Error::RuleViolation(format!(
            "invalid destination territory: {to}"
        )));
    }
    if unit.territory_id != from {
        return Err(Error::RuleViolation(format!(
            "unit {} is not in territory {from} (actually in {})",
            unit.id, unit.territory_id
        )));
    }
    if !rules.can_occupy(unit.kind, from) {
        return Err(Error::RuleViolation(format!(
            "{} cannot occupy {from}",
            unit.kind.name()
        )));
    }
    if !rules.can_occupy(unit.kind, to) {
        return Err(Error::RuleViolation(format!(
            "{} cannot occupy {to}",
            unit.kind.name()
        )));
    }
    if !rules.can_move(unit.kind, from, to) {
        return Err(Error::RuleViolation(format!(
            "{} cannot move from {from} to {to} (not adjacent or invalid for unit kind)",
            unit.kind.name()
        )));
    }
    Ok(())
}
