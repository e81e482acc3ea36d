//! Turn and phase sequencing.
//!
//! The season/phase/year successor function is deterministic and total:
//!
//! - Movement      -> Retreat, same season
//! - Spring Retreat -> Fall Movement
//! - Fall Retreat   -> Fall Build
//! - Build          -> Spring Movement, next year
//!
//! Every new turn gets a fixed 24-hour deadline from its creation time.

use std::time::{Duration, SystemTime};

use crate::game::{Phase, Season, Turn, TurnStatus};

/// Deadline window granted to every newly opened turn.
pub const DEADLINE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Classic variant start year.
pub const START_YEAR: u16 = 1901;

/// Computes the successor (year, season, phase) of a turn position.
pub fn successor(year: u16, season: Season, phase: Phase) -> (u16, Season, Phase) {
    match (phase, season) {
        (Phase::Movement, season) => (year, season, Phase::Retreat),
        (Phase::Retreat, Season::Spring) => (year, Season::Fall, Phase::Movement),
        (Phase::Retreat, Season::Fall) => (year, Season::Fall, Phase::Build),
        (Phase::Build, _) => (year + 1, Season::Spring, Phase::Movement),
    }
}

/// Builds the active turn that replaces `current`, deadline counted
/// from `now`. The store assigns the id.
pub fn next_turn(current: &Turn, now: SystemTime) -> Turn {
    let (year, season, phase) = successor(current.year, current.season, current.phase);
    Turn {
        id: 0,
        game_id: current.game_id.clone(),
        year,
        season,
        phase,
        status: TurnStatus::Active,
        deadline: now + DEADLINE_WINDOW,
        created_at: now,
    }
}

/// Builds the opening turn of a new game: Spring Movement of the
/// start year.
pub fn opening_turn(game_id: &str, now: SystemTime) -> Turn {
    Turn {
        id: 0,
        game_id: game_id.to_string(),
        year: START_YEAR,
        season: Season::Spring,
        phase: Phase::Movement,
        status: TurnStatus::Active,
        deadline: now + DEADLINE_WINDOW,
        created_at: now,
    }
}
