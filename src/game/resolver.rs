//! Resolution of a single click.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::game::combat::{apply_damage, capture_force, DamageResult};
use crate::game::skills::{apply_skill, trigger_trap};
use crate::game::{CellId, GridState, PlayerId, Roster, SimTime, Skill};

/// Why an action changed nothing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// No active cell matches the request.
    #[error("unknown cell")]
    UnknownCell,
    /// No registered player matches the request.
    #[error("unknown player")]
    UnknownPlayer,
    /// The player has been eliminated.
    #[error("player is eliminated")]
    Eliminated,
    /// The target is EMP-frozen.
    #[error("cell is frozen")]
    Frozen,
    /// Normal actions need a neighbor the player owns.
    #[error("cell is not adjacent to the player's territory")]
    NotAdjacent,
    /// The held skill's precondition does not hold. The skill is kept.
    #[error("{0} cannot target this cell")]
    SkillPrecondition(Skill),
    /// The player clicked again before the cooldown expired.
    #[error("cooling down for {}ms", .remaining.as_millis())]
    CoolingDown {
        /// Time left until the next normal action.
        remaining: Duration,
    },
    /// The board has not been built yet.
    #[error("grid not built")]
    GridNotReady,
    /// The match already has a result.
    #[error("match is over")]
    MatchOver,
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Power was added to an own cell.
    Reinforced {
        /// Target cell.
        cell: CellId,
    },
    /// A neutral cell with no force was taken.
    Captured {
        /// Target cell.
        cell: CellId,
        /// Whether a foreign trap on the cell went off.
        trap_triggered: bool,
    },
    /// Force was subtracted from an enemy or neutral-contested cell.
    Attacked {
        /// Target cell.
        cell: CellId,
        /// Whether the cell dropped to neutral.
        neutralized: bool,
    },
    /// A held skill was consumed.
    SkillUsed {
        /// The skill.
        skill: Skill,
        /// Target cell.
        cell: CellId,
    },
    /// Nothing happened.
    Rejected(Rejection),
}

impl ActionOutcome {
    /// Whether the action took effect.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// Whether this was a successful action without a skill.
    #[must_use]
    pub const fn is_normal_success(&self) -> bool {
        matches!(
            self,
            Self::Reinforced { .. } | Self::Captured { .. } | Self::Attacked { .. }
        )
    }
}

/// Apply `player`'s click on `cell` at `now`.
///
/// Eliminated players and frozen cells are rejected before anything else. A held skill
/// takes priority over the normal action and is cleared once consumed. Otherwise the
/// click reinforces an own cell, captures an adjacent neutral cell with no force, or
/// attacks an adjacent cell with the zero-floor rule.
pub fn resolve(
    grid: &mut GridState,
    roster: &mut Roster,
    cell: CellId,
    player: PlayerId,
    now: SimTime,
) -> ActionOutcome {
    let Some(target) = grid.cell(cell).copied() else {
        return ActionOutcome::Rejected(Rejection::UnknownCell);
    };
    let Some(actor) = roster.get(player) else {
        return ActionOutcome::Rejected(Rejection::UnknownPlayer);
    };
    if actor.eliminated {
        return ActionOutcome::Rejected(Rejection::Eliminated);
    }
    if target.is_frozen(now) {
        return ActionOutcome::Rejected(Rejection::Frozen);
    }

    if let Some(skill) = actor.active_skill {
        if !apply_skill(skill, grid, roster, player, cell, now) {
            return ActionOutcome::Rejected(Rejection::SkillPrecondition(skill));
        }
        if let Some(actor) = roster.get_mut(player) {
            actor.active_skill = None;
        }
        return ActionOutcome::SkillUsed { skill, cell };
    }

    let power = actor.power;
    let has_vampirism = actor.has_vampirism;

    if target.is_owned_by(player) {
        grid.set_force(cell, target.force.saturating_add(power));
        return ActionOutcome::Reinforced { cell };
    }

    if !grid.is_adjacent_to_owned(target.coord, player) {
        return ActionOutcome::Rejected(Rejection::NotAdjacent);
    }

    if target.is_neutral_capturable() {
        grid.set_owner(cell, Some(player));
        grid.set_force(cell, capture_force(power, has_vampirism));

        let trap_triggered = target.trap_owner.is_some_and(|owner| owner != player);
        if trap_triggered {
            trigger_trap(grid, roster, cell, player, now);
            grid.clear_trap(cell);
        }
        debug!(player, cell = %cell, trap_triggered, "captured");
        return ActionOutcome::Captured { cell, trap_triggered };
    }

    let neutralized = apply_damage(grid, cell, power) == Some(DamageResult::Neutralized);
    ActionOutcome::Attacked { cell, neutralized }
}
