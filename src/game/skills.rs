//! Special abilities and trap detonation.
//!
//! Each handler returns whether the skill was consumed. A handler that returns `false`
//! has written nothing.

use std::time::Duration;

use tracing::debug;

use crate::game::combat::{apply_damage, trap_damage};
use crate::game::reach::is_reachable_within;
use crate::game::{CellId, GridState, PlayerId, Roster, SimTime, Skill};

/// How long an EMP keeps cells frozen.
pub const EMP_DURATION: Duration = Duration::from_secs(5);

/// Maximum distance from the player's territory a Deep Strike can land.
pub const DEEP_STRIKE_RANGE: u32 = 2;

/// Deep Strike deals this multiple of the player's power.
pub const DEEP_STRIKE_MULTIPLIER: u32 = 2;

/// Dispatch `skill` used by `actor` on `target`.
///
/// The caller has already rejected frozen targets and eliminated actors.
pub fn apply_skill(
    skill: Skill,
    grid: &mut GridState,
    roster: &Roster,
    actor: PlayerId,
    target: CellId,
    now: SimTime,
) -> bool {
    let used = match skill {
        Skill::Artillery => artillery(grid, roster, actor, target, now),
        Skill::Emp => emp(grid, target, now),
        Skill::DeepStrike => deep_strike(grid, roster, actor, target, now),
        Skill::Trap => place_trap(grid, actor, target, now),
    };
    debug!(player = actor, %skill, cell = %target, used, "skill");
    used
}

/// Damage an enemy cell and every unfrozen enemy neighbor by the actor's power.
fn artillery(grid: &mut GridState, roster: &Roster, actor: PlayerId, target: CellId, now: SimTime) -> bool {
    let Some(cell) = grid.cell(target).copied() else {
        return false;
    };
    if !cell.is_enemy_of(actor) {
        return false;
    }

    let damage = roster.power_of(actor);
    apply_damage(grid, target, damage);

    let splash: Vec<CellId> = grid
        .neighbor_ids(cell.coord)
        .filter(|&id| {
            grid.cell(id)
                .is_some_and(|n| n.is_enemy_of(actor) && !n.is_frozen(now))
        })
        .collect();
    for id in splash {
        apply_damage(grid, id, damage);
    }
    true
}

/// Freeze the target and all its neighbors, whoever owns them.
fn emp(grid: &mut GridState, target: CellId, now: SimTime) -> bool {
    let Some(coord) = grid.coord_of(target) else {
        return false;
    };
    let until = now + EMP_DURATION;
    let neighbors: Vec<CellId> = grid.neighbor_ids(coord).collect();

    grid.set_emp_until(target, until);
    for id in neighbors {
        grid.set_emp_until(id, until);
    }
    true
}

/// Strike a cell near the actor's territory for double power.
///
/// Own cells are reinforced; unowned cells, neutral-contested included, are captured
/// outright with the damage as force; enemy cells are attacked. Captures here never
/// set off traps.
fn deep_strike(grid: &mut GridState, roster: &Roster, actor: PlayerId, target: CellId, now: SimTime) -> bool {
    let Some(cell) = grid.cell(target).copied() else {
        return false;
    };
    if cell.is_frozen(now) || !is_reachable_within(grid, actor, cell.coord, DEEP_STRIKE_RANGE) {
        return false;
    }

    let damage = roster.power_of(actor).saturating_mul(DEEP_STRIKE_MULTIPLIER);
    match cell.owner {
        Some(owner) if owner == actor => {
            grid.set_force(target, cell.force.saturating_add(damage));
        }
        None => {
            grid.set_owner(target, Some(actor));
            grid.set_force(target, damage);
        }
        Some(_) => {
            apply_damage(grid, target, damage);
        }
    }
    true
}

/// Arm a trap on an untrapped cell the actor owns.
fn place_trap(grid: &mut GridState, actor: PlayerId, target: CellId, now: SimTime) -> bool {
    let Some(cell) = grid.cell(target) else {
        return false;
    };
    if cell.is_frozen(now) || !cell.is_owned_by(actor) || cell.has_trap() {
        return false;
    }
    grid.set_trap(target, actor)
}

/// Detonate the trap on `trap_cell` against `capturer`.
///
/// Every unfrozen neighbor owned by the capturer takes the trap owner's trap damage.
/// Returns the number of cells hit. Does not disarm the trap.
pub fn trigger_trap(
    grid: &mut GridState,
    roster: &Roster,
    trap_cell: CellId,
    capturer: PlayerId,
    now: SimTime,
) -> usize {
    let Some(cell) = grid.cell(trap_cell).copied() else {
        return 0;
    };
    let Some(trap_owner) = cell.trap_owner else {
        return 0;
    };

    let damage = trap_damage(roster.power_of(trap_owner));
    let victims: Vec<CellId> = grid
        .neighbor_ids(cell.coord)
        .filter(|&id| {
            grid.cell(id)
                .is_some_and(|n| n.is_owned_by(capturer) && !n.is_frozen(now))
        })
        .collect();
    for &id in &victims {
        apply_damage(grid, id, damage);
    }
    debug!(trap_owner, capturer, damage, hit = victims.len(), "trap triggered");
    victims.len()
}
