//! Damage, capture and trap arithmetic.
//!
//! Every damaging effect uses the zero-floor rule: a cell whose force would drop to zero
//! or below becomes neutral with zero force, ready to be captured.

// Trap damage goes through a float multiply
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use crate::game::{CellId, GridState};

/// Extra force on captures for players with vampirism.
pub const VAMPIRISM_BONUS: u32 = 20;

/// Trap damage as a multiple of the trap owner's power.
pub const TRAP_DAMAGE_FACTOR: f64 = 1.5;

/// Lower bound on trap damage.
pub const TRAP_DAMAGE_MIN: u32 = 15;

/// Upper bound on trap damage.
pub const TRAP_DAMAGE_MAX: u32 = 45;

/// Result of damaging a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// The cell keeps its owner with reduced force.
    Weakened {
        /// Force left on the cell.
        remaining: u32,
    },
    /// The cell was knocked down to neutral with zero force.
    Neutralized,
}

/// Compute the zero-floor rule for `force` taking `damage`.
#[must_use]
pub const fn damage_result(force: u32, damage: u32) -> DamageResult {
    if force > damage {
        DamageResult::Weakened {
            remaining: force - damage,
        }
    } else {
        DamageResult::Neutralized
    }
}

/// Damage a cell in place with the zero-floor rule.
///
/// Returns `None` if the id is unknown.
pub fn apply_damage(grid: &mut GridState, id: CellId, damage: u32) -> Option<DamageResult> {
    let force = grid.cell(id)?.force;
    let result = damage_result(force, damage);
    match result {
        DamageResult::Weakened { remaining } => {
            grid.set_force(id, remaining);
        }
        DamageResult::Neutralized => {
            grid.set_owner(id, None);
            grid.set_force(id, 0);
        }
    }
    Some(result)
}

/// Force placed on a freshly captured neutral cell.
#[must_use]
pub const fn capture_force(power: u32, has_vampirism: bool) -> u32 {
    if has_vampirism {
        power.saturating_add(VAMPIRISM_BONUS)
    } else {
        power
    }
}

/// Damage dealt by a trap whose owner has `power`.
///
/// `power * 1.5` rounded half-to-even, clamped to `15..=45`.
#[must_use]
pub fn trap_damage(power: u32) -> u32 {
    let scaled = (f64::from(power) * TRAP_DAMAGE_FACTOR).round_ties_even();
    let clamped = scaled.clamp(f64::from(TRAP_DAMAGE_MIN), f64::from(TRAP_DAMAGE_MAX));
    clamped as u32
}

/// Formal verification proofs for the damage arithmetic.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// The zero-floor rule never produces a cell with zero force that keeps its owner.
    #[kani::proof]
    fn prove_damage_floor() {
        let force: u32 = kani::any();
        let damage: u32 = kani::any();

        match damage_result(force, damage) {
            DamageResult::Weakened { remaining } => {
                assert!(remaining > 0);
                assert!(remaining < force || damage == 0);
                assert_eq!(remaining, force - damage);
            }
            DamageResult::Neutralized => assert!(force <= damage),
        }
    }

    /// Trap damage always stays inside its clamp.
    #[kani::proof]
    fn prove_trap_damage_bounded() {
        let power: u32 = kani::any();
        let damage = trap_damage(power);
        assert!((TRAP_DAMAGE_MIN..=TRAP_DAMAGE_MAX).contains(&damage));
    }

    /// Capture force never wraps.
    #[kani::proof]
    fn prove_capture_force_no_overflow() {
        let power: u32 = kani::any();
        let with_bonus = capture_force(power, true);
        assert!(with_bonus >= power);
    }
}
