#![no_main]

//! Full match fuzzer.
//!
//! Exercises the whole request path: lookup, cooldown, skills, trap detonation,
//! elimination and win detection, with invariants checked after every step.

use arbitrary::Arbitrary;
use hexconquest::game::{
    check_invariants, ActionRequest, CellId, CellRef, Match, MatchEvent, SimTime, Skill,
};
use hexconquest::{Coord, MapKind, MatchConfig};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated step.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzStep {
    /// Click a cell by coordinate.
    Click { player: u8, x: i8, y: i8 },
    /// Click a cell by id.
    ClickId { player: u8, id: u16 },
    /// Hand out a skill.
    Grant { player: u8, skill: u8 },
    /// Change a player's power.
    Power { player: u8, power: u16 },
    /// Toggle vampirism.
    Vampirism { player: u8, enabled: bool },
    /// Advance time and retry spawns.
    Wait { millis: u16 },
    /// Ask for a spawn.
    Spawn { player: u8 },
}

/// Structured input for match fuzzing.
#[derive(Arbitrary, Debug)]
struct MatchInput {
    width: u8,
    height: u8,
    players: u8,
    circles: bool,
    seed: u64,
    steps: Vec<FuzzStep>,
}

const SKILLS: [Skill; 4] = [Skill::Artillery, Skill::Emp, Skill::DeepStrike, Skill::Trap];

fuzz_target!(|input: MatchInput| {
    // Cap inputs to keep each run small
    let config = MatchConfig {
        width: u16::from(input.width % 20) + 1,
        height: u16::from(input.height % 20) + 1,
        max_players: input.players % 4 + 1,
        map: if input.circles { MapKind::Circles } else { MapKind::Full },
        seed: input.seed,
        circles: None,
    };
    let Ok(mut state) = Match::new(config) else {
        return;
    };
    for id in 1..=config.max_players {
        let _ = state.join(id, format!("fuzz-{id}"));
    }
    if state.build_grid(SimTime::ZERO).is_err() {
        return;
    }

    let mut now = SimTime::ZERO;
    let mut decisions = 0;
    for step in input.steps.into_iter().take(500) {
        match step {
            FuzzStep::Click { player, x, y } => {
                let request = ActionRequest::at(player % 6, Coord::new(i32::from(x), i32::from(y)));
                let _ = state.submit(request, now);
            }
            FuzzStep::ClickId { player, id } => {
                let request = ActionRequest {
                    target: CellRef::Id(CellId(u32::from(id))),
                    player: player % 6,
                };
                let _ = state.submit(request, now);
            }
            FuzzStep::Grant { player, skill } => {
                state.grant_skill(player % 6, SKILLS[usize::from(skill % 4)]);
            }
            FuzzStep::Power { player, power } => {
                state.set_power(player % 6, u32::from(power));
            }
            FuzzStep::Vampirism { player, enabled } => {
                state.set_vampirism(player % 6, enabled);
            }
            FuzzStep::Wait { millis } => {
                now = now + std::time::Duration::from_millis(u64::from(millis));
                state.tick(now);
            }
            FuzzStep::Spawn { player } => state.ensure_spawn(player % 6, now),
        }

        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "Invariants violated: {violations:?}");
        decisions += state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, MatchEvent::MatchWon(_) | MatchEvent::MatchDrawn))
            .count();
        assert!(decisions <= 1, "match decided twice");
    }
});
