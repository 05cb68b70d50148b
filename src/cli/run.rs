//! Run command implementation.
//!
//! Plays a JSON script against a fresh match:
//!
//! ```json
//! {
//!   "players": [{ "id": 1, "name": "ada" }, { "id": 2, "name": "bo" }],
//!   "steps": [
//!     { "at": 0, "player": 1, "do": "click", "x": 1, "y": 0 },
//!     { "at": 600, "player": 1, "do": "grant", "skill": "Emp" },
//!     { "at": 700, "player": 1, "do": "click", "x": 5, "y": 0 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use hexconquest::game::{ActionOutcome, ActionRequest, Match, MatchEvent, SimTime, Skill};
use hexconquest::{Coord, MatchConfig, PlayerId};
use serde::{Deserialize, Serialize};

use super::output::{format_event, format_outcome, format_result};
use super::{CliError, OutputFormat};

/// A scripted match.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    players: Vec<ScriptPlayer>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptPlayer {
    id: PlayerId,
    name: String,
}

/// One scripted step, applied at `at` milliseconds of match time.
#[derive(Debug, Deserialize)]
struct Step {
    at: u64,
    player: PlayerId,
    #[serde(flatten)]
    action: StepAction,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
enum StepAction {
    /// Click the cell at `(x, y)`.
    Click { x: i32, y: i32 },
    /// Hand the player a skill.
    Grant { skill: Skill },
    /// Set the player's attack power.
    Power { power: u32 },
    /// Grant or revoke vampirism.
    Vampirism { enabled: bool },
    /// Ask for a starting cell (for players missing at grid creation).
    Spawn,
}

/// One JSON output line.
#[derive(Debug, Serialize)]
struct Record<'a> {
    at: SimTime,
    player: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<ActionOutcome>,
    events: &'a [MatchEvent],
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the script cannot be read or parsed, goes back in time, or
/// names players the match rejects.
pub(crate) fn execute(script: &Path, config: MatchConfig, format: OutputFormat) -> Result<(), CliError> {
    let text = fs::read_to_string(script)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", script.display())))?;
    let script: Script = serde_json::from_str(&text)?;

    let mut state = Match::new(config)?;
    for player in &script.players {
        state.join(player.id, player.name.clone())?;
    }
    state.build_grid(SimTime::ZERO)?;

    let setup = state.drain_events();
    emit(format, SimTime::ZERO, 0, None, &setup)?;

    let mut last = SimTime::ZERO;
    for step in &script.steps {
        let now = SimTime::from_millis(step.at);
        if now < last {
            return Err(CliError::new(format!(
                "step at {}ms is earlier than the previous step at {}ms",
                step.at,
                last.as_millis()
            )));
        }
        last = now;
        state.tick(now);

        let outcome = apply(&mut state, step, now)?;
        let events = state.drain_events();
        emit(format, now, step.player, outcome.as_ref(), &events)?;
    }

    if format == OutputFormat::Text {
        println!("{}", format_result(state.result()));
    }
    Ok(())
}

fn apply(state: &mut Match, step: &Step, now: SimTime) -> Result<Option<ActionOutcome>, CliError> {
    let player = step.player;
    let update = match step.action {
        StepAction::Click { x, y } => {
            let request = ActionRequest::at(player, Coord::new(x, y));
            return Ok(Some(state.submit(request, now)));
        }
        // Spawns may be requested before the player joins.
        StepAction::Spawn => {
            state.ensure_spawn(player, now);
            return Ok(None);
        }
        StepAction::Grant { skill } => Update::Skill(skill),
        StepAction::Power { power } => Update::Power(power),
        StepAction::Vampirism { enabled } => Update::Vampirism(enabled),
    };
    if state.player(player).is_none() {
        return Err(CliError::new(format!("step at {}ms names unknown player {player}", step.at)));
    }
    let applied = match update {
        Update::Skill(skill) => state.grant_skill(player, skill),
        Update::Power(power) => state.set_power(player, power),
        Update::Vampirism(enabled) => state.set_vampirism(player, enabled),
    };
    if !applied {
        tracing::debug!(player, at = step.at, "economy step refused");
    }
    Ok(None)
}

enum Update {
    Skill(Skill),
    Power(u32),
    Vampirism(bool),
}

fn emit(
    format: OutputFormat,
    at: SimTime,
    player: PlayerId,
    outcome: Option<&ActionOutcome>,
    events: &[MatchEvent],
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            if let Some(outcome) = outcome {
                println!("[{at}] player {player}: {}", format_outcome(outcome));
            }
            for event in events {
                println!("[{at}]   {}", format_event(event));
            }
        }
        OutputFormat::Json => {
            let record = Record {
                at,
                player,
                outcome: outcome.copied(),
                events,
            };
            println!("{}", serde_json::to_string(&record)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_parses() {
        let script: Script = serde_json::from_str(
            r#"{
                "players": [{ "id": 1, "name": "ada" }],
                "steps": [
                    { "at": 0, "player": 1, "do": "click", "x": 1, "y": 0 },
                    { "at": 10, "player": 1, "do": "grant", "skill": "DeepStrike" },
                    { "at": 20, "player": 1, "do": "spawn" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 3);
        assert!(matches!(script.steps[1].action, StepAction::Grant { skill: Skill::DeepStrike }));
        assert!(matches!(script.steps[2].action, StepAction::Spawn));
    }

    #[test]
    fn test_unknown_player_step_fails() {
        let mut state = Match::new(MatchConfig::default()).unwrap();
        let step = Step {
            at: 0,
            player: 3,
            action: StepAction::Power { power: 5 },
        };
        assert!(apply(&mut state, &step, SimTime::ZERO).is_err());
    }

    #[test]
    fn test_refused_economy_step_is_skipped() {
        let mut state = Match::new(MatchConfig { width: 4, height: 1, max_players: 2, ..MatchConfig::default() }).unwrap();
        state.join(1, "ada").unwrap();
        state.join(2, "bo").unwrap();
        state.build_grid(SimTime::ZERO).unwrap();
        state.player_mut(2).unwrap().eliminated = true;

        let step = Step {
            at: 0,
            player: 2,
            action: StepAction::Grant { skill: Skill::Emp },
        };
        assert!(apply(&mut state, &step, SimTime::ZERO).unwrap().is_none());
        assert_eq!(state.player(2).unwrap().active_skill, None);
    }
}
