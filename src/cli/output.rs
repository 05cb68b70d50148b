//! Output formatting utilities for CLI.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use hexconquest::game::{ActionOutcome, MatchEvent, MatchResult};
use hexconquest::mapgen::MapLayout;
use hexconquest::sim::SoakStats;
use hexconquest::{Coord, PlayerId};
use serde::Serialize;

/// JSON-serializable map layout.
#[derive(Debug, Serialize)]
pub(super) struct JsonMap {
    /// Grid width.
    width: u16,
    /// Grid height.
    height: u16,
    /// Archetype name.
    map: String,
    /// Seed the mines were placed with.
    seed: u64,
    /// Number of active cells.
    active_cells: usize,
    /// Gold mine coordinates.
    gold_mines: Vec<Coord>,
    /// Planned starting cell per player slot.
    spawns: BTreeMap<PlayerId, Coord>,
}

impl JsonMap {
    /// Create from a generated layout.
    pub(super) fn from_layout(layout: &MapLayout, seed: u64) -> Self {
        Self {
            width: layout.width(),
            height: layout.height(),
            map: layout.kind().to_string(),
            seed,
            active_cells: layout.len(),
            gold_mines: layout.gold_mines().iter().copied().collect(),
            spawns: layout.planned_spawns().clone(),
        }
    }
}

/// Render a layout as text: `.` active, `$` gold mine, a digit for a spawn.
///
/// Odd columns sit half a row lower, so every other character is shifted down.
pub(super) fn format_map_text(layout: &MapLayout, seed: u64) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Map {} {}x{} (seed: {})",
        layout.kind(),
        layout.width(),
        layout.height(),
        seed
    );
    let _ = writeln!(
        output,
        "  Active cells: {}  Gold mines: {}",
        layout.len(),
        layout.gold_mines().len()
    );
    for (slot, coord) in layout.planned_spawns() {
        let _ = writeln!(output, "  Player {slot} spawn: {coord}");
    }
    output.push('\n');

    let spawn_at: BTreeMap<Coord, PlayerId> =
        layout.planned_spawns().iter().map(|(&slot, &c)| (c, slot)).collect();
    for y in 0..i32::from(layout.height()) {
        for half in 0..2 {
            output.push_str("  ");
            for x in 0..i32::from(layout.width()) {
                let odd = x % 2 == 1;
                if odd != (half == 1) {
                    output.push(' ');
                    continue;
                }
                let coord = Coord::new(x, y);
                let glyph = match spawn_at.get(&coord) {
                    Some(slot) => char::from_digit(u32::from(*slot), 10).unwrap_or('?'),
                    None if layout.is_gold_mine(coord) => '$',
                    None if layout.is_active(coord) => '.',
                    None => ' ',
                };
                output.push(glyph);
            }
            output.truncate(output.trim_end_matches(' ').len());
            output.push('\n');
        }
    }
    output
}

/// One line describing an action outcome.
pub(super) fn format_outcome(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Reinforced { cell } => format!("reinforced {cell}"),
        ActionOutcome::Captured {
            cell,
            trap_triggered,
        } => {
            if *trap_triggered {
                format!("captured {cell} (trap triggered)")
            } else {
                format!("captured {cell}")
            }
        }
        ActionOutcome::Attacked { cell, neutralized } => {
            if *neutralized {
                format!("attacked {cell} (neutralized)")
            } else {
                format!("attacked {cell}")
            }
        }
        ActionOutcome::SkillUsed { skill, cell } => format!("used {skill} on {cell}"),
        ActionOutcome::Rejected(reason) => format!("rejected: {reason}"),
    }
}

/// One line describing a match event.
pub(super) fn format_event(event: &MatchEvent) -> String {
    match event {
        MatchEvent::CellChanged(change) => {
            let cell = &change.cell;
            let owner = cell
                .owner
                .map_or_else(|| "neutral".to_string(), |p| format!("player {p}"));
            let mut line = format!("cell {} {}: {owner}, force {}", change.id, cell.coord, cell.force);
            if let Some(until) = cell.emp_until {
                let _ = write!(line, ", frozen until {until}");
            }
            if let Some(trap) = cell.trap_owner {
                let _ = write!(line, ", trap of player {trap}");
            }
            line
        }
        MatchEvent::SpawnAssigned {
            player,
            cell,
            coord,
        } => format!("player {player} spawned on {cell} {coord}"),
        MatchEvent::SpawnFailed { player } => format!("player {player} could not be spawned"),
        MatchEvent::PlayerEliminated { player } => format!("player {player} eliminated"),
        MatchEvent::MatchWon(signal) => {
            format!("player {} ({}) wins", signal.winner_id, signal.winner_name)
        }
        MatchEvent::MatchDrawn => "match drawn".to_string(),
    }
}

/// Summary line for a finished or abandoned match.
pub(super) fn format_result(result: Option<&MatchResult>) -> String {
    match result {
        Some(MatchResult::Won(signal)) => {
            format!("Winner: Player {} ({})", signal.winner_id, signal.winner_name)
        }
        Some(MatchResult::Draw) => "Result: Draw".to_string(),
        None => "Result: undecided".to_string(),
    }
}

/// JSON-serializable soak result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSoakResult<'a> {
    /// First seed of the run.
    base_seed: u64,
    /// Aggregated statistics.
    #[serde(flatten)]
    stats: &'a SoakStats,
    /// Share of matches that reached a result.
    decided_rate: f64,
    /// Wall-clock duration in seconds.
    duration_secs: f64,
}

impl<'a> JsonSoakResult<'a> {
    /// Wrap aggregated stats for output.
    pub(super) fn new(base_seed: u64, stats: &'a SoakStats, duration_secs: f64) -> Self {
        Self {
            base_seed,
            stats,
            decided_rate: stats.decided_rate(),
            duration_secs,
        }
    }
}

/// Format soak statistics as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_soak_text(stats: &SoakStats) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Soak Results ({} matches)", stats.matches);
    if stats.errors > 0 {
        let _ = writeln!(output, "  Failed to start: {}", stats.errors);
    }
    let _ = writeln!(output, "  Decided: {:.1}%", stats.decided_rate() * 100.0);
    for (player, wins) in &stats.wins {
        let _ = writeln!(output, "  Player {player}: {wins} wins");
    }
    let _ = writeln!(output, "  Draws: {}", stats.draws);
    let _ = writeln!(output, "  Undecided: {}", stats.undecided);

    if stats.matches > 0 {
        let n = stats.matches as f64;
        let _ = writeln!(output, "  Avg ticks: {:.1}", stats.ticks as f64 / n);
        let _ = writeln!(output, "  Avg actions: {:.1}", stats.actions as f64 / n);
    }
    if stats.actions > 0 {
        let _ = writeln!(
            output,
            "  Rejected: {:.1}%",
            stats.rejected as f64 / stats.actions as f64 * 100.0
        );
    }
    let _ = writeln!(
        output,
        "  Skills used: {}  Traps triggered: {}",
        stats.skills_used, stats.traps_triggered
    );
    output
}
