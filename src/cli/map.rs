//! Map command implementation.

use super::output::{format_map_text, JsonMap};
use super::{CliError, OutputFormat};
use hexconquest::mapgen::generate_layout;
use hexconquest::MatchConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Execute the map command.
///
/// # Errors
///
/// Returns an error if the map has no active cells.
pub(crate) fn execute(config: &MatchConfig, format: OutputFormat) -> Result<(), CliError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let layout = generate_layout(config, &mut rng).map_err(|e| CliError::new(e.to_string()))?;

    match format {
        OutputFormat::Text => print!("{}", format_map_text(&layout, config.seed)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonMap::from_layout(&layout, config.seed))?;
            println!("{json}");
        }
    }
    Ok(())
}
