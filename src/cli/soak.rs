//! Soak command implementation.

use super::output::{format_soak_text, JsonSoakResult};
use super::{CliError, OutputFormat};
use hexconquest::sim::{run_soak_with_progress, SoakConfig};
use hexconquest::MatchConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Execute the soak command.
///
/// Seeds run from the configured seed upwards, one match per seed.
///
/// # Errors
///
/// Returns an error if the progress bar template or JSON output fails.
pub(crate) fn execute(
    config: MatchConfig,
    matches: u64,
    max_ticks: u32,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let soak = SoakConfig {
        match_config: config,
        max_ticks,
        ..SoakConfig::default()
    };
    let base_seed = config.seed;

    let pb = if progress {
        let pb = ProgressBar::new(matches);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} matches ({per_sec})")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    let seeds = base_seed..base_seed.saturating_add(matches);
    let stats = run_soak_with_progress(seeds, &soak, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();

    match format {
        OutputFormat::Text => {
            println!();
            print!("{}", format_soak_text(&stats));
            println!();
            println!(
                "Duration: {:.2}s (seeds {base_seed}..{})",
                duration.as_secs_f64(),
                base_seed.saturating_add(matches)
            );
        }
        OutputFormat::Json => {
            let result = JsonSoakResult::new(base_seed, &stats, duration.as_secs_f64());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
