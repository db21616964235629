use std::process::ExitCode;

use office_engine::{export_sprite_set, run_realtime, AssetCatalog, Simulation};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match app {
        AppWiring::ExportSprites { out_dir } => {
            match export_sprite_set(&out_dir, &AssetCatalog::builtin()) {
                Ok(manifest) => {
                    info!(
                        out_dir = %out_dir.display(),
                        sprite_count = manifest.sprites.len(),
                        "sprite_dump_finished"
                    );
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!(error = %err, "sprite_dump_failed");
                    ExitCode::FAILURE
                }
            }
        }
        AppWiring::Simulate {
            setup,
            runner,
            stop,
        } => {
            let mut simulation = Simulation::start(None, setup);
            let summary = run_realtime(&mut simulation, &runner, &stop);
            let rates = summary.last_rates.unwrap_or_default();
            info!(
                reason = ?summary.reason,
                virtual_ms = summary.virtual_ms,
                timers_fired = summary.timers_fired,
                events_emitted = summary.events_emitted,
                last_events_per_sec = rates.events_per_sec,
                last_timers_per_sec = rates.timers_per_sec,
                "shutdown"
            );
            ExitCode::SUCCESS
        }
    }
}
