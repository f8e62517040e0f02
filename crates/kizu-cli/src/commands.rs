//! Command handlers

use std::path::PathBuf;
use std::time::Duration;

use indicatif::ProgressBar;

use crate::cli::{Cli, Commands};
use crate::output::{
    output_diff, output_list, output_quality, print_quality_line, print_record_header, print_stage,
};
use kizu_app::config::Config;
use kizu_app::photos::{attach_photos, scan_slot_photos, validate_image};
use kizu_app::repository::open_vehicle_store;
use kizu_app::{run_inspection, InspectionOptions};
use kizu_domain::{diff_stages, QualityScorer, VehicleRecordRepository};
use kizu_types::{CameraSlot, Error, OutputFormat, Result, StoreError};
use kizu_vision::{LumaQualityScorer, ProgressCallback};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if cli.backend_command.is_some() {
        config.backend_command = cli.backend_command.clone();
    }
    if let Some(ref dir) = cli.store_dir {
        config.store_dir = Some(dir.clone());
    }

    let format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Register {
            make,
            model,
            registration,
        } => cmd_register(&config, format, make, model, registration),

        Commands::Photos {
            id,
            photos,
            dir,
            skip_check,
        } => cmd_photos(
            &config,
            format,
            id,
            photos.clone(),
            dir.clone(),
            *skip_check,
            cli.verbose,
        ),

        Commands::Check { image, slot } => cmd_check(format, image, *slot),

        Commands::Analyze { id, delay_ms } => cmd_analyze(&config, format, id, *delay_ms),

        Commands::Report { id, stage } => cmd_report(&config, format, id, *stage),

        Commands::Diff { id, from, to } => cmd_diff(&config, format, id, *from, *to),

        Commands::List => cmd_list(&config, format),

        Commands::Remove { id } => cmd_remove(&config, id),

        Commands::Clear { yes } => cmd_clear(&config, *yes),

        Commands::Config {
            show,
            set_backend_command,
            set_delay_ms,
            set_timeout,
            set_output,
            reset,
        } => cmd_config(
            config,
            *show,
            set_backend_command.clone(),
            *set_delay_ms,
            *set_timeout,
            *set_output,
            *reset,
        ),
    }
}

fn not_found(what: impl Into<String>) -> Error {
    Error::Store(StoreError::NotFound(what.into()))
}

fn cmd_register(
    config: &Config,
    format: OutputFormat,
    make: &str,
    model: &str,
    registration: &str,
) -> Result<()> {
    let mut store = open_vehicle_store(config)?;
    let id = store.create(make, model, registration)?;
    store.flush();

    if format == OutputFormat::Json {
        println!("{}", serde_json::json!({ "id": id }));
    } else {
        println!("Registered {} {} ({})", make, model, registration);
        println!("ID: {}", id);
    }
    Ok(())
}

fn cmd_photos(
    config: &Config,
    format: OutputFormat,
    id: &str,
    photos: Vec<PathBuf>,
    dir: Option<PathBuf>,
    skip_check: bool,
    verbose: bool,
) -> Result<()> {
    // Pair each photo with its slot: scanned photos carry their slot, explicit
    // ones are taken in canonical index order
    let slotted: Vec<(Option<CameraSlot>, PathBuf)> = if let Some(ref dir) = dir {
        let found = scan_slot_photos(dir)?;
        if found.is_empty() {
            return Err(Error::FileNotFound(format!(
                "no slot photos found under {}",
                dir.display()
            )));
        }
        let missing: Vec<&str> = CameraSlot::all()
            .iter()
            .filter(|slot| !found.iter().any(|(s, _)| s == *slot))
            .map(|slot| slot.label())
            .collect();
        if !missing.is_empty() {
            eprintln!("Missing slots: {}", missing.join(", "));
        }
        found.into_iter().map(|(s, p)| (Some(s), p)).collect()
    } else {
        photos
            .into_iter()
            .enumerate()
            .map(|(index, path)| (CameraSlot::from_index(index), path))
            .collect()
    };

    if slotted.is_empty() {
        return Err(Error::FileNotFound(
            "no photos given; pass files or --dir".to_string(),
        ));
    }

    if !skip_check {
        let scorer = LumaQualityScorer;
        let mut failures = 0;
        for (slot, path) in &slotted {
            let Some(slot) = slot else { continue };
            let breakdown = scorer.score(path, *slot)?;
            if verbose || !breakdown.accepted() {
                print_quality_line(*slot, path, &breakdown);
            }
            if !breakdown.accepted() {
                failures += 1;
            }
        }
        if failures > 0 {
            println!(
                "{} photo(s) failed the quality pre-check. Retake them or pass --skip-check.",
                failures
            );
            return Ok(());
        }
    }

    let photo_list: Vec<PathBuf> = slotted.into_iter().map(|(_, p)| p).collect();

    let mut store = open_vehicle_store(config)?;
    let count = attach_photos(&mut store, id, &photo_list)?;
    store.flush();

    if format == OutputFormat::Json {
        println!("{}", serde_json::json!({ "id": id, "photos": count }));
    } else {
        println!("Attached {} photo(s) to {}", count, id);
    }
    Ok(())
}

fn cmd_check(format: OutputFormat, image: &PathBuf, slot: CameraSlot) -> Result<()> {
    validate_image(image)?;
    let breakdown = LumaQualityScorer.score(image, slot)?;
    output_quality(format, image, slot, &breakdown)
}

fn cmd_analyze(
    config: &Config,
    format: OutputFormat,
    id: &str,
    delay_ms: Option<u64>,
) -> Result<()> {
    let mut store = open_vehicle_store(config)?;
    let backend = config.analyzer_config().backend();

    // Use CLI delay if specified, otherwise config value
    let delay = delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.analysis_delay());
    let options = InspectionOptions::default().with_delay(delay);

    let bar = (format != OutputFormat::Json).then(ProgressBar::new_spinner);
    if let Some(b) = &bar {
        b.enable_steady_tick(Duration::from_millis(120));
    }
    let progress: Option<ProgressCallback> = bar.clone().map(|b| {
        Box::new(move |msg: &str| b.set_message(msg.to_string())) as ProgressCallback
    });

    let outcome = run_inspection(&mut store, id, backend.as_ref(), &options, progress)?;
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    store.flush();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "Recorded stage {} ({} analyzed, {} failed)",
            outcome.stage_number, outcome.succeeded, outcome.failed
        );
        if let Some(record) = store.get(id) {
            if let Some(stage) = record.latest_stage() {
                print_stage(stage);
            }
        }
    }
    Ok(())
}

fn cmd_report(config: &Config, format: OutputFormat, id: &str, stage: Option<u32>) -> Result<()> {
    let store = open_vehicle_store(config)?;
    let record = store.get(id).ok_or_else(|| not_found(id))?;

    match stage {
        Some(number) => {
            let stage = record
                .stage(number)
                .ok_or_else(|| not_found(format!("stage {} of {}", number, id)))?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(stage)?);
            } else {
                print_record_header(&record);
                print_stage(stage);
            }
        }
        None => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record_header(&record);
                match record.latest_stage() {
                    Some(stage) => print_stage(stage),
                    None => println!("\nNo inspection stages recorded yet."),
                }
            }
        }
    }
    Ok(())
}

fn cmd_diff(config: &Config, format: OutputFormat, id: &str, from: u32, to: u32) -> Result<()> {
    let store = open_vehicle_store(config)?;
    let record = store.get(id).ok_or_else(|| not_found(id))?;

    let from_stage = record
        .stage(from)
        .ok_or_else(|| not_found(format!("stage {} of {}", from, id)))?;
    let to_stage = record
        .stage(to)
        .ok_or_else(|| not_found(format!("stage {} of {}", to, id)))?;

    let diff = diff_stages(from_stage, to_stage);
    output_diff(format, &diff)
}

fn cmd_list(config: &Config, format: OutputFormat) -> Result<()> {
    let store = open_vehicle_store(config)?;
    output_list(format, &store.all())
}

fn cmd_remove(config: &Config, id: &str) -> Result<()> {
    let mut store = open_vehicle_store(config)?;
    let removed = store.remove(id)?;
    store.flush();

    if removed {
        println!("Removed {}", id);
    } else {
        println!("No record with id {}", id);
    }
    Ok(())
}

fn cmd_clear(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        println!("This deletes every vehicle record. Re-run with --yes to confirm.");
        return Ok(());
    }

    let mut store = open_vehicle_store(config)?;
    store.clear()?;
    store.flush();
    println!("Repository cleared.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    mut config: Config,
    show: bool,
    set_backend_command: Option<String>,
    set_delay_ms: Option<u64>,
    set_timeout: Option<u64>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<()> {
    if reset {
        config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults.");
        return Ok(());
    }

    let mut changed = false;
    if let Some(command) = set_backend_command {
        config.backend_command = if command.is_empty() {
            None
        } else {
            Some(command)
        };
        changed = true;
    }
    if let Some(ms) = set_delay_ms {
        config.delay_ms = ms;
        changed = true;
    }
    if let Some(secs) = set_timeout {
        config.timeout_secs = secs;
        changed = true;
    }
    if let Some(output) = set_output {
        config.output_format = output;
        changed = true;
    }

    if changed {
        config.save()?;
        println!("Configuration saved.");
    }

    if show || !changed {
        println!("{}", config);
    }
    Ok(())
}
