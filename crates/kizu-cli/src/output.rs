//! Output formatting module

use std::path::Path;

use kizu_domain::{render_diff_report, QualityBreakdown, StageDiff};
use kizu_types::{CameraSlot, OutputFormat, Result, Stage, VehicleRecord};

/// Print the record header (identity, status, counts)
pub fn print_record_header(record: &VehicleRecord) {
    println!("\n{}", record.display_name());
    println!("=====================================");
    println!("ID:         {}", record.id);
    println!("Status:     {}", record.status);
    println!("Registered: {}", record.created_at.format("%Y-%m-%d %H:%M"));
    println!("Photos:     {}", record.photos.len());
    println!("Stages:     {}", record.stages.len());
}

/// Print one stage's per-slot assessments and its comparison narrative
pub fn print_stage(stage: &Stage) {
    println!(
        "\nStage {} - {}",
        stage.stage_number,
        stage.timestamp.format("%Y-%m-%d %H:%M")
    );
    println!("-------------------------------------");

    for (index, result) in stage.results.iter().enumerate() {
        let label = CameraSlot::label_for_index(index);
        if !result.image_complete {
            println!(
                "{:<16} unverified ({})",
                label,
                result.completeness_note.as_deref().unwrap_or("no detail")
            );
        } else if result.has_damage {
            println!(
                "{:<16} {:<9} {} - {}",
                label,
                result.severity.label(),
                result.damage_type,
                result.description
            );
        } else {
            println!("{:<16} clean", label);
        }
    }

    println!(
        "\nDamaged: {}  Clean: {}  Unverified: {}",
        stage.damage_count(),
        stage.clean_count(),
        stage.unverified_count()
    );

    if let Some(ref comparison) = stage.comparison {
        println!("\n{}", comparison);
    }
}

pub fn output_list(output_format: OutputFormat, records: &[VehicleRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No vehicles registered.");
        return Ok(());
    }

    println!(
        "{:<38} {:<24} {:<12} {:<14} {:>6}",
        "ID", "Vehicle", "Plate", "Status", "Stages"
    );
    println!("{}", "-".repeat(98));
    for record in records {
        println!(
            "{:<38} {:<24} {:<12} {:<14} {:>6}",
            record.id,
            format!("{} {}", record.make, record.model),
            record.registration_number,
            record.status.label(),
            record.stages.len()
        );
    }

    Ok(())
}

pub fn output_diff(output_format: OutputFormat, diff: &StageDiff) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(diff)?);
    } else {
        println!("{}", render_diff_report(diff));
    }
    Ok(())
}

pub fn output_quality(
    output_format: OutputFormat,
    image: &Path,
    slot: CameraSlot,
    breakdown: &QualityBreakdown,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let payload = serde_json::json!({
            "image": image.display().to_string(),
            "slot": slot.label(),
            "breakdown": breakdown,
            "total": breakdown.total(),
            "accepted": breakdown.accepted(),
            "hint": breakdown.hint(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("\nPhoto Quality Check");
    println!("===================");
    println!("Image:     {}", image.display());
    println!("Slot:      {}", slot.label());
    println!(
        "Angle:     {}",
        if breakdown.angle_ok { "ok" } else { "mismatch" }
    );
    println!("Framing:   {:>2}/25", breakdown.framing);
    println!("Lighting:  {:>2}/25", breakdown.lighting);
    println!("Sharpness: {:>2}/25", breakdown.sharpness);
    println!("Total:     {:>3}/100", breakdown.total());
    println!(
        "Accepted:  {}",
        if breakdown.accepted() { "Yes" } else { "No" }
    );
    if let Some(hint) = breakdown.hint() {
        println!("\nHint: {}", hint);
    }

    Ok(())
}

/// One-line quality verdict used during photo intake
pub fn print_quality_line(slot: CameraSlot, image: &Path, breakdown: &QualityBreakdown) {
    println!(
        "{:<16} {:>3}/100 {:<7} {}  ({})",
        slot.label(),
        breakdown.total(),
        if breakdown.accepted() { "ok" } else { "RETAKE" },
        breakdown.hint().unwrap_or(""),
        image.display()
    );
}
