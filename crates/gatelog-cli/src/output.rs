//! Output formatting module

use chrono::Local;
use serde::Serialize;

use gatelog_domain::service::{Classification, DailySummary};
use gatelog_types::{LogEntry, OutputFormat, RegisteredVehicle, Result, VehicleType};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn type_label(vehicle_type: VehicleType) -> &'static str {
    match vehicle_type {
        VehicleType::Internal => "Internal (registered)",
        VehicleType::Visitor => "Visitor",
    }
}

/// Truncate to `max` characters for table columns
fn fit(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[derive(Serialize)]
struct ClassificationView<'a> {
    plate: &'a str,
    vehicle_type: VehicleType,
    matched: Option<&'a RegisteredVehicle>,
}

pub fn output_classification(
    format: OutputFormat,
    plate: &str,
    classification: &Classification,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&ClassificationView {
            plate,
            vehicle_type: classification.vehicle_type(),
            matched: classification.matched(),
        });
    }

    println!("Plate:        {}", plate);
    println!("Status:       {}", type_label(classification.vehicle_type()));
    if let Some(vehicle) = classification.matched() {
        println!("Owner:        {}", vehicle.owner_name);
        println!(
            "Department:   {}",
            vehicle.department.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn output_log_entry(
    format: OutputFormat,
    entry: &LogEntry,
    classification: &Classification,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(entry);
    }

    println!("Logged");
    println!("======");
    println!("ID:           {}", entry.id);
    println!("Plate:        {}", entry.plate_number);
    println!("Direction:    {}", entry.direction);
    println!("Status:       {}", type_label(entry.vehicle_type));
    if let Some(vehicle) = classification.matched() {
        println!("Owner:        {}", vehicle.owner_name);
    }
    println!(
        "Time:         {}",
        entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    if let Some(ref note) = entry.note {
        println!("Note:         {}", note);
    }
    Ok(())
}

pub fn output_vehicles(format: OutputFormat, vehicles: &[RegisteredVehicle]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(vehicles);
    }

    println!("Registered Vehicles");
    println!("===================");
    println!("Total: {}", vehicles.len());
    println!();

    if vehicles.is_empty() {
        println!("No registered vehicles.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<14}  {:<20}  {:<16}  {:>10}",
        "ID", "Plate", "Owner", "Department", "Registered"
    );
    println!("{}", "-".repeat(104));
    for v in vehicles {
        println!(
            "{:<36}  {:<14}  {:<20}  {:<16}  {:>10}",
            v.id,
            fit(&v.plate_number, 14),
            fit(&v.owner_name, 20),
            fit(v.department.as_deref().unwrap_or("-"), 16),
            v.added_at.with_timezone(&Local).format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub fn output_log(format: OutputFormat, entries: &[LogEntry], limit: usize) -> Result<()> {
    let shown: Vec<_> = entries.iter().take(limit).collect();
    if format == OutputFormat::Json {
        return print_json(&shown);
    }

    println!("Checkpoint Log");
    println!("==============");
    println!("Total entries: {}", entries.len());
    println!();

    if shown.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    println!(
        "{:<16}  {:<14}  {:<4}  {:<9}  {}",
        "Time", "Plate", "Dir", "Type", "Note"
    );
    println!("{}", "-".repeat(70));
    for e in shown {
        println!(
            "{:<16}  {:<14}  {:<4}  {:<9}  {}",
            e.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            fit(&e.plate_number, 14),
            e.direction,
            e.vehicle_type,
            e.note.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ReportView<'a> {
    summary: &'a DailySummary,
    entries: &'a [&'a LogEntry],
}

pub fn output_report(
    format: OutputFormat,
    summary: &DailySummary,
    entries: &[&LogEntry],
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&ReportView { summary, entries });
    }

    let date = summary
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    println!("Daily Report {}", date);
    println!("=======================");
    println!("Total:      {}", summary.total);
    println!("Internal:   {}", summary.internal);
    println!("Visitors:   {}", summary.visitor);
    println!("In / Out:   {} / {}", summary.entries_in, summary.entries_out);
    println!();

    if entries.is_empty() {
        println!("No entries for this day.");
        return Ok(());
    }

    println!("{:<6}  {:<14}  {:<4}  {}", "Time", "Plate", "Dir", "Type");
    println!("{}", "-".repeat(40));
    for e in entries {
        println!(
            "{:<6}  {:<14}  {:<4}  {}",
            e.timestamp.with_timezone(&Local).format("%H:%M"),
            fit(&e.plate_number, 14),
            e.direction,
            e.vehicle_type
        );
    }
    Ok(())
}
