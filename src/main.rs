//! floodguard - Flood and Weather Hazard Assessment
//!
//! Two modes:
//! 1. `label`  - derive features and rule-based flood labels for a historical
//!    dataset (JSON array of daily records, any number of locations)
//! 2. `assess` - evaluate hazard alerts and flood risk for one location's
//!    recent window, with an optional forecast and classifier probability
//!
//! Usage:
//!   floodguard label <records.json> [--output labeled.json]
//!   floodguard assess <recent.json> [--forecast forecast.json] [--probability P] [--output report.json]
//!
//! Environment:
//!   FLOODGUARD_CONFIG - path to the TOML config (default: floodguard.toml)
//!   RUST_LOG          - log filter (default: floodguard=info)

use floodguard::alert::risk::ClassifierOutcome;
use floodguard::config::{self, HazardConfig};
use floodguard::logging;
use floodguard::monitor::HistoryBook;
use floodguard::pipeline::{self, RiskStatus};
use std::env;
use std::error::Error;

fn usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} label <records.json> [--output FILE]", program);
    eprintln!("  {} assess <recent.json> [--forecast FILE] [--probability P] [--output FILE]", program);
}

fn load_config() -> Result<HazardConfig, Box<dyn Error>> {
    match env::var("FLOODGUARD_CONFIG") {
        Ok(path) => {
            println!("⚙️  Config: {}", path);
            Ok(config::load_config(&path)?)
        }
        Err(_) => Ok(config::load_config_default()?),
    }
}

/// Command-line options shared by both modes.
#[derive(Default)]
struct Options {
    input: Option<String>,
    output: Option<String>,
    forecast: Option<String>,
    probability: Option<f64>,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--output" | "--forecast" | "--probability") => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} requires a value", flag))?;
                match flag {
                    "--output" => options.output = Some(value.clone()),
                    "--forecast" => options.forecast = Some(value.clone()),
                    _ => {
                        let p = value
                            .parse::<f64>()
                            .map_err(|_| format!("--probability expects a number, got {}", value))?;
                        options.probability = Some(p);
                    }
                }
                i += 2;
            }
            other if other.starts_with("--") => return Err(format!("Unknown argument: {}", other)),
            path => {
                if options.input.is_some() {
                    return Err(format!("Unexpected extra input: {}", path));
                }
                options.input = Some(path.to_string());
                i += 1;
            }
        }
    }
    Ok(options)
}

fn run_label(options: Options, config: &HazardConfig) -> Result<(), Box<dyn Error>> {
    let input = options.input.ok_or("label requires an input file")?;

    println!("📥 Reading {}...", input);
    let records = pipeline::read_records(&input)?;
    println!("   {} records", records.len());

    println!("🏷️  Labeling ({} worker threads)...", config.pipeline.worker_threads);
    let dataset = pipeline::label_dataset(records, config)?;

    let stats = &dataset.stats;
    println!("\n📊 Label statistics");
    println!("   Total records:  {}", stats.total);
    println!("   Flood events:   {} ({:.2}%)", stats.floods, stats.flood_ratio * 100.0);
    println!("   Synthetic:      {}", dataset.synthetic);
    if let Some(mean) = stats.mean_severity {
        println!("   Mean severity:  {:.2}", mean);
    }
    println!("\n   By flood type:");
    for (flood_type, count) in &stats.by_type {
        println!("     {:<18} {}", flood_type.as_str(), count);
    }
    println!("\n   By region:");
    for (region, counts) in &stats.by_region {
        println!("     {:<18} {} floods / {} records", region.as_str(), counts.floods, counts.records);
    }
    if !stats.floods_by_month.is_empty() {
        println!("\n   Floods by month:");
        for (month, count) in &stats.floods_by_month {
            println!("     {:>2}  {}", month, count);
        }
    }
    println!("\n   Top flood locations:");
    for (location, counts) in stats.top_flood_locations(10) {
        println!(
            "     {:<18} {} floods / {} days ({:.1}%)",
            location,
            counts.floods,
            counts.records,
            counts.flood_pct()
        );
    }
    if let (Some(flood), Some(normal)) = (&stats.flood_conditions, &stats.normal_conditions) {
        println!("\n   Flood vs normal conditions:");
        println!("     7-day rain:       {:>8.1} mm  vs {:>8.1} mm", flood.rain_7day, normal.rain_7day);
        println!("     Pressure change:  {:>8.2} hPa vs {:>8.2} hPa", flood.pressure_change, normal.pressure_change);
        println!("     Humidity:         {:>8.1} %   vs {:>8.1} %", flood.humidity, normal.humidity);
        println!("     Temperature:      {:>8.1} °C  vs {:>8.1} °C", flood.temperature, normal.temperature);
    }

    if let Some(output) = options.output {
        pipeline::write_json(&output, &dataset.records)?;
        println!("\n💾 Wrote {} labeled records to {}", dataset.records.len(), output);
    }
    Ok(())
}

fn run_assess(options: Options, config: &HazardConfig) -> Result<(), Box<dyn Error>> {
    let input = options.input.ok_or("assess requires a recent-window file")?;

    let book = HistoryBook::new(config.history.capacity)?;
    let (location, recent) = pipeline::single_location(pipeline::read_records(&input)?)?
        .ok_or("recent window is empty")?;
    for record in recent {
        book.record(record)?;
    }

    let forecast = match &options.forecast {
        Some(path) => Some(pipeline::read_records(path)?),
        None => None,
    };
    let outcome = match options.probability {
        Some(p) => ClassifierOutcome::Probability(p),
        None => ClassifierOutcome::Unavailable("no classifier probability supplied".to_string()),
    };

    let report = pipeline::assess_location(&book, &location, forecast.as_deref(), outcome, config)?;

    println!("\n🌦️  Hazard report: {}", location);
    println!("============================");
    if let Some(current) = &report.summary.current {
        println!(
            "   {} - {:.1}°C, {:.1} mm rain, {:.1} m/s wind, {:.1} hPa",
            current.date, current.temperature_c, current.rainfall_mm, current.wind_speed_ms, current.pressure_hpa
        );
    }

    match &report.risk {
        RiskStatus::Assessed(risk) => {
            println!(
                "\n🌊 Flood risk: {:?} (score {}, confidence {:.1}%)",
                risk.category,
                risk.risk_score,
                risk.confidence * 100.0
            );
        }
        RiskStatus::Unavailable { reason } => {
            println!("\n⚠️  Flood risk unavailable: {}", reason);
        }
    }

    if report.alerts.is_empty() {
        println!("\n✓ No active weather alerts");
    } else {
        println!("\n🚨 {} active alert(s):", report.alerts.len());
        for alert in &report.alerts {
            println!("   [{}] {} - {}", alert.severity.as_str(), alert.kind.label(), alert.message);
        }
    }

    if let Some(risk) = report.risk.assessment() {
        println!("\n📋 Recommendations:");
        for rec in &risk.recommendations {
            println!("   - {}", rec);
        }
    }

    if let Some(output) = options.output {
        pipeline::write_json(&output, &report)?;
        println!("\n💾 Wrote report to {}", output);
    }
    Ok(())
}

fn main() {
    dotenv::dotenv().ok();
    logging::init(logging::DEFAULT_FILTER);

    println!("🌊 floodguard");
    println!("============================\n");

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("floodguard");

    let Some(command) = args.get(1) else {
        usage(program);
        std::process::exit(1);
    };

    let options = match parse_options(&args[2..]) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            usage(program);
            std::process::exit(1);
        }
    };

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };

    let result = match command.as_str() {
        "label" => run_label(options, &config),
        "assess" => run_assess(options, &config),
        other => {
            eprintln!("Unknown command: {}", other);
            usage(program);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}
