//! primslice CLI - slice primitive trees into G-code
//!
//! Reads an element tree as JSON, slices it with settings from a TOML or
//! JSON file and writes Marlin/RepRap G-code.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use primslice::{element_bounds, Element, PrinterSettings};
use primslice_gcode::{generate_composite, GcodeError, PrinterProfile};
use tracing::info;

#[derive(Parser)]
#[command(name = "primslice")]
#[command(about = "Layer-based toolpath generator for parametric primitives", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Slice an element tree into G-code
    Slice {
        /// Element tree (.json)
        input: PathBuf,
        /// Printer settings (.toml or .json); defaults apply when omitted
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Built-in printer profile name
        #[arg(short, long, default_value = "generic")]
        profile: String,
        /// Printer profile file (.json), overrides --profile
        #[arg(long)]
        profile_file: Option<PathBuf>,
        /// Output file; G-code goes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print statistics as JSON on stderr
        #[arg(long)]
        stats: bool,
    },
    /// Show the bounding box of an element tree
    Bounds {
        /// Element tree (.json)
        input: PathBuf,
    },
    /// List built-in printer profiles
    Profiles,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Slice {
            input,
            settings,
            profile,
            profile_file,
            output,
            stats,
        } => slice(
            &input,
            settings.as_deref(),
            &profile,
            profile_file.as_deref(),
            output.as_deref(),
            stats,
        )?,
        Commands::Bounds { input } => show_bounds(&input)?,
        Commands::Profiles => list_profiles()?,
    }

    Ok(())
}

/// Log to stderr so G-code on stdout stays clean.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_tree(path: &Path) -> Result<Element> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read element tree {}", path.display()))?;
    Element::from_json_str(&json)
        .with_context(|| format!("failed to parse element tree {}", path.display()))
}

fn read_settings(path: Option<&Path>) -> Result<PrinterSettings> {
    let Some(path) = path else {
        return Ok(PrinterSettings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let settings = match ext.to_lowercase().as_str() {
        "toml" => PrinterSettings::from_toml_str(&text),
        "json" => PrinterSettings::from_json_str(&text),
        _ => bail!("unknown settings format: {} (expected .toml or .json)", ext),
    };
    settings.with_context(|| format!("invalid settings in {}", path.display()))
}

fn read_profile(name: &str, file: Option<&Path>) -> Result<PrinterProfile> {
    if let Some(path) = file {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read profile {}", path.display()))?;
        return serde_json::from_str(&json)
            .with_context(|| format!("failed to parse profile {}", path.display()));
    }
    PrinterProfile::by_name(name).ok_or_else(|| GcodeError::UnknownProfile(name.to_owned()).into())
}

fn slice(
    input: &Path,
    settings: Option<&Path>,
    profile: &str,
    profile_file: Option<&Path>,
    output: Option<&Path>,
    stats: bool,
) -> Result<()> {
    let tree = read_tree(input)?;
    let settings = read_settings(settings)?;
    let profile = read_profile(profile, profile_file)?;

    let print = generate_composite(&tree, &settings, &profile)
        .with_context(|| format!("failed to slice {}", input.display()))?;

    match output {
        Some(path) => {
            fs::write(path, &print.gcode)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                layers = print.layer_count,
                warnings = print.warnings.len(),
                "wrote G-code"
            );
        }
        None => io::stdout()
            .write_all(print.gcode.as_bytes())
            .context("failed to write G-code to stdout")?,
    }

    if stats {
        eprintln!("{}", serde_json::to_string_pretty(&print.stats)?);
    }
    Ok(())
}

fn show_bounds(input: &Path) -> Result<()> {
    let tree = read_tree(input)?;
    let (tree, _) = tree.normalized();
    let Some(bounds) = element_bounds(&tree) else {
        bail!("{} has no printable extent", input.display());
    };
    let size = bounds.max - bounds.min;
    println!("Element: {} ({} leaves)", tree.kind(), tree.leaf_count());
    println!(
        "Min: ({:.3}, {:.3}, {:.3})",
        bounds.min.x, bounds.min.y, bounds.min.z
    );
    println!(
        "Max: ({:.3}, {:.3}, {:.3})",
        bounds.max.x, bounds.max.y, bounds.max.z
    );
    println!("Size: {:.3} x {:.3} x {:.3} mm", size.x, size.y, size.z);
    Ok(())
}

fn list_profiles() -> Result<()> {
    for (key, profile) in PrinterProfile::NAMES.iter().zip(PrinterProfile::all_profiles()) {
        println!(
            "{:<10} {:<16} {:<8} {:.0} x {:.0} x {:.0} mm{}",
            key,
            profile.name,
            profile.flavor.name(),
            profile.bed_x,
            profile.bed_y,
            profile.bed_z,
            if profile.heated_bed { ", heated bed" } else { "" }
        );
    }
    Ok(())
}
