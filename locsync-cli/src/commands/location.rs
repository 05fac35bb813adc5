//! `locsync location list|add|menu`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use locsync_core::{
    catalog, config,
    types::{AccessorConfig, Location, LocationName},
};
use locsync_sync::action::{launch_form, variant};

use super::home_dir;

#[derive(Subcommand, Debug)]
pub enum LocationCommand {
    /// List registered locations.
    List,

    /// Register a location.
    Add(AddArgs),

    /// Print the launch form offered on the machine serving a location.
    Menu(MenuArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Location name (e.g. "studio.disk"). Names are the sync role keys.
    pub name: String,

    /// Directory holding the location's files. Without it the location is
    /// registered but cannot take part in a transfer.
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    pub priority: i64,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct MenuArgs {
    /// Location this machine serves. Defaults to the first hosted location
    /// in the settings.
    #[arg(long)]
    pub current: Option<String>,
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "priority")]
    priority: i64,
    #[tabled(rename = "storage")]
    storage: String,
    #[tabled(rename = "flags")]
    flags: String,
}

pub fn run(cmd: LocationCommand) -> Result<()> {
    match cmd {
        LocationCommand::List => list(),
        LocationCommand::Add(args) => add(args),
        LocationCommand::Menu(args) => menu(args),
    }
}

fn list() -> Result<()> {
    let home = home_dir()?;
    let settings = config::load_at(&home).context("failed to load settings")?;
    let locations = catalog::list_locations_at(&home).context("failed to load locations")?;

    if locations.is_empty() {
        println!("No locations registered.");
        println!("Run: locsync location add <name> --prefix <dir>");
        return Ok(());
    }

    let rows: Vec<LocationRow> = locations
        .iter()
        .map(|location| {
            let mut flags = Vec::new();
            if location.name == settings.sync_location {
                flags.push("staging");
            }
            if settings.host_locations.contains(&location.name) {
                flags.push("hosted");
            }
            if settings.is_reserved(location.name.as_str()) {
                flags.push("reserved");
            }
            LocationRow {
                name: location.name.0.clone(),
                priority: location.priority,
                storage: storage_label(location),
                flags: flags.join(", "),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn storage_label(location: &Location) -> String {
    match &location.accessor {
        Some(AccessorConfig::Disk { prefix }) => prefix.display().to_string(),
        None => "-".to_string(),
    }
}

fn add(args: AddArgs) -> Result<()> {
    let home = home_dir()?;
    let accessor = match args.prefix {
        Some(prefix) => {
            let prefix = std::path::absolute(&prefix)
                .with_context(|| format!("invalid prefix '{}'", prefix.display()))?;
            Some(AccessorConfig::Disk { prefix })
        }
        None => None,
    };

    let location = catalog::add_location_at(
        &home,
        LocationName::from(args.name.clone()),
        args.description,
        args.priority,
        accessor,
    )
    .with_context(|| format!("failed to add location '{}'", args.name))?;

    println!(
        "{} Added location '{}' ({})",
        "✓".green(),
        location.name,
        storage_label(&location)
    );
    Ok(())
}

fn menu(args: MenuArgs) -> Result<()> {
    let home = home_dir()?;
    let settings = config::load_at(&home).context("failed to load settings")?;
    let current = match args.current {
        Some(name) => LocationName::from(name),
        None => match settings.host_locations.first() {
            Some(name) => name.clone(),
            None => bail!(
                "no hosted location configured; pass --current <name> or set host_locations"
            ),
        },
    };

    let names: Vec<LocationName> = catalog::list_locations_at(&home)
        .context("failed to load locations")?
        .into_iter()
        .map(|location| location.name)
        .collect();

    let form = launch_form(&current, &names, &settings.reserved_locations);
    let payload = serde_json::json!({
        "variant": variant(&current),
        "items": form,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to render launch form")?
    );
    Ok(())
}
