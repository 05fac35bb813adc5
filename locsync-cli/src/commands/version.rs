//! `locsync version add|list`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use locsync_core::{
    catalog,
    types::{AccessorConfig, AssetVersion, Component, LocationName, VersionId},
};
use locsync_sync::disk::DiskAccessor;

use super::home_dir;

#[derive(Subcommand, Debug)]
pub enum VersionCommand {
    /// Import component files into a disk location and register the version.
    Add(AddArgs),

    /// List registered versions.
    List,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Version id, used as the selection entry when syncing.
    pub id: String,

    /// Disk location the files are imported into.
    #[arg(long)]
    pub location: String,

    /// Component as `<name>=<file>`; repeat for each component.
    #[arg(long = "component", value_name = "NAME=FILE", value_parser = parse_component_arg, required = true)]
    pub components: Vec<(String, PathBuf)>,

    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "label")]
    label: String,
    #[tabled(rename = "components")]
    components: String,
}

fn parse_component_arg(raw: &str) -> std::result::Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, file)) if !name.trim().is_empty() && !file.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(file.trim())))
        }
        _ => Err(format!("expected <name>=<file>, got '{raw}'")),
    }
}

pub fn run(cmd: VersionCommand) -> Result<()> {
    match cmd {
        VersionCommand::Add(args) => add(args),
        VersionCommand::List => list(),
    }
}

fn add(args: AddArgs) -> Result<()> {
    let home = home_dir()?;
    let id = VersionId::from(args.id.clone());
    catalog::check_entry_name("asset version", id.as_str())?;
    if catalog::version_path_at(&home, &id).exists() {
        bail!("version '{id}' already exists");
    }

    let location = catalog::load_location_at(&home, &LocationName::from(args.location.clone()))
        .with_context(|| format!("unknown location '{}'", args.location))?;
    let disk = match &location.accessor {
        Some(AccessorConfig::Disk { prefix }) => DiskAccessor::new(prefix.clone()),
        None => bail!(
            "location '{}' has no storage prefix; files cannot be imported into it",
            location.name
        ),
    };

    let mut components = Vec::with_capacity(args.components.len());
    for (index, (name, file)) in args.components.iter().enumerate() {
        let component = Component::new(format!("{id}-{}", index + 1), name.as_str());
        disk.import_file(&component, file)
            .with_context(|| format!("failed to import '{}'", file.display()))?;
        components.push(component);
    }

    let version = AssetVersion {
        id,
        label: args.label,
        components,
    };
    catalog::save_version_at(&home, &version).context("failed to save version")?;

    println!(
        "{} Added version '{}' with {} component(s) in '{}'",
        "✓".green(),
        version.id,
        version.components.len(),
        location.name
    );
    for component in &version.components {
        println!("  {}  {}", component.id, component.name);
    }
    Ok(())
}

fn list() -> Result<()> {
    let home = home_dir()?;
    let versions = catalog::list_versions_at(&home).context("failed to load versions")?;
    if versions.is_empty() {
        println!("No versions registered.");
        return Ok(());
    }

    let rows: Vec<VersionRow> = versions
        .into_iter()
        .map(|version| VersionRow {
            id: version.id.0,
            label: version.label.unwrap_or_default(),
            components: version
                .components
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
