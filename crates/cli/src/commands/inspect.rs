use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use stablemap_core::exports::{symbol_table, SymbolEntry};
use stablemap_core::model::ProgramImage;
use stablemap_core::overrides::{OverrideEntry, OverrideTable};

#[derive(Serialize)]
pub struct ExportsListing {
    pub image: Option<String>,
    pub units: usize,
    pub symbols: Vec<SymbolEntry>,
}

/// Dump the symbol table of one image. Members with extra tags are flagged.
pub fn exports_command(image: &str, json: bool) -> Result<()> {
    let loaded = ProgramImage::load(Path::new(image))?;
    let symbols = symbol_table(&loaded);

    if json {
        let listing = ExportsListing {
            image: loaded.name().map(str::to_string),
            units: loaded.len(),
            symbols,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if symbols.is_empty() {
        println!("No exported members in {}.", image);
        return Ok(());
    }

    println!("Exports ({} units):", loaded.len());
    for entry in &symbols {
        let extra = if entry.extra_tags.is_empty() {
            String::new()
        } else {
            format!("  [AMBIGUOUS: also {}]", entry.extra_tags.join(", "))
        };
        println!(
            "- {} {}.{} ({}) -> {}{}",
            entry.kind,
            entry.unit,
            entry.member,
            entry.binding.as_str(),
            entry.stable_name,
            extra
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct OverridesListing {
    pub active: usize,
    pub entries: Vec<OverrideEntry>,
}

/// Validate an override table and list its rows, inactive ones included.
pub fn overrides_command(path: &str, json: bool) -> Result<()> {
    let table = OverrideTable::load(Path::new(path))?;
    let active = table.active_entries().count();

    if json {
        let listing = OverridesListing { active, entries: table.entries().to_vec() };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Override table OK: {} entries ({} active)", table.len(), active);
    for entry in table.entries() {
        let kind = entry.kind.map(|k| k.as_str()).unwrap_or("any");
        let target = entry.target_unit.as_deref().unwrap_or("(mapped unit)");
        let note = entry.note.as_deref().map(|n| format!(" -- {n}")).unwrap_or_default();
        let state = if entry.active { "" } else { " [inactive]" };
        println!(
            "- ({}, {}) -> {} {} on {}{}{}",
            entry.unit, entry.stable_name, kind, entry.member, target, state, note
        );
    }
    Ok(())
}
