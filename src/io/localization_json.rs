use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::localization::{Contact, Lead, Localization};

#[derive(Debug, Deserialize)]
struct LocalizationFile {
    leads: BTreeMap<String, LeadEntry>,
}

#[derive(Debug, Deserialize)]
struct LeadEntry {
    #[serde(rename = "type", default)]
    lead_type: String,
    #[serde(default)]
    contacts: Vec<Contact>,
}

/// Loads a subject's localization record.
///
/// Layout: `{"leads": {"<lead>": {"type": "D", "contacts": [{"name": "LA1",
/// "coordinate_spaces": {"fs": {"raw": [x, y, z]}}}]}}}`.
/// Leads come back sorted by name; contact order within a lead is kept.
pub fn load_localization<P: AsRef<Path>>(path: P) -> Result<Localization> {
    let file = File::open(&path).with_context(|| {
        format!("failed to open localization {}", path.as_ref().display())
    })?;
    read_localization(BufReader::new(file))
        .with_context(|| format!("failed to load localization {}", path.as_ref().display()))
}

pub fn read_localization<R: Read>(reader: R) -> Result<Localization> {
    let parsed: LocalizationFile =
        serde_json::from_reader(reader).context("invalid localization JSON")?;
    let leads = parsed
        .leads
        .into_iter()
        .map(|(name, entry)| Lead {
            name,
            lead_type: entry.lead_type,
            contacts: entry.contacts,
        })
        .collect();
    Ok(Localization::from_leads(leads)?)
}
