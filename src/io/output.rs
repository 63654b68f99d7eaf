use anyhow::{anyhow, Context};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::localization::{pairs::adjacent_pairs, CoordinateMap, Localization};

/// space label -> type label -> [x, y, z]
pub type CoordinateOutput = BTreeMap<String, BTreeMap<String, [f64; 3]>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadOutput {
    pub contacts: BTreeMap<String, CoordinateOutput>,
    pub pairs: BTreeMap<String, CoordinateOutput>,
    #[serde(rename = "type")]
    pub lead_type: String,
}

fn coordinate_output(map: &CoordinateMap) -> CoordinateOutput {
    map.iter()
        .filter(|(_, by_type)| !by_type.is_empty())
        .map(|(space, by_type)| {
            let types = by_type
                .iter()
                .map(|(kind, xyz)| (kind.label().to_string(), *xyz))
                .collect();
            (space.label().to_string(), types)
        })
        .collect()
}

/// lead -> contacts/pairs -> space -> type -> coordinate, every level sorted.
pub fn leads_to_map(localization: &Localization) -> BTreeMap<String, LeadOutput> {
    localization
        .leads()
        .iter()
        .map(|lead| {
            let contacts = lead
                .contacts
                .iter()
                .map(|c| (c.name.clone(), coordinate_output(&c.coordinate_spaces)))
                .collect();
            let pairs = adjacent_pairs(lead)
                .into_iter()
                .filter_map(|pair| {
                    let coords = coordinate_output(localization.pair_coordinate_map(&pair)?);
                    (!coords.is_empty()).then(|| (pair.to_string(), coords))
                })
                .collect();
            (
                lead.name.clone(),
                LeadOutput {
                    contacts,
                    pairs,
                    lead_type: lead.lead_type.clone(),
                },
            )
        })
        .collect()
}

/// Writes the lead mapping as JSON, indented by 2, keys sorted.
pub fn write_leads_json<P: AsRef<Path>>(
    path: P,
    leads: &BTreeMap<String, LeadOutput>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Could not create output directory: {:?}", parent))?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, leads)
        .map_err(|e| anyhow!("Failed to write lead JSON to {}: {}", path.display(), e))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
