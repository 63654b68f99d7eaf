use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::io::input::{read_coordinate_records, CoordinateRecord};
use crate::io::matrix::{load_matrix_pair, MatrixProvider, MriInfo};
use crate::io::output::{leads_to_map, write_leads_json};
use crate::io::load_localization;
use crate::localization::Localization;
use crate::processing::affine::MatrixPair;
use crate::processing::ingest::IngestReport;
use crate::processing::{back_project_corrections, insert_transformed_coordinates, BackProjectReport};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub matrices: MatrixPair,
    pub ingest: IngestReport,
    pub back_projection: BackProjectReport,
}

/// Full pipeline for one subject, using the configured file layout and
/// `mri_info` for the volume matrices.
pub fn run(subject: &str, output_path: &Path, config: &Config) -> Result<RunSummary> {
    let files = config.file_locations(subject);
    tracing::info!("Converting contact coordinates for {}", subject);

    let mut localization = load_localization(&files.localization)?;
    let records = read_coordinate_records(&files.coords_t1, config.transform.has_headers)?;
    let provider = MriInfo::new(&config.transform.mri_info);
    let source = files
        .coords_t1
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| files.coords_t1.display().to_string());

    run_with(
        &mut localization,
        &records,
        &provider,
        &files.fs_orig_t1,
        output_path,
        &source,
    )
    .with_context(|| format!("run({}) failed", subject))
}

/// Pipeline over caller-supplied collaborators: read matrices, forward
/// pass, back-projection of corrections, then the JSON mapping.
pub fn run_with<P: MatrixProvider + ?Sized>(
    localization: &mut Localization,
    records: &[CoordinateRecord],
    provider: &P,
    reference_volume: &Path,
    output_path: &Path,
    source: &str,
) -> Result<RunSummary> {
    let matrices = load_matrix_pair(provider, reference_volume).with_context(|| {
        format!(
            "failed to read matrices from {}",
            reference_volume.display()
        )
    })?;

    let ingest = insert_transformed_coordinates(localization, records, &matrices, source)?;
    let back_projection = back_project_corrections(localization, &matrices)
        .context("back-projection of corrected coordinates failed")?;

    write_leads_json(output_path, &leads_to_map(localization))?;
    tracing::info!("Wrote {}", output_path.display());

    Ok(RunSummary {
        matrices,
        ingest,
        back_projection,
    })
}
