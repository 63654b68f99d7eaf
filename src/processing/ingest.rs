use crate::io::input::CoordinateRecord;
use crate::localization::{CoordinateSpace, CoordinateType, LocalizationStore, SetOutcome};
use crate::processing::affine::{AffineTransforms, TransformError};

/// A record whose contact is not part of the localization.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedContact {
    pub contact: String,
    pub source: String,
    pub line: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Contacts written, in record order.
    pub written: Vec<String>,
    pub skipped: Vec<SkippedContact>,
}

/// Maps scanner-space records to surface space and stores both coordinates.
///
/// Every record gets its surface coordinate under (surface, raw) and the
/// untouched input under (scanner, raw). Records naming a contact the store
/// does not know are skipped with a warning; the rest of the batch still
/// runs. `source` only labels the warning. A point that is not finite
/// stops the batch with [`TransformError::NonFinite`].
pub fn ingest_records<S: LocalizationStore + ?Sized>(
    store: &mut S,
    records: &[CoordinateRecord],
    transforms: &AffineTransforms,
    source: &str,
) -> Result<IngestReport, TransformError> {
    let mut report = IngestReport::default();

    for record in records {
        let scanner = record.point();
        let surface = transforms.to_surface(scanner)?;
        tracing::debug!("Transforming {}", record.contact);

        let surface_outcome = store.set_contact_coordinate(
            CoordinateSpace::Surface,
            &record.contact,
            surface,
            CoordinateType::Raw,
        );
        let outcome = match surface_outcome {
            SetOutcome::Written => store.set_contact_coordinate(
                CoordinateSpace::Scanner,
                &record.contact,
                scanner,
                CoordinateType::default(),
            ),
            missed => missed,
        };

        match outcome {
            SetOutcome::Written => report.written.push(record.contact.clone()),
            SetOutcome::UnknownContact => {
                tracing::warn!(
                    "Invalid contact {} in file {} (line {})",
                    record.contact,
                    source,
                    record.line
                );
                report.skipped.push(SkippedContact {
                    contact: record.contact.clone(),
                    source: source.to_string(),
                    line: record.line,
                });
            }
        }
    }

    tracing::info!(
        "Transformed {} contacts from {} ({} skipped)",
        report.written.len(),
        source,
        report.skipped.len()
    );
    Ok(report)
}
