use crate::localization::{CoordinateSpace, CoordinateType, LocalizationStore, SetOutcome};
use crate::processing::affine::{MatrixPair, TransformError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackProjectReport {
    /// Contacts that received a corrected scanner coordinate.
    pub projected: Vec<String>,
}

/// Projects corrected coordinates back into scanner space.
///
/// For each contact with a (surface_average, corrected) value, writes
/// `scanner * surface^-1 * p` under (scanner, corrected). Contacts without a
/// correction are left alone.
///
/// The corrected value is read from the group-average space but sent
/// through the subject's own matrix pair. This mirrors the established
/// pipeline behaviour and is kept as is pending review by someone who owns
/// the registration step.
pub fn back_project_corrections<S: LocalizationStore + ?Sized>(
    store: &mut S,
    matrices: &MatrixPair,
) -> Result<BackProjectReport, TransformError> {
    let transforms = matrices.compose()?;
    let mut report = BackProjectReport::default();

    for contact in store.contacts() {
        let Some(corrected) = store.get_contact_coordinate(
            CoordinateSpace::SurfaceAverage,
            &contact,
            CoordinateType::Corrected,
        ) else {
            continue;
        };

        let scanner = transforms.to_scanner(corrected)?;
        match store.set_contact_coordinate(
            CoordinateSpace::Scanner,
            &contact,
            scanner,
            CoordinateType::Corrected,
        ) {
            SetOutcome::Written => report.projected.push(contact),
            SetOutcome::UnknownContact => {
                tracing::warn!("Contact {} vanished from the localization", contact);
            }
        }
    }

    tracing::info!(
        "Projected {} corrected contacts back to scanner space",
        report.projected.len()
    );
    Ok(report)
}
