pub mod affine;
pub mod back_project;
pub mod ingest;

use anyhow::Context;

use crate::io::input::CoordinateRecord;
use crate::localization::{CoordinateSpace, CoordinateType, LocalizationStore};
use crate::processing::affine::MatrixPair;
use crate::processing::ingest::{ingest_records, IngestReport};

pub use back_project::{back_project_corrections, BackProjectReport};

/// Forward pass: stores raw surface and scanner coordinates, then refreshes
/// pair coordinates in both spaces.
///
/// Keep `matrices` for [`back_project_corrections`]; both passes must use
/// the same pair.
pub fn insert_transformed_coordinates<S: LocalizationStore + ?Sized>(
    store: &mut S,
    records: &[CoordinateRecord],
    matrices: &MatrixPair,
    source: &str,
) -> anyhow::Result<IngestReport> {
    let transforms = matrices
        .compose()
        .context("failed to compose scanner/surface transforms")?;

    let report = ingest_records(store, records, &transforms, source)
        .with_context(|| format!("failed to transform contacts from {}", source))?;

    // contact writes are complete, derived pairs can be recomputed now
    let pairs = store
        .pairs(&store.lead_names())
        .context("failed to enumerate contact pairs")?;
    for space in [CoordinateSpace::Surface, CoordinateSpace::Scanner] {
        let n = store
            .pair_coordinates(space, &pairs, CoordinateType::Raw)
            .len();
        tracing::debug!("Computed {} of {} {} pair coordinates", n, pairs.len(), space);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::input::read_coordinate_records_from;
    use crate::localization::Pair;
    use crate::processing::affine::AffineMatrix;
    use crate::utils::test_utils::{coords_row, sample_localization};
    use approx::assert_relative_eq;

    #[test]
    fn test_pairs_follow_contact_writes() {
        let mut loc = sample_localization();
        let data = [
            coords_row("LA1", [0.0, 0.0, 0.0]),
            coords_row("LA2", [2.0, 0.0, 0.0]),
            coords_row("RB1", [0.0, 4.0, 0.0]),
        ]
        .join("\n");
        let records = read_coordinate_records_from(data.as_bytes(), false).unwrap();
        let pair = MatrixPair::new(
            AffineMatrix::translation(10.0, 0.0, 0.0),
            AffineMatrix::identity(),
        );

        let report = insert_transformed_coordinates(&mut loc, &records, &pair, "coords.csv")
            .unwrap();
        assert_eq!(report.written.len(), 3);

        let la12 = Pair::new("LA1", "LA2");
        let fs = loc
            .pair_coordinate(&la12, CoordinateSpace::Surface, CoordinateType::Raw)
            .unwrap();
        assert_relative_eq!(fs[0], 11.0, epsilon = 1e-12);
        let t1 = loc
            .pair_coordinate(&la12, CoordinateSpace::Scanner, CoordinateType::Raw)
            .unwrap();
        assert_relative_eq!(t1[0], 1.0, epsilon = 1e-12);

        // LA3 and RB2 were never written
        assert!(loc
            .pair_coordinate(&Pair::new("LA2", "LA3"), CoordinateSpace::Surface, CoordinateType::Raw)
            .is_none());
        assert!(loc
            .pair_coordinate(&Pair::new("RB1", "RB2"), CoordinateSpace::Scanner, CoordinateType::Raw)
            .is_none());
    }

    #[test]
    fn test_forward_then_back_projection_round_trip() {
        let mut loc = sample_localization();
        let records = read_coordinate_records_from(
            coords_row("LA3", [-12.5, 40.0, 7.75]).as_bytes(),
            false,
        )
        .unwrap();
        let surface = AffineMatrix::from_rows([
            [-1.0, 0.0, 0.0, 128.0],
            [0.0, 0.0, 1.0, -128.0],
            [0.0, -1.0, 0.0, 128.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap();
        let scanner = AffineMatrix::from_rows([
            [-1.0, 0.0, 0.0, 131.2],
            [0.0, 0.0, 1.0, -101.7],
            [0.0, -1.0, 0.0, 140.4],
            [0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap();
        let pair = MatrixPair::new(surface, scanner);

        insert_transformed_coordinates(&mut loc, &records, &pair, "coords.csv").unwrap();

        // feed the raw surface value back in as if it had been corrected
        let fs = loc
            .get_contact_coordinate(CoordinateSpace::Surface, "LA3", CoordinateType::Raw)
            .unwrap();
        let _ = loc.set_contact_coordinate(
            CoordinateSpace::SurfaceAverage,
            "LA3",
            fs,
            CoordinateType::Corrected,
        );
        back_project_corrections(&mut loc, &pair).unwrap();

        let back = loc
            .get_contact_coordinate(CoordinateSpace::Scanner, "LA3", CoordinateType::Corrected)
            .unwrap();
        assert_relative_eq!(back[0], -12.5, epsilon = 1e-6);
        assert_relative_eq!(back[1], 40.0, epsilon = 1e-6);
        assert_relative_eq!(back[2], 7.75, epsilon = 1e-6);
    }
}
