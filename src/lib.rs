pub mod config;
pub mod entry;
pub mod io;
pub mod localization;
pub mod processing;
mod utils;

#[cfg(feature = "python")]
mod python_bind;

pub use config::{Config, FileLocations};
pub use entry::{run, run_with, RunSummary};
pub use localization::{
    CoordinateSpace, CoordinateType, Localization, LocalizationError, LocalizationStore, Pair,
    SetOutcome,
};
pub use processing::affine::{AffineMatrix, AffineTransforms, MatrixPair, TransformError};
pub use processing::ingest::{IngestReport, SkippedContact};
pub use processing::{back_project_corrections, insert_transformed_coordinates, BackProjectReport};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// This is the module importable from Python:
///
/// ```python
/// import fscoords
/// fscoords.run_py("R1001P", "out/voxel_coordinates_fs.json")
/// fscoords.transform_points_py(surface, scanner, [(1.0, 2.0, 3.0)])
/// ```
#[cfg(feature = "python")]
#[pymodule]
fn fscoords(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use python_bind::{run_py, transform_points_py, PyRunSummary};

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_function(wrap_pyfunction!(run_py, m)?)?;
    m.add_function(wrap_pyfunction!(transform_points_py, m)?)?;
    m.add_class::<PyRunSummary>()?;
    Ok(())
}
