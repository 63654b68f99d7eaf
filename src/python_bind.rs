// File: src/python_bind.rs
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::Path;

use crate::config::Config;
use crate::entry::{run, RunSummary};
use crate::processing::affine::{AffineMatrix, MatrixPair};

#[pyclass]
#[derive(Debug, Clone)]
pub struct PyRunSummary {
    #[pyo3(get)]
    pub written: Vec<String>,
    #[pyo3(get)]
    pub skipped: Vec<String>,
    #[pyo3(get)]
    pub projected: Vec<String>,
    #[pyo3(get)]
    pub surface_matrix: [[f64; 4]; 4],
    #[pyo3(get)]
    pub scanner_matrix: [[f64; 4]; 4],
}

#[pymethods]
impl PyRunSummary {
    fn __repr__(&self) -> String {
        format!(
            "RunSummary(written={}, skipped={}, projected={})",
            self.written.len(),
            self.skipped.len(),
            self.projected.len()
        )
    }
}

impl From<RunSummary> for PyRunSummary {
    fn from(summary: RunSummary) -> Self {
        Self {
            written: summary.ingest.written,
            skipped: summary
                .ingest
                .skipped
                .into_iter()
                .map(|s| s.contact)
                .collect(),
            projected: summary.back_projection.projected,
            surface_matrix: summary.matrices.surface.to_rows(),
            scanner_matrix: summary.matrices.scanner.to_rows(),
        }
    }
}

fn matrix_arg(rows: [[f64; 4]; 4], name: &str) -> PyResult<AffineMatrix> {
    AffineMatrix::from_rows(rows)
        .map_err(|e| PyValueError::new_err(format!("{}: {}", name, e)))
}

/// Runs the full conversion for `subject` and writes the JSON mapping.
#[pyfunction]
#[pyo3(signature = (subject, output_path, config_path = None))]
pub fn run_py(
    subject: &str,
    output_path: &str,
    config_path: Option<&str>,
) -> PyResult<PyRunSummary> {
    let config = match config_path {
        Some(path) => Config::load(path),
        None => Config::from_env(),
    }
    .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))?;

    let summary = run(subject, Path::new(output_path), &config)
        .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))?;
    Ok(summary.into())
}

/// Maps points scanner -> surface, or surface -> scanner with `inverse=True`.
#[pyfunction]
#[pyo3(signature = (surface, scanner, points, inverse = false))]
pub fn transform_points_py(
    surface: [[f64; 4]; 4],
    scanner: [[f64; 4]; 4],
    points: Vec<[f64; 3]>,
    inverse: bool,
) -> PyResult<Vec<[f64; 3]>> {
    let pair = MatrixPair::new(matrix_arg(surface, "surface")?, matrix_arg(scanner, "scanner")?);
    let matrix = (if inverse { pair.inverse() } else { pair.forward() })
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    points
        .into_iter()
        .map(|p| matrix.apply(p).map_err(|e| PyRuntimeError::new_err(e.to_string())))
        .collect()
}
