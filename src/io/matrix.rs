//! Reading the scanner and surface matrices of a reference volume.

use crate::processing::affine::{AffineMatrix, MatrixPair, TransformError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// voxel -> scanner RAS
    ScannerAffine,
    /// voxel -> surface RAS
    SurfaceAffine,
}

impl TransformKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransformKind::ScannerAffine => "scanner-affine",
            TransformKind::SurfaceAffine => "surface-affine",
        }
    }

    /// `mri_info` flag printing this matrix.
    pub fn mri_info_flag(&self) -> &'static str {
        match self {
            TransformKind::ScannerAffine => "--vox2ras",
            TransformKind::SurfaceAffine => "--vox2ras-tkr",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("reference volume {0} does not exist")]
    VolumeNotFound(PathBuf),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status} for {volume}: {stderr}")]
    ToolFailed {
        program: String,
        volume: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("could not parse {kind} matrix: {reason}")]
    Parse { kind: TransformKind, reason: String },
    #[error("{kind} matrix is invalid: {source}")]
    Invalid {
        kind: TransformKind,
        #[source]
        source: TransformError,
    },
}

/// Source of the affine matrices stored with a reference volume.
pub trait MatrixProvider {
    fn get_transform(&self, volume: &Path, kind: TransformKind)
        -> Result<AffineMatrix, MatrixError>;
}

/// Both matrices of `volume`, read through `provider`.
pub fn load_matrix_pair<P: MatrixProvider + ?Sized>(
    provider: &P,
    volume: &Path,
) -> Result<MatrixPair, MatrixError> {
    let surface = provider.get_transform(volume, TransformKind::SurfaceAffine)?;
    let scanner = provider.get_transform(volume, TransformKind::ScannerAffine)?;
    tracing::debug!(
        "Got transforms for {}\nsurface:\n{}scanner:\n{}",
        volume.display(),
        surface,
        scanner
    );
    Ok(MatrixPair::new(surface, scanner))
}

/// Parses four rows of four whitespace-separated numbers.
///
/// Blank lines are ignored; anything else that is not a number is an error.
pub fn parse_matrix_text(text: &str, kind: TransformKind) -> Result<AffineMatrix, MatrixError> {
    let mut rows = [[0.0; 4]; 4];
    let mut n_rows = 0;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if n_rows == 4 {
            return Err(MatrixError::Parse {
                kind,
                reason: format!("more than 4 rows (extra: '{}')", line),
            });
        }
        let values = line
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MatrixError::Parse {
                kind,
                reason: format!("row {} ('{}'): {}", n_rows + 1, line, e),
            })?;
        if values.len() != 4 {
            return Err(MatrixError::Parse {
                kind,
                reason: format!("row {} has {} values, expected 4", n_rows + 1, values.len()),
            });
        }
        rows[n_rows].copy_from_slice(&values);
        n_rows += 1;
    }
    if n_rows != 4 {
        return Err(MatrixError::Parse {
            kind,
            reason: format!("expected 4 rows, found {}", n_rows),
        });
    }
    AffineMatrix::from_rows(rows).map_err(|source| MatrixError::Invalid { kind, source })
}

/// Reads matrices with the `mri_info` tool of the surface reconstruction suite.
#[derive(Debug, Clone)]
pub struct MriInfo {
    pub program: PathBuf,
}

impl Default for MriInfo {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mri_info"),
        }
    }
}

impl MriInfo {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MatrixProvider for MriInfo {
    fn get_transform(
        &self,
        volume: &Path,
        kind: TransformKind,
    ) -> Result<AffineMatrix, MatrixError> {
        if !volume.exists() {
            return Err(MatrixError::VolumeNotFound(volume.to_path_buf()));
        }
        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .arg(kind.mri_info_flag())
            .arg(volume)
            .output()
            .map_err(|source| MatrixError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(MatrixError::ToolFailed {
                program,
                volume: volume.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_matrix_text(&String::from_utf8_lossy(&output.stdout), kind)
    }
}

/// Returns the same pair for every volume.
#[derive(Debug, Clone, Copy)]
pub struct FixedMatrices(pub MatrixPair);

impl MatrixProvider for FixedMatrices {
    fn get_transform(
        &self,
        _volume: &Path,
        kind: TransformKind,
    ) -> Result<AffineMatrix, MatrixError> {
        Ok(match kind {
            TransformKind::ScannerAffine => self.0.scanner,
            TransformKind::SurfaceAffine => self.0.surface,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TKR: &str = "
        -1.00000    0.00000    0.00000   128.00000
         0.00000    0.00000    1.00000  -128.00000
         0.00000   -1.00000    0.00000   128.00000
         0.00000    0.00000    0.00000     1.00000
    ";

    #[test]
    fn test_parse_mri_info_output() {
        let m = parse_matrix_text(TKR, TransformKind::SurfaceAffine).unwrap();
        let rows = m.to_rows();
        assert_eq!(rows[0], [-1.0, 0.0, 0.0, 128.0]);
        assert_eq!(rows[1], [0.0, 0.0, 1.0, -128.0]);
        assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_parse_rejects_short_matrix() {
        let err = parse_matrix_text("1 0 0 0\n0 1 0 0\n", TransformKind::ScannerAffine)
            .unwrap_err();
        assert!(matches!(err, MatrixError::Parse { .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_matrix_text(
            "1 0 0 0\n0 1 x 0\n0 0 1 0\n0 0 0 1\n",
            TransformKind::ScannerAffine,
        )
        .unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_parse_rejects_non_affine() {
        let err = parse_matrix_text(
            "1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 1 1\n",
            TransformKind::ScannerAffine,
        )
        .unwrap_err();
        assert!(matches!(err, MatrixError::Invalid { .. }));
    }

    #[test]
    fn test_missing_volume_is_fatal() {
        let err = MriInfo::default()
            .get_transform(
                Path::new("/nonexistent/orig.mgz"),
                TransformKind::ScannerAffine,
            )
            .unwrap_err();
        assert!(matches!(err, MatrixError::VolumeNotFound(_)));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let volume = tempfile::NamedTempFile::new().unwrap();
        let err = MriInfo::new("/nonexistent/bin/mri_info")
            .get_transform(volume.path(), TransformKind::SurfaceAffine)
            .unwrap_err();
        assert!(matches!(err, MatrixError::Spawn { .. }));
    }

    #[test]
    fn test_load_pair_from_fixed_provider() {
        let pair = MatrixPair::new(
            AffineMatrix::translation(10.0, 0.0, 0.0),
            AffineMatrix::identity(),
        );
        let loaded = load_matrix_pair(&FixedMatrices(pair), Path::new("orig.mgz")).unwrap();
        assert_eq!(loaded, pair);
    }
}
