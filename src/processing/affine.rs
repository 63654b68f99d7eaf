//! Affine matrices between scanner space and surface space.
//!
//! A reference volume carries two voxel-to-RAS matrices: the scanner
//! matrix (voxel -> scanner RAS) and the surface matrix (voxel -> surface
//! RAS). Both share the voxel grid, so a scanner point reaches surface space
//! through `surface * scanner^-1` and comes back through
//! `scanner * surface^-1`.

use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;
use thiserror::Error;

/// Tolerance for the affine bottom row and the homogeneous component.
pub const HOMOGENEOUS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// Matrix has no inverse.
    #[error("{label} matrix is singular and cannot be inverted")]
    Singular { label: &'static str },
    /// Matrix is not a 3-D affine transform in homogeneous form.
    #[error("matrix is not affine: {0}")]
    NotAffine(String),
    /// A transformed point came out with w != 1.
    #[error("homogeneous component drifted to {w} after transforming {point:?}")]
    HomogeneousDrift { point: [f64; 3], w: f64 },
    /// Input or output point has an infinite or NaN component.
    #[error("non-finite coordinate transforming {point:?}")]
    NonFinite { point: [f64; 3] },
}

/// 4x4 affine transform, row 3 fixed to [0, 0, 0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]")]
pub struct AffineMatrix(Matrix4<f64>);

impl AffineMatrix {
    pub fn new(matrix: Matrix4<f64>) -> Result<Self, TransformError> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NotAffine(
                "matrix contains non-finite entries".to_string(),
            ));
        }
        let bottom = [0.0, 0.0, 0.0, 1.0];
        for (col, expected) in bottom.iter().enumerate() {
            if (matrix[(3, col)] - expected).abs() > HOMOGENEOUS_TOLERANCE {
                return Err(TransformError::NotAffine(format!(
                    "bottom row must be [0, 0, 0, 1], got [{}, {}, {}, {}]",
                    matrix[(3, 0)],
                    matrix[(3, 1)],
                    matrix[(3, 2)],
                    matrix[(3, 3)]
                )));
            }
        }
        Ok(Self(matrix))
    }

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Result<Self, TransformError> {
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(Matrix4::from_row_slice(&flat))
    }

    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = x;
        m[(1, 3)] = y;
        m[(2, 3)] = z;
        Self(m)
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.0[(r, c)];
            }
        }
        rows
    }

    /// Inverts the matrix, `label` names it in the error.
    pub fn try_inverse(&self, label: &'static str) -> Result<Self, TransformError> {
        self.0
            .try_inverse()
            .map(Self)
            .ok_or(TransformError::Singular { label })
    }

    /// Maps a 3-D point through the matrix in homogeneous coordinates.
    ///
    /// The fourth component of the product must stay 1; anything else means
    /// the matrices were composed wrongly and is reported, not renormalized.
    pub fn apply(&self, point: [f64; 3]) -> Result<[f64; 3], TransformError> {
        if point.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite { point });
        }
        let out = self.apply_homogeneous(point);
        // written so that a NaN w fails too
        if !((out[3] - 1.0).abs() <= HOMOGENEOUS_TOLERANCE) {
            return Err(TransformError::HomogeneousDrift { point, w: out[3] });
        }
        let xyz = [out[0], out[1], out[2]];
        if xyz.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite { point });
        }
        Ok(xyz)
    }

    /// Raw product with the homogeneous point, w included.
    pub fn apply_homogeneous(&self, point: [f64; 3]) -> Vector4<f64> {
        self.0 * to_homogeneous(point)
    }
}

impl Mul for AffineMatrix {
    type Output = AffineMatrix;

    fn mul(self, rhs: AffineMatrix) -> AffineMatrix {
        Self(self.0 * rhs.0)
    }
}

impl TryFrom<[[f64; 4]; 4]> for AffineMatrix {
    type Error = TransformError;

    fn try_from(rows: [[f64; 4]; 4]) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<AffineMatrix> for [[f64; 4]; 4] {
    fn from(m: AffineMatrix) -> Self {
        m.to_rows()
    }
}

impl fmt::Display for AffineMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "{:>12.6} {:>12.6} {:>12.6} {:>12.6}", row[0], row[1], row[2], row[3])?;
        }
        Ok(())
    }
}

/// (x, y, z) -> (x, y, z, 1)
pub fn to_homogeneous(point: [f64; 3]) -> Vector4<f64> {
    Vector4::new(point[0], point[1], point[2], 1.0)
}

/// The two matrices read from one reference volume.
///
/// Forward and inverse passes must use the same pair, so the pair is what
/// gets handed from the ingestion step to the back-projection step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixPair {
    /// voxel -> surface RAS
    pub surface: AffineMatrix,
    /// voxel -> scanner RAS
    pub scanner: AffineMatrix,
}

impl MatrixPair {
    pub fn new(surface: AffineMatrix, scanner: AffineMatrix) -> Self {
        Self { surface, scanner }
    }

    /// `surface * scanner^-1`
    pub fn forward(&self) -> Result<AffineMatrix, TransformError> {
        Ok(self.surface * self.scanner.try_inverse("scanner")?)
    }

    /// `scanner * surface^-1`
    pub fn inverse(&self) -> Result<AffineMatrix, TransformError> {
        Ok(self.scanner * self.surface.try_inverse("surface")?)
    }

    pub fn compose(&self) -> Result<AffineTransforms, TransformError> {
        Ok(AffineTransforms {
            forward: self.forward()?,
            inverse: self.inverse()?,
        })
    }
}

/// Forward and inverse transforms, computed once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransforms {
    /// scanner -> surface
    pub forward: AffineMatrix,
    /// surface -> scanner
    pub inverse: AffineMatrix,
}

impl AffineTransforms {
    pub fn to_surface(&self, point: [f64; 3]) -> Result<[f64; 3], TransformError> {
        self.forward.apply(point)
    }

    pub fn to_scanner(&self, point: [f64; 3]) -> Result<[f64; 3], TransformError> {
        self.inverse.apply(point)
    }
}
