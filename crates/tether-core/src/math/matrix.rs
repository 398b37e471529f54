// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Column-major 4x4 matrix used for local and attachment transforms.

use super::{Quaternion, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 4x4 column-major matrix.
///
/// Vectors are treated as columns, so `a * b` applies `b` first. A slot's
/// result transform `T' * A` therefore places the attachment offset `A`
/// inside the joint frame `T'`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec4::ZERO; 4],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec4 {
        Vec4 {
            x: self.cols[0].get(index),
            y: self.cols[1].get(index),
            z: self.cols[2].get(index),
            w: self.cols[3].get(index),
        }
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self {
            cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::new(v.x, v.y, v.z, 1.0)],
        }
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            cols: [
                Vec4::new(scale.x, 0.0, 0.0, 0.0),
                Vec4::new(0.0, scale.y, 0.0, 0.0),
                Vec4::new(0.0, 0.0, scale.z, 0.0),
                Vec4::W,
            ],
        }
    }

    /// Creates a scaling matrix with the same factor on every axis.
    #[inline]
    pub fn from_uniform_scale(scale: f32) -> Self {
        Self::from_scale(Vec3::splat(scale))
    }

    /// Creates a rotation matrix from a quaternion.
    ///
    /// The quaternion is expected to be normalized.
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);

        Self {
            cols: [
                Vec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
                Vec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
                Vec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
                Vec4::W,
            ],
        }
    }

    /// Builds `Translate(translation) * Rotate(rotation) * Scale(scale)`.
    #[inline]
    pub fn from_trs(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self::from_translation(translation) * Self::from_quat(rotation) * Self::from_scale(scale)
    }

    /// The translation part stored in the last column.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Transforms a point (`w = 1`), applying translation.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }

    /// Component-wise comparison within `epsilon`.
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.cols.iter().zip(other.cols.iter()).all(|(a, b)| {
            (0..4).all(|i| super::approx_eq_eps(a.get(i), b.get(i), epsilon))
        })
    }
}

impl Default for Mat4 {
    /// Returns the identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat4`. Not commutative.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result_cols = [Vec4::ZERO; 4];
        for (c_idx, target) in result_cols.iter_mut().enumerate() {
            let col = rhs.cols[c_idx];
            *target = Vec4 {
                x: self.get_row(0).dot(col),
                y: self.get_row(1).dot(col),
                z: self.get_row(2).dot(col),
                w: self.get_row(3).dot(col),
            };
        }
        Mat4 { cols: result_cols }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, FRAC_PI_2};

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn identity_is_neutral() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m * Mat4::IDENTITY, m);
        assert_eq!(Mat4::IDENTITY * m, m);
    }

    #[test]
    fn from_quat_matches_quaternion_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7);
        let v = Vec3::new(0.3, -2.0, 5.0);
        assert!(vec3_approx_eq(
            Mat4::from_quat(q).transform_point(v),
            q.rotate_vec3(v)
        ));
    }

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let m = Mat4::from_trs(
            Vec3::new(10.0, 0.0, 0.0),
            Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2),
            Vec3::splat(2.0),
        );
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
        assert!(vec3_approx_eq(
            m.transform_point(Vec3::X),
            Vec3::new(10.0, 2.0, 0.0)
        ));
        assert!(vec3_approx_eq(m.translation(), Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn get_row_reads_across_columns() {
        let m = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.get_row(0), Vec4::new(1.0, 0.0, 0.0, 4.0));
        assert_eq!(m.get_row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }
}
