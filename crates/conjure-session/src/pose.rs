//! 4x4 pose matrices in the column-major layout XR hosts report

use std::ops::Mul;

/// Rigid transform stored as a column-major 4x4 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub matrix: [f32; 16],
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        matrix: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Wrap a matrix exactly as the host reported it
    pub fn from_matrix(matrix: [f32; 16]) -> Self {
        Self { matrix }
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut pose = Self::IDENTITY;
        pose.matrix[12] = x;
        pose.matrix[13] = y;
        pose.matrix[14] = z;
        pose
    }

    /// Rotation about the vertical axis, in radians
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            matrix: [
                c, 0.0, -s, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                s, 0.0, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn translation(&self) -> [f32; 3] {
        [self.matrix[12], self.matrix[13], self.matrix[14]]
    }

    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        self.matrix[12] = x;
        self.matrix[13] = y;
        self.matrix[14] = z;
    }

    fn at(&self, row: usize, col: usize) -> f32 {
        self.matrix[col * 4 + row]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| self.at(row, k) * rhs.at(k, col)).sum();
            }
        }
        Pose { matrix: out }
    }
}
