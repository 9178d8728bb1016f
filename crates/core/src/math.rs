//! Math collaborators for the serialization engine.
//!
//! The compressors operate on plain value types: a 3-component float vector,
//! a quaternion, and a row-major 4x4 matrix whose fourth column carries the
//! translation. Only the operations the wire format needs are provided;
//! gameplay math lives elsewhere.

use crate::bitio::BitCursor;

/// 3D vector: positions, velocities, directions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Point3 {
    /// Creates a new Point3.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn len_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length
    #[must_use]
    pub fn len(self) -> f32 {
        self.len_squared().sqrt()
    }
}

impl std::ops::Add for Point3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Point3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Point3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Unit quaternion for rotations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quat {
    /// Creates a new quaternion.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Extracts the rotation of an affine matrix as a quaternion.
    ///
    /// Uses the trace-based branch that keeps the dominant component away
    /// from zero, so the conversion stays numerically stable for all
    /// orientations.
    #[must_use]
    pub fn from_rotation(m: &Mat4) -> Self {
        let (m00, m01, m02) = (m.m[0], m.m[1], m.m[2]);
        let (m10, m11, m12) = (m.m[4], m.m[5], m.m[6]);
        let (m20, m21, m22) = (m.m[8], m.m[9], m.m[10]);

        let trace = m00 + m11 + m22;
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        }
    }

    /// Returns the normalized quaternion (identity if degenerate).
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Builds the rotation matrix of this quaternion (must be unit length).
    #[must_use]
    pub fn to_matrix(self) -> Mat4 {
        let Self { x, y, z, w } = self;
        let mut m = Mat4::IDENTITY;
        m.m[0] = 1.0 - 2.0 * (y * y + z * z);
        m.m[1] = 2.0 * (x * y - w * z);
        m.m[2] = 2.0 * (x * z + w * y);
        m.m[4] = 2.0 * (x * y + w * z);
        m.m[5] = 1.0 - 2.0 * (x * x + z * z);
        m.m[6] = 2.0 * (y * z - w * x);
        m.m[8] = 2.0 * (x * z - w * y);
        m.m[9] = 2.0 * (y * z + w * x);
        m.m[10] = 1.0 - 2.0 * (x * x + y * y);
        m
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Row-major 4x4 matrix. The upper-left 3x3 block is the rotation and
/// column 3 is the translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    /// Elements in row-major order: `m[row * 4 + col]`.
    pub m: [f32; 16],
}

impl Mat4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Returns the first three rows of column `col` as a vector.
    #[must_use]
    pub fn column(&self, col: usize) -> Point3 {
        Point3::new(self.m[col], self.m[4 + col], self.m[8 + col])
    }

    /// Stores `p` into the first three rows of column `col`.
    pub fn set_column(&mut self, col: usize, p: Point3) {
        self.m[col] = p.x;
        self.m[4 + col] = p.y;
        self.m[8 + col] = p.z;
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Writes a vector as three raw 32-bit little-endian floats, x then y then z.
pub fn write_point3<B: AsRef<[u8]> + AsMut<[u8]>>(stream: &mut BitCursor<B>, p: Point3) {
    stream.write_f32(p.x);
    stream.write_f32(p.y);
    stream.write_f32(p.z);
}

/// Reads a vector previously written by [`write_point3`].
pub fn read_point3<B: AsRef<[u8]>>(stream: &mut BitCursor<B>) -> Point3 {
    let x = stream.read_f32();
    let y = stream.read_f32();
    let z = stream.read_f32();
    Point3::new(x, y, z)
}
