//! Domain compressors layered on the bit cursor.
//!
//! These encoders exploit known value ranges to land well under native
//! word sizes:
//!
//! - Unit vectors spend bits on angles instead of three components, in two
//!   wire-compatible forms (a symmetric two-angle form and a later
//!   z-preferred form with better behavior at the poles).
//! - Bounded-magnitude vectors split a flag for zero, a flag for "within
//!   the expected range", a quantized or raw magnitude, and a direction.
//! - Affine transforms travel as a translation plus a quaternion with an
//!   implied w component.
//! - World-space points are quantized relative to the cursor's compression
//!   origin, with a 2-bit tier selecting per-axis precision and a raw
//!   fallback for far-away points.
//!
//! Every encoder here bottoms out in the [`BitCursor`] primitives, so the
//! bit layout is fully determined by this module plus `bitio`.

use crate::bitio::BitCursor;
use crate::math::{read_point3, write_point3, Mat4, Point3, Quat};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Per-axis bit widths for the four compressed-point tiers. The fourth
/// tier is a marker for raw 32-bit floats.
pub const POINT_TIER_BITS: [usize; 4] = [16, 18, 20, 32];

/// Below this magnitude a direction's x/y components are treated as zero
/// and the angle is not meaningful.
const NORMAL_EPSILON: f32 = 1e-5;

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitCursor<B> {
    /// Writes a unit vector as two angles: `phi` (heading) as a signed
    /// float in `bit_count + 1` bits and `theta` (latitude) in `bit_count`
    /// bits.
    ///
    /// Kept wire-compatible alongside [`BitCursor::write_normal_vector_z`];
    /// the two forms quantize differently (this one is coarser at the
    /// poles) and callers choose per field.
    pub fn write_normal_vector(&mut self, vec: Point3, bit_count: usize) {
        let phi = vec.x.atan2(vec.y) / PI;
        let theta = vec.z.atan2((vec.x * vec.x + vec.y * vec.y).sqrt()) / FRAC_PI_2;

        self.write_signed_float(phi, bit_count + 1);
        self.write_signed_float(theta, bit_count);
    }

    /// Writes a unit vector as a clamped z component in `z_bits` plus a
    /// heading angle in `angle_bits`. When x and y are both negligible the
    /// angle is meaningless and zero is written in its place.
    pub fn write_normal_vector_z(&mut self, vec: Point3, angle_bits: usize, z_bits: usize) {
        self.write_signed_float(vec.z.clamp(-1.0, 1.0), z_bits);

        if vec.x.abs() > NORMAL_EPSILON || vec.y.abs() > NORMAL_EPSILON {
            self.write_signed_float(vec.x.atan2(vec.y) / TAU, angle_bits);
        } else {
            self.write_signed_float(0.0, angle_bits);
        }
    }

    /// Writes a vector of bounded magnitude.
    ///
    /// Layout: a flag for `|v| > min_mag` (clear means the zero vector and
    /// nothing else is written); then a flag for `|v| < max_mag` selecting
    /// a `mag_bits` quantization of `|v| / max_mag` or a raw 32-bit float;
    /// then the normalized direction via the z-preferred form.
    pub fn write_vector(
        &mut self,
        vec: Point3,
        min_mag: f32,
        max_mag: f32,
        mag_bits: usize,
        angle_bits: usize,
        z_bits: usize,
    ) {
        let mag = vec.len();
        if self.write_flag(mag > min_mag) {
            if self.write_flag(mag < max_mag) {
                self.write_float(mag / max_mag, mag_bits);
            } else {
                self.write_f32(mag);
            }
            self.write_normal_vector_z(vec * (1.0 / mag), angle_bits, z_bits);
        }
    }

    /// Writes an affine transform: translation column, quaternion x/y/z as
    /// raw floats, and the sign of w as a flag. The caller must pass an
    /// affine matrix; this is not checked.
    pub fn write_affine_transform(&mut self, matrix: &Mat4) {
        write_point3(self, matrix.column(3));

        let q = Quat::from_rotation(matrix).normalize();
        self.write_f32(q.x);
        self.write_f32(q.y);
        self.write_f32(q.z);
        self.write_flag(q.w < 0.0);
    }

    /// Writes a world-space point relative to the compression origin.
    ///
    /// The origin-relative offset is divided by `scale` and classified into
    /// a tier by magnitude: tiers 0-2 quantize each axis to a signed
    /// integer of 16/18/20 bits, tier 3 falls back to the absolute point as
    /// three raw floats. Reader and writer must agree on both the origin
    /// and `scale`.
    pub fn write_compressed_point(&mut self, p: Point3, scale: f32) {
        let inv_scale = 1.0 / scale;
        let vec = p - self.compress_point;
        let dist = vec.len() * inv_scale;

        let tier: u32 = if dist < (1 << 15) as f32 {
            0
        } else if dist < (1 << 17) as f32 {
            1
        } else if dist < (1 << 19) as f32 {
            2
        } else {
            3
        };

        self.write_int(tier, 2);

        if tier != 3 {
            let bits = POINT_TIER_BITS[tier as usize];
            // Rounding can land exactly on the tier's magnitude limit when
            // the distance sits just under the boundary; clamp so the
            // sign-magnitude field never wraps.
            let limit = (1i32 << (bits - 1)) - 1;
            self.write_signed_int(((vec.x * inv_scale).round() as i32).clamp(-limit, limit), bits);
            self.write_signed_int(((vec.y * inv_scale).round() as i32).clamp(-limit, limit), bits);
            self.write_signed_int(((vec.z * inv_scale).round() as i32).clamp(-limit, limit), bits);
        } else {
            self.write_f32(p.x);
            self.write_f32(p.y);
            self.write_f32(p.z);
        }
    }
}

impl<B: AsRef<[u8]>> BitCursor<B> {
    /// Reads a unit vector written by [`BitCursor::write_normal_vector`].
    pub fn read_normal_vector(&mut self, bit_count: usize) -> Point3 {
        let phi = self.read_signed_float(bit_count + 1) * PI;
        let theta = self.read_signed_float(bit_count) * FRAC_PI_2;

        Point3::new(
            phi.sin() * theta.cos(),
            phi.cos() * theta.cos(),
            theta.sin(),
        )
    }

    /// Reads a unit vector written by [`BitCursor::write_normal_vector_z`].
    pub fn read_normal_vector_z(&mut self, angle_bits: usize, z_bits: usize) -> Point3 {
        let z = self.read_signed_float(z_bits);
        let angle = TAU * self.read_signed_float(angle_bits);

        // Guard against z quantizing to slightly over 1.
        let mult = (1.0 - z * z).max(0.0).sqrt();
        Point3::new(mult * angle.sin(), mult * angle.cos(), z)
    }

    /// Reads a vector written by [`BitCursor::write_vector`]. `min_mag`
    /// is part of the field's signature but only affects the write side.
    pub fn read_vector(
        &mut self,
        _min_mag: f32,
        max_mag: f32,
        mag_bits: usize,
        angle_bits: usize,
        z_bits: usize,
    ) -> Point3 {
        if self.read_flag() {
            let mag = if self.read_flag() {
                self.read_float(mag_bits) * max_mag
            } else {
                self.read_f32()
            };
            self.read_normal_vector_z(angle_bits, z_bits) * mag
        } else {
            Point3::ZERO
        }
    }

    /// Reads an affine transform written by
    /// [`BitCursor::write_affine_transform`], reconstructing
    /// `w = sqrt(max(0, 1 - x^2 - y^2 - z^2))` with the transmitted sign.
    pub fn read_affine_transform(&mut self) -> Mat4 {
        let pos = read_point3(self);
        let x = self.read_f32();
        let y = self.read_f32();
        let z = self.read_f32();

        let mut w = (1.0 - (x * x + y * y + z * z).min(1.0)).sqrt();
        if self.read_flag() {
            w = -w;
        }

        let mut matrix = Quat::new(x, y, z, w).to_matrix();
        matrix.set_column(3, pos);
        matrix
    }

    /// Reads a point written by [`BitCursor::write_compressed_point`].
    /// Tier 3 restores the absolute point verbatim; the others restore
    /// `origin + quantized * scale`.
    pub fn read_compressed_point(&mut self, scale: f32) -> Point3 {
        let tier = self.read_int(2);

        if tier == 3 {
            let x = self.read_f32();
            let y = self.read_f32();
            let z = self.read_f32();
            Point3::new(x, y, z)
        } else {
            let bits = POINT_TIER_BITS[tier as usize];
            let x = self.read_signed_int(bits) as f32;
            let y = self.read_signed_int(bits) as f32;
            let z = self.read_signed_int(bits) as f32;
            self.compress_point + Point3::new(x, y, z) * scale
        }
    }
}

/// Returns the on-wire approximation of a unit vector: what a reader will
/// see after `vec` goes through the symmetric two-angle encoding at
/// `bit_count` bits. Useful for server-side checks that must match what
/// clients were told.
pub fn quantize_normal(vec: Point3, bit_count: usize) -> Point3 {
    let mut scratch = [0u8; 32];
    let mut cursor = BitCursor::new(&mut scratch[..]);

    cursor.write_normal_vector(vec, bit_count);
    cursor.set_bit_position(0);
    cursor.read_normal_vector(bit_count)
}

#[cfg(feature = "bucketed-points")]
mod bucketed {
    use super::*;

    /// Bits needed to distinguish `value` levels (ceil(log2) of the next
    /// power of two at or above `value`).
    fn bits_for(value: f32) -> usize {
        let v = value.max(0.0) as u32;
        if v <= 1 {
            0
        } else {
            (32 - (v - 1).leading_zeros()) as usize
        }
    }

    impl<B: AsRef<[u8]> + AsMut<[u8]>> BitCursor<B> {
        /// Writes an origin-relative point using a caller-supplied table of
        /// increasing distance buckets and a base error tolerance.
        ///
        /// The direction is encoded with bit widths derived from the first
        /// bucket and the tolerance, then a ranged integer selects the
        /// first bucket exceeding the distance. Within a bucket the
        /// distance is quantized against that bucket's scaled error
        /// budget; past the last bucket it travels as a raw float.
        ///
        /// Returns the number of bits consumed.
        pub fn write_compressed_point_buckets(
            &mut self,
            p: Point3,
            dists: &[f32],
            err: f32,
        ) -> u32 {
            let num_dists = dists.len();
            let vec = p - self.compress_point;
            let len = vec.len();
            let dir = if err <= len {
                vec * (1.0 / len)
            } else {
                Point3::new(0.0, 0.0, 1.0)
            };

            let z_bits = bits_for(1.0 + 2.0 * dists[0] / err);
            let angle_bits = bits_for(dists[0] * TAU / err);
            self.write_normal_vector_z(dir, angle_bits, z_bits);

            let mut num = 0;
            while num < num_dists {
                if dists[num] > len {
                    break;
                }
                num += 1;
            }
            self.write_ranged_u32(num as u32, 0, num_dists as u32);

            let bit_count = (bits_for((num_dists + 1) as f32) + angle_bits + z_bits + 1) as u32;
            if num >= num_dists {
                self.write_f32(len);
                bit_count + 32
            } else {
                let err_bin = if num > 0 {
                    dists[num - 1] * err / dists[0]
                } else {
                    err
                };
                let min_bin = if num > 0 { dists[num - 1] } else { 0.0 };

                let extra_bits = bits_for((dists[num] - min_bin) / err_bin);
                self.write_float((len - min_bin) / (dists[num] - min_bin), extra_bits);
                bit_count + extra_bits as u32
            }
        }
    }

    impl<B: AsRef<[u8]>> BitCursor<B> {
        /// Reads a point written by
        /// [`BitCursor::write_compressed_point_buckets`] with the same
        /// bucket table and tolerance. Returns the point and the number of
        /// bits consumed.
        pub fn read_compressed_point_buckets(
            &mut self,
            dists: &[f32],
            err: f32,
        ) -> (Point3, u32) {
            let num_dists = dists.len();
            let z_bits = bits_for(1.0 + 2.0 * dists[0] / err);
            let angle_bits = bits_for(dists[0] * TAU / err);
            let dir = self.read_normal_vector_z(angle_bits, z_bits);

            let num = self.read_ranged_u32(0, num_dists as u32) as usize;

            let bit_count = (bits_for((num_dists + 1) as f32) + angle_bits + z_bits + 1) as u32;
            let (len, used) = if num >= num_dists {
                (self.read_f32(), bit_count + 32)
            } else {
                let err_bin = if num > 0 {
                    dists[num - 1] * err / dists[0]
                } else {
                    err
                };
                let min_bin = if num > 0 { dists[num - 1] } else { 0.0 };

                let extra_bits = bits_for((dists[num] - min_bin) / err_bin);
                let frac = self.read_float(extra_bits);
                ((dists[num] - min_bin) * frac + min_bin, bit_count + extra_bits as u32)
            };

            (self.compress_point + dir * len, used)
        }
    }
}
