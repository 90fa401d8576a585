//! Per-marker detection records as produced by a fiducial detector.

use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// One detected marker in one frame.
///
/// Records are produced fresh by the detector every frame and are never
/// carried over to the next one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Marker identifier decoded by the detector.
    pub id: i32,
    /// Raw range estimate in detector units. May be zero when the detector
    /// did not produce one.
    #[serde(default)]
    pub raw_distance: f32,
    /// Marker centre in image pixel coordinates.
    pub centroid: Point2<f32>,
    /// Marker position in camera space.
    pub translation: Vector3<f32>,
    /// Marker orientation in camera space; columns are the marker's local
    /// basis vectors. Serialized row by row.
    #[serde(with = "row_major")]
    pub orientation: Matrix3<f32>,
}

impl Default for DetectionRecord {
    fn default() -> Self {
        Self {
            id: 0,
            raw_distance: 0.0,
            centroid: Point2::origin(),
            translation: Vector3::zeros(),
            orientation: Matrix3::zeros(),
        }
    }
}

impl DetectionRecord {
    /// Build a record from plain arrays; `rows` is the orientation in
    /// row-major order.
    pub fn from_rows(
        id: i32,
        raw_distance: f32,
        centroid: [f32; 2],
        translation: [f32; 3],
        rows: [[f32; 3]; 3],
    ) -> Self {
        Self {
            id,
            raw_distance,
            centroid: Point2::new(centroid[0], centroid[1]),
            translation: Vector3::from(translation),
            orientation: matrix_from_rows(rows),
        }
    }

    /// Camera-space depth of the marker (translation z).
    #[inline]
    pub fn depth(&self) -> f32 {
        self.translation.z
    }

    /// Euclidean range from the optical centre, the quantity detectors
    /// report as `raw_distance`.
    #[inline]
    pub fn range_from_translation(&self) -> f32 {
        self.translation.norm()
    }
}

/// C-layout mirror of the record a native detector writes into its output
/// storage: an `i32` id followed by fifteen `f32` values.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RawMarkerRecord {
    pub id: i32,
    pub distance: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub translate_z: f32,
    pub rotate_11: f32,
    pub rotate_12: f32,
    pub rotate_13: f32,
    pub rotate_21: f32,
    pub rotate_22: f32,
    pub rotate_23: f32,
    pub rotate_31: f32,
    pub rotate_32: f32,
    pub rotate_33: f32,
}

/// Byte buffer whose length is not a whole number of raw records.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("record buffer of {len} bytes is not a multiple of {record_size}")]
pub struct RecordLayoutError {
    pub len: usize,
    pub record_size: usize,
}

impl RawMarkerRecord {
    pub const SIZE: usize = std::mem::size_of::<RawMarkerRecord>();

    /// Decode `count` records from a native output buffer.
    ///
    /// The buffer may be unaligned; records past `count` are not read.
    pub fn read_records(
        bytes: &[u8],
        count: usize,
    ) -> Result<Vec<DetectionRecord>, RecordLayoutError> {
        if bytes.len() % Self::SIZE != 0 {
            return Err(RecordLayoutError {
                len: bytes.len(),
                record_size: Self::SIZE,
            });
        }
        let available = bytes.len() / Self::SIZE;
        let used = &bytes[..count.min(available) * Self::SIZE];
        Ok(used
            .chunks_exact(Self::SIZE)
            .map(|chunk| DetectionRecord::from(bytemuck::pod_read_unaligned::<Self>(chunk)))
            .collect())
    }
}

impl From<RawMarkerRecord> for DetectionRecord {
    fn from(raw: RawMarkerRecord) -> Self {
        DetectionRecord::from_rows(
            raw.id,
            raw.distance,
            [raw.center_x, raw.center_y],
            [raw.translate_x, raw.translate_y, raw.translate_z],
            [
                [raw.rotate_11, raw.rotate_12, raw.rotate_13],
                [raw.rotate_21, raw.rotate_22, raw.rotate_23],
                [raw.rotate_31, raw.rotate_32, raw.rotate_33],
            ],
        )
    }
}

impl From<&DetectionRecord> for RawMarkerRecord {
    fn from(rec: &DetectionRecord) -> Self {
        let m = &rec.orientation;
        RawMarkerRecord {
            id: rec.id,
            distance: rec.raw_distance,
            center_x: rec.centroid.x,
            center_y: rec.centroid.y,
            translate_x: rec.translation.x,
            translate_y: rec.translation.y,
            translate_z: rec.translation.z,
            rotate_11: m[(0, 0)],
            rotate_12: m[(0, 1)],
            rotate_13: m[(0, 2)],
            rotate_21: m[(1, 0)],
            rotate_22: m[(1, 1)],
            rotate_23: m[(1, 2)],
            rotate_31: m[(2, 0)],
            rotate_32: m[(2, 1)],
            rotate_33: m[(2, 2)],
        }
    }
}

fn matrix_from_rows(rows: [[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::new(
        rows[0][0], rows[0][1], rows[0][2], //
        rows[1][0], rows[1][1], rows[1][2], //
        rows[2][0], rows[2][1], rows[2][2],
    )
}

mod row_major {
    use nalgebra::Matrix3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(m: &Matrix3<f32>, s: S) -> Result<S::Ok, S::Error> {
        let rows: [[f32; 3]; 3] =
            std::array::from_fn(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)]]);
        rows.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Matrix3<f32>, D::Error> {
        let rows = <[[f32; 3]; 3]>::deserialize(d)?;
        Ok(super::matrix_from_rows(rows))
    }
}
