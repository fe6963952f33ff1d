//! Flat binary export of a [`PixelMapping`].
//!
//! One 16-byte record per pixel in raster order: `u`, `v`, `theta` and `phi`
//! as little-endian `i32`, angles in whole arc-seconds truncated toward zero.
//! The file is a cache/debug artifact, not part of the control path.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use scanmap_core::{radians_to_arcsec, ValueError};

use crate::camera::PixelMapping;

/// Size of one record in bytes.
pub const TABLE_RECORD_BYTES: usize = 16;

/// One pixel of the exported table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRecord {
    pub u: i32,
    pub v: i32,
    pub theta_arcsec: i32,
    pub phi_arcsec: i32,
}

impl TableRecord {
    pub fn to_le_bytes(&self) -> [u8; TABLE_RECORD_BYTES] {
        let mut out = [0u8; TABLE_RECORD_BYTES];
        let words = [self.u, self.v, self.theta_arcsec, self.phi_arcsec];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: &[u8; TABLE_RECORD_BYTES]) -> Self {
        let word = |i: usize| {
            i32::from_le_bytes([bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]])
        };
        Self {
            u: word(0),
            v: word(1),
            theta_arcsec: word(2),
            phi_arcsec: word(3),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TableIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("table length {len} is not a multiple of 16 bytes")]
    Truncated { len: usize },
    #[error("pixel address {0} does not fit a table record")]
    AddressOverflow(u32),
}

impl PixelMapping {
    /// Table records in raster order.
    pub fn table_records(&self) -> Result<Vec<TableRecord>, TableIoError> {
        let (pixels, angles) = self.generate_mapping_arrays();
        pixels
            .iter()
            .zip(angles)
            .map(|(&[u, v], angle)| {
                Ok(TableRecord {
                    u: i32::try_from(u).map_err(|_| TableIoError::AddressOverflow(u))?,
                    v: i32::try_from(v).map_err(|_| TableIoError::AddressOverflow(v))?,
                    theta_arcsec: radians_to_arcsec("theta", angle.theta)?,
                    phi_arcsec: radians_to_arcsec("phi", angle.phi)?,
                })
            })
            .collect()
    }

    /// Write the table to `writer`, returning the number of records.
    pub fn write_table<W: Write>(&self, writer: W) -> Result<usize, TableIoError> {
        let records = self.table_records()?;
        let mut writer = BufWriter::new(writer);
        for record in &records {
            writer.write_all(&record.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(records.len())
    }

    /// Write the table to a file.
    pub fn save_table(&self, path: impl AsRef<Path>) -> Result<usize, TableIoError> {
        self.write_table(File::create(path)?)
    }
}

/// Read every record from `reader`.
pub fn read_table<R: Read>(reader: R) -> Result<Vec<TableRecord>, TableIoError> {
    let mut raw = Vec::new();
    BufReader::new(reader).read_to_end(&mut raw)?;
    if raw.len() % TABLE_RECORD_BYTES != 0 {
        return Err(TableIoError::Truncated { len: raw.len() });
    }
    Ok(raw
        .chunks_exact(TABLE_RECORD_BYTES)
        .map(|chunk| {
            let mut bytes = [0u8; TABLE_RECORD_BYTES];
            bytes.copy_from_slice(chunk);
            TableRecord::from_le_bytes(&bytes)
        })
        .collect())
}

/// Read a table previously written with [`PixelMapping::save_table`].
pub fn load_table(path: impl AsRef<Path>) -> Result<Vec<TableRecord>, TableIoError> {
    read_table(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraParams, FisheyeDistortion, Intrinsics, Resolution};

    fn small_mapping() -> PixelMapping {
        PixelMapping::new(CameraParams {
            intrinsics: Intrinsics {
                fx: 2.0,
                fy: 2.0,
                cx: 1.0,
                cy: 0.5,
            },
            distortion: FisheyeDistortion::default(),
            resolution: Resolution { rows: 2, cols: 3 },
        })
        .expect("mapping")
    }

    #[test]
    fn records_are_little_endian_words() {
        let record = TableRecord {
            u: 1,
            v: 2,
            theta_arcsec: 324_000,
            phi_arcsec: -5,
        };
        let bytes = record.to_le_bytes();
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &324_000i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &[0xFB, 0xFF, 0xFF, 0xFF]);
        assert_eq!(TableRecord::from_le_bytes(&bytes), record);
    }

    #[test]
    fn export_covers_every_pixel_in_raster_order() {
        let mapping = small_mapping();
        let mut buf = Vec::new();
        let n = mapping.write_table(&mut buf).expect("write");
        assert_eq!(n, 6);
        assert_eq!(buf.len(), 6 * TABLE_RECORD_BYTES);

        let records = read_table(buf.as_slice()).expect("read");
        let addresses: Vec<(i32, i32)> = records.iter().map(|r| (r.u, r.v)).collect();
        assert_eq!(addresses, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);

        // Pixel (1, 0) sits straight above the principal point at
        // theta_d = 0.25, so phi = 0 and theta = 90 deg + 0.25 rad.
        let expected_theta = (90.0 + 0.25_f64.to_degrees()) * 3600.0;
        assert_eq!(records[1].phi_arcsec, 0);
        assert_eq!(records[1].theta_arcsec, expected_theta.trunc() as i32);
    }

    #[test]
    fn truncated_file_is_rejected() {
        let err = read_table(&[0u8; 20][..]).unwrap_err();
        assert!(matches!(err, TableIoError::Truncated { len: 20 }));
    }

    #[test]
    fn save_and_load_through_a_file() {
        let mapping = small_mapping();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pixel_table.bin");
        mapping.save_table(&path).expect("save");
        let loaded = load_table(&path).expect("load");
        assert_eq!(loaded, mapping.table_records().expect("records"));
    }
}
