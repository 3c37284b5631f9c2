//! Zip container of `.npy` entries, as written by `numpy.savez`.
//!
//! The archive is assembled in memory and only handed to the sink by
//! [`NpzWriter::finish`], so nothing reaches the sink if building fails.
//! Only zip32 is supported.

use std::collections::HashSet;
use std::io::{self, Cursor, Read, Write};

use flate2::Crc;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};

use super::npy::NdArray;
use crate::error::{ExportError, ExportResult};

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Zip 2.0, needed for deflate.
const ZIP_VERSION: u16 = 20;

/// 1980-01-01 00:00, the DOS epoch.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = 0x0021;

/// How entries are stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Raw entries, like `numpy.savez`.
    #[default]
    Stored,
    /// Deflated entries, like `numpy.savez_compressed`.
    Deflate,
}

impl Compression {
    fn method(self) -> u16 {
        match self {
            Compression::Stored => 0,
            Compression::Deflate => 8,
        }
    }
}

#[derive(Debug)]
struct CentralEntry {
    name: String,
    method: u16,
    crc: u32,
    compressed_size: u32,
    size: u32,
    offset: u32,
}

/// Collects named arrays into an in-memory `.npz` archive.
pub struct NpzWriter {
    compression: Compression,
    buf: Vec<u8>,
    entries: Vec<CentralEntry>,
    names: HashSet<String>,
}

impl NpzWriter {
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            buf: Vec::new(),
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Number of arrays added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an array stored as `<name>.npy`.
    pub fn add(&mut self, name: &str, array: &NdArray) -> ExportResult<()> {
        if !array.is_consistent() {
            return Err(ExportError::ShapeMismatch {
                name: name.to_string(),
                len: array.data.len(),
                shape: array.shape.clone(),
            });
        }
        if !self.names.insert(name.to_string()) {
            return Err(ExportError::DuplicateName(name.to_string()));
        }
        if self.entries.len() >= u16::MAX as usize {
            return Err(ExportError::TooLarge(format!(
                "more than {} entries",
                u16::MAX
            )));
        }

        let raw = array.to_npy_bytes()?;
        let mut crc = Crc::new();
        crc.update(&raw);
        let size = zip32(raw.len(), name)?;

        let payload = match self.compression {
            Compression::Stored => raw,
            Compression::Deflate => {
                let mut enc = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(&raw)?;
                enc.finish()?
            }
        };

        let entry = CentralEntry {
            name: format!("{}.npy", name),
            method: self.compression.method(),
            crc: crc.sum(),
            compressed_size: zip32(payload.len(), name)?,
            size,
            offset: zip32(self.buf.len(), name)?,
        };

        put_u32(&mut self.buf, LOCAL_HEADER_SIG);
        put_u16(&mut self.buf, ZIP_VERSION);
        put_u16(&mut self.buf, 0);
        put_u16(&mut self.buf, entry.method);
        put_u16(&mut self.buf, DOS_TIME);
        put_u16(&mut self.buf, DOS_DATE);
        put_u32(&mut self.buf, entry.crc);
        put_u32(&mut self.buf, entry.compressed_size);
        put_u32(&mut self.buf, entry.size);
        put_u16(&mut self.buf, entry.name.len() as u16);
        put_u16(&mut self.buf, 0);
        self.buf.extend_from_slice(entry.name.as_bytes());
        self.buf.extend_from_slice(&payload);

        // The archive must still be addressable after this entry.
        zip32(self.buf.len(), name)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Append the central directory and write the whole archive to `w`.
    ///
    /// Returns the number of bytes written.
    pub fn finish<W: Write>(mut self, w: &mut W) -> ExportResult<u64> {
        let dir_offset = zip32(self.buf.len(), "central directory")?;
        for entry in &self.entries {
            put_u32(&mut self.buf, CENTRAL_HEADER_SIG);
            put_u16(&mut self.buf, ZIP_VERSION);
            put_u16(&mut self.buf, ZIP_VERSION);
            put_u16(&mut self.buf, 0);
            put_u16(&mut self.buf, entry.method);
            put_u16(&mut self.buf, DOS_TIME);
            put_u16(&mut self.buf, DOS_DATE);
            put_u32(&mut self.buf, entry.crc);
            put_u32(&mut self.buf, entry.compressed_size);
            put_u32(&mut self.buf, entry.size);
            put_u16(&mut self.buf, entry.name.len() as u16);
            // Extra field, comment, start disk, internal attributes.
            put_u16(&mut self.buf, 0);
            put_u16(&mut self.buf, 0);
            put_u16(&mut self.buf, 0);
            put_u16(&mut self.buf, 0);
            put_u32(&mut self.buf, 0);
            put_u32(&mut self.buf, entry.offset);
            self.buf.extend_from_slice(entry.name.as_bytes());
        }
        let dir_size = zip32(self.buf.len() - dir_offset as usize, "central directory")?;

        let count = self.entries.len() as u16;
        put_u32(&mut self.buf, END_OF_CENTRAL_DIR_SIG);
        put_u16(&mut self.buf, 0);
        put_u16(&mut self.buf, 0);
        put_u16(&mut self.buf, count);
        put_u16(&mut self.buf, count);
        put_u32(&mut self.buf, dir_size);
        put_u32(&mut self.buf, dir_offset);
        put_u16(&mut self.buf, 0);

        w.write_all(&self.buf)?;
        w.flush()?;
        Ok(self.buf.len() as u64)
    }
}

fn zip32(len: usize, what: &str) -> ExportResult<u32> {
    u32::try_from(len).map_err(|_| ExportError::TooLarge(format!("{} exceeds 4 GiB", what)))
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf2 = [0u8; 2];
    r.read_exact(&mut buf2)?;
    Ok(u16::from_le_bytes(buf2))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf4 = [0u8; 4];
    r.read_exact(&mut buf4)?;
    Ok(u32::from_le_bytes(buf4))
}

/// Read every array of an archive written by [`NpzWriter`], in order.
///
/// Entries are located by walking the local headers; the central directory
/// is not consulted.
pub fn read_npz(bytes: &[u8]) -> io::Result<Vec<(String, NdArray)>> {
    let mut r = Cursor::new(bytes);
    let mut arrays = Vec::new();

    loop {
        match read_u32(&mut r)? {
            LOCAL_HEADER_SIG => {}
            CENTRAL_HEADER_SIG | END_OF_CENTRAL_DIR_SIG => break,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unexpected zip signature: {:#010x}", other),
                ));
            }
        }

        let _version = read_u16(&mut r)?;
        let _flags = read_u16(&mut r)?;
        let method = read_u16(&mut r)?;
        let _time = read_u16(&mut r)?;
        let _date = read_u16(&mut r)?;
        let crc = read_u32(&mut r)?;
        let compressed_size = read_u32(&mut r)? as u64;
        let size = read_u32(&mut r)? as usize;
        let name_len = read_u16(&mut r)? as usize;
        let extra_len = read_u16(&mut r)? as u64;

        let mut name = vec![0u8; name_len];
        r.read_exact(&mut name)?;
        let name = String::from_utf8(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        io::copy(&mut (&mut r).take(extra_len), &mut io::sink())?;

        let mut payload = Vec::new();
        (&mut r).take(compressed_size).read_to_end(&mut payload)?;
        if payload.len() as u64 != compressed_size {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        let raw = match method {
            0 => payload,
            8 => {
                let mut raw = Vec::with_capacity(size.min(1 << 20));
                DeflateDecoder::new(payload.as_slice()).read_to_end(&mut raw)?;
                raw
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unsupported compression method {} for {}", other, name),
                ));
            }
        };

        let mut check = Crc::new();
        check.update(&raw);
        if check.sum() != crc || raw.len() != size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Checksum mismatch for {}", name),
            ));
        }

        let array = NdArray::read_npy(&mut raw.as_slice())?;
        let name = name.strip_suffix(".npy").unwrap_or(&name).to_string();
        arrays.push((name, array));
    }

    Ok(arrays)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(&'static str, NdArray)> {
        vec![
            ("count", NdArray::scalar(3.0)),
            ("series", NdArray::vector((0..100).map(|i| (i % 7) as f64).collect())),
            ("pairs", NdArray::from_rows(&[[0.5, 0.1], [0.75, 0.2]])),
        ]
    }

    fn build(compression: Compression) -> Vec<u8> {
        let mut writer = NpzWriter::new(compression);
        for (name, array) in sample() {
            writer.add(name, &array).unwrap();
        }
        let mut out = Vec::new();
        let written = writer.finish(&mut out).unwrap();
        assert_eq!(written, out.len() as u64);
        out
    }

    #[test]
    fn test_stored_archive() {
        let bytes = build(Compression::Stored);
        assert_eq!(&bytes[..4], &LOCAL_HEADER_SIG.to_le_bytes());
        // End of central directory record is 22 bytes with no comment.
        let eocd = &bytes[bytes.len() - 22..];
        assert_eq!(&eocd[..4], &END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        assert_eq!(u16::from_le_bytes([eocd[10], eocd[11]]), 3);

        let arrays = read_npz(&bytes).unwrap();
        let expected: Vec<(String, NdArray)> = sample()
            .into_iter()
            .map(|(n, a)| (n.to_string(), a))
            .collect();
        assert_eq!(arrays, expected);
    }

    #[test]
    fn test_deflate_archive() {
        let stored = build(Compression::Stored);
        let deflated = build(Compression::Deflate);
        assert!(deflated.len() < stored.len());
        assert_eq!(read_npz(&deflated).unwrap(), read_npz(&stored).unwrap());
    }

    #[test]
    fn test_duplicate_name() {
        let mut writer = NpzWriter::new(Compression::Stored);
        writer.add("a", &NdArray::scalar(1.0)).unwrap();
        let err = writer.add("a", &NdArray::scalar(2.0)).unwrap_err();
        assert!(matches!(err, ExportError::DuplicateName(ref n) if n == "a"));
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut writer = NpzWriter::new(Compression::Stored);
        let array = NdArray {
            shape: vec![2, 2],
            data: vec![1.0; 3],
        };
        let err = writer.add("bad", &array).unwrap_err();
        assert!(matches!(err, ExportError::ShapeMismatch { len: 3, .. }));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_corrupt_entry_detected() {
        let mut bytes = build(Compression::Stored);
        // Flip the last data byte of the last entry.
        let last = bytes.windows(4).position(|w| w == CENTRAL_HEADER_SIG.to_le_bytes()).unwrap();
        bytes[last - 1] ^= 0xff;
        let err = read_npz(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
