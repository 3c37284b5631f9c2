//! NumPy `.npy` version 1.0 arrays of little-endian `f64`.

use std::io::{self, Read, Write};

use crate::error::{ExportError, ExportResult};

/// Magic bytes opening every `.npy` file.
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Only format version 1.0 is written.
pub const NPY_VERSION: [u8; 2] = [1, 0];

/// Magic(6) + Version(2) + HeaderLen(2).
const PREAMBLE_SIZE: usize = 10;

/// The header is padded so the data starts on this boundary.
const HEADER_ALIGN: usize = 64;

/// A dense C-order array of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl NdArray {
    /// A 0-dimensional array holding one value.
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// A matrix with one row per entry of `rows`.
    pub fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        Self {
            shape: vec![rows.len(), N],
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// Number of elements the shape describes, or `None` on overflow.
    pub fn size(&self) -> Option<usize> {
        element_count(&self.shape)
    }

    /// True if the data length matches the shape.
    pub fn is_consistent(&self) -> bool {
        self.size() == Some(self.data.len())
    }

    /// Python-literal header dictionary, padded and newline-terminated.
    fn header(&self) -> String {
        let shape = match self.shape.as_slice() {
            [] => "()".to_string(),
            [n] => format!("({},)", n),
            dims => {
                let dims: Vec<String> = dims.iter().map(usize::to_string).collect();
                format!("({})", dims.join(", "))
            }
        };
        let mut header = format!(
            "{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}",
            shape
        );
        let unpadded = PREAMBLE_SIZE + header.len() + 1;
        let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
        header.extend(std::iter::repeat_n(' ', padding));
        header.push('\n');
        header
    }

    /// Write the array in `.npy` format.
    pub fn write_npy<W: Write>(&self, w: &mut W) -> ExportResult<()> {
        let header = self.header();
        let header_len = u16::try_from(header.len())
            .map_err(|_| ExportError::TooLarge(format!("npy header of {} bytes", header.len())))?;

        w.write_all(NPY_MAGIC)?;
        w.write_all(&NPY_VERSION)?;
        w.write_all(&header_len.to_le_bytes())?;
        w.write_all(header.as_bytes())?;
        for v in &self.data {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn to_npy_bytes(&self) -> ExportResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_ALIGN + self.data.len() * 8);
        self.write_npy(&mut buf)?;
        Ok(buf)
    }

    /// Read a `.npy` array written by [`NdArray::write_npy`].
    ///
    /// Only version 1.0, `<f8` and C order are accepted.
    pub fn read_npy<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 6];
        r.read_exact(&mut magic)?;
        if &magic != NPY_MAGIC {
            return Err(invalid("Invalid npy magic bytes"));
        }

        let mut version = [0u8; 2];
        r.read_exact(&mut version)?;
        if version != NPY_VERSION {
            return Err(invalid(format!(
                "Unsupported npy version: {}.{}",
                version[0], version[1]
            )));
        }

        let mut buf2 = [0u8; 2];
        r.read_exact(&mut buf2)?;
        let mut header = vec![0u8; u16::from_le_bytes(buf2) as usize];
        r.read_exact(&mut header)?;
        let header = String::from_utf8(header).map_err(|e| invalid(e.to_string()))?;

        if !header.contains("'descr': '<f8'") {
            return Err(invalid(format!("Unsupported dtype in header: {}", header.trim())));
        }
        if !header.contains("'fortran_order': False") {
            return Err(invalid("Fortran order is not supported"));
        }
        let shape = parse_shape(&header)?;

        let size = element_count(&shape)
            .ok_or_else(|| invalid(format!("npy shape {:?} overflows", shape)))?;
        let mut data = Vec::with_capacity(size.min(1 << 20));
        let mut buf8 = [0u8; 8];
        for _ in 0..size {
            r.read_exact(&mut buf8)?;
            data.push(f64::from_le_bytes(buf8));
        }
        Ok(Self { shape, data })
    }
}

fn parse_shape(header: &str) -> io::Result<Vec<usize>> {
    let start = header
        .find("'shape': (")
        .map(|i| i + "'shape': (".len())
        .ok_or_else(|| invalid("Missing shape in npy header"))?;
    let end = header[start..]
        .find(')')
        .map(|i| start + i)
        .ok_or_else(|| invalid("Unterminated shape in npy header"))?;

    header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse()
                .map_err(|_| invalid(format!("Invalid dimension in npy shape: {}", dim)))
        })
        .collect()
}

fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |n, &dim| n.checked_mul(dim))
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_is_aligned() {
        for array in [
            NdArray::scalar(3.0),
            NdArray::vector(vec![1.0; 7]),
            NdArray::from_rows(&[[0.5, 0.25]; 3]),
        ] {
            let bytes = array.to_npy_bytes().unwrap();
            let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            assert_eq!((PREAMBLE_SIZE + header_len) % HEADER_ALIGN, 0);
            assert_eq!(bytes[PREAMBLE_SIZE + header_len - 1], b'\n');
            assert_eq!(bytes.len(), PREAMBLE_SIZE + header_len + array.data.len() * 8);
        }
    }

    #[test]
    fn test_shape_literals() {
        assert!(NdArray::scalar(1.0).header().contains("'shape': (), "));
        assert!(NdArray::vector(vec![1.0, 2.0]).header().contains("'shape': (2,), "));
        assert!(
            NdArray::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
                .header()
                .contains("'shape': (3, 2), ")
        );
    }

    #[test]
    fn test_read_back() {
        let array = NdArray::from_rows(&[[1.0, -2.0], [3.5, 4.0]]);
        let bytes = array.to_npy_bytes().unwrap();
        let decoded = NdArray::read_npy(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, array);

        let empty = NdArray::vector(Vec::new());
        let decoded = NdArray::read_npy(&mut Cursor::new(empty.to_npy_bytes().unwrap())).unwrap();
        assert_eq!(decoded.shape, vec![0]);
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn test_rejects_other_dtypes() {
        let mut bytes = NdArray::scalar(1.0).to_npy_bytes().unwrap();
        let pos = bytes.windows(3).position(|w| w == b"<f8").unwrap();
        bytes[pos + 2] = b'4';
        let err = NdArray::read_npy(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_consistency() {
        let mut array = NdArray::from_rows(&[[1.0, 2.0]]);
        assert!(array.is_consistent());
        array.data.pop();
        assert!(!array.is_consistent());

        let huge = NdArray {
            shape: vec![usize::MAX, 2],
            data: Vec::new(),
        };
        assert_eq!(huge.size(), None);
        assert!(!huge.is_consistent());
    }

    fn npy_with_header(header: &str) -> Vec<u8> {
        let mut bytes = NPY_MAGIC.to_vec();
        bytes.extend_from_slice(&NPY_VERSION);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes
    }

    #[test]
    fn test_rejects_overflowing_shape() {
        let bytes = npy_with_header(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (18446744073709551615, 2), }\n",
        );
        let err = NdArray::read_npy(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_huge_shape_without_data_is_truncated() {
        let bytes = npy_with_header(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (1000000000,), }\n",
        );
        let err = NdArray::read_npy(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
