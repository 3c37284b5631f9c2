//! Primitive wire types and the positional encoder/decoder.

use std::io::{self, Read, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{CodecError, CodecResult};

/// Wire representation of a field, as listed in a record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    U32,
    U64,
    I64,
    F64,
    Bool,
    /// u64 length followed by UTF-8 bytes.
    Str,
    /// u64 length followed by raw bytes.
    Bytes,
    /// u64 count followed by f64 values.
    F64Vec,
    /// i64 seconds followed by u32 nanoseconds.
    Timestamp,
    /// u64 nanoseconds.
    Duration,
    /// One presence byte, then the named record if the byte is 1.
    Optional(&'static str),
    /// u64 count, then that many of the named record.
    Sequence(&'static str),
}

/// One entry of a record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: WireKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: WireKind) -> Self {
        Self { name, kind }
    }
}

/// A value with a fixed positional encoding.
pub trait Wire: Sized {
    const KIND: WireKind;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()>;

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self>;
}

/// A composite entity encoded as its schema fields in order.
pub trait Record: Sized {
    const NAME: &'static str;
    const SCHEMA: &'static [FieldSpec];

    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> CodecResult<()>;

    fn decode<R: Read>(dec: &mut Decoder<R>) -> CodecResult<Self>;
}

macro_rules! fixed_wire {
    ($ty:ty, $kind:ident, $size:literal) => {
        impl Wire for $ty {
            const KIND: WireKind = WireKind::$kind;

            fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
                w.write_all(&self.to_le_bytes())
            }

            fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
                let mut buf = [0u8; $size];
                r.read_exact(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    };
}

fixed_wire!(u32, U32, 4);
fixed_wire!(u64, U64, 8);
fixed_wire!(i64, I64, 8);
fixed_wire!(f64, F64, 8);

impl Wire for bool {
    const KIND: WireKind = WireKind::Bool;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[*self as u8])
    }

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
        let mut buf = [0u8; 1];
        r.read_exact(&mut buf)?;
        match buf[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

impl Wire for Vec<u8> {
    const KIND: WireKind = WireKind::Bytes;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (self.len() as u64).put(w)?;
        w.write_all(self)
    }

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
        let len = u64::take(r)?;
        let mut buf = Vec::new();
        // Bounded read: a corrupt length must not trigger a huge allocation.
        Read::take(&mut *r, len).read_to_end(&mut buf)?;
        if buf.len() as u64 != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, found {}", len, buf.len()),
            )
            .into());
        }
        Ok(buf)
    }
}

impl Wire for String {
    const KIND: WireKind = WireKind::Str;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (self.len() as u64).put(w)?;
        w.write_all(self.as_bytes())
    }

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
        Ok(String::from_utf8(Vec::<u8>::take(r)?)?)
    }
}

impl Wire for Vec<f64> {
    const KIND: WireKind = WireKind::F64Vec;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (self.len() as u64).put(w)?;
        for v in self {
            v.put(w)?;
        }
        Ok(())
    }

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
        let len = u64::take(r)?;
        let len = usize::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        let mut values = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            values.push(f64::take(r)?);
        }
        Ok(values)
    }
}

impl Wire for DateTime<Utc> {
    const KIND: WireKind = WireKind::Timestamp;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.timestamp().put(w)?;
        self.timestamp_subsec_nanos().put(w)
    }

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
        let secs = i64::take(r)?;
        let nanos = u32::take(r)?;
        DateTime::from_timestamp(secs, nanos).ok_or(CodecError::InvalidTimestamp { secs, nanos })
    }
}

impl Wire for Duration {
    const KIND: WireKind = WireKind::Duration;

    fn put<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        // Saturates above ~584 years.
        u64::try_from(self.as_nanos()).unwrap_or(u64::MAX).put(w)
    }

    fn take<R: Read + ?Sized>(r: &mut R) -> CodecResult<Self> {
        Ok(Duration::from_nanos(u64::take(r)?))
    }
}

/// Sequential writer for records.
///
/// With tracing enabled the encoder remembers every field it writes, which
/// lets tests compare the written order and kinds with a record schema.
pub struct Encoder<W> {
    inner: W,
    trace: Option<Vec<FieldSpec>>,
}

impl<W: Write> Encoder<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, trace: None }
    }

    /// Create an encoder that records fields as they are written.
    pub fn with_trace(inner: W) -> Self {
        Self {
            inner,
            trace: Some(Vec::new()),
        }
    }

    fn note(&mut self, name: &'static str, kind: WireKind) {
        if let Some(trace) = &mut self.trace {
            trace.push(FieldSpec::new(name, kind));
        }
    }

    pub fn field<T: Wire>(&mut self, name: &'static str, value: &T) -> CodecResult<()> {
        self.note(name, T::KIND);
        value.put(&mut self.inner)?;
        Ok(())
    }

    /// Write a presence byte, then the record if present.
    pub fn optional<T: Record>(&mut self, name: &'static str, value: Option<&T>) -> CodecResult<()> {
        self.note(name, WireKind::Optional(T::NAME));
        match value {
            Some(v) => {
                self.inner.write_all(&[1])?;
                v.encode(self)
            }
            None => Ok(self.inner.write_all(&[0])?),
        }
    }

    /// Write a count, then every item in order.
    pub fn sequence<T: Record>(&mut self, name: &'static str, items: &[T]) -> CodecResult<()> {
        self.note(name, WireKind::Sequence(T::NAME));
        (items.len() as u64).put(&mut self.inner)?;
        for item in items {
            item.encode(self)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> CodecResult<()> {
        Ok(self.inner.flush()?)
    }

    /// Fields written so far, if tracing is enabled.
    pub fn trace(&self) -> Option<&[FieldSpec]> {
        self.trace.as_deref()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Sequential reader for records.
///
/// Every failure is wrapped with the name of the field being read, so an
/// error surfacing at the top level carries the full field path.
pub struct Decoder<R> {
    inner: R,
}

impl<R: Read> Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn field<T: Wire>(&mut self, name: &'static str) -> CodecResult<T> {
        T::take(&mut self.inner).map_err(|e| e.in_field(name))
    }

    pub fn optional<T: Record>(&mut self, name: &'static str) -> CodecResult<Option<T>> {
        let mut marker = [0u8; 1];
        self.inner
            .read_exact(&mut marker)
            .map_err(|e| CodecError::from(e).in_field(name))?;
        match marker[0] {
            0 => Ok(None),
            1 => T::decode(self).map(Some).map_err(|e| e.in_field(name)),
            other => Err(CodecError::InvalidMarker(other).in_field(name)),
        }
    }

    pub fn sequence<T: Record>(&mut self, name: &'static str) -> CodecResult<Vec<T>> {
        let count: u64 = self.field(name)?;
        let len = usize::try_from(count)
            .map_err(|_| CodecError::LengthOverflow(count).in_field(name))?;
        let mut items = Vec::with_capacity(len.min(1024));
        for i in 0..len {
            let item = T::decode(self).map_err(|e| e.in_field(format!("{}[{}]", name, i)))?;
            items.push(item);
        }
        Ok(items)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
