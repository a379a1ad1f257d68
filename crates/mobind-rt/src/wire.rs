//! Boundary encoding of values.
//!
//! Numbers are little-endian and bit-preserving. Text is length-prefixed:
//! UTF-8 bytes for the native backend and 16-bit code units for the
//! managed backend. Tagged values carry a one byte tag.

use crate::error::MarshalError;
use crate::handle::Handle;
use crate::value::Value;

#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

macro_rules! write_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, v: $ty) {
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
        )*
    };
}

macro_rules! read_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty, MarshalError> {
                let bytes = self.take(std::mem::size_of::<$ty>())?;
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    write_le! {
        write_i8: i8, write_i16: i16, write_i32: i32, write_i64: i64,
        write_u8: u8, write_u16: u16, write_u32: u32, write_u64: u64,
        write_f32: f32, write_f64: f64,
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_handle(&mut self, h: Handle) {
        self.write_i64(h.raw());
    }

    fn write_len(&mut self, len: usize) -> Result<(), MarshalError> {
        let len = u32::try_from(len).map_err(|_| MarshalError::TooLong(len))?;
        self.write_u32(len);
        Ok(())
    }

    /// Length-prefixed UTF-8 bytes.
    pub fn write_utf8(&mut self, s: &str) -> Result<(), MarshalError> {
        self.write_len(s.len())?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Length-prefixed UTF-16 code units.
    pub fn write_utf16(&mut self, s: &str) -> Result<(), MarshalError> {
        let units = utf8_to_utf16(s);
        self.write_len(units.len())?;
        for unit in units {
            self.write_u16(unit);
        }
        Ok(())
    }

    pub fn write_value(&mut self, value: &Value) -> Result<(), MarshalError> {
        self.write_u8(value.tag());
        match value {
            Value::Unit => {}
            Value::Bool(v) => self.write_bool(*v),
            Value::Int8(v) => self.write_i8(*v),
            Value::Int16(v) => self.write_i16(*v),
            Value::Int32(v) => self.write_i32(*v),
            Value::Int64(v) => self.write_i64(*v),
            Value::Uint8(v) => self.write_u8(*v),
            Value::Uint16(v) => self.write_u16(*v),
            Value::Uint32(v) => self.write_u32(*v),
            Value::Uint64(v) => self.write_u64(*v),
            Value::Float32(v) => self.write_f32(*v),
            Value::Float64(v) => self.write_f64(*v),
            Value::String(v) => self.write_utf8(v)?,
            Value::Ref(h) => self.write_handle(*h),
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], MarshalError> {
        if self.remaining() < n {
            return Err(MarshalError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    read_le! {
        read_i8: i8, read_i16: i16, read_i32: i32, read_i64: i64,
        read_u8: u8, read_u16: u16, read_u32: u32, read_u64: u64,
        read_f32: f32, read_f64: f64,
    }

    pub fn read_bool(&mut self) -> Result<bool, MarshalError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_handle(&mut self) -> Result<Handle, MarshalError> {
        Ok(Handle::from_raw(self.read_i64()?))
    }

    pub fn read_utf8(&mut self) -> Result<String, MarshalError> {
        let len = self.read_u32()? as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| MarshalError::InvalidUtf8(start + e.valid_up_to()))
    }

    pub fn read_utf16(&mut self) -> Result<String, MarshalError> {
        let len = self.read_u32()? as usize;
        let mut units = Vec::with_capacity(len.min(self.remaining() / 2));
        for _ in 0..len {
            units.push(self.read_u16()?);
        }
        utf16_to_utf8(&units)
    }

    pub fn read_value(&mut self) -> Result<Value, MarshalError> {
        let tag = self.read_u8()?;
        let value = match tag {
            0 => Value::Unit,
            1 => Value::Bool(self.read_bool()?),
            2 => Value::Int8(self.read_i8()?),
            3 => Value::Int16(self.read_i16()?),
            4 => Value::Int32(self.read_i32()?),
            5 => Value::Int64(self.read_i64()?),
            6 => Value::Uint8(self.read_u8()?),
            7 => Value::Uint16(self.read_u16()?),
            8 => Value::Uint32(self.read_u32()?),
            9 => Value::Uint64(self.read_u64()?),
            10 => Value::Float32(self.read_f32()?),
            11 => Value::Float64(self.read_f64()?),
            12 => Value::String(self.read_utf8()?),
            13 => Value::Ref(self.read_handle()?),
            other => return Err(MarshalError::UnknownTag(other)),
        };
        Ok(value)
    }

    /// Reads a tagged value and checks it has the same variant as `like`.
    pub fn expect_value(&mut self, like: &Value) -> Result<Value, MarshalError> {
        let value = self.read_value()?;
        if value.tag() != like.tag() {
            return Err(MarshalError::UnexpectedTag {
                expected: like.kind_name().to_string(),
                found: value.tag(),
            });
        }
        Ok(value)
    }
}

pub fn utf8_to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub fn utf16_to_utf8(units: &[u16]) -> Result<String, MarshalError> {
    String::from_utf16(units).map_err(|_| MarshalError::InvalidUtf16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: Value) -> Value {
        let mut w = WireWriter::new();
        w.write_value(&value).unwrap();
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        let decoded = r.read_value().unwrap();
        assert_eq!(r.remaining(), 0);
        decoded
    }

    #[test]
    fn numeric_extremes_survive_the_boundary() {
        let values = [
            Value::Int8(i8::MIN),
            Value::Int16(i16::MAX),
            Value::Int32(i32::MIN),
            Value::Int64(i64::MIN),
            Value::Int64(i64::MAX),
            Value::Uint8(u8::MAX),
            Value::Uint16(u16::MAX),
            Value::Uint32(u32::MAX),
            Value::Uint64(u64::MAX),
            Value::Float32(f32::MIN_POSITIVE),
            Value::Float64(-0.0),
            Value::Float64(f64::MAX),
            Value::Float64(f64::NAN),
            Value::Bool(true),
        ];
        for value in values {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn text_recoding_is_exact() {
        for s in ["", "héllo", "日本語", "emoji 😀 pair", "\u{0}nul"] {
            let mut w = WireWriter::new();
            w.write_utf16(s).unwrap();
            w.write_utf8(s).unwrap();
            let bytes = w.into_bytes();
            let mut r = WireReader::new(&bytes);
            assert_eq!(r.read_utf16().unwrap(), s);
            assert_eq!(r.read_utf8().unwrap(), s);
        }
        assert_eq!(utf8_to_utf16("😀").len(), 2);
    }

    #[test]
    fn malformed_input_is_reported() {
        // Unpaired high surrogate.
        let mut w = WireWriter::new();
        w.write_u32(1);
        w.write_u16(0xD800);
        let bytes = w.into_bytes();
        assert_eq!(
            WireReader::new(&bytes).read_utf16(),
            Err(MarshalError::InvalidUtf16)
        );

        let mut w = WireWriter::new();
        w.write_u32(2);
        w.write_u8(b'a');
        w.write_u8(0xFF);
        let bytes = w.into_bytes();
        assert_eq!(WireReader::new(&bytes).read_utf8(), Err(MarshalError::InvalidUtf8(5)));

        assert!(matches!(
            WireReader::new(&[5, 1, 2]).read_value(),
            Err(MarshalError::Truncated { needed: 8, available: 2 })
        ));
        assert_eq!(WireReader::new(&[99]).read_value(), Err(MarshalError::UnknownTag(99)));

        let mut w = WireWriter::new();
        w.write_value(&Value::Int32(7)).unwrap();
        let bytes = w.into_bytes();
        assert!(matches!(
            WireReader::new(&bytes).expect_value(&Value::String(String::new())),
            Err(MarshalError::UnexpectedTag { found: 4, .. })
        ));
    }
}
