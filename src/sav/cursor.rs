//! Big-endian (XDR) cursor used by the IDL SAVE decoder.
//!
//! IDL writes every scalar in XDR order and pads every item to a 4-byte
//! boundary measured from the start of the (uncompressed) file. The cursor
//! keeps the absolute position so that [`XdrCursor::align_32`] can honour that
//! rule, and delegates the actual byte decoding to `nom` parsers.
use nom::{
    bytes::complete::take,
    number::complete::{be_f32, be_f64, be_i16, be_i32, be_i64, be_u16, be_u32, be_u64},
    IResult,
};

use crate::euvm_errors::EuvmError;

/// Read position over a fully loaded IDL SAVE buffer.
#[derive(Debug, Clone)]
pub(crate) struct XdrCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        XdrCursor { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Check that `count` items of at least `size` bytes each can still be read.
    ///
    /// Return
    /// ----------
    /// * The total byte count, or a [`EuvmError::SavDecode`] when it overflows or
    ///   exceeds what is left in the buffer.
    pub(crate) fn ensure_remaining(
        &self,
        count: usize,
        size: usize,
        what: &str,
    ) -> Result<usize, EuvmError> {
        match count.checked_mul(size) {
            Some(total) if total <= self.remaining() => Ok(total),
            _ => Err(EuvmError::SavDecode {
                offset: self.pos,
                reason: format!(
                    "{what} declares {count} elements of {size} bytes, only {} bytes left",
                    self.remaining()
                ),
            }),
        }
    }

    /// Jump to an absolute byte offset.
    pub(crate) fn seek(&mut self, pos: usize) -> Result<(), EuvmError> {
        if pos > self.buf.len() {
            return Err(EuvmError::SavDecode {
                offset: self.pos,
                reason: format!(
                    "record pointer {pos} beyond end of file ({} bytes)",
                    self.buf.len()
                ),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Apply a nom parser at the current position and advance past its input.
    fn run<O>(
        &mut self,
        mut parser: impl FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
        what: &str,
    ) -> Result<O, EuvmError> {
        let input = &self.buf[self.pos..];
        match parser(input) {
            Ok((rest, out)) => {
                self.pos = self.buf.len() - rest.len();
                Ok(out)
            }
            Err(_) => Err(EuvmError::SavDecode {
                offset: self.pos,
                reason: format!("unexpected end of data while reading {what}"),
            }),
        }
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, EuvmError> {
        self.run(be_i32, "a 32-bit integer")
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, EuvmError> {
        self.run(be_u32, "an unsigned 32-bit integer")
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64, EuvmError> {
        self.run(be_i64, "a 64-bit integer")
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, EuvmError> {
        self.run(be_u64, "an unsigned 64-bit integer")
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, EuvmError> {
        self.run(be_f32, "a float")
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, EuvmError> {
        self.run(be_f64, "a double")
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], EuvmError> {
        self.run(take(n), "a byte block")
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), EuvmError> {
        self.read_bytes(n).map(|_| ())
    }

    /// A `BYTE` scalar occupies a full 4-byte word; the value is the first byte.
    pub(crate) fn read_padded_u8(&mut self) -> Result<u8, EuvmError> {
        let word = self.read_bytes(4)?;
        Ok(word[0])
    }

    /// An `INT` scalar occupies a full 4-byte word; the value is the low half.
    pub(crate) fn read_padded_i16(&mut self) -> Result<i16, EuvmError> {
        let word = self.read_bytes(4)?;
        let (_, v) = be_i16::<_, nom::error::Error<&[u8]>>(&word[2..]).map_err(|_| {
            EuvmError::SavDecode {
                offset: self.pos,
                reason: "malformed INT word".into(),
            }
        })?;
        Ok(v)
    }

    /// A `UINT` scalar occupies a full 4-byte word; the value is the low half.
    pub(crate) fn read_padded_u16(&mut self) -> Result<u16, EuvmError> {
        let word = self.read_bytes(4)?;
        let (_, v) = be_u16::<_, nom::error::Error<&[u8]>>(&word[2..]).map_err(|_| {
            EuvmError::SavDecode {
                offset: self.pos,
                reason: "malformed UINT word".into(),
            }
        })?;
        Ok(v)
    }

    /// Move to the next 4-byte boundary (absolute offset).
    pub(crate) fn align_32(&mut self) -> Result<(), EuvmError> {
        let rem = self.pos % 4;
        if rem != 0 {
            self.seek(self.pos + 4 - rem)?;
        }
        Ok(())
    }

    /// Length-prefixed identifier string (variable and tag names).
    pub(crate) fn read_string(&mut self) -> Result<String, EuvmError> {
        let length = self.read_i32()?;
        if length <= 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(length as usize)?;
        self.align_32()?;
        Ok(latin1(bytes))
    }

    /// `STRING` data value: the length is written twice, the second one precedes the bytes.
    pub(crate) fn read_string_data(&mut self) -> Result<String, EuvmError> {
        let length = self.read_i32()?;
        if length <= 0 {
            return Ok(String::new());
        }
        let length = self.read_i32()?;
        let bytes = self.read_bytes(length.max(0) as usize)?;
        self.align_32()?;
        Ok(latin1(bytes))
    }
}

/// IDL strings are byte strings; decode them as ISO-8859-1.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
