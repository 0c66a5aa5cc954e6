//! # IDL SAVE reader
//!
//! Minimal decoder for the binary container written by IDL's `SAVE`
//! procedure, which is how the EUVM temperature retrievals are distributed.
//!
//! ## Overview
//! -----------------
//! A SAVE file is a sequence of records, each introduced by a 12-byte header:
//!
//! ```text
//! +---------+-----------------------------+-----------+
//! | RECTYPE | NEXTREC (low u32, high u32) | reserved  |
//! +---------+-----------------------------+-----------+
//! ```
//!
//! `NEXTREC` is the absolute offset of the following record, so records this
//! reader does not care about (timestamps, version, notices, heap) are simply
//! skipped. `VARIABLE` records are decoded into [`SavValue`]s and indexed by
//! their lower-cased name. The stream ends at `END_MARKER`.
//!
//! All scalars are big-endian (XDR) and every item is padded to a 4-byte
//! boundary measured from the start of the file.
//!
//! ## Compression
//! -----------------
//! Files saved with `/COMPRESS` carry the record format `0x0006`: each record
//! body is an independent zlib stream. They are inflated once into an
//! equivalent plain buffer (rewriting the `NEXTREC` pointers) before decoding,
//! so both layouts go through the same parser.
//!
//! ## Error Handling
//! -----------------
//! * Bad signature / record format / record type → [`EuvmError::InvalidSavSignature`],
//!   [`EuvmError::InvalidRecordFormat`], [`EuvmError::UnknownRecordType`].
//! * Truncated or inconsistent content → [`EuvmError::SavDecode`] with the byte offset.
//! * Variables holding pointers or objects are not decoded; asking for them with
//!   [`SavFile::get`] returns [`EuvmError::Unsupported`].
//!
//! ## See also
//! ------------
//! * [`crate::observations::profile_reader`] – Maps the decoded variables onto observations.
use std::collections::BTreeMap;
use std::io::Read;

use camino::Utf8Path;
use flate2::read::ZlibDecoder;

use crate::euvm_errors::EuvmError;

mod cursor;
mod type_desc;
mod value;

use cursor::XdrCursor;
use type_desc::{StructRegistry, TypeCode, TypeDesc};

pub use type_desc::TypeCode as SavTypeCode;
pub use value::{ArrayData, SavArray, SavStructure, SavValue};

const SIGNATURE: &[u8] = b"SR";
const RECFMT_PLAIN: [u8; 2] = [0x00, 0x04];
const RECFMT_COMPRESSED: [u8; 2] = [0x00, 0x06];

const VARSTART: i32 = 7;

/// Record kinds found in an IDL SAVE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordType {
    StartMarker,
    CommonVariable,
    Variable,
    SystemVariable,
    EndMarker,
    Timestamp,
    Compiled,
    Identification,
    Version,
    HeapHeader,
    HeapData,
    Promote64,
    Notice,
    Description,
}

impl TryFrom<i32> for RecordType {
    type Error = EuvmError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        use RecordType::*;
        Ok(match code {
            0 => StartMarker,
            1 => CommonVariable,
            2 => Variable,
            3 => SystemVariable,
            6 => EndMarker,
            10 => Timestamp,
            12 => Compiled,
            13 => Identification,
            14 => Version,
            15 => HeapHeader,
            16 => HeapData,
            17 => Promote64,
            19 => Notice,
            20 => Description,
            other => return Err(EuvmError::UnknownRecordType(other)),
        })
    }
}

/// Decoded content of an IDL SAVE file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavFile {
    variables: BTreeMap<String, SavValue>,
    skipped: BTreeMap<String, String>,
    compressed: bool,
}

impl SavFile {
    /// Read and decode a SAVE file from disk.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Location of the `.sav` file.
    ///
    /// Return
    /// ----------
    /// * The decoded variables, or the first I/O or decoding error encountered.
    pub fn read(path: &Utf8Path) -> Result<Self, EuvmError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Decode an in-memory SAVE image.
    pub fn parse(bytes: &[u8]) -> Result<Self, EuvmError> {
        if bytes.len() < 4 || &bytes[..2] != SIGNATURE {
            return Err(EuvmError::InvalidSavSignature(
                bytes.iter().take(2).copied().collect(),
            ));
        }

        let recfmt = [bytes[2], bytes[3]];
        let (plain, compressed) = if recfmt == RECFMT_PLAIN {
            (std::borrow::Cow::Borrowed(bytes), false)
        } else if recfmt == RECFMT_COMPRESSED {
            (std::borrow::Cow::Owned(inflate_records(bytes)?), true)
        } else {
            return Err(EuvmError::InvalidRecordFormat(recfmt.to_vec()));
        };

        let mut sav = SavFile {
            compressed,
            ..Default::default()
        };
        let mut registry = StructRegistry::new();
        let mut cursor = XdrCursor::new(&plain);
        cursor.seek(4)?;

        loop {
            if cursor.is_at_end() {
                return Err(EuvmError::SavDecode {
                    offset: cursor.position(),
                    reason: "missing END_MARKER record".into(),
                });
            }
            let start = cursor.position();
            let rectype = RecordType::try_from(cursor.read_i32()?)?;
            let nextrec = read_nextrec(&mut cursor)?;
            cursor.skip(4)?;

            match rectype {
                RecordType::EndMarker => break,
                RecordType::Variable => sav.read_variable(&mut cursor, nextrec, &mut registry)?,
                other => log::trace!("skipping {other:?} record at byte {start}"),
            }

            if nextrec <= start {
                return Err(EuvmError::SavDecode {
                    offset: start,
                    reason: format!("record pointer {nextrec} does not move forward"),
                });
            }
            cursor.seek(nextrec)?;
        }

        Ok(sav)
    }

    fn read_variable(
        &mut self,
        cursor: &mut XdrCursor<'_>,
        nextrec: usize,
        registry: &mut StructRegistry,
    ) -> Result<(), EuvmError> {
        let name = cursor.read_string()?.to_lowercase();
        let type_desc = match TypeDesc::parse(cursor, registry) {
            Ok(desc) => desc,
            Err(EuvmError::Unsupported(reason)) => {
                self.skipped.insert(name, reason);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if type_desc.type_code() == TypeCode::Undefined {
            if cursor.position() == nextrec {
                self.skipped.insert(name, "undefined (NULL) value".into());
                return Ok(());
            }
            return Err(EuvmError::SavDecode {
                offset: cursor.position(),
                reason: format!("variable '{name}' has type code 0 but carries data"),
            });
        }

        let varstart = cursor.read_i32()?;
        if varstart != VARSTART {
            return Err(EuvmError::SavDecode {
                offset: cursor.position(),
                reason: format!("VARSTART should be {VARSTART}, found {varstart}"),
            });
        }

        let decoded = match &type_desc {
            TypeDesc::Structure(array, layout) => {
                value::read_structure(cursor, array, layout).map(SavValue::Structure)
            }
            TypeDesc::Array(code, array) => {
                value::read_array(cursor, *code, array).map(SavValue::Array)
            }
            TypeDesc::Scalar(code) => value::read_scalar(cursor, *code),
        };

        match decoded {
            Ok(v) => {
                log::trace!("decoded variable '{name}' ({})", v.kind());
                self.variables.insert(name, v);
            }
            Err(EuvmError::Unsupported(reason)) => {
                self.skipped.insert(name, reason);
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Look up a variable by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Result<&SavValue, EuvmError> {
        let key = name.to_lowercase();
        if let Some(v) = self.variables.get(&key) {
            return Ok(v);
        }
        match self.skipped.get(&key) {
            Some(reason) => Err(EuvmError::Unsupported(format!("variable '{key}': {reason}"))),
            None => Err(EuvmError::MissingVariable(key)),
        }
    }

    /// Names of the decoded variables, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

fn read_nextrec(cursor: &mut XdrCursor<'_>) -> Result<usize, EuvmError> {
    let low = cursor.read_u32()? as u64;
    let high = cursor.read_u32()? as u64;
    Ok((low + (high << 32)) as usize)
}

fn write_nextrec(out: &mut Vec<u8>, nextrec: u64) {
    out.extend_from_slice(&((nextrec & 0xffff_ffff) as u32).to_be_bytes());
    out.extend_from_slice(&((nextrec >> 32) as u32).to_be_bytes());
}

/// Inflate a `/COMPRESS` SAVE image into the equivalent plain layout.
fn inflate_records(bytes: &[u8]) -> Result<Vec<u8>, EuvmError> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(&RECFMT_PLAIN);

    let mut cursor = XdrCursor::new(bytes);
    cursor.seek(4)?;

    loop {
        let rectype = cursor.read_i32()?;
        let nextrec = read_nextrec(&mut cursor)?;
        let reserved = cursor.read_bytes(4)?;
        out.extend_from_slice(&rectype.to_be_bytes());

        if RecordType::try_from(rectype)? == RecordType::EndMarker {
            write_nextrec(&mut out, nextrec as u64);
            out.extend_from_slice(reserved);
            break;
        }

        let pos = cursor.position();
        if nextrec <= pos {
            return Err(EuvmError::SavDecode {
                offset: pos,
                reason: format!("compressed record pointer {nextrec} does not move forward"),
            });
        }
        let compressed = cursor.read_bytes(nextrec - pos)?;
        let mut body = Vec::new();
        ZlibDecoder::new(compressed)
            .read_to_end(&mut body)
            .map_err(|e| EuvmError::Decompression(format!("record at byte {pos}: {e}")))?;

        let new_next = (out.len() + 8 + 4 + body.len()) as u64;
        write_nextrec(&mut out, new_next);
        out.extend_from_slice(reserved);
        out.extend_from_slice(&body);
    }

    Ok(out)
}

#[cfg(test)]
mod test_sav_file {
    use super::*;

    fn header(rectype: i32, nextrec: u32) -> Vec<u8> {
        let mut h = rectype.to_be_bytes().to_vec();
        h.extend_from_slice(&nextrec.to_be_bytes());
        h.extend_from_slice(&[0; 8]);
        h
    }

    fn ident(s: &str) -> Vec<u8> {
        let mut out = (s.len() as i32).to_be_bytes().to_vec();
        out.extend_from_slice(s.as_bytes());
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    #[test]
    fn test_scalar_variable() {
        let mut body = ident("ORBIT");
        body.extend_from_slice(&3_i32.to_be_bytes()); // LONG
        body.extend_from_slice(&0_i32.to_be_bytes()); // scalar flags
        body.extend_from_slice(&7_i32.to_be_bytes()); // VARSTART
        body.extend_from_slice(&888_i32.to_be_bytes());

        let mut file = b"SR\x00\x04".to_vec();
        let next = (file.len() + 16 + body.len()) as u32;
        file.extend(header(2, next));
        file.extend(body);
        let end = file.len() as u32;
        file.extend(header(6, end));

        let sav = SavFile::parse(&file).unwrap();
        assert_eq!(sav.get("orbit").unwrap(), &SavValue::Long(888));
        assert_eq!(sav.names().collect::<Vec<_>>(), vec!["orbit"]);
        assert!(!sav.is_compressed());
        assert_eq!(
            sav.get("temp").unwrap_err(),
            EuvmError::MissingVariable("temp".into())
        );
    }

    #[test]
    fn test_bad_signature_and_format() {
        assert!(matches!(
            SavFile::parse(b"XX\x00\x04"),
            Err(EuvmError::InvalidSavSignature(_))
        ));
        assert_eq!(
            SavFile::parse(b"SR\x00\x09").unwrap_err(),
            EuvmError::InvalidRecordFormat(vec![0, 9])
        );
    }

    #[test]
    fn test_missing_end_marker() {
        let file = b"SR\x00\x04".to_vec();
        assert!(matches!(
            SavFile::parse(&file),
            Err(EuvmError::SavDecode { offset: 4, .. })
        ));
    }
}
