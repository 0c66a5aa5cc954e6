//! Decoded IDL SAVE values.
//!
//! Numeric arrays of every IDL numeric type are widened to `f64` since the
//! pipeline only ever consumes them as floating point columns; the original
//! type code is kept alongside for diagnostics. Structures keep their tag
//! names and one row of values per structure element.
use crate::euvm_errors::EuvmError;

use super::cursor::XdrCursor;
use super::type_desc::{ArrayDesc, StructDesc, TypeCode};

/// A single decoded variable (or structure field).
#[derive(Debug, Clone, PartialEq)]
pub enum SavValue {
    Byte(u8),
    Int(i16),
    Long(i32),
    Float(f32),
    Double(f64),
    Complex(f32, f32),
    DComplex(f64, f64),
    String(String),
    UInt(u16),
    ULong(u32),
    Long64(i64),
    ULong64(u64),
    Array(SavArray),
    Structure(SavStructure),
}

impl SavValue {
    /// Numeric scalar as `f64`, `None` for strings, complex values and containers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SavValue::Byte(v) => Some(*v as f64),
            SavValue::Int(v) => Some(*v as f64),
            SavValue::Long(v) => Some(*v as f64),
            SavValue::Float(v) => Some(*v as f64),
            SavValue::Double(v) => Some(*v),
            SavValue::UInt(v) => Some(*v as f64),
            SavValue::ULong(v) => Some(*v as f64),
            SavValue::Long64(v) => Some(*v as f64),
            SavValue::ULong64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Short human readable kind, used in schema error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SavValue::Array(_) => "array",
            SavValue::Structure(_) => "structure",
            SavValue::String(_) => "string",
            SavValue::Complex(..) | SavValue::DComplex(..) => "complex scalar",
            _ => "numeric scalar",
        }
    }
}

/// Array payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Numeric(Vec<f64>),
    Complex(Vec<(f64, f64)>),
    Strings(Vec<String>),
}

/// An array value with its row-major shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SavArray {
    pub type_code: TypeCode,
    pub shape: Vec<usize>,
    pub data: ArrayData,
}

impl SavArray {
    pub fn len(&self) -> usize {
        match &self.data {
            ArrayData::Numeric(v) => v.len(),
            ArrayData::Complex(v) => v.len(),
            ArrayData::Strings(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ArrayData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Element `(row, col)` of a numeric 2-D array in row-major order.
    pub fn get2(&self, row: usize, col: usize) -> Option<f64> {
        let values = self.as_numeric()?;
        if self.shape.len() != 2 || col >= self.shape[1] {
            return None;
        }
        values.get(row * self.shape[1] + col).copied()
    }
}

/// A structure (or array of structures). `rows[i][j]` is tag `j` of element `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavStructure {
    pub name: String,
    pub tags: Vec<String>,
    pub shape: Vec<usize>,
    pub rows: Vec<Vec<SavValue>>,
}

impl SavStructure {
    pub fn field(&self, row: usize, tag: usize) -> Option<&SavValue> {
        self.rows.get(row)?.get(tag)
    }

    pub fn field_by_name(&self, row: usize, name: &str) -> Option<&SavValue> {
        let tag = self
            .tags
            .iter()
            .position(|t| t.eq_ignore_ascii_case(name))?;
        self.field(row, tag)
    }
}

fn unsupported(type_code: TypeCode) -> EuvmError {
    EuvmError::Unsupported(format!("{type_code:?} values (heap references)"))
}

/// Read a scalar of the given type.
pub(crate) fn read_scalar(
    cursor: &mut XdrCursor<'_>,
    type_code: TypeCode,
) -> Result<SavValue, EuvmError> {
    use TypeCode::*;
    Ok(match type_code {
        Byte => {
            let marker = cursor.read_i32()?;
            if marker != 1 {
                return Err(EuvmError::SavDecode {
                    offset: cursor.position(),
                    reason: format!("BYTE scalar length marker should be 1, found {marker}"),
                });
            }
            SavValue::Byte(cursor.read_padded_u8()?)
        }
        Int => SavValue::Int(cursor.read_padded_i16()?),
        Long => SavValue::Long(cursor.read_i32()?),
        Float => SavValue::Float(cursor.read_f32()?),
        Double => SavValue::Double(cursor.read_f64()?),
        Complex => SavValue::Complex(cursor.read_f32()?, cursor.read_f32()?),
        DComplex => SavValue::DComplex(cursor.read_f64()?, cursor.read_f64()?),
        String => SavValue::String(cursor.read_string_data()?),
        UInt => SavValue::UInt(cursor.read_padded_u16()?),
        ULong => SavValue::ULong(cursor.read_u32()?),
        Long64 => SavValue::Long64(cursor.read_i64()?),
        ULong64 => SavValue::ULong64(cursor.read_u64()?),
        Undefined | Structure | Pointer | ObjRef => return Err(unsupported(type_code)),
    })
}

/// Read an array of the given type, then realign to 32 bits.
pub(crate) fn read_array(
    cursor: &mut XdrCursor<'_>,
    type_code: TypeCode,
    desc: &ArrayDesc,
) -> Result<SavArray, EuvmError> {
    use TypeCode::*;
    let n = desc.nelements;

    let data = match type_code {
        Int | UInt => {
            // 16-bit values are not packed: each one fills a 4-byte word
            let total = cursor.ensure_remaining(n, 4, "INT array")?;
            let bytes = cursor.read_bytes(total)?;
            let values = bytes
                .chunks_exact(4)
                .map(|w| {
                    let raw = [w[2], w[3]];
                    if type_code == Int {
                        i16::from_be_bytes(raw) as f64
                    } else {
                        u16::from_be_bytes(raw) as f64
                    }
                })
                .collect();
            ArrayData::Numeric(values)
        }
        Byte | Long | Float | Double | ULong | Long64 | ULong64 | Complex | DComplex => {
            if type_code == Byte {
                let declared = cursor.read_i32()?;
                if usize::try_from(declared).ok() != Some(desc.nbytes) {
                    log::debug!(
                        "BYTE array declares {declared} bytes, descriptor says {}",
                        desc.nbytes
                    );
                }
            }
            let size = type_code.packed_size().unwrap_or(1);
            let needed = cursor.ensure_remaining(n, size, "packed array")?;
            if desc.nbytes < needed {
                return Err(EuvmError::SavDecode {
                    offset: cursor.position(),
                    reason: format!(
                        "array of {n} {type_code:?} needs {needed} bytes, descriptor declares {}",
                        desc.nbytes
                    ),
                });
            }
            let bytes = cursor.read_bytes(desc.nbytes)?;
            decode_packed(type_code, &bytes[..needed])
        }
        String => {
            cursor.ensure_remaining(n, 4, "STRING array")?;
            let values = (0..n)
                .map(|_| cursor.read_string_data())
                .collect::<Result<Vec<_>, _>>()?;
            ArrayData::Strings(values)
        }
        Undefined | Structure | Pointer | ObjRef => return Err(unsupported(type_code)),
    };

    cursor.align_32()?;
    Ok(SavArray {
        type_code,
        shape: desc.shape(),
        data,
    })
}

fn decode_packed(type_code: TypeCode, bytes: &[u8]) -> ArrayData {
    use TypeCode::*;
    fn be4(c: &[u8]) -> [u8; 4] {
        [c[0], c[1], c[2], c[3]]
    }
    fn be8(c: &[u8]) -> [u8; 8] {
        [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]
    }

    match type_code {
        Byte => ArrayData::Numeric(bytes.iter().map(|&b| b as f64).collect()),
        Long => ArrayData::Numeric(
            bytes
                .chunks_exact(4)
                .map(|c| i32::from_be_bytes(be4(c)) as f64)
                .collect(),
        ),
        ULong => ArrayData::Numeric(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_be_bytes(be4(c)) as f64)
                .collect(),
        ),
        Float => ArrayData::Numeric(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_be_bytes(be4(c)) as f64)
                .collect(),
        ),
        Double => ArrayData::Numeric(
            bytes
                .chunks_exact(8)
                .map(|c| f64::from_be_bytes(be8(c)))
                .collect(),
        ),
        Long64 => ArrayData::Numeric(
            bytes
                .chunks_exact(8)
                .map(|c| i64::from_be_bytes(be8(c)) as f64)
                .collect(),
        ),
        ULong64 => ArrayData::Numeric(
            bytes
                .chunks_exact(8)
                .map(|c| u64::from_be_bytes(be8(c)) as f64)
                .collect(),
        ),
        Complex => ArrayData::Complex(
            bytes
                .chunks_exact(8)
                .map(|c| {
                    (
                        f32::from_be_bytes(be4(&c[..4])) as f64,
                        f32::from_be_bytes(be4(&c[4..])) as f64,
                    )
                })
                .collect(),
        ),
        DComplex => ArrayData::Complex(
            bytes
                .chunks_exact(16)
                .map(|c| {
                    (
                        f64::from_be_bytes(be8(&c[..8])),
                        f64::from_be_bytes(be8(&c[8..])),
                    )
                })
                .collect(),
        ),
        _ => ArrayData::Numeric(Vec::new()),
    }
}

/// Read `desc.nelements` structure elements laid out tag after tag.
pub(crate) fn read_structure(
    cursor: &mut XdrCursor<'_>,
    desc: &ArrayDesc,
    layout: &StructDesc,
) -> Result<SavStructure, EuvmError> {
    let nrows = desc.nelements;
    // every tag takes at least one 4-byte word
    cursor.ensure_remaining(nrows, 4 * layout.tags.len().max(1), "structure array")?;
    let mut rows = Vec::with_capacity(nrows);

    for _ in 0..nrows {
        let mut row = Vec::with_capacity(layout.tags.len());
        for tag in &layout.tags {
            let value = if tag.structure {
                let (sub_array, sub_layout) = layout
                    .arrays
                    .get(&tag.name)
                    .zip(layout.structs.get(&tag.name))
                    .ok_or_else(|| EuvmError::SavDecode {
                        offset: cursor.position(),
                        reason: format!("missing descriptor for nested structure tag {}", tag.name),
                    })?;
                SavValue::Structure(read_structure(cursor, sub_array, sub_layout)?)
            } else if tag.array {
                let sub_array =
                    layout
                        .arrays
                        .get(&tag.name)
                        .ok_or_else(|| EuvmError::SavDecode {
                            offset: cursor.position(),
                            reason: format!("missing array descriptor for tag {}", tag.name),
                        })?;
                SavValue::Array(read_array(cursor, tag.type_code, sub_array)?)
            } else {
                read_scalar(cursor, tag.type_code)?
            };
            row.push(value);
        }
        rows.push(row);
    }

    Ok(SavStructure {
        name: layout.name.clone(),
        tags: layout.tags.iter().map(|t| t.name.clone()).collect(),
        shape: desc.shape(),
        rows,
    })
}
