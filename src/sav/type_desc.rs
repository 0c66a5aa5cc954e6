//! Type, array and structure descriptors of IDL SAVE variables.
//!
//! Every `VARIABLE` record starts with a *type descriptor* telling whether the
//! value is a scalar, an array or a structure. Arrays are followed by an
//! *array descriptor* (element count, byte count, dimensions) and structures by
//! a *structure descriptor* (tag table, tag names, nested array/structure
//! descriptors). Structures written once can be referenced again by name only
//! (`PREDEF` flag), hence the [`StructRegistry`] threaded through the parsers.
use std::collections::HashMap;

use crate::euvm_errors::EuvmError;

use super::cursor::XdrCursor;

/// IDL type codes as written in the SAVE file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    Undefined,
    Byte,
    Int,
    Long,
    Float,
    Double,
    Complex,
    String,
    Structure,
    DComplex,
    Pointer,
    ObjRef,
    UInt,
    ULong,
    Long64,
    ULong64,
}

impl TryFrom<i32> for TypeCode {
    type Error = EuvmError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        use TypeCode::*;
        Ok(match code {
            0 => Undefined,
            1 => Byte,
            2 => Int,
            3 => Long,
            4 => Float,
            5 => Double,
            6 => Complex,
            7 => String,
            8 => Structure,
            9 => DComplex,
            10 => Pointer,
            11 => ObjRef,
            12 => UInt,
            13 => ULong,
            14 => Long64,
            15 => ULong64,
            other => {
                return Err(EuvmError::Unsupported(format!("IDL type code {other}")));
            }
        })
    }
}

impl TypeCode {
    /// Size in bytes of one packed array element, for the types stored packed.
    pub(crate) fn packed_size(self) -> Option<usize> {
        use TypeCode::*;
        match self {
            Byte => Some(1),
            Long | Float | ULong => Some(4),
            Double | Complex | Long64 | ULong64 => Some(8),
            DComplex => Some(16),
            _ => None,
        }
    }
}

const VARFLAG_SYSTEM: i32 = 2;
const VARFLAG_ARRAY: i32 = 4;
const VARFLAG_STRUCT: i32 = 32;

/// A 32-bit size field; negative values are corrupt.
fn read_count(cursor: &mut XdrCursor<'_>, what: &str) -> Result<usize, EuvmError> {
    let offset = cursor.position();
    let value = cursor.read_i32()?;
    usize::try_from(value).map_err(|_| EuvmError::SavDecode {
        offset,
        reason: format!("negative {what} {value}"),
    })
}

fn read_count64(cursor: &mut XdrCursor<'_>, what: &str) -> Result<usize, EuvmError> {
    let offset = cursor.position();
    let value = cursor.read_u64()?;
    usize::try_from(value).map_err(|_| EuvmError::SavDecode {
        offset,
        reason: format!("{what} {value} does not fit in memory"),
    })
}

/// Dimensions and sizes of an array value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArrayDesc {
    pub nbytes: usize,
    pub nelements: usize,
    pub ndims: usize,
    /// IDL (column-major) dimensions, `nmax` entries of which `ndims` are meaningful.
    pub dims: Vec<usize>,
}

impl ArrayDesc {
    pub(crate) fn parse(cursor: &mut XdrCursor<'_>) -> Result<Self, EuvmError> {
        let arrstart = cursor.read_i32()?;
        match arrstart {
            8 => {
                cursor.skip(4)?;
                let nbytes = read_count(cursor, "array byte count")?;
                let nelements = read_count(cursor, "array element count")?;
                let ndims = cursor.read_i32()?.max(0) as usize;
                cursor.skip(8)?;
                let nmax = cursor.read_i32()?.max(0) as usize;
                let dims = (0..nmax)
                    .map(|_| cursor.read_i32().map(|d| d.max(0) as usize))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ArrayDesc {
                    nbytes,
                    nelements,
                    ndims,
                    dims,
                })
            }
            18 => {
                cursor.skip(8)?;
                let nbytes = read_count64(cursor, "array byte count")?;
                let nelements = read_count64(cursor, "array element count")?;
                let ndims = cursor.read_i32()?.max(0) as usize;
                cursor.skip(8)?;
                let mut dims = Vec::with_capacity(8);
                for _ in 0..8 {
                    let high = cursor.read_i32()?;
                    if high != 0 {
                        return Err(EuvmError::SavDecode {
                            offset: cursor.position(),
                            reason: "expected a zero high word in 64-bit array descriptor".into(),
                        });
                    }
                    dims.push(cursor.read_i32()?.max(0) as usize);
                }
                Ok(ArrayDesc {
                    nbytes,
                    nelements,
                    ndims,
                    dims,
                })
            }
            other => Err(EuvmError::SavDecode {
                offset: cursor.position(),
                reason: format!("unknown ARRSTART marker {other}"),
            }),
        }
    }

    /// Row-major shape, i.e. the IDL dimensions reversed.
    pub(crate) fn shape(&self) -> Vec<usize> {
        if self.ndims > 1 {
            let mut shape: Vec<usize> = self.dims.iter().take(self.ndims).copied().collect();
            shape.reverse();
            shape
        } else {
            vec![self.nelements]
        }
    }
}

/// One entry of a structure tag table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagDesc {
    pub name: String,
    pub type_code: TypeCode,
    pub array: bool,
    pub structure: bool,
}

impl TagDesc {
    fn parse(cursor: &mut XdrCursor<'_>) -> Result<Self, EuvmError> {
        let offset = cursor.read_i32()?;
        if offset == -1 {
            cursor.read_u64()?;
        }
        let type_code = TypeCode::try_from(cursor.read_i32()?)?;
        let flags = cursor.read_i32()?;
        Ok(TagDesc {
            name: String::new(),
            type_code,
            array: flags & VARFLAG_ARRAY == VARFLAG_ARRAY,
            structure: flags & VARFLAG_STRUCT == VARFLAG_STRUCT,
        })
    }
}

/// Layout of a structure: ordered tags plus nested descriptors keyed by tag name.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StructDesc {
    pub name: String,
    pub tags: Vec<TagDesc>,
    pub arrays: HashMap<String, ArrayDesc>,
    pub structs: HashMap<String, StructDesc>,
}

/// Structure definitions already seen in the file, keyed by structure name.
pub(crate) type StructRegistry = HashMap<String, StructDesc>;

impl StructDesc {
    pub(crate) fn parse(
        cursor: &mut XdrCursor<'_>,
        registry: &mut StructRegistry,
    ) -> Result<Self, EuvmError> {
        let structstart = cursor.read_i32()?;
        if structstart != 9 {
            return Err(EuvmError::SavDecode {
                offset: cursor.position(),
                reason: format!("STRUCTSTART should be 9, found {structstart}"),
            });
        }
        let name = cursor.read_string()?;
        let predef = cursor.read_i32()?;
        let ntags = cursor.read_i32()?.max(0) as usize;
        let _nbytes = cursor.read_i32()?;

        let is_predef = predef & 1 == 1;
        let inherits = predef & 2 == 2;
        let is_super = predef & 4 == 4;

        if is_predef {
            return registry.get(&name).cloned().ok_or_else(|| EuvmError::SavDecode {
                offset: cursor.position(),
                reason: format!("predefined structure '{name}' was never defined"),
            });
        }

        let mut tags = (0..ntags)
            .map(|_| TagDesc::parse(cursor))
            .collect::<Result<Vec<_>, _>>()?;
        for tag in tags.iter_mut() {
            tag.name = cursor.read_string()?;
        }

        let mut arrays = HashMap::new();
        for tag in tags.iter().filter(|t| t.array) {
            arrays.insert(tag.name.clone(), ArrayDesc::parse(cursor)?);
        }
        let mut structs = HashMap::new();
        for tag in tags.iter().filter(|t| t.structure) {
            structs.insert(tag.name.clone(), StructDesc::parse(cursor, registry)?);
        }

        if inherits || is_super {
            let _classname = cursor.read_string()?;
            let nsupclasses = cursor.read_i32()?.max(0) as usize;
            for _ in 0..nsupclasses {
                cursor.read_string()?;
            }
            for _ in 0..nsupclasses {
                StructDesc::parse(cursor, registry)?;
            }
        }

        let desc = StructDesc {
            name: name.clone(),
            tags,
            arrays,
            structs,
        };
        registry.insert(name, desc.clone());
        Ok(desc)
    }
}

/// What kind of value follows a variable header.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TypeDesc {
    Scalar(TypeCode),
    Array(TypeCode, ArrayDesc),
    Structure(ArrayDesc, StructDesc),
}

impl TypeDesc {
    pub(crate) fn parse(
        cursor: &mut XdrCursor<'_>,
        registry: &mut StructRegistry,
    ) -> Result<Self, EuvmError> {
        let type_code = TypeCode::try_from(cursor.read_i32()?)?;
        let varflags = cursor.read_i32()?;
        if varflags & VARFLAG_SYSTEM == VARFLAG_SYSTEM {
            return Err(EuvmError::Unsupported("system variables".into()));
        }
        if varflags & VARFLAG_STRUCT == VARFLAG_STRUCT {
            let array = ArrayDesc::parse(cursor)?;
            let structure = StructDesc::parse(cursor, registry)?;
            Ok(TypeDesc::Structure(array, structure))
        } else if varflags & VARFLAG_ARRAY == VARFLAG_ARRAY {
            Ok(TypeDesc::Array(type_code, ArrayDesc::parse(cursor)?))
        } else {
            Ok(TypeDesc::Scalar(type_code))
        }
    }

    pub(crate) fn type_code(&self) -> TypeCode {
        match self {
            TypeDesc::Scalar(code) | TypeDesc::Array(code, _) => *code,
            TypeDesc::Structure(..) => TypeCode::Structure,
        }
    }
}
