#![allow(dead_code)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::write::ZlibEncoder;
use flate2::Compression;

const REC_VARIABLE: i32 = 2;
const REC_END: i32 = 6;
const REC_TIMESTAMP: i32 = 10;

const TYPE_INT: i32 = 2;
const TYPE_LONG: i32 = 3;
const TYPE_FLOAT: i32 = 4;
const TYPE_DOUBLE: i32 = 5;
const TYPE_STRUCT: i32 = 8;

fn push_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn push_ident(out: &mut Vec<u8>, s: &str) {
    push_i32(out, s.len() as i32);
    out.extend_from_slice(s.as_bytes());
    pad4(out);
}

/// ARRSTART block for a row-major `shape`.
fn push_array_desc(out: &mut Vec<u8>, shape: &[usize], nbytes: usize) {
    let nelements: usize = shape.iter().product();
    push_i32(out, 8);
    push_i32(out, 0);
    push_i32(out, nbytes as i32);
    push_i32(out, nelements as i32);
    push_i32(out, shape.len() as i32);
    push_i32(out, 0);
    push_i32(out, 0);
    push_i32(out, 8);
    let mut dims: Vec<usize> = shape.iter().rev().copied().collect();
    dims.resize(8, 1);
    for d in dims {
        push_i32(out, d as i32);
    }
}

/// In-memory builder of IDL SAVE images.
#[derive(Debug, Clone, Default)]
pub struct SavBuilder {
    records: Vec<(i32, Vec<u8>)>,
}

impl SavBuilder {
    /// A builder whose first record is a timestamp, skipped by readers.
    pub fn new() -> Self {
        let mut body = Vec::new();
        for _ in 0..256 {
            push_i32(&mut body, 0);
        }
        push_ident(&mut body, "Mon Dec 14 09:46:40 2015");
        push_ident(&mut body, "euvm");
        push_ident(&mut body, "retrieval");
        SavBuilder {
            records: vec![(REC_TIMESTAMP, body)],
        }
    }

    fn numeric_array(mut self, name: &str, type_code: i32, shape: &[usize], data: Vec<u8>) -> Self {
        let mut body = Vec::new();
        push_ident(&mut body, &name.to_uppercase());
        push_i32(&mut body, type_code);
        push_i32(&mut body, 4);
        push_array_desc(&mut body, shape, data.len());
        push_i32(&mut body, 7);
        body.extend(data);
        pad4(&mut body);
        self.records.push((REC_VARIABLE, body));
        self
    }

    pub fn double_array(self, name: &str, shape: &[usize], values: &[f64]) -> Self {
        let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.numeric_array(name, TYPE_DOUBLE, shape, data)
    }

    pub fn float_array(self, name: &str, shape: &[usize], values: &[f64]) -> Self {
        let data = values
            .iter()
            .flat_map(|v| (*v as f32).to_be_bytes())
            .collect();
        self.numeric_array(name, TYPE_FLOAT, shape, data)
    }

    /// 16-bit integers, each stored in a full 4-byte word.
    pub fn int_array(self, name: &str, shape: &[usize], values: &[i16]) -> Self {
        let data = values
            .iter()
            .flat_map(|v| {
                let [hi, lo] = v.to_be_bytes();
                [0, 0, hi, lo]
            })
            .collect();
        self.numeric_array(name, TYPE_INT, shape, data)
    }

    /// Overwrite the element count declared by the last variable's array descriptor.
    pub fn declare_elements(mut self, nelements: i32) -> Self {
        let (_, body) = self.records.last_mut().unwrap();
        let name_len = i32::from_be_bytes(body[0..4].try_into().unwrap()) as usize;
        // name, type code, flags, then ARRSTART, a zero word and the byte count
        let at = 4 + name_len.div_ceil(4) * 4 + 8 + 12;
        body[at..at + 4].copy_from_slice(&nelements.to_be_bytes());
        self
    }

    pub fn long_scalar(mut self, name: &str, value: i32) -> Self {
        let mut body = Vec::new();
        push_ident(&mut body, &name.to_uppercase());
        push_i32(&mut body, TYPE_LONG);
        push_i32(&mut body, 0);
        push_i32(&mut body, 7);
        push_i32(&mut body, value);
        self.records.push((REC_VARIABLE, body));
        self
    }

    /// A one-element structure: a LONG tag followed by DOUBLE tags.
    pub fn struct_scalar(mut self, name: &str, long_tag: (&str, i32), tags: &[(&str, f64)]) -> Self {
        let ntags = tags.len() + 1;
        let nbytes = 4 + 8 * tags.len();

        let mut body = Vec::new();
        push_ident(&mut body, &name.to_uppercase());
        push_i32(&mut body, TYPE_STRUCT);
        push_i32(&mut body, 4 | 32);
        push_array_desc(&mut body, &[1], nbytes);

        push_i32(&mut body, 9);
        push_ident(&mut body, "");
        push_i32(&mut body, 0);
        push_i32(&mut body, ntags as i32);
        push_i32(&mut body, nbytes as i32);

        push_i32(&mut body, 0);
        push_i32(&mut body, TYPE_LONG);
        push_i32(&mut body, 0);
        for (k, _) in tags.iter().enumerate() {
            push_i32(&mut body, (4 + 8 * k) as i32);
            push_i32(&mut body, TYPE_DOUBLE);
            push_i32(&mut body, 0);
        }
        push_ident(&mut body, &long_tag.0.to_uppercase());
        for (tag, _) in tags {
            push_ident(&mut body, &tag.to_uppercase());
        }

        push_i32(&mut body, 7);
        push_i32(&mut body, long_tag.1);
        for (_, v) in tags {
            body.extend_from_slice(&v.to_be_bytes());
        }
        self.records.push((REC_VARIABLE, body));
        self
    }

    /// Serialize, optionally with zlib-compressed record bodies (`/COMPRESS`).
    pub fn build(&self, compressed: bool) -> Vec<u8> {
        let mut out = b"SR".to_vec();
        out.extend_from_slice(if compressed { &[0, 6] } else { &[0, 4] });

        for (rectype, body) in &self.records {
            let body = if compressed {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(body).unwrap();
                enc.finish().unwrap()
            } else {
                body.clone()
            };
            let next = (out.len() + 16 + body.len()) as u64;
            push_i32(&mut out, *rectype);
            out.extend_from_slice(&((next & 0xffff_ffff) as u32).to_be_bytes());
            out.extend_from_slice(&((next >> 32) as u32).to_be_bytes());
            push_i32(&mut out, 0);
            out.extend(body);
        }

        let end = out.len() as u32;
        push_i32(&mut out, REC_END);
        out.extend_from_slice(&end.to_be_bytes());
        out.extend_from_slice(&[0; 8]);
        out
    }
}

/// One synthetic occultation profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub altitudes: Vec<f64>,
    pub temps: Vec<f64>,
    pub pressures: Vec<f64>,
    /// `(altitude, density)` rows, may be shorter than the temperature rows
    pub density: Vec<(f64, f64)>,
    pub lat: f64,
    pub lon: f64,
    pub lst: f64,
    pub unixtime: f64,
}

impl Profile {
    /// Isothermal profile from `alt_lo` to `alt_hi` (inclusive) every `step` km.
    pub fn isothermal(temp: f64, alt_lo: f64, alt_hi: f64, step: f64, lon: f64) -> Self {
        let n = ((alt_hi - alt_lo) / step).round() as usize + 1;
        let altitudes: Vec<f64> = (0..n).map(|i| alt_lo + i as f64 * step).collect();
        let pressures = altitudes
            .iter()
            .map(|z| 1.0e-2 * (-(z - alt_lo) / 10.0).exp())
            .collect();
        let density = altitudes.iter().map(|z| (*z, 1.0e10 / z)).collect();
        Profile {
            temps: vec![temp; n],
            altitudes,
            pressures,
            density,
            lat: 20.0,
            lon,
            lst: 14.5,
            unixtime: 1_450_000_000.0,
        }
    }

    /// The EUVM variables: `temp` and `density` as `[n, 2]`, `pressure` as `[n]`,
    /// `location_info` as a structure whose fields 1..=4 are lat, lon, lst, time.
    pub fn to_sav(&self) -> SavBuilder {
        let temp: Vec<f64> = self
            .altitudes
            .iter()
            .zip(&self.temps)
            .flat_map(|(a, t)| [*a, *t])
            .collect();
        let density: Vec<f64> = self.density.iter().flat_map(|(a, d)| [*a, *d]).collect();

        SavBuilder::new()
            .double_array("temp", &[self.altitudes.len(), 2], &temp)
            .double_array("pressure", &[self.pressures.len()], &self.pressures)
            .double_array("density", &[self.density.len(), 2], &density)
            .struct_scalar(
                "location_info",
                ("orbit", 0),
                &[
                    ("lat", self.lat),
                    ("lon", self.lon),
                    ("lst", self.lst),
                    ("time", self.unixtime),
                ],
            )
    }

    /// Write the profile as `<dir>/<file_name>`.
    pub fn write(&self, dir: &Utf8Path, file_name: &str, compressed: bool) -> Utf8PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.to_sav().build(compressed)).unwrap();
        path
    }
}

/// Scratch directory with a UTF-8 path.
pub fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}
