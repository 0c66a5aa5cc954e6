mod common;

use approx::assert_relative_eq;
use common::{Profile, SavBuilder};
use euvmt::euvm_errors::EuvmError;
use euvmt::sav::{ArrayData, SavFile, SavTypeCode, SavValue};

#[test]
fn test_plain_and_compressed_decode_identically() {
    let builder = Profile::isothermal(180.0, 100.0, 140.0, 2.0, 45.0).to_sav();

    let plain = SavFile::parse(&builder.build(false)).unwrap();
    let compressed = SavFile::parse(&builder.build(true)).unwrap();

    assert!(!plain.is_compressed());
    assert!(compressed.is_compressed());
    for name in plain.names() {
        assert_eq!(plain.get(name).unwrap(), compressed.get(name).unwrap());
    }
    assert_eq!(
        plain.names().collect::<Vec<_>>(),
        vec!["density", "location_info", "pressure", "temp"]
    );
}

#[test]
fn test_array_shapes_and_values() {
    let bytes = SavBuilder::new()
        .double_array("temp", &[3, 2], &[100.0, 150.0, 101.0, 151.0, 102.0, 152.5])
        .float_array("pressure", &[3], &[1.0e-3, 5.0e-4, 2.5e-4])
        .long_scalar("orbit", 888)
        .build(false);
    let sav = SavFile::parse(&bytes).unwrap();

    let SavValue::Array(temp) = sav.get("TEMP").unwrap() else {
        panic!("temp should be an array");
    };
    assert_eq!(temp.type_code, SavTypeCode::Double);
    assert_eq!(temp.shape, vec![3, 2]);
    assert_eq!(temp.get2(2, 0), Some(102.0));
    assert_eq!(temp.get2(2, 1), Some(152.5));
    assert_eq!(temp.get2(0, 2), None);

    let SavValue::Array(pressure) = sav.get("pressure").unwrap() else {
        panic!("pressure should be an array");
    };
    assert_eq!(pressure.type_code, SavTypeCode::Float);
    let ArrayData::Numeric(values) = &pressure.data else {
        panic!("pressure should be numeric");
    };
    assert_relative_eq!(values[1], 5.0e-4, max_relative = 1e-6);

    assert_eq!(sav.get("orbit").unwrap(), &SavValue::Long(888));
}

#[test]
fn test_structure_fields() {
    let bytes = SavBuilder::new()
        .struct_scalar("location_info", ("orbit", 905), &[("lat", -12.5), ("lon", 310.0)])
        .build(true);
    let sav = SavFile::parse(&bytes).unwrap();

    let SavValue::Structure(info) = sav.get("location_info").unwrap() else {
        panic!("location_info should be a structure");
    };
    assert_eq!(info.tags, vec!["ORBIT", "LAT", "LON"]);
    assert_eq!(info.rows.len(), 1);
    assert_eq!(info.field(0, 0), Some(&SavValue::Long(905)));
    assert_eq!(info.field_by_name(0, "lon"), Some(&SavValue::Double(310.0)));
}

#[test]
fn test_corrupt_compressed_record() {
    let mut bytes = SavBuilder::new().long_scalar("orbit", 1).build(true);
    // first record body starts right after the 4-byte magic and 16-byte header
    for b in &mut bytes[20..28] {
        *b = 0xff;
    }
    assert!(matches!(
        SavFile::parse(&bytes),
        Err(EuvmError::Decompression(_))
    ));
}

#[test]
fn test_truncated_file() {
    let bytes = SavBuilder::new()
        .double_array("temp", &[2, 2], &[1.0, 2.0, 3.0, 4.0])
        .build(false);
    let truncated = &bytes[..bytes.len() - 40];
    assert!(matches!(
        SavFile::parse(truncated),
        Err(EuvmError::SavDecode { .. })
    ));
}

#[test]
fn test_int_array_words() {
    let bytes = SavBuilder::new()
        .int_array("flags", &[3], &[-2, 0, 513])
        .build(false);
    let sav = SavFile::parse(&bytes).unwrap();

    let SavValue::Array(flags) = sav.get("flags").unwrap() else {
        panic!("flags should be an array");
    };
    assert_eq!(flags.type_code, SavTypeCode::Int);
    assert_eq!(flags.data, ArrayData::Numeric(vec![-2.0, 0.0, 513.0]));
}

#[test]
fn test_negative_element_count_is_a_decode_error() {
    let structure = SavBuilder::new()
        .struct_scalar("location_info", ("orbit", 905), &[("lat", -12.5)])
        .declare_elements(-1);
    let int_array = SavBuilder::new()
        .int_array("flags", &[3], &[1, 2, 3])
        .declare_elements(-1);

    for builder in [structure, int_array] {
        for compressed in [false, true] {
            assert!(matches!(
                SavFile::parse(&builder.build(compressed)),
                Err(EuvmError::SavDecode { .. })
            ));
        }
    }
}

#[test]
fn test_element_count_beyond_file_is_a_decode_error() {
    let structure = SavBuilder::new()
        .struct_scalar("location_info", ("orbit", 905), &[("lat", -12.5)])
        .declare_elements(i32::MAX);
    let int_array = SavBuilder::new()
        .int_array("flags", &[3], &[1, 2, 3])
        .declare_elements(i32::MAX);

    for builder in [structure, int_array] {
        assert!(matches!(
            SavFile::parse(&builder.build(false)),
            Err(EuvmError::SavDecode { .. })
        ));
    }
}
