mod common;

use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use common::{utf8_tempdir, Profile};
use euvmt::binning::BinningParams;
use euvmt::config::EuvmConfig;
use euvmt::observations::profile_reader::ProfileSchema;
use euvmt::pipeline::{DataSource, Pipeline};
use euvmt::euvm_errors::EuvmError;
use euvmt::render::CsvGridPresenter;
use euvmt::table::batch_loader::{load_directory, load_files};
use euvmt::table::CombinedTable;

/// Archive with orbits 650 (150 K) and 900 (200 K), a corrupt file and a hidden file.
fn archive() -> (tempfile::TempDir, Utf8PathBuf) {
    let (guard, root) = utf8_tempdir();
    let dir = root.join("euvm_temperatures_v01r00");
    std::fs::create_dir_all(&dir).unwrap();

    Profile::isothermal(150.0, 100.0, 200.0, 1.0, 45.0).write(&dir, "temp_650in_v01r00.sav", false);
    Profile::isothermal(200.0, 100.0, 200.0, 1.0, 45.0).write(&dir, "temp_900out_v01r00.sav", true);
    std::fs::write(dir.join("temp_901in_v01r00.sav"), b"definitely not IDL").unwrap();
    std::fs::write(dir.join(".DS_Store"), b"\0\0\0\x01Bud1").unwrap();

    (guard, root)
}

#[test]
fn test_corrupt_file_is_isolated() {
    let (_guard, root) = archive();
    let dir = EuvmConfig::new(root.as_str()).version_dir().unwrap();

    let batch = load_directory(&dir, &ProfileSchema::default()).unwrap();
    assert_eq!(batch.files_loaded, 2);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(
        batch.failures[0].path.file_name(),
        Some("temp_901in_v01r00.sav")
    );
    assert_eq!(batch.table.len(), 202);
    assert_eq!(batch.table.orbits(), vec![650, 900]);
}

#[test]
fn test_only_orbits_inside_the_window_are_binned() {
    let (_guard, root) = archive();
    let pipeline = Pipeline::new(EuvmConfig::new(root.as_str()));

    let aggregate = pipeline.aggregate(&BinningParams::default()).unwrap();
    assert_eq!(pipeline.failures().len(), 1);

    // 101..=195 km fall in the right-closed 5 km bins starting at 100 km
    assert_eq!(aggregate.rows_binned(), 95);
    assert_eq!(aggregate.rows_outside(), 6);
    assert_eq!(aggregate.len(), 19);
    for bin in aggregate.bins() {
        assert_eq!(bin.count, 5);
        assert_relative_eq!(bin.mean_temp, 200.0);
        assert_relative_eq!(bin.std_temp, 0.0);
        assert_relative_eq!(bin.x_mid, 54.0);
    }
    let total: usize = aggregate.bins().iter().map(|b| b.count).sum();
    assert_eq!(total, aggregate.rows_binned());
}

#[test]
fn test_combined_csv_round_trip() {
    let (_guard, root) = archive();
    let mut config = EuvmConfig::new(root.as_str());
    config.combined_csv = root.join("data").join("all_euvm.csv");
    let pipeline = Pipeline::new(config.clone());

    let path = pipeline.export_combined().unwrap();
    assert!(path.is_file());

    let back = CombinedTable::read_csv(path).unwrap();
    assert_eq!(&back, pipeline.table().unwrap());

    let reread = Pipeline::new(config).with_source(DataSource::CombinedCsv(path.to_path_buf()));
    let a = reread.aggregate(&BinningParams::default()).unwrap();
    let b = pipeline.aggregate(&BinningParams::default()).unwrap();
    assert_eq!(a.bins(), b.bins());
}

#[test]
fn test_grid_presenter_writes_every_panel() {
    let (_guard, root) = archive();
    let pipeline = Pipeline::new(EuvmConfig::new(root.as_str()));
    let out = root.join("figures");
    let presenter = CsvGridPresenter::new(out.clone(), "lon_alt");

    pipeline
        .present(&BinningParams::default(), &presenter)
        .unwrap();

    for name in ["temperature", "std", "n2", "count", "profiles"] {
        assert!(presenter.path_for(name).is_file(), "{name} grid missing");
    }
    let count = std::fs::read_to_string(presenter.path_for("count")).unwrap();
    assert_eq!(count.lines().count(), 20);
    assert_eq!(count.lines().next(), Some("y\\x,54"));
}

#[test]
fn test_single_save_file_source() {
    let (_guard, root) = archive();
    let path = root
        .join("euvm_temperatures_v01r00")
        .join("temp_900out_v01r00.sav");
    let pipeline = Pipeline::new(EuvmConfig::new("unused")).with_source(DataSource::from_input(&path));

    let table = pipeline.table().unwrap();
    assert_eq!(table.len(), 101);
    assert_eq!(table.orbits(), vec![900]);
}

#[test]
fn test_bad_element_count_becomes_a_load_failure() {
    let (_guard, root) = utf8_tempdir();
    let good = Profile::isothermal(180.0, 100.0, 110.0, 1.0, 45.0).write(&root, "temp_899out_v01r00.sav", false);
    let bad = root.join("temp_900in_v01r00.sav");
    let bytes = Profile::isothermal(180.0, 100.0, 110.0, 1.0, 45.0)
        .to_sav()
        .declare_elements(-1)
        .build(true);
    std::fs::write(&bad, bytes).unwrap();

    let batch = load_files(&[good, bad.clone()], &ProfileSchema::default());
    assert_eq!(batch.files_loaded, 1);
    assert_eq!(batch.table.len(), 11);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].path, bad);
    assert!(matches!(batch.failures[0].error, EuvmError::SavDecode { .. }));
}

#[test]
fn test_unwritable_output_is_a_presenter_error() {
    let (_guard, root) = archive();
    let pipeline = Pipeline::new(EuvmConfig::new(root.as_str()));
    let blocker = root.join("figures");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = pipeline
        .present(&BinningParams::default(), &CsvGridPresenter::new(blocker, "lon_alt"))
        .unwrap_err();
    assert!(matches!(err, EuvmError::Presenter(_)));
}
