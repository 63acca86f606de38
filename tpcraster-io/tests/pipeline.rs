#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]
use std::path::Path;
use tempfile::TempDir;
use tpcraster_core::{Point, PointCloud, Projection};
use tpcraster_io::{
    load_image_h5, read_dataset, run, write_event_file, Error, Features, LoadOptions,
    LoadedDataset, Mode, PipelineConfig, RasterizedDataset, Targets,
};

// A short track with charges above 1 so the log transform stays positive
fn track(seed: u64, points: usize) -> PointCloud {
    (0..points)
        .map(|i| {
            let t = (seed * 31 + i as u64) as f64;
            Point::new(
                (t * 7.0) % 500.0 - 250.0,
                (t * 3.0) % 500.0 - 250.0,
                (t * 11.0) % 1200.0,
                2.0 + (t * 13.0) % 300.0,
            )
        })
        .collect()
}

fn write_run(dir: &Path, name: &str, ids: &[u64]) {
    let clouds: Vec<(u64, PointCloud)> = ids.iter().map(|&id| (id, track(id, 12))).collect();
    write_event_file(
        dir.join(name),
        clouds.iter().map(|(id, cloud)| (*id, cloud)),
    )
    .unwrap();
}

fn expect_labeled(dataset: RasterizedDataset) -> (usize, usize, Vec<u8>) {
    match dataset {
        RasterizedDataset::Labeled { train, test, .. } => {
            let mut targets: Vec<u8> = train.targets.iter().chain(&test.targets).copied().collect();
            targets.sort_unstable();
            (train.len(), test.len(), targets)
        }
        RasterizedDataset::Unlabeled { .. } => panic!("expected a labeled dataset"),
    }
}

#[test]
fn test_real_labeled_run() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_run(data.path(), "run_0130.h5", &[1, 2, 3, 4, 5, 6, 7]);
    std::fs::write(
        data.path().join("run_0130_labels.csv"),
        "evt_id,label\n4,c\n1,p\n6,x\n2,p\n5,j\n3,p\n",
    )
    .unwrap();

    let config = PipelineConfig::new(data.path(), Projection::Xy, Mode::RealLabeled)
        .with_runs(["0130"])
        .with_save_path(out.path().join("nested"))
        .with_seed(Some(42));
    let report = run(&config).unwrap();

    assert_eq!(report.class_counts.proton, 3);
    assert_eq!(report.class_counts.carbon, 1);
    assert_eq!(report.class_counts.junk, 1);
    assert_eq!((report.train, report.test), (4, 1));
    assert!(report.output.ends_with("nested/images.h5"));

    let (train, test, targets) = expect_labeled(read_dataset(&report.output).unwrap());
    assert_eq!((train, test), (4, 1));
    assert_eq!(targets, vec![0, 0, 0, 1, 2]);
}

#[test]
fn test_real_labeled_missing_table() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "run_0130.h5", &[1]);
    let config = PipelineConfig::new(data.path(), Projection::Zy, Mode::RealLabeled)
        .with_runs(["0130"])
        .with_save_path(data.path());
    assert!(matches!(run(&config), Err(Error::MissingInput(_))));
    assert!(!config.output_path().exists());
}

#[test]
fn test_real_unlabeled_reads_every_run() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "run_0130.h5", &[10, 11, 12]);
    write_run(data.path(), "run_0210.h5", &[20, 21]);

    let config = PipelineConfig::new(data.path(), Projection::Zy, Mode::RealUnlabeled)
        .with_save_path(data.path())
        .with_prefix("unlabeled_")
        .with_seed(Some(7));
    let report = run(&config).unwrap();
    assert_eq!(report.class_counts.unlabeled, 5);
    assert_eq!((report.train, report.test), (5, 0));

    let options = LoadOptions::default()
        .with_categorical(true)
        .with_flatten(true);
    match load_image_h5(&report.output, &options).unwrap() {
        LoadedDataset::Images(images) => assert_eq!(images.dim(), (5, 128, 128, 3)),
        LoadedDataset::Split(_) => panic!("expected unlabeled images"),
    }
}

#[test]
fn test_simulated_without_junk_keeps_sources() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "sim_proton.h5", &[0, 1, 2]);
    write_run(data.path(), "sim_carbon.h5", &[0, 1]);

    let mode = Mode::Simulated {
        noise: false,
        num_events: 0,
    };
    let config = PipelineConfig::new(data.path(), Projection::Zy, mode)
        .with_save_path(data.path())
        .with_prefix("sim_")
        .with_seed(Some(1));
    let report = run(&config).unwrap();

    let (train, test, targets) = expect_labeled(read_dataset(&report.output).unwrap());
    assert_eq!(train + test, 5);
    assert_eq!(train, 4);
    assert_eq!(targets, vec![0, 0, 0, 1, 1]);
}

#[test]
fn test_simulated_with_noise_and_loader_options() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "proton.h5", &[0, 1, 2, 3]);
    write_run(data.path(), "carbon.h5", &[0, 1, 2]);

    let mode = Mode::Simulated {
        noise: true,
        num_events: 3,
    };
    let config = PipelineConfig::new(data.path(), Projection::Xy, mode)
        .with_save_path(data.path())
        .with_seed(Some(99));
    let report = run(&config).unwrap();
    assert_eq!(report.class_counts.junk, 3);
    assert_eq!((report.train, report.test), (8, 2));

    let options = LoadOptions::default()
        .with_binary(true)
        .with_categorical(true)
        .with_flatten(true)
        .with_max_charge(true);
    let LoadedDataset::Split(split) = load_image_h5(&report.output, &options).unwrap() else {
        panic!("expected a labeled split");
    };
    assert_eq!(split.max_charge, Some(report.max_charge));
    match (&split.train.features, &split.train.targets) {
        (Features::Flat(features), Targets::OneHot(one_hot)) => {
            assert_eq!(features.dim(), (8, 49152));
            assert_eq!(one_hot.ncols(), 2);
            for row in one_hot.rows() {
                assert_eq!(row.sum(), 1);
            }
        }
        other => panic!("unexpected train partition: {other:?}"),
    }
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "proton.h5", &[0, 1, 2, 3, 4]);
    write_run(data.path(), "carbon.h5", &[0, 1, 2, 3, 4]);

    let mode = Mode::Simulated {
        noise: true,
        num_events: 2,
    };
    let first = PipelineConfig::new(data.path(), Projection::Zy, mode)
        .with_save_path(data.path().join("a"))
        .with_seed(Some(5));
    let second = first.clone().with_save_path(data.path().join("b"));

    let a = run(&first).unwrap();
    let b = run(&second).unwrap();
    assert_eq!(
        read_dataset(&a.output).unwrap(),
        read_dataset(&b.output).unwrap()
    );
}

#[test]
fn test_missing_data_dir_fails_before_reading() {
    let out = TempDir::new().unwrap();
    let config = PipelineConfig::new(out.path().join("absent"), Projection::Xy, Mode::RealUnlabeled)
        .with_save_path(out.path());
    assert!(matches!(run(&config), Err(Error::MissingInput(_))));
}
