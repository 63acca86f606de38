//! End-to-end image generation: read, label, transform, split, normalize,
//! render and write.

use crate::dataset::{output_path, write_dataset, LabeledImages, RasterizedDataset, WriteOptions};
use crate::events::Hdf5EventFile;
use crate::labels::read_label_table;
use crate::{Error, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tpcraster_core::{
    apply_log_charge_all, class_counts, label_real_run, label_simulated, label_unlabeled_run,
    normalize_partitions, shuffle, shuffle_split, ChargeScale, LabeledEvent, Projection,
    Split, SplitConfig, UniformNoise, UniformNoiseConfig,
};
use tpcraster_render::{RenderConfig, Renderer};

/// Runs read in real mode when none are configured.
pub const DEFAULT_RUNS: [&str; 2] = ["0130", "0210"];

/// Origin of the input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Real,
    Sim,
}

impl FromStr for DataType {
    type Err = tpcraster_core::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "real" => Ok(DataType::Real),
            "sim" => Ok(DataType::Sim),
            other => Err(tpcraster_core::Error::InvalidDataType(other.to_string())),
        }
    }
}

/// Ingestion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Real runs selected and labeled by their label tables.
    RealLabeled,
    /// Every event of the real runs, without labels.
    RealUnlabeled,
    /// Proton and carbon simulations plus `num_events` junk placeholders.
    Simulated { noise: bool, num_events: usize },
}

impl Mode {
    /// Resolves the mode from the command-line switches. `labeled` only
    /// applies to real data.
    #[must_use]
    pub fn new(data_type: DataType, labeled: bool, noise: bool, num_events: usize) -> Self {
        match (data_type, labeled) {
            (DataType::Real, true) => Mode::RealLabeled,
            (DataType::Real, false) => Mode::RealUnlabeled,
            (DataType::Sim, _) => Mode::Simulated { noise, num_events },
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::RealLabeled => "real-labeled",
            Mode::RealUnlabeled => "real-unlabeled",
            Mode::Simulated { noise: true, .. } => "simulated-noisy",
            Mode::Simulated { noise: false, .. } => "simulated",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Directory holding the input files.
    pub data_dir: PathBuf,
    /// Directory the output container is written to.
    pub save_path: PathBuf,
    /// Prefix of the output file name, and of the simulation inputs.
    pub prefix: String,
    pub projection: Projection,
    pub mode: Mode,
    /// Real runs to read (`run_<id>.h5`, `run_<id>_labels.csv`).
    pub runs: Vec<String>,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub split: SplitConfig,
    pub render: RenderConfig,
    pub noise: UniformNoiseConfig,
    pub write: WriteOptions,
}

impl PipelineConfig {
    /// A configuration with default runs, split, rendering and noise.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, projection: Projection, mode: Mode) -> Self {
        Self {
            data_dir: data_dir.into(),
            save_path: PathBuf::from("."),
            prefix: String::new(),
            projection,
            mode,
            runs: DEFAULT_RUNS.iter().map(ToString::to_string).collect(),
            seed: None,
            split: SplitConfig::default(),
            render: RenderConfig::default(),
            noise: UniformNoiseConfig::default(),
            write: WriteOptions::default(),
        }
    }

    #[must_use]
    pub fn with_save_path(mut self, save_path: impl Into<PathBuf>) -> Self {
        self.save_path = save_path.into();
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_runs<I, S>(mut self, runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runs = runs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    #[must_use]
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    #[must_use]
    pub fn with_noise(mut self, noise: UniformNoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    #[must_use]
    pub fn with_write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// `<save_path>/<prefix>images.h5`.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        output_path(&self.save_path, &self.prefix)
    }

    /// Checks the configuration and builds the renderer.
    ///
    /// # Errors
    /// Returns [`Error::MissingInput`] if `data_dir` is not a directory, or a
    /// configuration error for invalid render or noise settings.
    pub fn validate(&self) -> Result<Renderer> {
        if !self.data_dir.is_dir() {
            return Err(Error::MissingInput(self.data_dir.clone()));
        }
        if matches!(self.mode, Mode::Simulated { noise: true, .. }) {
            self.noise.validate()?;
        }
        if self.runs.is_empty() && matches!(self.mode, Mode::RealLabeled | Mode::RealUnlabeled) {
            return Err(tpcraster_core::Error::ConfigError("no runs configured".into()).into());
        }
        Ok(Renderer::new(self.projection, self.render.clone())?)
    }

    fn run_file(&self, run: &str) -> PathBuf {
        self.data_dir.join(format!("run_{run}.h5"))
    }

    fn label_file(&self, run: &str) -> PathBuf {
        self.data_dir.join(format!("run_{run}_labels.csv"))
    }

    fn sim_file(&self, particle: &str) -> PathBuf {
        self.data_dir.join(format!("{}{particle}.h5", self.prefix))
    }
}

/// Per-class event counts before splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClassCounts {
    pub proton: usize,
    pub carbon: usize,
    pub junk: usize,
    pub unlabeled: usize,
}

impl From<[usize; 4]> for ClassCounts {
    fn from(counts: [usize; 4]) -> Self {
        let [proton, carbon, junk, unlabeled] = counts;
        Self {
            proton,
            carbon,
            junk,
            unlabeled,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub mode: String,
    pub output: PathBuf,
    pub class_counts: ClassCounts,
    pub train: usize,
    /// Zero for unlabeled runs, which are not split.
    pub test: usize,
    pub max_charge: f64,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode:       {}", self.mode)?;
        writeln!(f, "Output:     {}", self.output.display())?;
        writeln!(
            f,
            "Events:     proton={} carbon={} junk={} unlabeled={}",
            self.class_counts.proton,
            self.class_counts.carbon,
            self.class_counts.junk,
            self.class_counts.unlabeled
        )?;
        writeln!(f, "Train/test: {}/{}", self.train, self.test)?;
        write!(f, "Max charge: {:.6}", self.max_charge)
    }
}

/// Runs the whole pipeline and writes the container.
///
/// # Errors
/// Returns configuration errors before any input is read, then any read,
/// normalization or write failure. Nothing is written on failure.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let renderer = config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let events = collect_events(config, &mut rng)?;
    let counts = ClassCounts::from(class_counts(&events));
    debug!("collected {} events ({counts:?})", events.len());

    let dataset = match config.mode {
        Mode::RealUnlabeled => rasterize_unlabeled(events, &renderer, &mut rng)?,
        Mode::RealLabeled | Mode::Simulated { .. } => {
            rasterize_labeled(events, &renderer, &config.split, &mut rng)?
        }
    };

    let output = config.output_path();
    info!("Saving file...");
    write_dataset(&output, &dataset, &config.write)?;

    let (train, test) = match &dataset {
        RasterizedDataset::Labeled { train, test, .. } => (train.len(), test.len()),
        RasterizedDataset::Unlabeled { .. } => (dataset.len(), 0),
    };
    Ok(PipelineReport {
        mode: config.mode.to_string(),
        output,
        class_counts: counts,
        train,
        test,
        max_charge: dataset.max_charge(),
    })
}

/// Reads and labels the events of the configured mode.
///
/// # Errors
/// Returns an error if an input file is missing or unreadable.
pub fn collect_events<R: Rng + ?Sized>(
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<Vec<LabeledEvent>> {
    let mut events = Vec::new();
    match config.mode {
        Mode::RealLabeled => {
            for run in &config.runs {
                let source = Hdf5EventFile::open(config.run_file(run))?;
                let table = read_label_table(config.label_file(run))?;
                let labeled = label_real_run(&source, &table)?;
                info!("run {run}: {} labeled events", labeled.len());
                events.extend(labeled);
            }
        }
        Mode::RealUnlabeled => {
            for run in &config.runs {
                let source = Hdf5EventFile::open(config.run_file(run))?;
                let unlabeled = label_unlabeled_run(&source)?;
                info!("run {run}: {} events", unlabeled.len());
                events.extend(unlabeled);
            }
        }
        Mode::Simulated { noise, num_events } => {
            let protons = Hdf5EventFile::open(config.sim_file("proton"))?;
            let carbons = Hdf5EventFile::open(config.sim_file("carbon"))?;
            let simulated = if noise {
                let mut model = UniformNoise::new(config.noise.clone(), rng.gen())?;
                label_simulated(&protons, &carbons, num_events, Some(&mut model))?
            } else {
                label_simulated(&protons, &carbons, num_events, None)?
            };
            events.extend(simulated);
        }
    }
    Ok(events)
}

/// Log-transforms, shuffles and splits `events`, normalizes both partitions
/// with the train scale and renders them.
///
/// # Errors
/// Returns [`tpcraster_core::Error::DegenerateScale`] if the train partition
/// has no point or a zero maximum, or [`Error::InvalidFormat`] if an event
/// carries no class.
pub fn rasterize_labeled<R: Rng + ?Sized>(
    mut events: Vec<LabeledEvent>,
    renderer: &Renderer,
    split: &SplitConfig,
    rng: &mut R,
) -> Result<RasterizedDataset> {
    apply_log_charge_all(&mut events);
    let Split {
        mut train,
        mut test,
    } = shuffle_split(events, split, rng);
    let scale = normalize_partitions(&mut train, &mut test)?;

    info!("Making images...");
    Ok(RasterizedDataset::Labeled {
        train: render_partition(renderer, &train)?,
        test: render_partition(renderer, &test)?,
        max_charge: scale.max_charge(),
    })
}

/// Log-transforms and shuffles `events`, normalizes them with their own scale
/// and renders them.
///
/// # Errors
/// Returns [`tpcraster_core::Error::DegenerateScale`] if no event has a point
/// or the maximum is zero.
pub fn rasterize_unlabeled<R: Rng + ?Sized>(
    mut events: Vec<LabeledEvent>,
    renderer: &Renderer,
    rng: &mut R,
) -> Result<RasterizedDataset> {
    apply_log_charge_all(&mut events);
    shuffle(&mut events, rng);
    let scale = ChargeScale::fit(&events)?;
    scale.apply_all(&mut events);

    info!("Making images...");
    Ok(RasterizedDataset::Unlabeled {
        images: renderer.render_stack(&events),
        max_charge: scale.max_charge(),
    })
}

fn render_partition(renderer: &Renderer, events: &[LabeledEvent]) -> Result<LabeledImages> {
    let targets = events
        .iter()
        .map(|event| {
            event.label.class_index().ok_or_else(|| {
                Error::InvalidFormat(format!("{} event in a labeled dataset", event.label))
            })
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok(LabeledImages {
        features: renderer.render_stack(events),
        targets: targets.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tpcraster_core::{EventLabel, Point, PointCloud};

    fn event(charge: f64, label: EventLabel) -> LabeledEvent {
        let cloud: PointCloud = [Point::new(0.0, 0.0, 100.0, charge)].into_iter().collect();
        LabeledEvent::new(cloud, label)
    }

    fn renderer() -> Renderer {
        Renderer::new(Projection::Zy, RenderConfig::default()).unwrap()
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!("real".parse::<DataType>().unwrap(), DataType::Real);
        assert_eq!("sim".parse::<DataType>().unwrap(), DataType::Sim);
        assert!(matches!(
            "Real".parse::<DataType>(),
            Err(tpcraster_core::Error::InvalidDataType(_))
        ));
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(Mode::new(DataType::Real, true, true, 7), Mode::RealLabeled);
        assert_eq!(Mode::new(DataType::Real, false, true, 7), Mode::RealUnlabeled);
        assert_eq!(
            Mode::new(DataType::Sim, false, false, 7),
            Mode::Simulated {
                noise: false,
                num_events: 7
            }
        );
    }

    #[test]
    fn test_rasterize_labeled_split_and_scale() {
        let mut events = Vec::new();
        for i in 1..=6 {
            events.push(event(f64::from(i) * 10.0, EventLabel::Proton));
        }
        for i in 1..=4 {
            events.push(event(f64::from(i) * 100.0, EventLabel::Carbon));
        }
        let mut rng = StdRng::seed_from_u64(11);
        let dataset =
            rasterize_labeled(events, &renderer(), &SplitConfig::default(), &mut rng).unwrap();

        let RasterizedDataset::Labeled { train, test, max_charge } = dataset else {
            panic!("expected a labeled dataset");
        };
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(train.features.dim(), (8, 128, 128, 3));
        let carbons = train.targets.iter().chain(test.targets.iter()).filter(|&&t| t == 1);
        assert_eq!(carbons.count(), 4);
        // the largest train charge is at most log10(400)
        assert!(max_charge <= 400f64.log10() + 1e-12);
        assert!(max_charge >= 60f64.log10() - 1e-12);
    }

    #[test]
    fn test_rasterize_labeled_is_deterministic() {
        let events: Vec<_> = (1..=20)
            .map(|i| event(f64::from(i), EventLabel::Junk))
            .collect();
        let a = rasterize_labeled(
            events.clone(),
            &renderer(),
            &SplitConfig::default(),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
        let b = rasterize_labeled(
            events,
            &renderer(),
            &SplitConfig::default(),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rasterize_labeled_degenerate_scale() {
        let events = vec![event(1.0, EventLabel::Proton), event(0.0, EventLabel::Carbon)];
        let err = rasterize_labeled(
            events,
            &renderer(),
            &SplitConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::CoreError(tpcraster_core::Error::DegenerateScale(_))
        ));
    }

    #[test]
    fn test_rasterize_labeled_rejects_unlabeled_events() {
        let events = vec![event(50.0, EventLabel::Unlabeled); 5];
        let err = rasterize_labeled(
            events,
            &renderer(),
            &SplitConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_rasterize_unlabeled_uses_whole_dataset_scale() {
        let events = vec![
            event(10.0, EventLabel::Unlabeled),
            event(1000.0, EventLabel::Unlabeled),
            event(100.0, EventLabel::Unlabeled),
        ];
        let dataset =
            rasterize_unlabeled(events, &renderer(), &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_relative_eq!(dataset.max_charge(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_missing_data_dir() {
        let config = PipelineConfig::new("/definitely/not/here", Projection::Xy, Mode::RealLabeled);
        assert!(matches!(config.validate(), Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_output_path_uses_prefix() {
        let config = PipelineConfig::new(".", Projection::Xy, Mode::RealLabeled)
            .with_save_path("out")
            .with_prefix("noisy_");
        assert_eq!(config.output_path(), PathBuf::from("out/noisy_images.h5"));
        assert_eq!(config.runs, vec!["0130".to_string(), "0210".to_string()]);
    }
}
