//! Labeling policies for the three ingestion modes.

use crate::cloud::PointCloud;
use crate::label::{EventLabel, LabelTable, LabeledEvent};
use crate::source::{EventSource, NoiseModel};

const PROGRESS_INTERVAL: usize = 50;

/// Labeled real data: only events present in `table` are read, appended proton
/// ids first, then carbon, then junk, each in table order.
///
/// # Errors
/// Propagates reader errors, including ids missing from the source.
pub fn label_real_run<S: EventSource>(
    source: &S,
    table: &LabelTable,
) -> Result<Vec<LabeledEvent>, S::Error> {
    let mut events = Vec::with_capacity(table.len());
    for label in EventLabel::CLASSES {
        for evt_id in table.ids_with(label) {
            let cloud = source.read_event(evt_id)?;
            events.push(LabeledEvent::new(cloud, label));
        }
    }
    Ok(events)
}

/// Unlabeled real data: every event of the source, in source order, labeled
/// [`EventLabel::Unlabeled`].
///
/// # Errors
/// Propagates reader errors.
pub fn label_unlabeled_run<S: EventSource>(source: &S) -> Result<Vec<LabeledEvent>, S::Error> {
    let ids = source.event_ids()?;
    let mut events = Vec::with_capacity(ids.len());
    for evt_id in ids {
        let cloud = source.read_event(evt_id)?;
        events.push(LabeledEvent::new(cloud, EventLabel::Unlabeled));
    }
    Ok(events)
}

/// Simulated data: all proton events, all carbon events, then `num_junk`
/// placeholder junk events. With a noise model, every event (the junk
/// placeholder included) is augmented before it is labeled.
///
/// # Errors
/// Propagates reader errors.
pub fn label_simulated<S: EventSource>(
    protons: &S,
    carbons: &S,
    num_junk: usize,
    mut noise: Option<&mut dyn NoiseModel>,
) -> Result<Vec<LabeledEvent>, S::Error> {
    let mut events = Vec::new();

    for (source, label) in [(protons, EventLabel::Proton), (carbons, EventLabel::Carbon)] {
        for (i, evt_id) in source.event_ids()?.into_iter().enumerate() {
            let cloud = source.read_event(evt_id)?;
            events.push(LabeledEvent::new(augment(&mut noise, cloud), label));
            log_progress(label, i);
        }
    }

    for i in 0..num_junk {
        let cloud = augment(&mut noise, PointCloud::placeholder());
        events.push(LabeledEvent::new(cloud, EventLabel::Junk));
        log_progress(EventLabel::Junk, i);
    }

    Ok(events)
}

fn augment(noise: &mut Option<&mut dyn NoiseModel>, cloud: PointCloud) -> PointCloud {
    match noise {
        Some(model) => model.augment(&cloud),
        None => cloud,
    }
}

fn log_progress(label: EventLabel, index: usize) {
    if index % PROGRESS_INTERVAL == 0 {
        log::debug!("{label} event {index} added");
    }
}

/// Number of events per class, in [`EventLabel::CLASSES`] order followed by the
/// unlabeled count.
#[must_use]
pub fn class_counts(events: &[LabeledEvent]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for event in events {
        let slot = event.label.class_index().map_or(3, usize::from);
        counts[slot] += 1;
    }
    counts
}
