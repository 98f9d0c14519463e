//! Event assembly from the parallel streams of validated inputs.

use std::collections::VecDeque;

use serde::de::DeserializeOwned;

use crate::domain::{
    AnalysisRecord, Event, JetRecord, JetVariants, MetRecord, MetVariants, MiscRecord, PhotonRecord,
};
use crate::error::AppError;
use crate::io::ingest::ValidatedInput;
use crate::io::layout::*;
use crate::io::stream::JsonLines;
use crate::process::EventRange;

/// The concatenation of every validated input, in the given order.
#[derive(Debug, Clone)]
pub struct EventSource {
    inputs: Vec<ValidatedInput>,
}

impl EventSource {
    pub fn new(inputs: Vec<ValidatedInput>) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &[ValidatedInput] {
        &self.inputs
    }

    /// Total number of events across inputs.
    pub fn len(&self) -> usize {
        self.inputs.iter().map(|i| i.entries).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the luminosity recorded by the inputs that declare one.
    pub fn luminosity(&self) -> f64 {
        self.inputs.iter().filter_map(|i| i.luminosity).sum()
    }

    /// Events in `range`, read sequentially.
    pub fn events(&self, range: EventRange) -> EventIter {
        EventIter {
            pending: self.inputs.iter().cloned().collect(),
            current: None,
            skip: range.from,
            remaining: range.len(),
        }
    }
}

/// Sequential iterator over assembled events.
pub struct EventIter {
    pending: VecDeque<ValidatedInput>,
    current: Option<InputReaders>,
    skip: usize,
    remaining: usize,
}

impl EventIter {
    fn next_event(&mut self) -> Result<Option<Event>, AppError> {
        while self.remaining > 0 {
            if self.current.is_none() {
                let Some(input) = self.pending.pop_front() else {
                    return Ok(None);
                };
                if self.skip >= input.entries {
                    self.skip -= input.entries;
                    continue;
                }
                let mut readers = InputReaders::open(&input)?;
                readers.skip(self.skip)?;
                self.skip = 0;
                self.current = Some(readers);
            }

            let Some(readers) = self.current.as_mut() else {
                continue;
            };
            match readers.next_event()? {
                Some(event) => {
                    self.remaining -= 1;
                    return Ok(Some(event));
                }
                None => self.current = None,
            }
        }
        Ok(None)
    }
}

impl Iterator for EventIter {
    type Item = Result<Event, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// A stream that may be absent; absent streams yield default records.
struct Optional<T>(Option<JsonLines<T>>);

impl<T: DeserializeOwned + Default> Optional<T> {
    fn open(input: &ValidatedInput, name: &str) -> Result<Self, AppError> {
        if !input.has_truth(name) {
            return Ok(Self(None));
        }
        JsonLines::open(&input.layout.stream(name)).map(|s| Self(Some(s)))
    }

    fn next(&mut self) -> Result<T, AppError> {
        match &mut self.0 {
            Some(stream) => required(stream),
            None => Ok(T::default()),
        }
    }

    fn skip(&mut self, n: usize) -> Result<(), AppError> {
        match &mut self.0 {
            Some(stream) => stream.skip(n),
            None => Ok(()),
        }
    }
}

fn required<T: DeserializeOwned>(stream: &mut JsonLines<T>) -> Result<T, AppError> {
    stream.next_record()?.ok_or_else(|| {
        AppError::config(format!(
            "Stream '{}' ended before 'analysis'",
            stream.path().display()
        ))
    })
}

struct InputReaders {
    analysis: JsonLines<AnalysisRecord>,
    photon: JsonLines<PhotonRecord>,
    photon_gen: Optional<PhotonRecord>,
    first_jet: JsonLines<JetRecord>,
    first_jet_raw: JsonLines<JetRecord>,
    first_jet_gen: Optional<JetRecord>,
    second_jet: JsonLines<JetRecord>,
    second_jet_raw: JsonLines<JetRecord>,
    second_jet_gen: Optional<JetRecord>,
    met: JsonLines<MetRecord>,
    met_raw: JsonLines<MetRecord>,
    met_gen: Optional<MetRecord>,
    misc: JsonLines<MiscRecord>,
}

impl InputReaders {
    fn open(input: &ValidatedInput) -> Result<Self, AppError> {
        let layout = &input.layout;
        Ok(Self {
            analysis: JsonLines::open(&layout.stream(ANALYSIS))?,
            photon: JsonLines::open(&layout.stream(PHOTON))?,
            photon_gen: Optional::open(input, PHOTON_GEN)?,
            first_jet: JsonLines::open(&layout.stream(FIRST_JET))?,
            first_jet_raw: JsonLines::open(&layout.stream(FIRST_JET_RAW))?,
            first_jet_gen: Optional::open(input, FIRST_JET_GEN)?,
            second_jet: JsonLines::open(&layout.stream(SECOND_JET))?,
            second_jet_raw: JsonLines::open(&layout.stream(SECOND_JET_RAW))?,
            second_jet_gen: Optional::open(input, SECOND_JET_GEN)?,
            met: JsonLines::open(&layout.stream(MET))?,
            met_raw: JsonLines::open(&layout.stream(MET_RAW))?,
            met_gen: Optional::open(input, MET_GEN)?,
            misc: JsonLines::open(&layout.stream(MISC))?,
        })
    }

    fn skip(&mut self, n: usize) -> Result<(), AppError> {
        if n == 0 {
            return Ok(());
        }
        self.analysis.skip(n)?;
        self.photon.skip(n)?;
        self.photon_gen.skip(n)?;
        self.first_jet.skip(n)?;
        self.first_jet_raw.skip(n)?;
        self.first_jet_gen.skip(n)?;
        self.second_jet.skip(n)?;
        self.second_jet_raw.skip(n)?;
        self.second_jet_gen.skip(n)?;
        self.met.skip(n)?;
        self.met_raw.skip(n)?;
        self.met_gen.skip(n)?;
        self.misc.skip(n)
    }

    fn next_event(&mut self) -> Result<Option<Event>, AppError> {
        let Some(analysis) = self.analysis.next_record()? else {
            return Ok(None);
        };
        Ok(Some(Event {
            analysis,
            photon: required(&mut self.photon)?,
            gen_photon: self.photon_gen.next()?,
            first_jet: JetVariants {
                reco: required(&mut self.first_jet)?,
                raw: required(&mut self.first_jet_raw)?,
                truth: self.first_jet_gen.next()?,
            },
            second_jet: JetVariants {
                reco: required(&mut self.second_jet)?,
                raw: required(&mut self.second_jet_raw)?,
                truth: self.second_jet_gen.next()?,
            },
            met: MetVariants {
                reco: required(&mut self.met)?,
                raw: required(&mut self.met_raw)?,
                truth: self.met_gen.next()?,
            },
            misc: required(&mut self.misc)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::validate_inputs;
    use std::fs;
    use std::path::Path;

    const POSTFIX: &str = "CaloAK5";

    /// Input whose photon pt encodes the global event number.
    fn write_input(root: &Path, first: usize, n: usize) {
        fs::create_dir_all(root.join(POSTFIX)).unwrap();
        let layout = InputLayout::new(root, POSTFIX);
        for name in REQUIRED_STREAMS {
            let body: String = (first..first + n)
                .map(|i| match name {
                    ANALYSIS => format!("{{\"run\":{i}}}\n"),
                    PHOTON => format!("{{\"is_present\":true,\"pt\":{i}}}\n"),
                    _ => "{}\n".to_string(),
                })
                .collect();
            fs::write(layout.stream(name), body).unwrap();
        }
    }

    fn source(dir: &Path) -> EventSource {
        write_input(&dir.join("a"), 0, 3);
        write_input(&dir.join("b"), 3, 4);
        let (ok, errors) = validate_inputs(&[dir.join("a"), dir.join("b")], POSTFIX);
        assert!(errors.is_empty());
        EventSource::new(ok)
    }

    #[test]
    fn concatenates_inputs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        assert_eq!(source.len(), 7);
        let runs: Vec<u32> = source
            .events(EventRange::all(source.len()))
            .map(|e| e.unwrap().run())
            .collect();
        assert_eq!(runs, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn ranges_span_input_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let pts: Vec<f64> = source
            .events(EventRange { from: 2, to: 5 })
            .map(|e| e.unwrap().photon.pt)
            .collect();
        assert_eq!(pts, vec![2.0, 3.0, 4.0]);

        let tail: Vec<u32> = source
            .events(EventRange { from: 4, to: 7 })
            .map(|e| e.unwrap().run())
            .collect();
        assert_eq!(tail, vec![4, 5, 6]);
    }

    #[test]
    fn absent_truth_streams_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let event = source.events(EventRange::all(1)).next().unwrap().unwrap();
        assert!(!event.gen_photon.is_present);
        assert_eq!(event.first_jet.truth, JetRecord::default());
    }
}
