//! JSON-lines record streams.
//!
//! One record per line, blank lines ignored. Reading is sequential; seeking is
//! done by skipping records.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Sequential reader over one `.jsonl` file.
pub struct JsonLines<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonLines<T> {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::config(format!("Failed to open stream '{}': {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line: 0,
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next non-blank line, unparsed.
    fn next_line(&mut self) -> Result<Option<String>, AppError> {
        for line in self.lines.by_ref() {
            self.line += 1;
            let line = line.map_err(|e| {
                AppError::config(format!("Failed to read '{}' line {}: {e}", self.path.display(), self.line))
            })?;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<T>, AppError> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        serde_json::from_str(&line).map(Some).map_err(|e| {
            AppError::config(format!("Bad record in '{}' line {}: {e}", self.path.display(), self.line))
        })
    }

    /// Skip `n` records without decoding them.
    pub fn skip(&mut self, n: usize) -> Result<(), AppError> {
        for _ in 0..n {
            if self.next_line()?.is_none() {
                return Err(AppError::config(format!(
                    "Stream '{}' ended while seeking",
                    self.path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Number of records in a `.jsonl` file.
pub fn count_records(path: &Path) -> std::io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut n = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            n += 1;
        }
    }
    Ok(n)
}

/// Buffered `.jsonl` writer.
pub struct JsonLinesWriter<T> {
    path: PathBuf,
    out: BufWriter<File>,
    _record: PhantomData<T>,
}

impl<T: Serialize> JsonLinesWriter<T> {
    pub fn create(path: &Path) -> Result<Self, AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            _record: PhantomData,
        })
    }

    pub fn write(&mut self, record: &T) -> Result<(), AppError> {
        serde_json::to_writer(&mut self.out, record)
            .map_err(|e| AppError::output(format!("Failed to encode record for '{}': {e}", self.path.display())))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| AppError::output(format!("Failed to write '{}': {e}", self.path.display())))
    }

    pub fn finish(mut self) -> Result<(), AppError> {
        self.out
            .flush()
            .map_err(|e| AppError::output(format!("Failed to flush '{}': {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhotonRecord;

    #[test]
    fn skips_blank_lines_and_seeks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photon.jsonl");
        std::fs::write(
            &path,
            "{\"is_present\":true,\"pt\":1}\n\n{\"pt\":2}\n{\"pt\":3}\n",
        )
        .unwrap();
        assert_eq!(count_records(&path).unwrap(), 3);

        let mut stream = JsonLines::<PhotonRecord>::open(&path).unwrap();
        stream.skip(1).unwrap();
        let rec = stream.next_record().unwrap().unwrap();
        assert_eq!(rec.pt, 2.0);
        assert!(!rec.is_present);
        assert_eq!(stream.next_record().unwrap().unwrap().pt, 3.0);
        assert!(stream.next_record().unwrap().is_none());
        assert!(stream.skip(1).is_err());
    }

    #[test]
    fn bad_record_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photon.jsonl");
        std::fs::write(&path, "{\"pt\":1}\nnot json\n").unwrap();
        let mut stream = JsonLines::<PhotonRecord>::open(&path).unwrap();
        stream.next_record().unwrap();
        let err = stream.next_record().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn writer_output_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photon.jsonl");
        let mut w = JsonLinesWriter::create(&path).unwrap();
        w.write(&PhotonRecord { is_present: true, pt: 50.0, eta: 0.1, phi: 0.2 }).unwrap();
        w.finish().unwrap();
        let mut r = JsonLines::<PhotonRecord>::open(&path).unwrap();
        assert_eq!(r.next_record().unwrap().unwrap().pt, 50.0);
    }
}
