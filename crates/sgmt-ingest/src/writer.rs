//! CSV output with a fixed field list.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sgmt_core::Record;
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{IngestError, Result};
use crate::reader::is_stdio;

/// Writes a header line, then one line per record.
///
/// Only the configured fields are written, in order; absent fields are
/// written empty and fields outside the list are dropped. With an empty
/// field list nothing is written at all.
pub struct CsvSink {
    path: PathBuf,
    fields: Vec<String>,
    writer: Option<csv::Writer<Box<dyn Write>>>,
    rows: usize,
}

impl CsvSink {
    /// Create `path` (`-` writes standard output) and write the header.
    pub fn create(path: &Path, dialect: Dialect, fields: Vec<String>) -> Result<Self> {
        let output: Box<dyn Write> = if is_stdio(path) {
            Box::new(io::stdout())
        } else {
            let file = File::create(path).map_err(|source| IngestError::FileCreate {
                path: path.to_path_buf(),
                source,
            })?;
            Box::new(file)
        };
        Self::from_writer(output, path, dialect, fields)
    }

    pub fn from_writer(
        output: Box<dyn Write>,
        path: &Path,
        dialect: Dialect,
        fields: Vec<String>,
    ) -> Result<Self> {
        let mut sink = Self {
            path: path.to_path_buf(),
            writer: None,
            fields,
            rows: 0,
        };
        if sink.fields.is_empty() {
            debug!(path = %path.display(), "no output fields, output stays empty");
            return Ok(sink);
        }
        let mut writer = dialect.writer_builder().from_writer(output);
        writer
            .write_record(&sink.fields)
            .map_err(|source| sink.write_error(source))?;
        sink.writer = Some(writer);
        Ok(sink)
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let row = record.project(&self.fields);
        if let Err(source) = writer.write_record(&row) {
            return Err(self.write_error(source));
        }
        self.rows += 1;
        Ok(())
    }

    /// Write every record of `rows`, stopping at the first error.
    pub fn write_all<I>(&mut self, rows: I) -> sgmt_core::Result<usize>
    where
        I: IntoIterator<Item = sgmt_core::Result<Record>>,
    {
        let before = self.rows;
        for row in rows {
            self.write(&row?)?;
        }
        Ok(self.rows - before)
    }

    /// Flush buffered output; returns the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|source| IngestError::CsvWrite {
                path: self.path.clone(),
                source: source.into(),
            })?;
        }
        Ok(self.rows)
    }

    fn write_error(&self, source: csv::Error) -> IngestError {
        IngestError::CsvWrite {
            path: self.path.clone(),
            source,
        }
    }
}
