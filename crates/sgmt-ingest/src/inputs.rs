//! Opening the input list as one merged record stream.

use std::path::PathBuf;

use sgmt_core::{CoreError, StreamMerger};

use crate::dialect::Dialect;
use crate::reader::{CsvSource, STDIO_PATH};

/// How input files are read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub dialect: Dialect,
    /// Fail when a later input's header names differ from the first one.
    pub strict_schema: bool,
}

impl ReadOptions {
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }
}

/// Lazily opened inputs, in order.
pub type InputSources = Box<dyn Iterator<Item = sgmt_core::Result<CsvSource>>>;

/// Merged, provenance-tagged stream over all inputs.
pub type InputStream = StreamMerger<InputSources, CsvSource>;

/// The input list with standard input substituted for an empty list.
pub fn input_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(STDIO_PATH)]
    } else {
        paths.to_vec()
    }
}

/// Open each input only when the previous one is exhausted.
pub fn open_inputs(paths: &[PathBuf], dialect: Dialect) -> InputSources {
    Box::new(
        input_paths(paths)
            .into_iter()
            .map(move |path| CsvSource::open(&path, dialect).map_err(CoreError::from)),
    )
}

/// Merge all inputs into one stream.
pub fn merge_inputs(paths: &[PathBuf], options: &ReadOptions) -> InputStream {
    StreamMerger::new(open_inputs(paths, options.dialect)).with_strict_schema(options.strict_schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_means_stdin() {
        assert_eq!(input_paths(&[]), vec![PathBuf::from("-")]);
        let explicit = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(input_paths(&explicit), explicit);
    }

    #[test]
    fn test_missing_input_fails_when_reached() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("edges.csv");
        std::fs::write(&present, "src,dst\na,b\n").unwrap();
        let paths = vec![present, dir.path().join("missing.csv")];

        let mut stream = merge_inputs(&paths, &ReadOptions::default());
        assert_eq!(stream.field_names().unwrap(), vec!["src", "dst"]);
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
