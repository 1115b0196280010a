//! Node lists read from CSV files.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{IngestError, Result};
use crate::inputs::input_paths;
use crate::reader::{CsvSource, is_stdio};

/// Where node names come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSource {
    /// Node files; empty means standard input.
    pub paths: Vec<PathBuf>,
    pub dialect: Dialect,
    pub column: String,
}

impl Default for NodeSource {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            dialect: Dialect::Default,
            column: "node".to_string(),
        }
    }
}

impl NodeSource {
    /// True when node names are read from standard input.
    pub fn reads_stdin(&self) -> bool {
        input_paths(&self.paths)
            .iter()
            .any(|path| is_stdio(path))
    }

    /// Every non-empty value of the node column across all node files.
    ///
    /// A file with no header contributes nothing; a header without the
    /// node column is an error.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        let mut nodes = BTreeSet::new();
        for path in input_paths(&self.paths) {
            let mut source = CsvSource::open(&path, self.dialect)?;
            let fields = sgmt_core::RowSource::field_names(&source);
            if fields.is_empty() {
                debug!(path = %path.display(), "empty node file");
                continue;
            }
            if !fields.iter().any(|field| *field == self.column) {
                return Err(IngestError::MissingColumn {
                    column: self.column.clone(),
                    path,
                });
            }
            while let Some(record) = source.next_record() {
                let node = record?.get(&self.column).to_string();
                if !node.is_empty() {
                    nodes.insert(node);
                }
            }
        }
        debug!(count = nodes.len(), "loaded nodes");
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(&dir, "a.csv", "node,comment\n^b^,x\na,\n\n");
        let second = write(&dir, "b.csv", "comment,node\n,a\ny,\n,c\n");
        let source = NodeSource {
            paths: vec![first, second],
            ..NodeSource::default()
        };
        let nodes = source.load().unwrap();
        assert_eq!(nodes.into_iter().collect::<Vec<_>>(), vec!["^b^", "a", "c"]);
        assert!(!source.reads_stdin());
    }

    #[test]
    fn test_missing_node_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "n.csv", "name\na\n");
        let source = NodeSource {
            paths: vec![path],
            ..NodeSource::default()
        };
        assert!(matches!(
            source.load(),
            Err(IngestError::MissingColumn { ref column, .. }) if column == "node"
        ));
    }

    #[test]
    fn test_custom_column_and_dialect() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "n.tsv", "id\tlabel\r\nx\tX\r\n");
        let source = NodeSource {
            paths: vec![path],
            dialect: Dialect::ExcelTab,
            column: "label".into(),
        };
        assert_eq!(source.load().unwrap().len(), 1);
    }

    #[test]
    fn test_default_reads_stdin() {
        assert!(NodeSource::default().reads_stdin());
    }
}
