//! Row-level stages: pass-through, column projection, value assignment and
//! pattern filtering.

use std::collections::HashSet;

use crate::error::{CoreError, Result};
use crate::pattern::PatternMatcher;
use crate::record::Record;
use crate::stage::{RowStream, Stage};

/// `cat`: every record unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatStage;

impl Stage for CatStage {
    fn stage_name(&self) -> &str {
        "cat"
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        Ok(rows)
    }
}

/// A `DST=SRC` column mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub dst: String,
    pub src: String,
}

impl ColumnMapping {
    /// Parse `DST=SRC`. Both sides must be non-empty.
    pub fn parse(spec: &str) -> Result<Self> {
        let Some((dst, src)) = spec.split_once('=') else {
            return Err(CoreError::InvalidArgument(format!(
                "column mapping '{spec}' must look like DST=SRC"
            )));
        };
        if dst.is_empty() || src.is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "column mapping '{spec}' has an empty side"
            )));
        }
        Ok(Self {
            dst: dst.to_string(),
            src: src.to_string(),
        })
    }
}

/// `extract`: project and rename columns, dropping rows whose projected
/// source values were already emitted.
#[derive(Debug, Clone)]
pub struct ExtractStage {
    mappings: Vec<ColumnMapping>,
}

impl ExtractStage {
    pub fn new(mappings: Vec<ColumnMapping>) -> Self {
        Self { mappings }
    }

    /// Build from `DST=SRC` strings.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mappings = specs
            .iter()
            .map(|spec| ColumnMapping::parse(spec.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(mappings))
    }
}

impl Stage for ExtractStage {
    fn stage_name(&self) -> &str {
        "extract"
    }

    fn input_columns(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .map(|mapping| mapping.src.as_str())
            .collect()
    }

    fn output_fields(&self, _input_fields: &[String]) -> Vec<String> {
        self.mappings
            .iter()
            .map(|mapping| mapping.dst.clone())
            .collect()
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        let mut emitted: HashSet<Vec<String>> = HashSet::new();
        Ok(Box::new(rows.filter_map(move |row| {
            let record = match row {
                Ok(record) => record,
                Err(error) => return Some(Err(error)),
            };
            let mut projected = Record::new();
            let mut key = Vec::with_capacity(self.mappings.len());
            for mapping in &self.mappings {
                let value = record.get(&mapping.src);
                projected.set(mapping.dst.as_str(), value);
                key.push(value.to_string());
            }
            emitted.insert(key).then_some(Ok(projected))
        })))
    }
}

/// `set`: assign fixed values to columns of every record.
///
/// New columns are appended to the output field list once, in order.
#[derive(Debug, Clone)]
pub struct AssignStage {
    updates: Vec<(String, String)>,
}

impl AssignStage {
    /// Later assignments to the same column override earlier ones.
    pub fn new<I, K, V>(updates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged: Vec<(String, String)> = Vec::new();
        for (column, value) in updates {
            let column = column.into();
            let value = value.into();
            match merged.iter_mut().find(|(existing, _)| *existing == column) {
                Some(slot) => slot.1 = value,
                None => merged.push((column, value)),
            }
        }
        Self { updates: merged }
    }

    /// Build from `COLUMN=VALUE` strings; the value may contain `=`.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mut updates = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = spec.as_ref();
            match spec.split_once('=') {
                Some((column, value)) if !column.is_empty() => updates.push((column, value)),
                _ => {
                    return Err(CoreError::InvalidArgument(format!(
                        "assignment '{spec}' must look like COLUMN=VALUE"
                    )));
                }
            }
        }
        Ok(Self::new(updates))
    }
}

impl Stage for AssignStage {
    fn stage_name(&self) -> &str {
        "set"
    }

    fn output_fields(&self, input_fields: &[String]) -> Vec<String> {
        let mut fields = input_fields.to_vec();
        for (column, _) in &self.updates {
            if !fields.contains(column) {
                fields.push(column.clone());
            }
        }
        fields
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        Ok(Box::new(rows.map(move |row| {
            row.map(|mut record| {
                for (column, value) in &self.updates {
                    record.set(column.as_str(), value.as_str());
                }
                record
            })
        })))
    }
}

/// `grep`: keep records whose column value matches the node patterns.
#[derive(Debug, Clone)]
pub struct MatchStage {
    column: String,
    matcher: PatternMatcher,
    invert: bool,
}

impl MatchStage {
    pub fn new(column: impl Into<String>, matcher: PatternMatcher) -> Self {
        Self {
            column: column.into(),
            matcher,
            invert: false,
        }
    }

    /// Keep the records that do not match instead.
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }
}

impl Stage for MatchStage {
    fn stage_name(&self) -> &str {
        "grep"
    }

    fn input_columns(&self) -> Vec<&str> {
        vec![self.column.as_str()]
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        Ok(Box::new(rows.filter(move |row| match row {
            Ok(record) => self.matcher.is_match(record.get(&self.column)) != self.invert,
            Err(_) => true,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternConfig;

    fn collect(stage: &dyn Stage, rows: Vec<Record>) -> Vec<Record> {
        stage
            .process(Box::new(rows.into_iter().map(Ok)))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_cat_is_identity() {
        let rows = vec![Record::from([("a", "1")]), Record::from([("b", "2")])];
        assert_eq!(collect(&CatStage, rows.clone()), rows);
    }

    #[test]
    fn test_column_mapping_parse() {
        assert_eq!(
            ColumnMapping::parse("to=from").unwrap(),
            ColumnMapping {
                dst: "to".into(),
                src: "from".into()
            }
        );
        assert!(ColumnMapping::parse("nothing").is_err());
        assert!(ColumnMapping::parse("=x").is_err());
    }

    #[test]
    fn test_extract_renames_and_dedupes() {
        let stage = ExtractStage::parse(&["node=src"]).unwrap();
        assert_eq!(stage.output_fields(&["src".into(), "dst".into()]), vec!["node"]);
        let rows = vec![
            Record::from([("src", "a"), ("dst", "b")]),
            Record::from([("src", "a"), ("dst", "c")]),
            Record::from([("src", "b"), ("dst", "c")]),
        ];
        assert_eq!(
            collect(&stage, rows),
            vec![Record::from([("node", "a")]), Record::from([("node", "b")])]
        );
    }

    #[test]
    fn test_extract_reads_source_columns() {
        let stage = ExtractStage::parse(&["x=missing", "node=src"]).unwrap();
        assert_eq!(stage.input_columns(), vec!["missing", "src"]);
    }

    #[test]
    fn test_assign_appends_new_columns_once() {
        let stage = AssignStage::parse(&["kind=dep", "dst=z", "kind=lib"]).unwrap();
        assert_eq!(
            stage.output_fields(&["src".into(), "dst".into()]),
            vec!["src", "dst", "kind"]
        );
        let out = collect(&stage, vec![Record::from([("src", "a"), ("dst", "b")])]);
        assert_eq!(out, vec![Record::from([("src", "a"), ("dst", "z"), ("kind", "lib")])]);
    }

    #[test]
    fn test_assign_value_may_contain_separator() {
        let stage = AssignStage::parse(&["expr=a=b"]).unwrap();
        let out = collect(&stage, vec![Record::new()]);
        assert_eq!(out[0].get("expr"), "a=b");
        assert!(AssignStage::parse(&["novalue"]).is_err());
    }

    #[test]
    fn test_assign_empty_value_clears_column() {
        let stage = AssignStage::parse(&["dst="]).unwrap();
        let out = collect(&stage, vec![Record::from([("src", "a"), ("dst", "b")])]);
        assert!(!out[0].contains("dst"));
    }

    #[test]
    fn test_match_stage_filters_and_inverts() {
        let matcher = PatternMatcher::new(["^a^"], &PatternConfig::default()).unwrap();
        let rows = vec![
            Record::from([("node", "a")]),
            Record::from([("node", "ab")]),
            Record::from([("node", "x a")]),
        ];
        let kept = collect(&MatchStage::new("node", matcher.clone()), rows.clone());
        assert_eq!(kept.len(), 2);
        let dropped = collect(&MatchStage::new("node", matcher).with_invert(true), rows);
        assert_eq!(dropped, vec![Record::from([("node", "ab")])]);
    }
}
