//! Multi-set algebra over grouped record streams.
//!
//! Records are compared by key: the tuple of their values in the key
//! columns (absent fields count as `""`). A group is a maximal run of
//! consecutive records carrying the same `@fn` tag, so every merged input
//! normally forms one group.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::ordered::OrderedMap;
use crate::record::{FILE_INDEX, Record};
use crate::stage::{RowStream, Stage, check_names};

/// The four set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// First occurrence of every key, in input order.
    Union,
    /// Keys present in every group.
    Intersection,
    /// Keys of the first group not present in any later group.
    Subtraction,
    /// Keys present in exactly one group.
    Diff,
}

impl SetOp {
    pub fn name(self) -> &'static str {
        match self {
            SetOp::Union => "uni",
            SetOp::Intersection => "int",
            SetOp::Subtraction => "sub",
            SetOp::Diff => "diff",
        }
    }
}

/// Key column selection. `None` keys on the full input field list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetConfig {
    pub key: Option<Vec<String>>,
}

impl SetConfig {
    pub fn with_key(mut self, key: Vec<String>) -> Self {
        self.key = Some(key);
        self
    }
}

type Key = Vec<String>;

/// Pipeline stage applying one [`SetOp`].
#[derive(Debug, Clone)]
pub struct SetStage {
    op: SetOp,
    key: Key,
}

impl SetStage {
    /// Resolve the key columns; without explicit keys every input field is
    /// part of the key.
    pub fn new(op: SetOp, config: SetConfig, input_fields: &[String]) -> Result<Self> {
        let key = match config.key {
            Some(columns) => {
                check_names(columns.iter().map(String::as_str))?;
                columns
            }
            None => input_fields.to_vec(),
        };
        debug!(op = op.name(), key = ?key, "set stage configured");
        Ok(Self { op, key })
    }

    fn key_of(&self, record: &Record) -> Key {
        record.project(&self.key)
    }

    fn intersection(&self, rows: RowStream<'_>) -> Result<Vec<Record>> {
        let mut working: OrderedMap<Key, Record> = OrderedMap::new();
        let mut next: OrderedMap<Key, Record> = OrderedMap::new();
        let mut current = 0;
        for row in Grouped::new(rows) {
            let (group, record) = row?;
            let key = self.key_of(&record);
            if group == 0 {
                working.insert(key, record);
                continue;
            }
            if group != current {
                if current > 0 {
                    working = std::mem::take(&mut next);
                }
                current = group;
            }
            if let Some(kept) = working.remove(&key) {
                next.insert(key, kept);
            }
        }
        if current > 0 {
            working = next;
        }
        Ok(working.into_values().collect())
    }

    fn subtraction(&self, rows: RowStream<'_>) -> Result<Vec<Record>> {
        let mut working: OrderedMap<Key, Record> = OrderedMap::new();
        for row in Grouped::new(rows) {
            let (group, record) = row?;
            let key = self.key_of(&record);
            if group == 0 {
                working.insert(key, record);
            } else {
                working.remove(&key);
            }
        }
        Ok(working.into_values().collect())
    }

    fn diff(&self, rows: RowStream<'_>) -> Result<Vec<Record>> {
        let mut unique: OrderedMap<Key, (usize, Record)> = OrderedMap::new();
        let mut excluded: HashSet<Key> = HashSet::new();
        for row in Grouped::new(rows) {
            let (group, record) = row?;
            let key = self.key_of(&record);
            if excluded.contains(&key) {
                continue;
            }
            let seen_in = unique.get(&key).map(|(seen_in, _)| *seen_in);
            match seen_in {
                Some(seen_in) if seen_in != group => {
                    unique.remove(&key);
                    excluded.insert(key);
                }
                Some(_) => {}
                None => {
                    unique.insert(key, (group, record));
                }
            }
        }
        Ok(unique.into_values().map(|(_, record)| record).collect())
    }
}

impl Stage for SetStage {
    fn stage_name(&self) -> &str {
        self.op.name()
    }

    fn input_columns(&self) -> Vec<&str> {
        self.key.iter().map(String::as_str).collect()
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        let materialized = match self.op {
            SetOp::Union => {
                let mut known: HashSet<Key> = HashSet::new();
                return Ok(Box::new(rows.filter(move |row| match row {
                    Ok(record) => known.insert(self.key_of(record)),
                    Err(_) => true,
                })));
            }
            SetOp::Intersection => self.intersection(rows)?,
            SetOp::Subtraction => self.subtraction(rows)?,
            SetOp::Diff => self.diff(rows)?,
        };
        debug!(op = self.op.name(), rows = materialized.len(), "set result ready");
        Ok(Box::new(materialized.into_iter().map(Ok)))
    }
}

/// Numbers the groups of a stream: 0 for the first run of equal `@fn`
/// values, 1 for the next run, and so on.
struct Grouped<I> {
    rows: I,
    label: Option<String>,
    ordinal: usize,
}

impl<I> Grouped<I> {
    fn new(rows: I) -> Self {
        Self {
            rows,
            label: None,
            ordinal: 0,
        }
    }
}

impl<I> Iterator for Grouped<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<(usize, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.rows.next()? {
            Ok(record) => record,
            Err(error) => return Some(Err(error)),
        };
        let label = record.get(FILE_INDEX);
        match self.label.as_deref() {
            Some(current) if current == label => {}
            Some(_) => {
                self.ordinal += 1;
                self.label = Some(label.to_string());
            }
            None => self.label = Some(label.to_string()),
        }
        Some(Ok((self.ordinal, record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn row(group: usize, k: &str) -> Record {
        Record::from([("@fn", group.to_string()), ("k", k.to_string())])
    }

    fn run(op: SetOp, rows: Vec<Record>) -> Vec<String> {
        let fields = vec!["k".to_string()];
        let stage = SetStage::new(op, SetConfig::default(), &fields).unwrap();
        stage
            .process(Box::new(rows.into_iter().map(Ok)))
            .unwrap()
            .map(|r| r.unwrap().get("k").to_string())
            .collect()
    }

    fn two_sets() -> Vec<Record> {
        vec![row(0, "1"), row(0, "2"), row(1, "2"), row(1, "3")]
    }

    #[test]
    fn test_union() {
        assert_eq!(run(SetOp::Union, two_sets()), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_intersection() {
        assert_eq!(run(SetOp::Intersection, two_sets()), vec!["2"]);
    }

    #[test]
    fn test_subtraction() {
        assert_eq!(run(SetOp::Subtraction, two_sets()), vec!["1"]);
    }

    #[test]
    fn test_diff() {
        assert_eq!(run(SetOp::Diff, two_sets()), vec!["1", "3"]);
    }

    #[test]
    fn test_empty_input() {
        for op in [SetOp::Union, SetOp::Intersection, SetOp::Subtraction, SetOp::Diff] {
            assert!(run(op, Vec::new()).is_empty(), "{}", op.name());
        }
    }

    #[test]
    fn test_single_group_intersection_is_first_group() {
        let rows = vec![row(0, "b"), row(0, "a"), row(0, "b")];
        assert_eq!(run(SetOp::Intersection, rows), vec!["b", "a"]);
    }

    #[test]
    fn test_intersection_orders_by_later_group() {
        let rows = vec![
            row(0, "a"),
            row(0, "b"),
            row(0, "c"),
            row(1, "c"),
            row(1, "a"),
            row(1, "x"),
            row(2, "a"),
            row(2, "c"),
        ];
        assert_eq!(run(SetOp::Intersection, rows), vec!["a", "c"]);
    }

    #[test]
    fn test_intersection_keeps_first_group_value() {
        let fields = vec!["k".to_string(), "v".to_string()];
        let config = SetConfig::default().with_key(vec!["k".to_string()]);
        let stage = SetStage::new(SetOp::Intersection, config, &fields).unwrap();
        let rows = vec![
            Record::from([("@fn", "0"), ("k", "1"), ("v", "first")]),
            Record::from([("@fn", "0"), ("k", "1"), ("v", "second")]),
            Record::from([("@fn", "1"), ("k", "1"), ("v", "other")]),
        ];
        let out: Vec<Record> = stage
            .process(Box::new(rows.into_iter().map(Ok)))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("v"), "second");
    }

    #[test]
    fn test_diff_exclusion_is_permanent() {
        let rows = vec![row(0, "a"), row(1, "a"), row(2, "a"), row(2, "b")];
        assert_eq!(run(SetOp::Diff, rows), vec!["b"]);
    }

    #[test]
    fn test_diff_same_group_duplicate_survives() {
        let rows = vec![row(0, "a"), row(0, "a"), row(1, "b")];
        assert_eq!(run(SetOp::Diff, rows), vec!["a", "b"]);
    }

    #[test]
    fn test_groups_follow_runs_of_origin() {
        let rows = vec![row(0, "a"), row(2, "a"), row(2, "b"), row(3, "c")];
        assert_eq!(run(SetOp::Subtraction, rows), Vec::<String>::new());
    }

    #[test]
    fn test_empty_key_column_is_rejected() {
        let fields = vec!["k".to_string()];
        let config = SetConfig::default().with_key(vec!["k".to_string(), String::new()]);
        assert!(matches!(
            SetStage::new(SetOp::Union, config, &fields),
            Err(CoreError::MalformedKeySpec { .. })
        ));
    }

    #[test]
    fn test_key_may_come_from_a_later_input() {
        let fields = vec!["k".to_string()];
        let config = SetConfig::default().with_key(vec!["id".to_string()]);
        let stage = SetStage::new(SetOp::Union, config, &fields).unwrap();
        assert_eq!(stage.input_columns(), vec!["id"]);
        let rows = vec![
            Record::from([("@fn", "0"), ("k", "1")]),
            Record::from([("@fn", "1"), ("k", "2"), ("id", "x")]),
            Record::from([("@fn", "1"), ("k", "3"), ("id", "x")]),
        ];
        let out: Vec<Record> = stage
            .process(Box::new(rows.into_iter().map(Ok)))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let keys: Vec<&str> = out.iter().map(|r| r.get("k")).collect();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[test]
    fn test_provenance_key_is_accepted() {
        let fields = vec!["k".to_string()];
        let config = SetConfig::default().with_key(vec!["@fn".to_string()]);
        let stage = SetStage::new(SetOp::Union, config, &fields).unwrap();
        let out: Vec<Record> = stage
            .process(Box::new(two_sets().into_iter().map(Ok)))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out, vec![row(0, "1"), row(1, "2")]);
    }
}
