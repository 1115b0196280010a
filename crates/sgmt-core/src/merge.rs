//! Concatenation of several row sources into one provenance-tagged stream.
//!
//! Sources are consumed strictly in order, each one completely before the
//! next is opened. Every record leaving the merger carries:
//!
//! - `@fn`: 0-based index of its source
//! - `@frn`: row index within that source
//! - `@rn`: row index across the merged output
//!
//! The merged field list is the field list of the first source that
//! declares any fields. Asking for it opens sources early: leading sources
//! without fields are parked, the first one with fields stays in a
//! lookahead slot, and all of them are replayed in order when iteration
//! starts, so nothing is read twice.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::record::{FILE_INDEX, FILE_ROW_INDEX, Record, ROW_INDEX};
use crate::replay::Replayable;

/// A producer of records with a field list known before the first record.
pub trait RowSource: Iterator<Item = Result<Record>> {
    /// Field names declared by this source (for CSV: its header line).
    fn field_names(&self) -> &[String];

    /// Human-readable label for log messages.
    fn label(&self) -> &str {
        "<rows>"
    }
}

/// In-memory [`RowSource`], mostly useful for tests and fixed row sets.
#[derive(Debug, Clone)]
pub struct VecSource {
    fields: Vec<String>,
    rows: std::vec::IntoIter<Record>,
}

impl VecSource {
    pub fn new(fields: Vec<String>, rows: Vec<Record>) -> Self {
        Self {
            fields,
            rows: rows.into_iter(),
        }
    }

    /// Build a source whose field list is the union of the rows' field names.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let mut fields: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.names() {
                if !fields.iter().any(|field| field == name) {
                    fields.push(name.to_string());
                }
            }
        }
        Self::new(fields, rows)
    }
}

impl Iterator for VecSource {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }
}

impl RowSource for VecSource {
    fn field_names(&self) -> &[String] {
        &self.fields
    }
}

/// Merges lazily-opened sources into a single tagged record stream.
///
/// `I` yields opened sources in order; an `Err` item means a source could
/// not be opened and is passed through as a stream error.
pub struct StreamMerger<I, S>
where
    I: Iterator<Item = Result<S>>,
    S: RowSource,
{
    sources: Replayable<I>,
    parked: VecDeque<S>,
    current: Option<S>,
    next_origin: usize,
    file_row: u64,
    global_row: u64,
    first_fields: Option<Vec<String>>,
    seen_fields: Vec<String>,
    strict_schema: bool,
}

impl<I, S> StreamMerger<I, S>
where
    I: Iterator<Item = Result<S>>,
    S: RowSource,
{
    pub fn new(sources: I) -> Self {
        Self {
            sources: Replayable::new(sources),
            parked: VecDeque::new(),
            current: None,
            next_origin: 0,
            file_row: 0,
            global_row: 0,
            first_fields: None,
            seen_fields: Vec::new(),
            strict_schema: false,
        }
    }

    /// Reject sources whose field set differs from the first source.
    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    /// Field list of the merged stream.
    ///
    /// This is the field list of the first source declaring any fields.
    /// Empty when no source does.
    pub fn field_names(&mut self) -> Result<Vec<String>> {
        if let Some(fields) = &self.first_fields {
            return Ok(fields.clone());
        }
        while let Some(Ok(source)) = self
            .sources
            .next_if(|source| matches!(source, Ok(source) if source.field_names().is_empty()))
        {
            debug!(source = source.label(), "input declares no fields");
            self.parked.push_back(source);
        }
        match self.sources.peek() {
            None => Ok(Vec::new()),
            Some(Ok(source)) => {
                let fields = source.field_names().to_vec();
                self.first_fields = Some(fields.clone());
                Ok(fields)
            }
            Some(Err(_)) => match self.sources.next() {
                Some(Err(error)) => Err(error),
                _ => Ok(Vec::new()),
            },
        }
    }

    /// Number of sources opened so far.
    pub fn sources_opened(&self) -> usize {
        self.next_origin
    }

    /// Union of the field lists of the sources opened so far, in first-seen
    /// order.
    pub fn seen_fields(&self) -> &[String] {
        &self.seen_fields
    }

    fn open_next(&mut self) -> Option<Result<()>> {
        let source = match self.parked.pop_front() {
            Some(source) => source,
            None => match self.sources.next()? {
                Ok(source) => source,
                Err(error) => return Some(Err(error)),
            },
        };
        let origin = self.next_origin;
        self.next_origin += 1;
        self.file_row = 0;
        debug!(origin, source = source.label(), "opened input");

        let fields = source.field_names();
        for name in fields {
            if !self.seen_fields.contains(name) {
                self.seen_fields.push(name.clone());
            }
        }
        if !fields.is_empty() {
            match &self.first_fields {
                None => self.first_fields = Some(fields.to_vec()),
                Some(expected) if self.strict_schema && !same_field_set(expected, fields) => {
                    return Some(Err(CoreError::AmbiguousSchema {
                        origin,
                        expected: expected.join(","),
                        found: fields.join(","),
                    }));
                }
                Some(_) => {}
            }
        }
        self.current = Some(source);
        Some(Ok(()))
    }
}

impl<I, S> Iterator for StreamMerger<I, S>
where
    I: Iterator<Item = Result<S>>,
    S: RowSource,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(source) = self.current.as_mut() {
                match source.next() {
                    Some(Ok(mut record)) => {
                        // `next_origin` was bumped when this source opened.
                        let origin = self.next_origin - 1;
                        record.set(FILE_INDEX, origin.to_string());
                        record.set(FILE_ROW_INDEX, self.file_row.to_string());
                        record.set(ROW_INDEX, self.global_row.to_string());
                        self.file_row += 1;
                        self.global_row += 1;
                        return Some(Ok(record));
                    }
                    Some(Err(error)) => return Some(Err(error)),
                    None => self.current = None,
                }
            }
            if let Err(error) = self.open_next()? {
                return Some(Err(error));
            }
        }
    }
}

fn same_field_set(left: &[String], right: &[String]) -> bool {
    left.iter().all(|name| right.contains(name)) && right.iter().all(|name| left.contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(prefix: &str, count: usize) -> VecSource {
        let records = (0..count)
            .map(|i| Record::from([("v", format!("{prefix}{i}"))]))
            .collect();
        VecSource::new(vec!["v".to_string()], records)
    }

    fn merged(sizes: &[usize]) -> Vec<Record> {
        let sources: Vec<Result<VecSource>> = sizes
            .iter()
            .enumerate()
            .map(|(idx, &n)| Ok(rows(&format!("s{idx}-"), n)))
            .collect();
        StreamMerger::new(sources.into_iter())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_output_length_is_sum_of_inputs() {
        assert_eq!(merged(&[3, 0, 2, 4]).len(), 9);
    }

    #[test]
    fn test_provenance_tags() {
        let out = merged(&[2, 0, 3]);
        let tags: Vec<(&str, &str, &str)> = out
            .iter()
            .map(|r| (r.get("@fn"), r.get("@frn"), r.get("@rn")))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("0", "0", "0"),
                ("0", "1", "1"),
                ("2", "0", "2"),
                ("2", "1", "3"),
                ("2", "2", "4"),
            ]
        );
        assert_eq!(out[2].get("v"), "s2-0");
    }

    #[test]
    fn test_field_names_replay_first_source() {
        let sources = vec![Ok(rows("a", 2)), Ok(rows("b", 1))];
        let mut merger = StreamMerger::new(sources.into_iter());
        assert_eq!(merger.field_names().unwrap(), vec!["v"]);
        assert_eq!(merger.sources_opened(), 0);
        let out: Vec<Record> = merger.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].get("v"), "a0");
        assert_eq!(merger.sources_opened(), 2);
    }

    #[test]
    fn test_no_sources() {
        let mut merger = StreamMerger::new(std::iter::empty::<Result<VecSource>>());
        assert!(merger.field_names().unwrap().is_empty());
        assert!(merger.next().is_none());
    }

    #[test]
    fn test_open_error_is_passed_through() {
        let sources = vec![
            Ok(rows("a", 1)),
            Err(CoreError::InvalidArgument("cannot open".into())),
        ];
        let out: Vec<Result<Record>> = StreamMerger::new(sources.into_iter()).collect();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_field_names_skip_sources_without_fields() {
        let empty = || VecSource::new(Vec::new(), Vec::new());
        let sources = vec![Ok(empty()), Ok(empty()), Ok(rows("b", 2))];
        let mut merger = StreamMerger::new(sources.into_iter()).with_strict_schema(true);
        assert_eq!(merger.field_names().unwrap(), vec!["v"]);
        assert_eq!(merger.sources_opened(), 0);
        let out: Vec<Record> = merger.by_ref().collect::<Result<_>>().unwrap();
        let tags: Vec<(&str, &str)> = out.iter().map(|r| (r.get("v"), r.get("@fn"))).collect();
        assert_eq!(tags, vec![("b0", "2"), ("b1", "2")]);
        assert_eq!(merger.sources_opened(), 3);
    }

    #[test]
    fn test_seen_fields_cover_every_opened_source() {
        let other = VecSource::new(
            vec!["w".to_string(), "v".to_string()],
            vec![Record::from([("w", "1")])],
        );
        let sources: Vec<Result<VecSource>> = vec![Ok(rows("a", 1)), Ok(other)];
        let mut merger = StreamMerger::new(sources.into_iter());
        merger.by_ref().for_each(drop);
        assert_eq!(merger.seen_fields(), ["v", "w"]);
    }

    #[test]
    fn test_strict_schema_rejects_conflicting_fields() {
        let other = VecSource::new(
            vec!["w".to_string()],
            vec![Record::from([("w", "1")])],
        );
        let sources: Vec<Result<VecSource>> = vec![Ok(rows("a", 1)), Ok(other)];
        let out: Vec<Result<Record>> = StreamMerger::new(sources.into_iter())
            .with_strict_schema(true)
            .collect();
        assert!(matches!(
            out.last(),
            Some(Err(CoreError::AmbiguousSchema { origin: 1, .. }))
        ));
    }

    #[test]
    fn test_lenient_schema_accepts_conflicting_fields() {
        let other = VecSource::new(
            vec!["w".to_string()],
            vec![Record::from([("w", "1")])],
        );
        let sources: Vec<Result<VecSource>> = vec![Ok(rows("a", 1)), Ok(other)];
        let out: Vec<Record> = StreamMerger::new(sources.into_iter())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out[1].get("w"), "1");
    }
}
