//! Graph operations over edge records.
//!
//! An edge is a record whose source column names the origin node and whose
//! destination column names the target node. This module provides:
//!
//! - [`GraphConfig::invert`]: swap the endpoints of an edge
//! - [`Adjacency`]: source node to destination node to edge, in input order
//! - [`Bfs`]: breadth-first edge enumeration from matching seed nodes
//! - [`sources`]: nodes that have outgoing edges but no incoming ones
//!
//! [`BfsStage`] and [`SourcesStage`] expose the traversals as pipeline
//! stages.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::debug;

use crate::error::Result;
use crate::ordered::OrderedMap;
use crate::pattern::PatternMatcher;
use crate::record::Record;
use crate::stage::{RowStream, Stage, check_names};

pub const DEFAULT_SRC_COLUMN: &str = "src";
pub const DEFAULT_DST_COLUMN: &str = "dst";
pub const DEFAULT_NODE_COLUMN: &str = "node";

/// Column names and orientation for graph stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Edge source column.
    pub src: String,
    /// Edge destination column.
    pub dst: String,
    /// Output column for node lists.
    pub node: String,
    /// Operate on the graph with every edge reversed.
    pub inverted: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            src: DEFAULT_SRC_COLUMN.to_string(),
            dst: DEFAULT_DST_COLUMN.to_string(),
            node: DEFAULT_NODE_COLUMN.to_string(),
            inverted: false,
        }
    }
}

impl GraphConfig {
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    pub fn with_dst(mut self, dst: impl Into<String>) -> Self {
        self.dst = dst.into();
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Swap the source and destination values of `edge`.
    ///
    /// Applying it twice restores the original values.
    pub fn invert(&self, mut edge: Record) -> Record {
        let src = edge.get(&self.src).to_string();
        let dst = edge.get(&self.dst).to_string();
        edge.set(self.src.as_str(), dst);
        edge.set(self.dst.as_str(), src);
        edge
    }

    fn edge_columns(&self) -> Vec<&str> {
        vec![self.src.as_str(), self.dst.as_str()]
    }
}

/// Materialized adjacency view of an edge stream.
///
/// For a repeated `(src, dst)` pair the last edge wins, keeping the
/// position of the first.
#[derive(Debug, Default)]
pub struct Adjacency {
    edges: OrderedMap<String, OrderedMap<String, Record>>,
}

impl Adjacency {
    /// Drain `rows` into an adjacency view, stopping at the first error.
    pub fn build<I>(rows: I, config: &GraphConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let mut adjacency = Self::default();
        for row in rows {
            adjacency.insert(row?, config);
        }
        Ok(adjacency)
    }

    pub fn insert(&mut self, edge: Record, config: &GraphConfig) {
        let src = edge.get(&config.src).to_string();
        let dst = edge.get(&config.dst).to_string();
        self.edges.get_or_default(src).insert(dst, edge);
    }

    /// Nodes with at least one outgoing edge, in first-seen order.
    pub fn source_nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|(_, out)| out.len()).sum()
    }

    /// Breadth-first traversal from every source node accepted by `is_seed`.
    pub fn bfs<F>(self, is_seed: F) -> Bfs
    where
        F: Fn(&str) -> bool,
    {
        Bfs::new(self, is_seed)
    }
}

/// Lazy breadth-first edge enumeration over an [`Adjacency`].
///
/// Every node enters the queue at most once. Dequeuing a node emits all of
/// its outgoing edges in adjacency order; each destination not yet visited
/// is queued.
pub struct Bfs {
    edges: OrderedMap<String, OrderedMap<String, Record>>,
    queue: VecDeque<String>,
    visited: HashSet<String>,
    pending: VecDeque<Record>,
}

impl Bfs {
    fn new<F>(adjacency: Adjacency, is_seed: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let seeds: Vec<String> = adjacency
            .source_nodes()
            .filter(|node| is_seed(node))
            .map(str::to_string)
            .collect();
        debug!(seeds = seeds.len(), "bfs seeds selected");
        Self {
            edges: adjacency.edges,
            visited: seeds.iter().cloned().collect(),
            queue: seeds.into(),
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for Bfs {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(edge) = self.pending.pop_front() {
                return Some(edge);
            }
            let node = self.queue.pop_front()?;
            let Some(outgoing) = self.edges.remove(&node) else {
                continue;
            };
            for (dst, edge) in outgoing.into_entries() {
                if self.visited.insert(dst.clone()) {
                    self.queue.push_back(dst);
                }
                self.pending.push_back(edge);
            }
        }
    }
}

/// Nodes that occur as a source but never as a destination, sorted.
///
/// Empty when the source and destination columns are the same.
pub fn sources<I>(rows: I, config: &GraphConfig) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut srcs = BTreeSet::new();
    let mut dsts = HashSet::new();
    let distinct = config.src != config.dst;
    for row in rows {
        let row = row?;
        srcs.insert(row.get(&config.src).to_string());
        if distinct {
            dsts.insert(row.get(&config.dst).to_string());
        }
    }
    if !distinct {
        return Ok(Vec::new());
    }
    Ok(srcs.into_iter().filter(|node| !dsts.contains(node)).collect())
}

/// `bfs`: edges reachable from nodes matching the node patterns.
///
/// When inverted, edges are reversed on the way in and restored on the
/// way out.
pub struct BfsStage {
    config: GraphConfig,
    matcher: PatternMatcher,
}

impl BfsStage {
    pub fn new(config: GraphConfig, matcher: PatternMatcher) -> Self {
        Self { config, matcher }
    }
}

impl Stage for BfsStage {
    fn stage_name(&self) -> &str {
        "bfs"
    }

    fn input_columns(&self) -> Vec<&str> {
        self.config.edge_columns()
    }

    fn preprocess_input(&self, record: Record) -> Record {
        if self.config.inverted {
            self.config.invert(record)
        } else {
            record
        }
    }

    fn postprocess_output(&self, record: Record) -> Record {
        if self.config.inverted {
            self.config.invert(record)
        } else {
            record
        }
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        let adjacency = Adjacency::build(rows, &self.config)?;
        debug!(
            nodes = adjacency.node_count(),
            edges = adjacency.edge_count(),
            "adjacency built"
        );
        let edges = adjacency.bfs(|node| self.matcher.is_match(node));
        Ok(Box::new(edges.map(Ok)))
    }
}

/// `srcs`: one record per pure source node under the node column.
///
/// When inverted, edges are reversed on the way in only.
pub struct SourcesStage {
    config: GraphConfig,
}

impl SourcesStage {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }
}

impl Stage for SourcesStage {
    fn stage_name(&self) -> &str {
        "srcs"
    }

    fn input_columns(&self) -> Vec<&str> {
        self.config.edge_columns()
    }

    fn validate(&self) -> Result<()> {
        check_names([self.config.node.as_str()])
    }

    fn output_fields(&self, _input_fields: &[String]) -> Vec<String> {
        vec![self.config.node.clone()]
    }

    fn preprocess_input(&self, record: Record) -> Record {
        if self.config.inverted {
            self.config.invert(record)
        } else {
            record
        }
    }

    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        let nodes = sources(rows, &self.config)?;
        let node_column = self.config.node.clone();
        Ok(Box::new(nodes.into_iter().map(move |node| {
            let mut record = Record::new();
            record.set(node_column.as_str(), node);
            Ok(record)
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(src: &str, dst: &str) -> Record {
        Record::from([("src", src), ("dst", dst)])
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Result<Record>> {
        pairs.iter().map(|(s, d)| Ok(edge(s, d))).collect()
    }

    fn pairs(records: &[Record]) -> Vec<(String, String)> {
        records
            .iter()
            .map(|r| (r.get("src").to_string(), r.get("dst").to_string()))
            .collect()
    }

    #[test]
    fn test_invert_is_involution() {
        let config = GraphConfig::default();
        let original = Record::from([("src", "a"), ("dst", "b"), ("w", "3")]);
        let inverted = config.invert(original.clone());
        assert_eq!(inverted.get("src"), "b");
        assert_eq!(inverted.get("dst"), "a");
        assert_eq!(config.invert(inverted), original);
    }

    #[test]
    fn test_invert_with_missing_endpoint() {
        let config = GraphConfig::default();
        let inverted = config.invert(Record::from([("src", "a")]));
        assert!(!inverted.contains("src"));
        assert_eq!(inverted.get("dst"), "a");
    }

    #[test]
    fn test_adjacency_last_edge_wins() {
        let config = GraphConfig::default();
        let mut first = edge("a", "b");
        first.set("w", "1");
        let mut second = edge("a", "b");
        second.set("w", "2");
        let adjacency = Adjacency::build(vec![Ok(first), Ok(second)], &config).unwrap();
        assert_eq!(adjacency.edge_count(), 1);
        let out: Vec<Record> = adjacency.bfs(|_| true).collect();
        assert_eq!(out[0].get("w"), "2");
    }

    #[test]
    fn test_bfs_seed_edges_in_input_order() {
        let config = GraphConfig::default();
        let rows = edges(&[
            ("a", "c"),
            ("a", "d"),
            ("a", "e"),
            ("b", "c"),
            ("b", "d"),
            ("b", "f"),
        ]);
        let out: Vec<Record> = Adjacency::build(rows, &config)
            .unwrap()
            .bfs(|node| node == "a")
            .collect();
        assert_eq!(
            pairs(&out),
            vec![
                ("a".to_string(), "c".to_string()),
                ("a".to_string(), "d".to_string()),
                ("a".to_string(), "e".to_string()),
            ]
        );
    }

    #[test]
    fn test_bfs_follows_reachable_edges_only() {
        let config = GraphConfig::default();
        let rows = edges(&[
            ("a", "c"),
            ("b", "c"),
            ("c", "d"),
            ("c", "e"),
            ("a", "f"),
            ("b", "g"),
        ]);
        let out: Vec<Record> = Adjacency::build(rows, &config)
            .unwrap()
            .bfs(|node| node == "a")
            .collect();
        let got: BTreeSet<(String, String)> = pairs(&out).into_iter().collect();
        let want: BTreeSet<(String, String)> = [("a", "c"), ("a", "f"), ("c", "d"), ("c", "e")]
            .iter()
            .map(|(s, d)| (s.to_string(), d.to_string()))
            .collect();
        assert_eq!(got, want);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_bfs_handles_cycles() {
        let config = GraphConfig::default();
        let rows = edges(&[("a", "b"), ("b", "a"), ("b", "c")]);
        let out: Vec<Record> = Adjacency::build(rows, &config)
            .unwrap()
            .bfs(|node| node == "a")
            .collect();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_bfs_without_matching_seed_is_empty() {
        let config = GraphConfig::default();
        let rows = edges(&[("a", "b")]);
        let mut bfs = Adjacency::build(rows, &config).unwrap().bfs(|_| false);
        assert!(bfs.next().is_none());
    }

    #[test]
    fn test_sources() {
        let config = GraphConfig::default();
        assert_eq!(
            sources(edges(&[("a", "b"), ("b", "c")]), &config).unwrap(),
            vec!["a"]
        );
        assert!(sources(edges(&[("a", "b"), ("b", "a")]), &config)
            .unwrap()
            .is_empty());
        assert_eq!(
            sources(edges(&[("z", "x"), ("m", "x")]), &config).unwrap(),
            vec!["m", "z"]
        );
    }

    #[test]
    fn test_sources_same_column_is_empty() {
        let config = GraphConfig::default().with_dst("src");
        assert!(sources(edges(&[("a", "b")]), &config).unwrap().is_empty());
    }
}
