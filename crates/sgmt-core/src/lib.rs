//! Row-stream engine for set and graph manipulation of tabular data.
//!
//! Input sources are merged into one provenance-tagged record stream
//! ([`merge::StreamMerger`]), transformed by a chain of [`stage::Stage`]s
//! and handed to a sink by the caller.

pub mod columns;
pub mod error;
pub mod graph;
pub mod merge;
pub mod ordered;
pub mod pattern;
pub mod record;
pub mod replay;
pub mod sets;
pub mod stage;

pub use columns::{AssignStage, CatStage, ColumnMapping, ExtractStage, MatchStage};
pub use error::{CoreError, Result};
pub use graph::{Adjacency, BfsStage, GraphConfig, SourcesStage};
pub use merge::{RowSource, StreamMerger, VecSource};
pub use pattern::{PatternConfig, PatternMatcher};
pub use record::Record;
pub use sets::{SetConfig, SetOp, SetStage};
pub use stage::{Pipeline, RowStream, Stage};
