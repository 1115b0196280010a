//! CSV input and output for the sgmt row engine.
//!
//! - [`dialect`]: the named CSV dialects
//! - [`reader`]: CSV files and standard input as [`sgmt_core::RowSource`]s
//! - [`inputs`]: the input list as one merged stream
//! - [`writer`]: header-first CSV output with a fixed field list
//! - [`nodes`]: node-name lists for pattern matching

pub mod dialect;
pub mod error;
pub mod inputs;
pub mod nodes;
pub mod reader;
pub mod writer;

pub use dialect::Dialect;
pub use error::{IngestError, Result};
pub use inputs::{InputStream, ReadOptions, merge_inputs};
pub use nodes::NodeSource;
pub use reader::CsvSource;
pub use writer::CsvSink;
