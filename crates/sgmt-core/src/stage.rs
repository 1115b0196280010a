//! Row-stream stages and their ordered composition.
//!
//! A stage turns a record stream into another record stream. Around its
//! `process` body every stage gets two per-record hooks: `preprocess_input`
//! runs on each record entering the stage, `postprocess_output` on each
//! record leaving it. Graph inversion uses these hooks.
//!
//! # Example
//!
//! ```ignore
//! use sgmt_core::stage::Pipeline;
//! use sgmt_core::columns::CatStage;
//!
//! let pipeline = Pipeline::new().add_stage(Box::new(CatStage));
//! let fields = pipeline.prepare(&input_fields)?;
//! for row in pipeline.run(rows)? {
//!     sink.write(&row?)?;
//! }
//! ```

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::record::{Record, is_provenance_field};

/// Boxed, lazily evaluated stream of records.
///
/// Read failures travel as `Err` items; the end of the stream is `None`.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// One transformation in a row pipeline.
pub trait Stage {
    /// Short name for logging.
    fn stage_name(&self) -> &str;

    /// Input columns this stage reads.
    ///
    /// Each must be a non-empty name, and once all inputs are read it must
    /// occur in at least one of them.
    fn input_columns(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Extra configuration checks run before any record is read.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Field list of the records this stage produces.
    ///
    /// Defaults to the input field list.
    fn output_fields(&self, input_fields: &[String]) -> Vec<String> {
        input_fields.to_vec()
    }

    /// Applied to every record before it reaches `process`.
    fn preprocess_input(&self, record: Record) -> Record {
        record
    }

    /// Applied to every record leaving `process`.
    fn postprocess_output(&self, record: Record) -> Record {
        record
    }

    /// Transform the record stream.
    ///
    /// Materializing stages drain `rows` here and fail on the first read
    /// error; streaming stages return an adapter over `rows`.
    fn process<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>>;
}

/// Run a single stage with its hooks wrapped around `process`.
pub fn run_stage<'a, S>(stage: &'a S, rows: RowStream<'a>) -> Result<RowStream<'a>>
where
    S: Stage + ?Sized,
{
    let entering: RowStream<'a> =
        Box::new(rows.map(move |row| row.map(|record| stage.preprocess_input(record))));
    let leaving = stage.process(entering)?;
    Ok(Box::new(
        leaving.map(move |row| row.map(|record| stage.postprocess_output(record))),
    ))
}

/// An ordered chain of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create an empty pipeline (behaves like `cat`).
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Validate every stage and compute the final output field list.
    pub fn prepare(&self, input_fields: &[String]) -> Result<Vec<String>> {
        let mut fields = input_fields.to_vec();
        for stage in &self.stages {
            check_names(stage.input_columns())?;
            stage.validate()?;
            fields = stage.output_fields(&fields);
            debug!(stage = stage.stage_name(), fields = ?fields, "prepared stage");
        }
        Ok(fields)
    }

    /// Check that every column read by a stage occurs in some input.
    ///
    /// `seen_fields` is the union of the field lists of every input. When
    /// no input declared any field there is nothing to resolve against.
    pub fn resolve(&self, seen_fields: &[String]) -> Result<()> {
        if seen_fields.is_empty() {
            return Ok(());
        }
        let mut fields = seen_fields.to_vec();
        for stage in &self.stages {
            check_resolved(stage.input_columns(), &fields)?;
            fields = stage.output_fields(&fields);
        }
        Ok(())
    }

    /// Chain all stages over `rows`.
    pub fn run<'a>(&'a self, rows: RowStream<'a>) -> Result<RowStream<'a>> {
        let mut rows = rows;
        for stage in &self.stages {
            rows = run_stage(stage.as_ref(), rows)?;
        }
        Ok(rows)
    }

    /// List stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.stage_name()).collect()
    }
}

/// Check that each configured column is a non-empty name.
pub fn check_names<'c, I>(columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'c str>,
{
    match columns.into_iter().find(|column| column.is_empty()) {
        Some(column) => Err(CoreError::malformed(column, "has an empty name")),
        None => Ok(()),
    }
}

/// Check that each column is one of `fields` or a provenance tag.
pub fn check_resolved<'c, I>(columns: I, fields: &[String]) -> Result<()>
where
    I: IntoIterator<Item = &'c str>,
{
    for column in columns {
        if !is_provenance_field(column) && !fields.iter().any(|field| field == column) {
            return Err(CoreError::malformed(
                column,
                format!("is absent from every input (have: {})", fields.join(",")),
            ));
        }
    }
    Ok(())
}
