use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, warn};

use sgmt_core::pattern::{PatternConfig, PatternMatcher};
use sgmt_core::{
    AssignStage, BfsStage, CatStage, ExtractStage, GraphConfig, MatchStage, Pipeline, SetConfig,
    SetOp, SetStage, SourcesStage, Stage,
};
use sgmt_ingest::inputs::input_paths;
use sgmt_ingest::reader::is_stdio;
use sgmt_ingest::{CsvSink, NodeSource, ReadOptions, merge_inputs};

use crate::cli::{Command, GraphArgs, IoArgs, NodeArgs, SetOpArgs};

/// What a finished command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub command: &'static str,
    pub inputs_opened: usize,
    pub output_fields: Vec<String>,
    pub rows_written: usize,
}

pub fn run(command: &Command) -> Result<RunSummary> {
    let name = command.name();
    match command {
        Command::Cat(args) => run_filter(name, &args.io, |_| Ok(Box::new(CatStage))),
        Command::Extract(args) => {
            let stage = ExtractStage::parse(&args.columns).context("parse --column")?;
            run_filter(name, &args.io, |_| Ok(Box::new(stage)))
        }
        Command::Set(args) => {
            let stage = AssignStage::parse(&args.data).context("parse --data")?;
            run_filter(name, &args.io, |_| Ok(Box::new(stage)))
        }
        Command::Grep(args) => {
            let matcher = load_matcher(&args.nodes, &args.io)?;
            let stage = MatchStage::new(args.column.clone(), matcher).with_invert(args.invert_match);
            run_filter(name, &args.io, |_| Ok(Box::new(stage)))
        }
        Command::Uni(args) => run_set(name, SetOp::Union, args),
        Command::Int(args) => run_set(name, SetOp::Intersection, args),
        Command::Sub(args) => run_set(name, SetOp::Subtraction, args),
        Command::Diff(args) => run_set(name, SetOp::Diff, args),
        Command::Bfs(args) => {
            let matcher = load_matcher(&args.nodes, &args.io)?;
            let stage = BfsStage::new(graph_config(&args.graph), matcher);
            run_filter(name, &args.io, |_| Ok(Box::new(stage)))
        }
        Command::Srcs(args) => {
            let config = graph_config(&args.graph).with_node(args.node.clone());
            run_filter(name, &args.io, |_| Ok(Box::new(SourcesStage::new(config))))
        }
    }
}

fn run_set(name: &'static str, op: SetOp, args: &SetOpArgs) -> Result<RunSummary> {
    let config = SetConfig {
        key: args.key.clone(),
    };
    run_filter(name, &args.io, |input_fields| {
        let stage = SetStage::new(op, config, input_fields).context("resolve --key")?;
        Ok(Box::new(stage))
    })
}

fn graph_config(args: &GraphArgs) -> GraphConfig {
    GraphConfig::default()
        .with_src(args.src.clone())
        .with_dst(args.dst.clone())
        .with_inverted(args.inverted)
}

/// Read every node file and compile the node names into one matcher.
fn load_matcher(args: &NodeArgs, io: &IoArgs) -> Result<PatternMatcher> {
    let source = NodeSource {
        paths: args.nodes.clone(),
        dialect: args.nodes_dialect.into(),
        column: args.node_column.clone(),
    };
    if source.reads_stdin() && reads_stdin(&io.inputs) {
        warn!("nodes and input rows both read standard input; the input will be empty");
    }
    let nodes = source.load().context("load nodes")?;
    let config = PatternConfig::default().with_anchor(args.anchor);
    let matcher = PatternMatcher::new(&nodes, &config).context("compile node patterns")?;
    debug!(patterns = matcher.len(), "node patterns ready");
    if matcher.is_empty() {
        warn!("no node names loaded; nothing will match");
    }
    Ok(matcher)
}

fn reads_stdin(paths: &[PathBuf]) -> bool {
    input_paths(paths).iter().any(|path| is_stdio(path))
}

/// Merge the inputs, run one stage over them and write the result.
///
/// `build` receives the merged input field list (the first input's header).
fn run_filter<F>(name: &'static str, io: &IoArgs, build: F) -> Result<RunSummary>
where
    F: FnOnce(&[String]) -> Result<Box<dyn Stage>>,
{
    let span = info_span!("run", command = name);
    let _guard = span.enter();

    let options = ReadOptions::default()
        .with_dialect(io.input_dialect.into())
        .with_strict_schema(io.strict_schema);
    let mut stream = merge_inputs(&io.inputs, &options);
    let input_fields = stream.field_names().context("read input header")?;

    let pipeline = Pipeline::new().add_stage(build(&input_fields)?);
    let output_fields = pipeline
        .prepare(&input_fields)
        .with_context(|| format!("configure {name}"))?;
    debug!(stages = ?pipeline.stage_names(), fields = ?output_fields, "pipeline ready");

    let mut sink = CsvSink::create(&io.output, io.output_dialect.into(), output_fields.clone())
        .with_context(|| format!("open output {}", io.output.display()))?;
    let rows = pipeline
        .run(Box::new(stream.by_ref()))
        .with_context(|| format!("run {name}"))?;
    sink.write_all(rows).with_context(|| format!("run {name}"))?;
    pipeline
        .resolve(stream.seen_fields())
        .with_context(|| format!("resolve {name} columns"))?;
    let rows_written = sink.finish().context("flush output")?;

    let summary = RunSummary {
        command: name,
        inputs_opened: stream.sources_opened(),
        output_fields,
        rows_written,
    };
    info!(
        inputs = summary.inputs_opened,
        rows = summary.rows_written,
        "{name} finished"
    );
    Ok(summary)
}
