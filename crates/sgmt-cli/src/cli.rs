//! CLI argument definitions for sgmt.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use sgmt_core::graph::{DEFAULT_DST_COLUMN, DEFAULT_NODE_COLUMN, DEFAULT_SRC_COLUMN};
use sgmt_core::pattern::DEFAULT_ANCHOR;
use sgmt_ingest::Dialect;

#[derive(Parser)]
#[command(
    name = "sgmt",
    version,
    about = "Sets and graphs manipulation tool for CSV streams",
    long_about = "Sets and graphs manipulation tool for CSV streams.\n\n\
                  Inputs are concatenated in order and tagged with @fn (input index),\n\
                  @frn (row within the input) and @rn (row overall). Set commands\n\
                  treat every input as one set; graph commands treat rows as edges."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Concatenate inputs to output.
    Cat(CatArgs),

    /// Extract columns with rename, dropping repeated rows.
    Extract(ExtractArgs),

    /// Set column values; new columns are appended.
    Set(SetArgs),

    /// Keep rows whose column matches one of the node patterns.
    Grep(GrepArgs),

    /// Union of the input sets.
    Uni(SetOpArgs),

    /// Intersection of the input sets.
    Int(SetOpArgs),

    /// Subtract later input sets from the first one.
    Sub(SetOpArgs),

    /// Keep rows contained in only one input set.
    Diff(SetOpArgs),

    /// Breadth-first search from the nodes matching the node patterns.
    Bfs(BfsArgs),

    /// Extract the source nodes of the graph.
    Srcs(SrcsArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Cat(_) => "cat",
            Command::Extract(_) => "extract",
            Command::Set(_) => "set",
            Command::Grep(_) => "grep",
            Command::Uni(_) => "uni",
            Command::Int(_) => "int",
            Command::Sub(_) => "sub",
            Command::Diff(_) => "diff",
            Command::Bfs(_) => "bfs",
            Command::Srcs(_) => "srcs",
        }
    }
}

/// Input and output options shared by every command.
#[derive(Debug, Args)]
pub struct IoArgs {
    /// Input file; repeat for several inputs ("-" or none reads stdin).
    #[arg(long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// CSV dialect for input files.
    #[arg(long = "input-dialect", value_enum, default_value = "default")]
    pub input_dialect: DialectArg,

    /// Output file ("-" writes stdout).
    #[arg(long = "output", value_name = "FILE", default_value = "-")]
    pub output: PathBuf,

    /// CSV dialect for the output file.
    #[arg(long = "output-dialect", value_enum, default_value = "default")]
    pub output_dialect: DialectArg,

    /// Fail when an input header differs from the first input's header.
    #[arg(long = "strict-schema")]
    pub strict_schema: bool,
}

/// Edge column options.
#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Edge source column name.
    #[arg(long = "src", value_name = "NAME", default_value = DEFAULT_SRC_COLUMN)]
    pub src: String,

    /// Edge destination column name.
    #[arg(long = "dst", value_name = "NAME", default_value = DEFAULT_DST_COLUMN)]
    pub dst: String,

    /// Operate on the graph with edges inverted.
    #[arg(long = "inverted")]
    pub inverted: bool,
}

/// Where node patterns come from.
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Nodes file; repeat for several files (none reads stdin).
    #[arg(long = "nodes", value_name = "FILE")]
    pub nodes: Vec<PathBuf>,

    /// CSV dialect for nodes files.
    #[arg(long = "nodes-dialect", value_enum, default_value = "default")]
    pub nodes_dialect: DialectArg,

    /// Column name for the node name in nodes files.
    #[arg(long = "node-column", value_name = "NAME", default_value = DEFAULT_NODE_COLUMN)]
    pub node_column: String,

    /// Marker that anchors a node name to a word boundary (e.g. ^lib^).
    #[arg(long = "anchor", value_name = "CHAR", default_value_t = DEFAULT_ANCHOR)]
    pub anchor: char,
}

#[derive(Debug, Args)]
pub struct CatArgs {
    #[command(flatten)]
    pub io: IoArgs,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// DST=SRC column mapping; repeat for several columns.
    #[arg(long = "column", value_name = "DST=SRC")]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// COLUMN=VALUE to set in output; the column is added as needed.
    #[arg(long = "data", value_name = "COLUMN=VALUE")]
    pub data: Vec<String>,
}

#[derive(Debug, Args)]
pub struct GrepArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[command(flatten)]
    pub nodes: NodeArgs,

    /// Column matched against the node patterns.
    #[arg(long = "column", value_name = "NAME", default_value = DEFAULT_NODE_COLUMN)]
    pub column: String,

    /// Keep the rows that do not match.
    #[arg(long = "invert-match")]
    pub invert_match: bool,
}

#[derive(Debug, Args)]
pub struct SetOpArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Comma-separated key column names (default: all input columns).
    #[arg(long = "key", value_name = "COLUMNS", value_delimiter = ',')]
    pub key: Option<Vec<String>>,
}

#[derive(Debug, Args)]
pub struct BfsArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub nodes: NodeArgs,
}

#[derive(Debug, Args)]
pub struct SrcsArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[command(flatten)]
    pub graph: GraphArgs,

    /// Node output column name.
    #[arg(long = "node", value_name = "NAME", default_value = DEFAULT_NODE_COLUMN)]
    pub node: String,
}

/// CSV dialect choices.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DialectArg {
    Default,
    Excel,
    ExcelTab,
    Unix,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Default => Dialect::Default,
            DialectArg::Excel => Dialect::Excel,
            DialectArg::ExcelTab => Dialect::ExcelTab,
            DialectArg::Unix => Dialect::Unix,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
