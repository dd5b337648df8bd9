use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use cubelink::remote::QueryMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "cubelink")]
/// Cubelink command line toolkit for cube.link data cubes
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Infer the observation constraint of a cube
    Infer {
        #[command(flatten)]
        input: GraphInput,
        /// The cube to infer the constraint of
        ///
        /// By default the first cube:Cube of the input is used.
        #[arg(long, value_hint = ValueHint::Url)]
        cube: Option<String>,
        /// The IRI of the constraint
        ///
        /// By default the IRI of the cube followed by "/constraint" is used.
        #[arg(long, value_hint = ValueHint::Url)]
        constraint: Option<String>,
        /// Do not assert cube:KeyDimension or cube:MeasureDimension on the properties
        #[arg(long)]
        no_roles: bool,
        /// Do not enumerate the values of properties with few distinct values
        #[arg(long)]
        no_enumeration: bool,
        /// The maximal number of values enumerated with sh:in
        #[arg(long, default_value_t = cubelink::engine::constraint::DEFAULT_MAX_ENUM_VALUES)]
        max_enum_values: usize,
        #[command(flatten)]
        output: GraphOutput,
    },
    /// Generate observations from a CSV file
    Generate {
        /// The JSON mapping of columns to dimensions, measures and attributes
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        mapping: PathBuf,
        /// The CSV file to read the rows from
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        rows: Option<PathBuf>,
        /// The field delimiter of the CSV file
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        #[command(flatten)]
        output: GraphOutput,
    },
    /// Summarize the observations, properties and constraint of a cube as JSON
    Summarize {
        #[command(flatten)]
        input: GraphInput,
        /// The cube to summarize
        ///
        /// By default the first cube:Cube of the input is used.
        #[arg(long, value_hint = ValueHint::Url)]
        cube: Option<String>,
    },
    /// Fetch a cube from a SPARQL endpoint
    Fetch {
        /// The URL of the SPARQL endpoint
        #[arg(short, long, value_hint = ValueHint::Url)]
        endpoint: String,
        #[command(flatten)]
        query: QueryArgs,
        /// The timeout of the request in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
        #[command(flatten)]
        output: GraphOutput,
    },
    /// Print the SPARQL query that fetches a cube
    Query {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Render a JSON shape definition as a SHACL shape in Turtle
    Shape {
        /// The JSON shape definition
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// The file to write the shape to
        ///
        /// If no file is given, stdout is written.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        to_file: Option<PathBuf>,
    },
}

#[derive(ClapArgs)]
pub struct GraphInput {
    /// The file to read the graph from
    ///
    /// If no file is given, stdin is read.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
    /// The format of the input
    ///
    /// It can be an extension like "nt" or a MIME type like "application/n-triples".
    ///
    /// By default the format is guessed from the input file extension.
    #[arg(long, required_unless_present = "file")]
    pub format: Option<String>,
}

#[derive(ClapArgs)]
pub struct GraphOutput {
    /// The file to write the graph to
    ///
    /// If no file is given, stdout is written.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub to_file: Option<PathBuf>,
    /// The format of the output
    ///
    /// It can be an extension like "nt" or a MIME type like "application/n-triples".
    ///
    /// By default the format is guessed from the output file extension, or Turtle is written to
    /// stdout.
    #[arg(long)]
    pub to_format: Option<String>,
}

#[derive(ClapArgs)]
pub struct QueryArgs {
    /// The cube to fetch
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub cube: String,
    /// The part of the cube to fetch: full-cube, metadata-only, constraint-only or
    /// observations-only
    #[arg(long, default_value = "full-cube")]
    pub mode: QueryMode,
    /// The named graph that holds the cube
    #[arg(long, value_hint = ValueHint::Url)]
    pub graph: Option<String>,
    /// The maximal number of observation triples (observations-only)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// The number of observation triples to skip (observations-only)
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}
