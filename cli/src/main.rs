use crate::cli::{Args, Command, GraphInput, GraphOutput, QueryArgs};
use anyhow::{bail, Context};
use clap::Parser;
use cubelink::engine::generator::{
    CellValue, GeneratedObservations, GeneratorConfig, ObservationGenerator, Row,
    TracingProgressSink,
};
use cubelink::engine::registry::{OperationOutcome, OperationRegistry, OperationRequest};
use cubelink::engine::shapes::{serialize_shape, ShapeDefinition};
use cubelink::engine::InferenceOptions;
use cubelink::model::io::{parse_graph, serialize_graph, RdfFormat};
use cubelink::model::{CubeGraph, NamedNode};
use cubelink::remote::{CubeQuery, FetchOptions, HttpEndpoint, RemoteCubeFetcher};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, stdin, stdout, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;

/// The log filter used if `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "cubelink=info";

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Infer {
            input,
            cube,
            constraint,
            no_roles,
            no_enumeration,
            max_enum_values,
            output,
        } => {
            let request = OperationRequest {
                cube: cube.as_deref().map(|cube| named_node(cube, "cube")).transpose()?,
                inference: InferenceOptions {
                    constraint: constraint
                        .as_deref()
                        .map(|constraint| named_node(constraint, "constraint"))
                        .transpose()?,
                    infer_dimension_roles: !no_roles,
                    include_value_enumeration: !no_enumeration,
                    max_enum_values,
                },
                ..OperationRequest::new(read_graph(&input)?)
            };
            let outcome = OperationRegistry::standard(None).execute("infer-constraint", &request)?;
            let Some(graph) = outcome.graph() else {
                bail!("The inference did not produce a constraint graph")
            };
            write_graph(graph, &output)
        }
        Command::Generate {
            mapping,
            rows,
            delimiter,
            output,
        } => {
            let config: GeneratorConfig = serde_json::from_reader(BufReader::new(
                File::open(&mapping)
                    .with_context(|| format!("Failed to open {}", mapping.display()))?,
            ))
            .with_context(|| format!("Invalid mapping file {}", mapping.display()))?;
            let generator = ObservationGenerator::new(config)?;
            let Ok(delimiter) = u8::try_from(delimiter) else {
                bail!("The delimiter '{delimiter}' is not an ASCII character")
            };
            let generated = match rows {
                Some(rows) => generate(
                    &generator,
                    File::open(&rows)
                        .with_context(|| format!("Failed to open {}", rows.display()))?,
                    delimiter,
                )?,
                None => generate(&generator, stdin().lock(), delimiter)?,
            };
            write_graph(&generated.graph, &output)
        }
        Command::Summarize { input, cube } => {
            let request = OperationRequest {
                cube: cube.as_deref().map(|cube| named_node(cube, "cube")).transpose()?,
                ..OperationRequest::new(read_graph(&input)?)
            };
            let OperationOutcome::Summary(summary) =
                OperationRegistry::standard(None).execute("summarize-cube", &request)?
            else {
                bail!("The summary operation did not produce a summary")
            };
            let mut stdout = stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &summary)?;
            writeln!(stdout)?;
            Ok(stdout.flush()?)
        }
        Command::Fetch {
            endpoint,
            query,
            timeout,
            output,
        } => {
            let (cube, options) = query_options(&query)?;
            let endpoint = HttpEndpoint::with_timeout(&endpoint, Duration::from_secs(timeout))
                .with_context(|| format!("Failed to create an HTTP client for {endpoint}"))?;
            let fetched = RemoteCubeFetcher::new(endpoint).fetch(query.mode, &cube, &options)?;
            write_graph(&fetched.graph, &output)
        }
        Command::Query { query } => {
            let (cube, options) = query_options(&query)?;
            let mut stdout = stdout().lock();
            write!(stdout, "{}", CubeQuery::build(query.mode, &cube, &options))?;
            Ok(stdout.flush()?)
        }
        Command::Shape { file, to_file } => {
            let shape: ShapeDefinition = match &file {
                Some(file) => serde_json::from_reader(BufReader::new(
                    File::open(file)
                        .with_context(|| format!("Failed to open {}", file.display()))?,
                )),
                None => serde_json::from_reader(stdin().lock()),
            }
            .context("Invalid shape definition")?;
            let turtle = serialize_shape(&shape)?;
            match to_file {
                Some(to_file) => {
                    let mut writer = BufWriter::new(File::create(to_file)?);
                    writer.write_all(turtle.as_bytes())?;
                    close_file_writer(writer)?;
                }
                None => {
                    let mut stdout = stdout().lock();
                    stdout.write_all(turtle.as_bytes())?;
                    stdout.flush()?;
                }
            }
            Ok(())
        }
    }
}

fn named_node(iri: &str, argument: &str) -> anyhow::Result<NamedNode> {
    NamedNode::new(iri).with_context(|| format!("The {argument} IRI '{iri}' is invalid"))
}

fn query_options(query: &QueryArgs) -> anyhow::Result<(NamedNode, FetchOptions)> {
    let options = FetchOptions {
        named_graph: query
            .graph
            .as_deref()
            .map(|graph| named_node(graph, "graph"))
            .transpose()?,
        limit: query.limit,
        offset: query.offset,
    };
    Ok((named_node(&query.cube, "cube")?, options))
}

/// Reads CSV rows and turns them into observations. All cells are read as text.
fn generate(
    generator: &ObservationGenerator,
    reader: impl Read,
    delimiter: u8,
) -> anyhow::Result<GeneratedObservations> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    let headers = reader.headers().context("Failed to read the CSV header")?.clone();
    let rows = reader.records().map(|record| {
        record.map(|record| {
            headers
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column, Some(CellValue::from(value))))
                .collect::<Row>()
        })
    });
    Ok(generator.generate(rows, &mut TracingProgressSink)?)
}

fn read_graph(input: &GraphInput) -> anyhow::Result<CubeGraph> {
    let format = if let Some(format) = &input.format {
        rdf_format_from_name(format)?
    } else if let Some(file) = &input.file {
        rdf_format_from_path(file)?
    } else {
        bail!("The --format option must be set when reading from stdin")
    };
    let graph = match &input.file {
        Some(file) => parse_graph(
            format,
            BufReader::new(
                File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
            ),
        )?,
        None => parse_graph(format, stdin().lock())?,
    };
    tracing::debug!(triples = graph.len(), "Read input graph");
    Ok(graph)
}

fn write_graph(graph: &CubeGraph, output: &GraphOutput) -> anyhow::Result<()> {
    let format = if let Some(format) = &output.to_format {
        rdf_format_from_name(format)?
    } else if let Some(file) = &output.to_file {
        rdf_format_from_path(file)?
    } else {
        RdfFormat::Turtle
    };
    match &output.to_file {
        Some(file) => close_file_writer(serialize_graph(
            graph,
            format,
            BufWriter::new(File::create(file)?),
        )?)?,
        None => serialize_graph(graph, format, stdout().lock())?.flush()?,
    }
    Ok(())
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

fn close_file_writer(writer: BufWriter<File>) -> io::Result<()> {
    let mut file = writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    file.flush()?;
    file.sync_all()
}
