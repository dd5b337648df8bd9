//! Generation of observations from tabular rows.
//!
//! The generator is a streaming consumer: rows are pulled one at a time and turned into triples
//! right away. Usage example:
//!
//! ```
//! use cubelink_engine::generator::{
//!     DimensionConfig, GeneratorConfig, MeasureConfig, NoProgress, ObservationGenerator, Row,
//! };
//!
//! let generator = ObservationGenerator::new(GeneratorConfig {
//!     cube: "http://example.com/cube".to_owned(),
//!     observation_base: "http://example.com/obs/".to_owned(),
//!     dimensions: vec![DimensionConfig::new("city", "http://example.com/city").key()],
//!     measures: vec![MeasureConfig::new("pop", "http://example.com/pop")],
//!     ..GeneratorConfig::default()
//! })?;
//! let rows = [Row::new().with("city", "Bern").with("pop", 133_000_i64)];
//! let generated = generator.generate_rows(rows, &mut NoProgress)?;
//!
//! assert_eq!(generated.observation_count, 1);
//! assert_eq!(generated.undefined_count, 0);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod config;
mod progress;
mod row;

pub use config::{
    AttributeConfig, DimensionConfig, GeneratorConfig, MeasureConfig, DEFAULT_DATE_FORMAT,
};
pub use progress::{NoProgress, ProgressSink, TracingProgressSink, PROGRESS_INTERVAL};
pub use row::{CellValue, Row};

use crate::roles::is_numeric_datatype;
use chrono::NaiveDate;
use cubelink_model::vocab::{cube, rdf, xsd};
use cubelink_model::{CubeError, CubeGraph, ExternalError, Literal, NamedNode, Term};
use std::convert::Infallible;

const OPERATION: &str = "generate-observations";

/// The placeholder of a value in an IRI template.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// The IRI segment of a missing key dimension value.
const UNDEFINED_SEGMENT: &str = "undefined";

/// The output of an [ObservationGenerator].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedObservations {
    pub graph: CubeGraph,
    pub observation_count: usize,
    /// The number of `cube:Undefined` values that were emitted.
    pub undefined_count: usize,
    pub triples_generated: usize,
}

#[derive(Debug)]
enum DimensionValue {
    Template(String),
    Date,
    Plain,
}

#[derive(Debug)]
struct Column {
    column: String,
    property: NamedNode,
}

/// Turns rows into observations according to a [GeneratorConfig].
#[derive(Debug)]
pub struct ObservationGenerator {
    cube: NamedNode,
    observation_set: NamedNode,
    observation_base: String,
    dimensions: Vec<(Column, DimensionValue)>,
    keys: Vec<String>,
    measures: Vec<(Column, Option<NamedNode>)>,
    attributes: Vec<Column>,
    date_format: String,
    emit_undefined: bool,
    link_observation_set: bool,
}

impl ObservationGenerator {
    /// Creates a generator and validates the IRIs and templates of `config`.
    ///
    /// # Errors
    ///
    /// Returns [CubeError::InvalidPathArgument] for malformed IRIs or templates.
    pub fn new(config: GeneratorConfig) -> Result<Self, CubeError> {
        let cube = named_node(&config.cube)?;
        let observation_set = named_node(&format!("{}/observation/", cube.as_str()))?;
        named_node(&format!("{}1", config.observation_base))?;

        let mut dimensions = Vec::with_capacity(config.dimensions.len());
        let mut keys = Vec::new();
        for dimension in config.dimensions {
            let value = match (&dimension.value_template, dimension.datatype.as_deref()) {
                (Some(template), _) => {
                    if !template.contains(VALUE_PLACEHOLDER) {
                        return Err(CubeError::InvalidPathArgument {
                            operation: OPERATION,
                            argument: template.clone(),
                            message: format!("the template does not contain {VALUE_PLACEHOLDER}"),
                        });
                    }
                    named_node(&template.replace(VALUE_PLACEHOLDER, "value"))?;
                    DimensionValue::Template(template.clone())
                }
                (None, Some(datatype)) if is_date(datatype) => DimensionValue::Date,
                (None, _) => DimensionValue::Plain,
            };
            if dimension.key_dimension {
                keys.push(dimension.column.clone());
            }
            dimensions.push((column(dimension.column, &dimension.property)?, value));
        }
        let measures = config
            .measures
            .into_iter()
            .map(|measure| {
                let datatype = measure.datatype.as_deref().map(named_node).transpose()?;
                Ok((column(measure.column, &measure.property)?, datatype))
            })
            .collect::<Result<Vec<_>, CubeError>>()?;
        let attributes = config
            .attributes
            .into_iter()
            .map(|attribute| column(attribute.column, &attribute.property))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cube,
            observation_set,
            observation_base: config.observation_base,
            dimensions,
            keys,
            measures,
            attributes,
            date_format: config.date_format,
            emit_undefined: config.emit_undefined,
            link_observation_set: config.link_observation_set,
        })
    }

    /// The IRI of the observation set (`<cube>/observation/`).
    pub fn observation_set(&self) -> &NamedNode {
        &self.observation_set
    }

    /// Generates observations from infallible rows.
    pub fn generate_rows(
        &self,
        rows: impl IntoIterator<Item = Row>,
        progress: &mut dyn ProgressSink,
    ) -> Result<GeneratedObservations, CubeError> {
        self.generate(rows.into_iter().map(Ok::<_, Infallible>), progress)
    }

    /// Generates observations from the rows produced by `rows`.
    ///
    /// Rows are consumed one at a time. `progress` is notified every [PROGRESS_INTERVAL] rows.
    ///
    /// # Errors
    ///
    /// Returns [CubeError::RowSource] if the row source fails. No partial result is returned.
    pub fn generate<E: Into<ExternalError>>(
        &self,
        rows: impl IntoIterator<Item = Result<Row, E>>,
        progress: &mut dyn ProgressSink,
    ) -> Result<GeneratedObservations, CubeError> {
        let mut graph = CubeGraph::new();
        let mut observation_count = 0;
        let mut undefined_count = 0;

        if self.link_observation_set {
            graph.add(self.cube.clone(), rdf::TYPE, cube::CUBE.into_owned());
            graph.add(
                self.cube.clone(),
                cube::OBSERVATION_SET_PROPERTY,
                self.observation_set.clone(),
            );
            graph.add(
                self.observation_set.clone(),
                rdf::TYPE,
                cube::OBSERVATION_SET.into_owned(),
            );
        }

        for row in rows {
            let row = row.map_err(|error| CubeError::RowSource {
                operation: OPERATION,
                source: error.into(),
            })?;
            observation_count += 1;
            undefined_count += self.add_observation(&mut graph, &row, observation_count)?;
            if observation_count % PROGRESS_INTERVAL == 0 {
                progress.report(observation_count);
            }
        }

        tracing::info!(
            cube = self.cube.as_str(),
            observations = observation_count,
            undefined = undefined_count,
            triples = graph.len(),
            "Generated observations"
        );
        Ok(GeneratedObservations {
            triples_generated: graph.len(),
            graph,
            observation_count,
            undefined_count,
        })
    }

    /// Adds the triples of a single row and returns the number of undefined values.
    fn add_observation(
        &self,
        graph: &mut CubeGraph,
        row: &Row,
        ordinal: usize,
    ) -> Result<usize, CubeError> {
        let observation = self.observation_iri(row, ordinal)?;
        graph.add(observation.clone(), rdf::TYPE, cube::OBSERVATION.into_owned());
        graph.add(observation.clone(), cube::OBSERVED_BY, self.cube.clone());
        if self.link_observation_set {
            graph.add(
                self.observation_set.clone(),
                cube::OBSERVATION_PROPERTY,
                observation.clone(),
            );
        }

        let mut undefined = 0;
        for (column, kind) in &self.dimensions {
            let value = row
                .value(&column.column)
                .map(|value| self.dimension_value(kind, value))
                .transpose()?;
            if self.add_value(graph, &observation, &column.property, value) {
                undefined += 1;
            }
        }
        for (column, datatype) in &self.measures {
            let value = row
                .value(&column.column)
                .map(|value| measure_value(value, datatype.as_ref()));
            if self.add_value(graph, &observation, &column.property, value) {
                undefined += 1;
            }
        }
        for column in &self.attributes {
            let value = row
                .value(&column.column)
                .map(|value| Literal::new_simple_literal(value.to_string()).into());
            if self.add_value(graph, &observation, &column.property, value) {
                undefined += 1;
            }
        }
        Ok(undefined)
    }

    /// Adds a single value of an observation. Returns true iff `cube:Undefined` was added in place
    /// of a missing value.
    fn add_value(
        &self,
        graph: &mut CubeGraph,
        observation: &NamedNode,
        property: &NamedNode,
        value: Option<Term>,
    ) -> bool {
        match value {
            Some(value) => {
                graph.add(observation.clone(), property.clone(), value);
                false
            }
            None if self.emit_undefined => {
                graph.add(
                    observation.clone(),
                    property.clone(),
                    cube::UNDEFINED.into_owned(),
                );
                true
            }
            None => false,
        }
    }

    fn observation_iri(&self, row: &Row, ordinal: usize) -> Result<NamedNode, CubeError> {
        let suffix = if self.keys.is_empty() {
            ordinal.to_string()
        } else {
            self.keys
                .iter()
                .map(|key| match row.value(key) {
                    Some(value) => sanitize(&value.to_string()),
                    None => UNDEFINED_SEGMENT.to_owned(),
                })
                .collect::<Vec<_>>()
                .join("-")
        };
        named_node(&format!("{}{suffix}", self.observation_base))
    }

    fn dimension_value(&self, kind: &DimensionValue, value: &CellValue) -> Result<Term, CubeError> {
        let lexical = value.to_string();
        Ok(match kind {
            DimensionValue::Template(template) => {
                named_node(&template.replace(VALUE_PLACEHOLDER, &sanitize(&lexical)))?.into()
            }
            DimensionValue::Date => match parse_date(&lexical, &self.date_format) {
                Ok(date) => {
                    Literal::new_typed_literal(date.format("%Y-%m-%d").to_string(), xsd::DATE)
                        .into()
                }
                Err(error) => {
                    tracing::warn!("{error}, falling back to a plain literal");
                    Literal::new_simple_literal(lexical).into()
                }
            },
            DimensionValue::Plain => Literal::new_simple_literal(lexical).into(),
        })
    }
}

/// Parses `value` as a date using a `chrono` format pattern.
///
/// # Errors
///
/// Returns [CubeError::MalformedDateValue] if the value does not match the pattern.
pub fn parse_date(value: &str, pattern: &str) -> Result<NaiveDate, CubeError> {
    NaiveDate::parse_from_str(value.trim(), pattern).map_err(|_| CubeError::MalformedDateValue {
        value: value.to_owned(),
        pattern: pattern.to_owned(),
    })
}

/// Replaces every character outside of `[A-Za-z0-9_-]` with `_`.
///
/// ```
/// use cubelink_engine::generator::sanitize;
///
/// assert_eq!(sanitize("Zürich 2024"), "Z_rich_2024");
/// ```
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn measure_value(value: &CellValue, datatype: Option<&NamedNode>) -> Term {
    let lexical = value.to_string();
    if let Some(datatype) = datatype.filter(|datatype| is_numeric_datatype(datatype.as_ref())) {
        let valid = if is_integer_datatype(datatype) {
            lexical.parse::<i64>().is_ok()
        } else {
            lexical.parse::<f64>().is_ok_and(f64::is_finite)
        };
        if valid {
            return Literal::new_typed_literal(lexical, datatype.clone()).into();
        }
    }
    match value {
        CellValue::Integer(value) => Literal::from(*value).into(),
        CellValue::Float(value) => Literal::from(*value).into(),
        CellValue::Text(_) if lexical.parse::<f64>().is_ok_and(f64::is_finite) => {
            Literal::new_typed_literal(lexical, xsd::DOUBLE).into()
        }
        CellValue::Text(_) | CellValue::Boolean(_) => Literal::new_simple_literal(lexical).into(),
    }
}

fn is_integer_datatype(datatype: &NamedNode) -> bool {
    [xsd::INTEGER, xsd::INT, xsd::LONG]
        .iter()
        .any(|integer| *integer == datatype.as_ref())
}

fn is_date(datatype: &str) -> bool {
    datatype.eq_ignore_ascii_case("date") || datatype == xsd::DATE.as_str()
}

fn column(column: String, property: &str) -> Result<Column, CubeError> {
    Ok(Column {
        column,
        property: named_node(property)?,
    })
}

fn named_node(iri: &str) -> Result<NamedNode, CubeError> {
    NamedNode::new(iri).map_err(|error| CubeError::invalid_iri(OPERATION, iri, &error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{infer_constraint, InferenceOptions};
    use cubelink_model::Subject;
    use std::io;

    const EX: &str = "http://example.com/";

    fn ex(local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("{EX}{local}"))
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            cube: format!("{EX}cube"),
            observation_base: format!("{EX}obs/"),
            dimensions: vec![DimensionConfig::new("city", format!("{EX}city")).key()],
            measures: vec![MeasureConfig {
                datatype: Some(xsd::INTEGER.as_str().to_owned()),
                ..MeasureConfig::new("pop", format!("{EX}pop"))
            }],
            link_observation_set: false,
            ..GeneratorConfig::default()
        }
    }

    fn rows(pop: &str) -> Vec<Row> {
        vec![
            Row::new().with("city", "Bern").with("pop", "133000"),
            Row::new().with("city", "Zurich").with("pop", pop),
        ]
    }

    fn generate(
        config: GeneratorConfig,
        rows: impl IntoIterator<Item = Row>,
    ) -> Result<GeneratedObservations, CubeError> {
        ObservationGenerator::new(config)?.generate_rows(rows, &mut NoProgress)
    }

    fn objects(graph: &CubeGraph, subject: &str, property: &str) -> Vec<Term> {
        graph
            .objects_for_subject_predicate(&ex(subject).into(), ex(property).as_ref())
            .cloned()
            .collect()
    }

    #[test]
    fn generates_one_observation_per_row() -> Result<(), CubeError> {
        let generated = generate(config(), rows("434000"))?;
        assert_eq!(generated.observation_count, 2);
        assert_eq!(generated.undefined_count, 0);
        assert_eq!(generated.triples_generated, generated.graph.len());

        let graph = &generated.graph;
        assert_eq!(
            graph.subjects_with_type(cube::OBSERVATION),
            vec![Subject::from(ex("obs/Bern")), Subject::from(ex("obs/Zurich"))]
        );
        assert_eq!(
            objects(graph, "obs/Bern", "city"),
            vec![Term::from(Literal::from("Bern"))]
        );
        assert_eq!(
            objects(graph, "obs/Zurich", "pop"),
            vec![Term::from(Literal::new_typed_literal("434000", xsd::INTEGER))]
        );
        assert_eq!(
            graph.object_for_subject_predicate(&ex("obs/Bern").into(), cube::OBSERVED_BY),
            Some(&Term::from(ex("cube")))
        );
        Ok(())
    }

    #[test]
    fn missing_values_become_undefined() -> Result<(), CubeError> {
        let generated = generate(config(), rows("n/a"))?;
        assert_eq!(generated.undefined_count, 1);
        assert_eq!(
            objects(&generated.graph, "obs/Zurich", "pop"),
            vec![Term::from(cube::UNDEFINED.into_owned())]
        );

        let config = GeneratorConfig {
            emit_undefined: false,
            ..config()
        };
        let generated = generate(config, rows("n/a"))?;
        assert_eq!(generated.undefined_count, 0);
        assert_eq!(generated.observation_count, 2);
        assert!(objects(&generated.graph, "obs/Zurich", "pop").is_empty());
        Ok(())
    }

    #[test]
    fn undefined_values_are_counted_per_column() -> Result<(), CubeError> {
        let mut config = config();
        config
            .dimensions
            .push(DimensionConfig::new("canton", format!("{EX}canton")));
        config.attributes = vec![AttributeConfig::new("note", format!("{EX}note"))];
        let rows = [
            Row::new().with("city", "Bern"),
            Row::new()
                .with("city", "Zurich")
                .with("canton", "ZH")
                .with("pop", "434000")
                .with("note", "n/a"),
        ];

        let generated = generate(config, rows)?;
        assert_eq!(generated.undefined_count, 4);
        let undefined = vec![Term::from(cube::UNDEFINED.into_owned())];
        assert_eq!(objects(&generated.graph, "obs/Bern", "canton"), undefined);
        assert_eq!(objects(&generated.graph, "obs/Bern", "pop"), undefined);
        assert_eq!(objects(&generated.graph, "obs/Bern", "note"), undefined);
        assert_eq!(objects(&generated.graph, "obs/Zurich", "note"), undefined);
        Ok(())
    }

    #[test]
    fn missing_key_values_are_named_undefined() -> Result<(), CubeError> {
        let rows = [Row::new().with("pop", "1")];
        let generated = generate(config(), rows)?;
        assert_eq!(
            generated.graph.subjects_with_type(cube::OBSERVATION),
            vec![Subject::from(ex("obs/undefined"))]
        );
        Ok(())
    }

    #[test]
    fn rows_are_numbered_without_key_dimensions() -> Result<(), CubeError> {
        let config = GeneratorConfig {
            dimensions: vec![DimensionConfig::new("city", format!("{EX}city"))],
            ..config()
        };
        let generated = generate(config, rows("1"))?;
        assert_eq!(
            generated.graph.subjects_with_type(cube::OBSERVATION),
            vec![Subject::from(ex("obs/1")), Subject::from(ex("obs/2"))]
        );
        Ok(())
    }

    #[test]
    fn key_values_are_sanitized_and_joined() -> Result<(), CubeError> {
        let config = GeneratorConfig {
            dimensions: vec![
                DimensionConfig::new("city", format!("{EX}city")).key(),
                DimensionConfig::new("year", format!("{EX}year")).key(),
            ],
            ..config()
        };
        let rows = [Row::new().with("city", "St. Gallen").with("year", 2024_i64)];
        let generated = generate(config, rows)?;
        assert_eq!(
            generated.graph.subjects_with_type(cube::OBSERVATION),
            vec![Subject::from(ex("obs/St__Gallen-2024"))]
        );
        Ok(())
    }

    #[test]
    fn templates_and_dates() -> Result<(), CubeError> {
        let config = GeneratorConfig {
            dimensions: vec![
                DimensionConfig {
                    value_template: Some(format!("{EX}city/{{value}}")),
                    ..DimensionConfig::new("city", format!("{EX}city")).key()
                },
                DimensionConfig {
                    datatype: Some("date".to_owned()),
                    ..DimensionConfig::new("date", format!("{EX}date"))
                },
            ],
            date_format: "%d.%m.%Y".to_owned(),
            ..config()
        };
        let rows = [
            Row::new().with("city", "Bern").with("date", "31.12.2024"),
            Row::new().with("city", "Basel").with("date", "someday"),
        ];
        let generated = generate(config, rows)?;
        let graph = &generated.graph;
        assert_eq!(
            objects(graph, "obs/Bern", "city"),
            vec![Term::from(ex("city/Bern"))]
        );
        assert_eq!(
            objects(graph, "obs/Bern", "date"),
            vec![Term::from(Literal::new_typed_literal("2024-12-31", xsd::DATE))]
        );
        assert_eq!(
            objects(graph, "obs/Basel", "date"),
            vec![Term::from(Literal::from("someday"))]
        );
        Ok(())
    }

    #[test]
    fn measures_are_typed_by_their_source() {
        assert_eq!(
            measure_value(&CellValue::Integer(3), None),
            Term::from(Literal::from(3_i64))
        );
        assert_eq!(
            measure_value(&CellValue::from("2.5"), None),
            Term::from(Literal::new_typed_literal("2.5", xsd::DOUBLE))
        );
        assert_eq!(
            measure_value(&CellValue::from("many"), None),
            Term::from(Literal::from("many"))
        );
        assert_eq!(
            measure_value(&CellValue::from("2.5"), Some(&xsd::INTEGER.into_owned())),
            Term::from(Literal::new_typed_literal("2.5", xsd::DOUBLE))
        );
        assert_eq!(
            measure_value(&CellValue::from("2.5"), Some(&xsd::DECIMAL.into_owned())),
            Term::from(Literal::new_typed_literal("2.5", xsd::DECIMAL))
        );
    }

    #[test]
    fn attributes_are_plain_literals() -> Result<(), CubeError> {
        let config = GeneratorConfig {
            attributes: vec![AttributeConfig::new("note", format!("{EX}note"))],
            ..config()
        };
        let rows = [Row::new().with("city", "Bern").with("note", 12_i64)];
        let generated = generate(config, rows)?;
        assert_eq!(
            objects(&generated.graph, "obs/Bern", "note"),
            vec![Term::from(Literal::from("12"))]
        );
        // pop is missing
        assert_eq!(generated.undefined_count, 1);
        Ok(())
    }

    #[test]
    fn links_observation_set() -> Result<(), CubeError> {
        let config = GeneratorConfig {
            link_observation_set: true,
            ..config()
        };
        let generator = ObservationGenerator::new(config)?;
        let generated = generator.generate_rows(rows("1"), &mut NoProgress)?;
        let graph = &generated.graph;
        assert!(graph.has_type(&ex("cube").into(), cube::CUBE));
        assert_eq!(
            graph
                .objects_for_subject_predicate(
                    &generator.observation_set().clone().into(),
                    cube::OBSERVATION_PROPERTY
                )
                .count(),
            2
        );
        assert_eq!(generated.triples_generated, 3 + 2 * 5);
        Ok(())
    }

    #[test]
    fn reports_progress() -> Result<(), CubeError> {
        let rows = (0..2500).map(|index| Row::new().with("city", format!("c{index}")));
        let mut reports = Vec::new();
        ObservationGenerator::new(config())?
            .generate_rows(rows, &mut |rows: usize| reports.push(rows))?;
        assert_eq!(reports, vec![1000, 2000]);
        Ok(())
    }

    #[test]
    fn row_source_errors_abort() -> Result<(), CubeError> {
        let rows = vec![
            Ok(Row::new().with("city", "Bern")),
            Err(io::Error::new(io::ErrorKind::InvalidData, "broken row")),
        ];
        let result = ObservationGenerator::new(config())?.generate(rows, &mut NoProgress);
        assert!(matches!(
            result,
            Err(CubeError::RowSource {
                operation: OPERATION,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn rejects_malformed_configuration() {
        let missing_placeholder = GeneratorConfig {
            dimensions: vec![DimensionConfig {
                value_template: Some(format!("{EX}city/")),
                ..DimensionConfig::new("city", format!("{EX}city"))
            }],
            ..config()
        };
        assert!(matches!(
            ObservationGenerator::new(missing_placeholder),
            Err(CubeError::InvalidPathArgument { .. })
        ));

        let relative_cube = GeneratorConfig {
            cube: "cube".to_owned(),
            ..config()
        };
        assert!(ObservationGenerator::new(relative_cube).is_err());
    }

    #[test]
    fn generated_measures_keep_their_datatype() -> Result<(), CubeError> {
        let rows = (0..20).map(|index| {
            Row::new()
                .with("city", format!("city{index}"))
                .with("pop", (1000 + index).to_string())
        });
        let generated = generate(config(), rows)?;
        let inferred = infer_constraint(&generated.graph, &ex("cube"), &InferenceOptions::default())?;
        let pop = inferred
            .shapes
            .iter()
            .find(|shape| shape.path == ex("pop").as_str())
            .map(|shape| shape.datatype.clone());
        assert_eq!(pop, Some(Some(xsd::INTEGER.as_str().to_owned())));
        Ok(())
    }

    #[test]
    fn malformed_dates_are_reported() {
        assert!(matches!(
            parse_date("2024-13-01", DEFAULT_DATE_FORMAT),
            Err(CubeError::MalformedDateValue { .. })
        ));
        assert_eq!(
            parse_date(" 2024-02-29 ", DEFAULT_DATE_FORMAT).ok(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}
