//! SPARQL `CONSTRUCT` queries that retrieve a cube or parts of it.
//!
//! Each [QueryMode] yields a query with a fixed shape:
//!
//! - [QueryMode::FullCube] retrieves the cube, its observation set, its observations and its
//!   constraint.
//! - [QueryMode::MetadataOnly] retrieves the same triples except for the observations and the
//!   `cube:observation` links.
//! - [QueryMode::ConstraintOnly] retrieves the constraint, its property shapes and the blank nodes
//!   (e.g., `sh:in` lists) nested in the property shapes.
//! - [QueryMode::ObservationsOnly] retrieves the triples of the observations, optionally paginated.
//!
//! ```
//! use cubelink_model::NamedNode;
//! use cubelink_remote::{CubeQuery, FetchOptions, QueryMode};
//!
//! let cube = NamedNode::new("http://example.com/cube")?;
//! let options = FetchOptions {
//!     limit: 100,
//!     ..FetchOptions::default()
//! };
//! let query = CubeQuery::build(QueryMode::ObservationsOnly, &cube, &options);
//! assert!(query.as_str().ends_with("LIMIT 100\n"));
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use cubelink_model::vocab::{cube, sh};
use cubelink_model::NamedNode;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// The part of a cube that is retrieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    FullCube,
    MetadataOnly,
    ConstraintOnly,
    ObservationsOnly,
}

impl QueryMode {
    pub const ALL: [QueryMode; 4] = [
        QueryMode::FullCube,
        QueryMode::MetadataOnly,
        QueryMode::ConstraintOnly,
        QueryMode::ObservationsOnly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryMode::FullCube => "full-cube",
            QueryMode::MetadataOnly => "metadata-only",
            QueryMode::ConstraintOnly => "constraint-only",
            QueryMode::ObservationsOnly => "observations-only",
        }
    }

    /// The name of the fetch operation reported in errors.
    pub fn operation(self) -> &'static str {
        match self {
            QueryMode::FullCube => "fetch-cube",
            QueryMode::MetadataOnly => "fetch-metadata",
            QueryMode::ConstraintOnly => "fetch-constraint",
            QueryMode::ObservationsOnly => "fetch-observations",
        }
    }

    /// Whether `limit` and `offset` apply to the query.
    pub fn is_paginated(self) -> bool {
        self == QueryMode::ObservationsOnly
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query mode '{0}'")]
pub struct UnknownQueryMode(String);

impl FromStr for QueryMode {
    type Err = UnknownQueryMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QueryMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| UnknownQueryMode(value.to_owned()))
    }
}

/// Options shared by all query modes.
///
/// `limit` and `offset` are only used by [QueryMode::ObservationsOnly]. A value of 0 disables
/// the respective clause.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// The named graph that holds the cube. If absent, the default graph is queried.
    pub named_graph: Option<NamedNode>,
    pub limit: usize,
    pub offset: usize,
}

/// The text of a `CONSTRUCT` query for a single cube.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubeQuery {
    mode: QueryMode,
    text: String,
}

impl CubeQuery {
    pub fn build(mode: QueryMode, cube: &NamedNode, options: &FetchOptions) -> Self {
        let cube = cube.to_string();
        let (template, branches) = match mode {
            QueryMode::FullCube => {
                let mut branches = vec![
                    cube_branch(&cube),
                    set_branch(&cube, false),
                    observation_branch(&cube),
                ];
                branches.extend(constraint_branches(&cube));
                (
                    vec![
                        CUBE_TEMPLATE,
                        SET_TEMPLATE,
                        OBSERVATION_TEMPLATE,
                        CONSTRAINT_TEMPLATE,
                        SHAPE_TEMPLATE,
                        NESTED_TEMPLATE,
                    ],
                    branches,
                )
            }
            QueryMode::MetadataOnly => {
                let mut branches = vec![cube_branch(&cube), set_branch(&cube, true)];
                branches.extend(constraint_branches(&cube));
                (
                    vec![
                        CUBE_TEMPLATE,
                        SET_TEMPLATE,
                        CONSTRAINT_TEMPLATE,
                        SHAPE_TEMPLATE,
                        NESTED_TEMPLATE,
                    ],
                    branches,
                )
            }
            QueryMode::ConstraintOnly => (
                vec![CONSTRAINT_TEMPLATE, SHAPE_TEMPLATE, NESTED_TEMPLATE],
                constraint_branches(&cube),
            ),
            QueryMode::ObservationsOnly => {
                (vec![OBSERVATION_TEMPLATE], vec![observation_branch(&cube)])
            }
        };

        let mut text = format!(
            "PREFIX cube: <{}>\nPREFIX sh: <{}>\nPREFIX rdf: <{RDF_NAMESPACE}>\n",
            cube::NAMESPACE,
            sh::NAMESPACE
        );
        text.push_str("CONSTRUCT {\n");
        for pattern in template {
            push_line(&mut text, 1, &pattern.replace(CUBE_PLACEHOLDER, &cube));
        }
        text.push_str("}\nWHERE {\n");
        let mut body = group(branches);
        if let Some(graph) = &options.named_graph {
            body = wrap(format!("GRAPH {graph} {{"), body);
        }
        for line in body {
            push_line(&mut text, 1, &line);
        }
        text.push_str("}\n");

        if mode.is_paginated() {
            for (keyword, value) in [("LIMIT", options.limit), ("OFFSET", options.offset)] {
                if value > 0 {
                    push_line(&mut text, 0, &format!("{keyword} {value}"));
                }
            }
        }
        tracing::debug!(mode = mode.as_str(), "Built CONSTRUCT query");
        Self { mode, text }
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for CubeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

const CUBE_PLACEHOLDER: &str = "$cube";
const CUBE_TEMPLATE: &str = "$cube ?cubeP ?cubeO .";
const SET_TEMPLATE: &str = "?set ?setP ?setO .";
const OBSERVATION_TEMPLATE: &str = "?observation ?observationP ?observationO .";
const CONSTRAINT_TEMPLATE: &str = "?constraint ?constraintP ?constraintO .";
const SHAPE_TEMPLATE: &str = "?shape ?shapeP ?shapeO .";
const NESTED_TEMPLATE: &str = "?node ?nodeP ?nodeO .";

fn cube_branch(cube: &str) -> Vec<String> {
    vec![CUBE_TEMPLATE.replace(CUBE_PLACEHOLDER, cube)]
}

fn set_branch(cube: &str, exclude_observations: bool) -> Vec<String> {
    let mut lines = vec![
        format!("{cube} cube:observationSet ?set ."),
        SET_TEMPLATE.to_owned(),
    ];
    if exclude_observations {
        lines.push("FILTER(?setP != cube:observation)".to_owned());
    }
    lines
}

fn observation_branch(cube: &str) -> Vec<String> {
    vec![
        format!("{cube} cube:observationSet ?set ."),
        "?set cube:observation ?observation .".to_owned(),
        OBSERVATION_TEMPLATE.to_owned(),
    ]
}

/// The constraint, its property shapes and the blank nodes below the property shapes.
///
/// `rdf:rest*` follows RDF lists so that `sh:in` values are retrieved completely.
fn constraint_branches(cube: &str) -> Vec<Vec<String>> {
    let link = format!("{cube} cube:observationConstraint ?constraint .");
    vec![
        vec![link.clone(), CONSTRAINT_TEMPLATE.to_owned()],
        vec![
            link.clone(),
            "?constraint sh:property ?shape .".to_owned(),
            SHAPE_TEMPLATE.to_owned(),
        ],
        vec![
            link,
            "?constraint sh:property ?shape .".to_owned(),
            "?shape ?shapeP ?nested .".to_owned(),
            "FILTER(isBlank(?nested))".to_owned(),
            "?nested rdf:rest* ?node .".to_owned(),
            NESTED_TEMPLATE.to_owned(),
        ],
    ]
}

/// Joins the branches with `UNION`. A single branch is emitted as is.
fn group(mut branches: Vec<Vec<String>>) -> Vec<String> {
    if branches.len() == 1 {
        return branches.remove(0);
    }
    let mut lines = Vec::new();
    for (index, branch) in branches.into_iter().enumerate() {
        if index > 0 {
            lines.push("UNION".to_owned());
        }
        lines.extend(wrap("{".to_owned(), branch));
    }
    lines
}

fn wrap(open: String, lines: Vec<String>) -> Vec<String> {
    let mut wrapped = Vec::with_capacity(lines.len() + 2);
    wrapped.push(open);
    wrapped.extend(lines.into_iter().map(|line| format!("  {line}")));
    wrapped.push("}".to_owned());
    wrapped
}

fn push_line(text: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        text.push_str("  ");
    }
    text.push_str(line);
    text.push('\n');
}
