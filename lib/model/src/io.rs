//! Reading and writing [`CubeGraph`]s in the usual RDF formats.

use crate::error::CubeError;
use crate::graph::CubeGraph;
use crate::vocab::{cube, schema, sh};
use oxrdf::Triple;
pub use oxrdfio::{RdfFormat, RdfParseError, RdfParser, RdfSerializer};
use std::io::{Read, Write};

/// The prefixes written at the top of serialized graphs.
pub const PREFIXES: [(&str, &str); 5] = [
    ("cube", cube::NAMESPACE),
    ("sh", sh::NAMESPACE),
    ("schema", schema::NAMESPACE),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Parses a graph from `reader`.
///
/// Quads of all graphs are merged into the returned graph.
///
/// ```
/// use cubelink_model::io::{parse_graph, RdfFormat};
///
/// let file = "<http://example.com/s> <http://example.com/p> \"o\" .\n";
/// let graph = parse_graph(RdfFormat::NTriples, file.as_bytes())?;
/// assert_eq!(graph.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn parse_graph(parser: impl Into<RdfParser>, reader: impl Read) -> Result<CubeGraph, CubeError> {
    let mut graph = CubeGraph::new();
    for quad in parser.into().for_reader(reader) {
        let quad = quad?;
        graph.insert(Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}

/// Writes `graph` to `writer` in the given format.
pub fn serialize_graph<W: Write>(
    graph: &CubeGraph,
    format: RdfFormat,
    writer: W,
) -> Result<W, CubeError> {
    let mut serializer = RdfSerializer::from_format(format);
    for (name, iri) in PREFIXES {
        serializer = serializer
            .with_prefix(name, iri)
            .map_err(|error| CubeError::invalid_iri("serialize-graph", iri, &error))?;
    }
    let mut serializer = serializer.for_writer(writer);
    for triple in graph {
        serializer.serialize_triple(triple)?;
    }
    Ok(serializer.finish()?)
}

/// Serializes `graph` to a [Turtle](https://www.w3.org/TR/turtle/) string.
pub fn to_turtle(graph: &CubeGraph) -> Result<String, CubeError> {
    let buffer = serialize_graph(graph, RdfFormat::Turtle, Vec::new())?;
    String::from_utf8(buffer).map_err(|error| {
        CubeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, error))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::rdf;
    use oxrdf::{Literal, NamedNode};

    #[test]
    fn turtle_round_trip_keeps_triples() -> Result<(), CubeError> {
        let mut graph = CubeGraph::new();
        let observation = NamedNode::new_unchecked("http://example.com/obs/1");
        graph.add(observation.clone(), rdf::TYPE, cube::OBSERVATION.into_owned());
        graph.add(
            observation,
            NamedNode::new_unchecked("http://example.com/population"),
            Literal::from(133_000_i64),
        );

        let turtle = to_turtle(&graph)?;
        assert!(turtle.contains("@prefix cube: <https://cube.link/>"));

        let parsed = parse_graph(RdfFormat::Turtle, turtle.as_bytes())?;
        assert_eq!(parsed.len(), 2);
        for triple in &graph {
            assert!(parsed.contains(triple));
        }
        Ok(())
    }

    #[test]
    fn reports_syntax_errors() {
        let result = parse_graph(RdfFormat::NTriples, "<http://example.com/s> .".as_bytes());
        assert!(matches!(result, Err(CubeError::Parsing(_))));
    }
}
