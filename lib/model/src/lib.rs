mod error;
mod graph;
pub mod io;
pub mod vocab;

pub use error::*;
pub use graph::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Subject, SubjectRef, Term, TermRef, Triple, TripleRef,
};

/// Returns the local name of an IRI, i.e., the part after the last `#` or `/`.
///
/// ```
/// use cubelink_model::local_name;
///
/// assert_eq!(local_name("http://example.com/ns#populationTotal"), "populationTotal");
/// assert_eq!(local_name("http://example.com/dimension/city"), "city");
/// ```
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    trimmed
        .rfind(['#', '/', ':'])
        .map_or(trimmed, |index| &trimmed[index + 1..])
}
