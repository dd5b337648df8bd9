//! An in-memory [RDF graph](https://www.w3.org/TR/rdf11-concepts/#dfn-graph) that remembers the
//! order in which triples were inserted.
//!
//! The entry point of the module is the [`CubeGraph`] struct.
//!
//! Usage example:
//! ```
//! use cubelink_model::vocab::{cube, rdf};
//! use cubelink_model::{CubeGraph, NamedNode, Subject, Triple};
//!
//! let observation = NamedNode::new("http://example.com/obs/1")?;
//! let mut graph = CubeGraph::new();
//! graph.insert(Triple::new(
//!     observation.clone(),
//!     rdf::TYPE,
//!     cube::OBSERVATION.into_owned(),
//! ));
//!
//! assert_eq!(
//!     graph.subjects_with_type(cube::OBSERVATION),
//!     vec![Subject::from(observation)]
//! );
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::vocab::rdf;
use indexmap::IndexMap;
use oxrdf::{Graph, NamedNode, NamedNodeRef, Subject, Term, Triple};

/// An insertion-ordered multiset of triples indexed by subject.
///
/// Unlike [`oxrdf::Graph`], iteration follows insertion order. Cube inference relies on this to
/// report properties in the order they were first seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CubeGraph {
    triples: Vec<Triple>,
    by_subject: IndexMap<Subject, Vec<usize>>,
}

impl CubeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of triples in this graph.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Checks if this graph contains any triple.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Adds a triple to this graph. Duplicates are kept.
    pub fn insert(&mut self, triple: Triple) {
        let index = self.triples.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(index);
        self.triples.push(triple);
    }

    /// Adds the triple (`subject`, `predicate`, `object`) to this graph.
    pub fn add(
        &mut self,
        subject: impl Into<Subject>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) {
        self.insert(Triple::new(subject, predicate, object));
    }

    /// Checks if the graph contains the given triple.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples_for_subject(&triple.subject)
            .any(|candidate| candidate == triple)
    }

    /// Returns all triples in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Triple> {
        self.triples.iter()
    }

    /// Returns the distinct subjects of this graph in the order they were first seen.
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.by_subject.keys()
    }

    /// Returns all triples with the given `subject` in insertion order.
    pub fn triples_for_subject<'a>(
        &'a self,
        subject: &Subject,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .map(|index| &self.triples[*index])
    }

    /// Returns all objects of triples with the given `subject` and `predicate`.
    pub fn objects_for_subject_predicate<'a>(
        &'a self,
        subject: &Subject,
        predicate: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples_for_subject(subject)
            .filter(move |triple| triple.predicate.as_ref() == predicate)
            .map(|triple| &triple.object)
    }

    /// Returns the first object of a triple with the given `subject` and `predicate`.
    pub fn object_for_subject_predicate<'a>(
        &'a self,
        subject: &Subject,
        predicate: NamedNodeRef<'a>,
    ) -> Option<&'a Term> {
        self.objects_for_subject_predicate(subject, predicate).next()
    }

    /// Returns the subjects that are asserted to be instances of `class`, in first-seen order.
    pub fn subjects_with_type(&self, class: NamedNodeRef<'_>) -> Vec<Subject> {
        self.by_subject
            .keys()
            .filter(|subject| {
                self.objects_for_subject_predicate(subject, rdf::TYPE)
                    .any(|object| matches!(object, Term::NamedNode(node) if node.as_ref() == class))
            })
            .cloned()
            .collect()
    }

    /// Checks if `subject` is asserted to be an instance of `class`.
    pub fn has_type(&self, subject: &Subject, class: NamedNodeRef<'_>) -> bool {
        self.objects_for_subject_predicate(subject, rdf::TYPE)
            .any(|object| matches!(object, Term::NamedNode(node) if node.as_ref() == class))
    }

    /// Returns a new graph that only contains the triples of the given subjects.
    ///
    /// The triples are grouped by subject in the order of `subjects`.
    pub fn subgraph<'a>(&self, subjects: impl IntoIterator<Item = &'a Subject>) -> CubeGraph {
        let mut result = CubeGraph::new();
        for subject in subjects {
            for triple in self.triples_for_subject(subject) {
                result.insert(triple.clone());
            }
        }
        result
    }

    /// Reads the members of the [RDF collection](https://www.w3.org/TR/rdf11-mt/#rdf-collections)
    /// starting at `head`.
    ///
    /// Reading stops at `rdf:nil`, at a node without `rdf:first`, or once a cycle is detected.
    pub fn read_list(&self, head: &Term) -> Vec<Term> {
        let mut members = Vec::new();
        let mut current = as_subject(head);
        while let Some(node) = current {
            if members.len() > self.len() {
                break;
            }
            let Some(first) = self.object_for_subject_predicate(&node, rdf::FIRST) else {
                break;
            };
            members.push(first.clone());
            current = self
                .object_for_subject_predicate(&node, rdf::REST)
                .filter(|rest| !matches!(rest, Term::NamedNode(n) if n.as_ref() == rdf::NIL))
                .and_then(as_subject);
        }
        members
    }
}

/// Converts an object term into a subject, if it is an IRI or a blank node.
pub fn as_subject(term: &Term) -> Option<Subject> {
    match term {
        Term::NamedNode(node) => Some(Subject::NamedNode(node.clone())),
        Term::BlankNode(node) => Some(Subject::BlankNode(node.clone())),
        _ => None,
    }
}

impl Extend<Triple> for CubeGraph {
    fn extend<T: IntoIterator<Item = Triple>>(&mut self, iter: T) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl FromIterator<Triple> for CubeGraph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        let mut graph = CubeGraph::new();
        graph.extend(iter);
        graph
    }
}

impl<'a> IntoIterator for &'a CubeGraph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<&Graph> for CubeGraph {
    fn from(graph: &Graph) -> Self {
        graph.iter().map(|triple| triple.into_owned()).collect()
    }
}

impl From<&CubeGraph> for Graph {
    fn from(graph: &CubeGraph) -> Self {
        let mut result = Graph::new();
        for triple in graph {
            result.insert(triple);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal};

    fn ex(local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{local}"))
    }

    #[test]
    fn keeps_insertion_order_per_subject() {
        let mut graph = CubeGraph::new();
        graph.add(ex("s"), ex("b"), Literal::from(1));
        graph.add(ex("t"), ex("a"), Literal::from(2));
        graph.add(ex("s"), ex("a"), Literal::from(3));

        let predicates = graph
            .triples_for_subject(&ex("s").into())
            .map(|triple| triple.predicate.clone())
            .collect::<Vec<_>>();
        assert_eq!(predicates, vec![ex("b"), ex("a")]);
        assert_eq!(
            graph.subjects().cloned().collect::<Vec<_>>(),
            vec![Subject::from(ex("s")), Subject::from(ex("t"))]
        );
    }

    #[test]
    fn keeps_duplicates() {
        let mut graph = CubeGraph::new();
        graph.add(ex("s"), ex("p"), ex("o"));
        graph.add(ex("s"), ex("p"), ex("o"));
        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&Triple::new(ex("s"), ex("p"), ex("o"))));
    }

    #[test]
    fn reads_lists() {
        let mut graph = CubeGraph::new();
        let first = BlankNode::default();
        let second = BlankNode::default();
        graph.add(first.clone(), rdf::FIRST, Literal::from("a"));
        graph.add(first.clone(), rdf::REST, second.clone());
        graph.add(second.clone(), rdf::FIRST, Literal::from("b"));
        graph.add(second, rdf::REST, rdf::NIL.into_owned());

        assert_eq!(
            graph.read_list(&first.into()),
            vec![
                Term::from(Literal::from("a")),
                Term::from(Literal::from("b"))
            ]
        );
    }

    #[test]
    fn reading_cyclic_lists_terminates() {
        let mut graph = CubeGraph::new();
        let node = BlankNode::default();
        graph.add(node.clone(), rdf::FIRST, Literal::from("a"));
        graph.add(node.clone(), rdf::REST, node.clone());

        assert!(graph.read_list(&node.into()).len() <= graph.len() + 1);
    }

    #[test]
    fn subgraph_only_contains_requested_subjects() {
        let mut graph = CubeGraph::new();
        graph.add(ex("a"), ex("p"), Literal::from(1));
        graph.add(ex("b"), ex("p"), Literal::from(2));
        graph.add(ex("a"), ex("q"), Literal::from(3));

        let subgraph = graph.subgraph([&Subject::from(ex("a"))]);
        assert_eq!(subgraph.len(), 2);
        assert!(subgraph
            .iter()
            .all(|triple| triple.subject == Subject::from(ex("a"))));
    }

    #[test]
    fn converts_from_and_to_oxrdf_graphs() {
        let mut graph = CubeGraph::new();
        graph.add(ex("s"), ex("p"), ex("o"));
        let converted = Graph::from(&graph);
        assert_eq!(converted.len(), 1);
        assert_eq!(CubeGraph::from(&converted), graph);
    }
}
