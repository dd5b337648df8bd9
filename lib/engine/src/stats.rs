use cubelink_model::vocab::rdf;
use cubelink_model::{CubeGraph, NamedNode, NamedNodeRef, Subject, Term, Triple};
use indexmap::{IndexMap, IndexSet};

/// The maximum number of distinct values remembered per property.
pub const VALUE_SET_CAPACITY: usize = 1000;

/// Statistics for all properties of a set of observations, in the order the properties were first
/// seen.
pub type PropertyStatsMap = IndexMap<NamedNode, PropertyStats>;

/// Aggregated information about the values of a single property.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyStats {
    datatypes: IndexSet<NamedNode>,
    has_iri_values: bool,
    has_literal_values: bool,
    has_blank_values: bool,
    values: IndexSet<Term>,
    values_overflowed: bool,
    count: usize,
}

impl PropertyStats {
    /// Folds a single value of the property into the statistics.
    pub fn record(&mut self, value: &Term) {
        self.count += 1;
        match value {
            Term::Literal(literal) => {
                self.has_literal_values = true;
                self.datatypes.insert(literal.datatype().into_owned());
            }
            Term::NamedNode(_) => self.has_iri_values = true,
            _ => self.has_blank_values = true,
        }

        if self.values.len() < VALUE_SET_CAPACITY {
            self.values.insert(value.clone());
        } else if !self.values.contains(value) {
            self.values_overflowed = true;
        }
    }

    /// The number of values recorded for this property.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The datatypes of the literal values in the order they were first seen.
    pub fn datatypes(&self) -> impl Iterator<Item = NamedNodeRef<'_>> {
        self.datatypes.iter().map(NamedNode::as_ref)
    }

    pub fn has_iri_values(&self) -> bool {
        self.has_iri_values
    }

    pub fn has_literal_values(&self) -> bool {
        self.has_literal_values
    }

    pub fn has_blank_values(&self) -> bool {
        self.has_blank_values
    }

    /// The distinct values in the order they were first seen, bounded by [VALUE_SET_CAPACITY].
    ///
    /// Values are distinguished by term, so `"1"^^xsd:integer` and `"1"^^xsd:decimal` differ.
    pub fn values(&self) -> impl Iterator<Item = &Term> {
        self.values.iter()
    }

    /// The number of distinct values, bounded by [VALUE_SET_CAPACITY].
    pub fn distinct_value_count(&self) -> usize {
        self.values.len()
    }

    /// Whether more distinct values were seen than could be remembered.
    pub fn values_overflowed(&self) -> bool {
        self.values_overflowed
    }

    /// Holds iff exactly one datatype is present and there are no IRI or blank node values.
    pub fn has_consistent_datatype(&self) -> bool {
        self.datatypes.len() == 1 && !self.has_iri_values && !self.has_blank_values
    }

    /// Returns the datatype if [Self::has_consistent_datatype] holds.
    pub fn consistent_datatype(&self) -> Option<NamedNodeRef<'_>> {
        if self.has_consistent_datatype() {
            self.datatypes().next()
        } else {
            None
        }
    }

    /// Holds iff IRI values exist and there are no literal or blank node values.
    pub fn all_values_are_iris(&self) -> bool {
        self.has_iri_values && !self.has_literal_values && !self.has_blank_values
    }

    /// Whether the value set is complete and small enough to be enumerated.
    pub fn is_enumerable(&self, limit: usize) -> bool {
        !self.values_overflowed && self.values.len() <= limit
    }
}

/// Collects [PropertyStats] in a single pass over the triples of observations.
///
/// The type assertion (`rdf:type`) of an observation is not considered a property.
#[derive(Debug, Default)]
pub struct PropertyStatisticsCollector {
    stats: PropertyStatsMap,
}

impl PropertyStatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a single triple of an observation into the statistics.
    pub fn fold(&mut self, triple: &Triple) {
        if triple.predicate.as_ref() == rdf::TYPE {
            return;
        }
        self.stats
            .entry(triple.predicate.clone())
            .or_default()
            .record(&triple.object);
    }

    /// Folds all outgoing triples of `observation`.
    pub fn fold_observation(&mut self, graph: &CubeGraph, observation: &Subject) {
        for triple in graph.triples_for_subject(observation) {
            self.fold(triple);
        }
    }

    pub fn finish(self) -> PropertyStatsMap {
        self.stats
    }
}

/// Collects the statistics of all properties used by `observations`.
///
/// An empty set of observations yields an empty map.
pub fn collect_property_stats(graph: &CubeGraph, observations: &[Subject]) -> PropertyStatsMap {
    let mut collector = PropertyStatisticsCollector::new();
    for observation in observations {
        collector.fold_observation(graph, observation);
    }
    let stats = collector.finish();
    tracing::debug!(
        observations = observations.len(),
        properties = stats.len(),
        "Collected property statistics"
    );
    stats
}
