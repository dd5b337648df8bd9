use crate::stats::PropertyStats;
use cubelink_model::vocab::{cube, xsd};
use cubelink_model::NamedNodeRef;
use serde::Serialize;

/// A property with more distinct numeric values than this is considered a measure.
pub const MEASURE_DISTINCT_THRESHOLD: usize = 10;

/// The datatypes considered numeric when inferring dimension roles.
pub const NUMERIC_DATATYPES: [NamedNodeRef<'static>; 6] = [
    xsd::INTEGER,
    xsd::DECIMAL,
    xsd::DOUBLE,
    xsd::FLOAT,
    xsd::INT,
    xsd::LONG,
];

/// The role a property plays within the observations of a cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DimensionRole {
    /// The property identifies an observation.
    KeyDimension,
    /// The property holds a measured value.
    MeasureDimension,
}

impl DimensionRole {
    /// The class asserted on the property to record its role.
    pub fn class(self) -> NamedNodeRef<'static> {
        match self {
            DimensionRole::KeyDimension => cube::KEY_DIMENSION,
            DimensionRole::MeasureDimension => cube::MEASURE_DIMENSION,
        }
    }
}

pub fn is_numeric_datatype(datatype: NamedNodeRef<'_>) -> bool {
    NUMERIC_DATATYPES
        .iter()
        .any(|numeric| *numeric == datatype)
}

/// Infers the role of a property from its statistics.
///
/// This is a heuristic: a property is a measure iff its values have a single numeric datatype and
/// there are more than [MEASURE_DISTINCT_THRESHOLD] distinct values. Everything else is a key
/// dimension.
pub fn infer_role(stats: &PropertyStats) -> DimensionRole {
    let numeric = stats.consistent_datatype().is_some_and(is_numeric_datatype);
    if numeric && stats.distinct_value_count() > MEASURE_DISTINCT_THRESHOLD {
        DimensionRole::MeasureDimension
    } else {
        DimensionRole::KeyDimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubelink_model::{Literal, NamedNode};

    fn numeric_stats(distinct: usize) -> PropertyStats {
        let mut stats = PropertyStats::default();
        for value in 0..distinct {
            stats.record(&Literal::new_typed_literal(value.to_string(), xsd::DECIMAL).into());
        }
        stats
    }

    #[test]
    fn many_numeric_values_are_a_measure() {
        assert_eq!(
            infer_role(&numeric_stats(MEASURE_DISTINCT_THRESHOLD + 1)),
            DimensionRole::MeasureDimension
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(
            infer_role(&numeric_stats(MEASURE_DISTINCT_THRESHOLD)),
            DimensionRole::KeyDimension
        );
    }

    #[test]
    fn strings_are_keys() {
        let mut stats = PropertyStats::default();
        for value in 0..50 {
            stats.record(&Literal::new_simple_literal(value.to_string()).into());
        }
        assert_eq!(infer_role(&stats), DimensionRole::KeyDimension);
    }

    #[test]
    fn iris_are_keys() {
        let mut stats = PropertyStats::default();
        for value in 0..50 {
            stats.record(
                &NamedNode::new_unchecked(format!("http://example.com/{value}")).into(),
            );
        }
        assert_eq!(infer_role(&stats), DimensionRole::KeyDimension);
    }

    #[test]
    fn short_is_not_numeric() {
        assert!(!is_numeric_datatype(xsd::SHORT));
        assert!(is_numeric_datatype(xsd::LONG));
    }
}
