//! Numeric thresholds for data restrictions.
//!
//! Collected once from the values individuals actually hold, sorted ascending
//! and deduplicated. When a property has more distinct values than the cap,
//! evenly spaced quantiles are kept (the extremes always survive).

use std::collections::{BTreeMap, BTreeSet};

use concept_graph_core::{ConceptExpr, DataProperty, Numeric};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::oracle::{Oracle, Signature};

/// Sorted candidate thresholds per data property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataThresholds {
    values: BTreeMap<DataProperty, Vec<Numeric>>,
}

impl DataThresholds {
    /// Collect the numeric values of every individual for every data property
    /// of `signature`. Non-numeric literals are ignored.
    pub fn collect<O: Oracle + ?Sized>(oracle: &O, signature: &Signature, max_per_property: usize) -> Self {
        let individuals = oracle.instances_of(&ConceptExpr::Top);
        let observed = signature.data_properties.iter().map(|property| {
            let values: BTreeSet<Numeric> = individuals
                .iter()
                .flat_map(|i| oracle.data_property_values(i, property))
                .filter_map(|literal| literal.as_numeric())
                .collect();
            (property.clone(), values)
        });
        let thresholds = Self::from_values(observed, max_per_property);
        debug!(
            properties = thresholds.values.len(),
            individuals = individuals.len(),
            "data_thresholds_collected"
        );
        thresholds
    }

    /// Build from explicit values.
    pub fn from_values<I, V>(observed: I, max_per_property: usize) -> Self
    where
        I: IntoIterator<Item = (DataProperty, V)>,
        V: IntoIterator<Item = Numeric>,
    {
        let mut values = BTreeMap::new();
        for (property, raw) in observed {
            let sorted: Vec<Numeric> = raw.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
            let kept = sample(sorted, max_per_property);
            if !kept.is_empty() {
                values.insert(property, kept);
            }
        }
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Thresholds of `property`, ascending.
    pub fn get(&self, property: &DataProperty) -> &[Numeric] {
        self.values.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Properties with at least one threshold.
    pub fn properties(&self) -> impl Iterator<Item = &DataProperty> {
        self.values.keys()
    }

    pub fn min(&self, property: &DataProperty) -> Option<Numeric> {
        self.get(property).first().copied()
    }

    pub fn max(&self, property: &DataProperty) -> Option<Numeric> {
        self.get(property).last().copied()
    }

    /// Smallest threshold strictly above `value`.
    pub fn next_above(&self, property: &DataProperty, value: Numeric) -> Option<Numeric> {
        let values = self.get(property);
        let at = values.partition_point(|v| *v <= value);
        values.get(at).copied()
    }

    /// Largest threshold strictly below `value`.
    pub fn next_below(&self, property: &DataProperty, value: Numeric) -> Option<Numeric> {
        let values = self.get(property);
        let at = values.partition_point(|v| *v < value);
        at.checked_sub(1).and_then(|i| values.get(i)).copied()
    }
}

/// Keep at most `max` of the ascending `sorted` values, evenly spaced.
fn sample(sorted: Vec<Numeric>, max: usize) -> Vec<Numeric> {
    let n = sorted.len();
    if max == 0 {
        return Vec::new();
    }
    if n <= max {
        return sorted;
    }
    if max == 1 {
        return vec![sorted[n / 2]];
    }
    (0..max)
        .map(|i| sorted[i * (n - 1) / (max - 1)])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MemoryOracle;
    use concept_graph_core::{Literal, OrderedFloat};

    fn age() -> DataProperty {
        DataProperty::new("age")
    }

    fn nums(values: &[f64]) -> Vec<Numeric> {
        values.iter().copied().map(OrderedFloat).collect()
    }

    #[test]
    fn values_are_sorted_and_deduplicated() {
        let t = DataThresholds::from_values([(age(), nums(&[30.0, 18.0, 30.0, 65.0]))], 10);
        assert_eq!(t.get(&age()), nums(&[18.0, 30.0, 65.0]).as_slice());
    }

    #[test]
    fn neighbours_are_strict() {
        let t = DataThresholds::from_values([(age(), nums(&[18.0, 30.0, 65.0]))], 10);
        assert_eq!(t.next_above(&age(), OrderedFloat(18.0)), Some(OrderedFloat(30.0)));
        assert_eq!(t.next_above(&age(), OrderedFloat(20.0)), Some(OrderedFloat(30.0)));
        assert_eq!(t.next_above(&age(), OrderedFloat(65.0)), None);
        assert_eq!(t.next_below(&age(), OrderedFloat(30.0)), Some(OrderedFloat(18.0)));
        assert_eq!(t.next_below(&age(), OrderedFloat(18.0)), None);
    }

    #[test]
    fn cap_keeps_extremes() {
        let raw: Vec<f64> = (0..100).map(f64::from).collect();
        let t = DataThresholds::from_values([(age(), nums(&raw))], 5);
        let kept = t.get(&age());
        assert_eq!(kept.len(), 5);
        assert_eq!(kept.first(), Some(&OrderedFloat(0.0)));
        assert_eq!(kept.last(), Some(&OrderedFloat(99.0)));
    }

    #[test]
    fn collects_numeric_values_from_oracle() {
        let oracle = MemoryOracle::new()
            .with_value("alice", "age", Literal::number(41.0))
            .with_value("bob", "age", Literal::number(17.0))
            .with_value("bob", "age", Literal::Text("unknown".into()));
        let t = DataThresholds::collect(&oracle, &oracle.signature(), 8);
        assert_eq!(t.get(&age()), nums(&[17.0, 41.0]).as_slice());
        assert_eq!(t.min(&age()), Some(OrderedFloat(17.0)));
        assert_eq!(t.max(&age()), Some(OrderedFloat(41.0)));
    }
}
