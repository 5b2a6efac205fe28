//! Background knowledge queried while building the hierarchy index.
//!
//! The [`Oracle`] trait is the read-only query surface of a reasoner. The
//! refinement code never calls it directly: everything it needs is copied
//! into a [`HierarchyIndex`](crate::HierarchyIndex) (and, for numeric data,
//! [`DataThresholds`](crate::DataThresholds)) once, before refinement starts.
//!
//! [`MemoryOracle`] answers the same queries from told facts held in memory.
//! It performs no inference beyond the transitive closure needed for
//! `instances_of`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use concept_graph_core::{ConceptExpr, DataProperty, Iri, Literal};
use serde::{Deserialize, Serialize};

use crate::error::RefineResult;

/// Read-only classification queries.
///
/// Class queries take full expressions so that `⊤` (and, for reasoners that
/// support it, complex classes) can be asked about; results are named
/// classes, `⊤` or `⊥`. Unknown terms answer with empty sets.
pub trait Oracle {
    /// Direct subclasses of `class`. A leaf may answer `{⊥}` or nothing.
    fn direct_subclasses(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr>;

    /// Direct superclasses of `class`. A root class answers `{⊤}`.
    fn direct_superclasses(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr>;

    /// Classes equivalent to `class`, excluding itself.
    fn equivalent_classes(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr>;

    /// Classes declared disjoint with `class`.
    fn disjoint_classes(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr>;

    /// Direct sub-properties of an object property.
    fn direct_subproperties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Direct super-properties of an object property.
    fn direct_superproperties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Properties equivalent to `property`, excluding itself.
    fn equivalent_properties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Properties declared disjoint with `property`.
    fn disjoint_properties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Named inverses of `property`.
    fn inverse_properties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Domain classes of an object property.
    fn property_domain(&self, property: &Iri) -> BTreeSet<ConceptExpr>;

    /// Range classes of an object property.
    fn property_range(&self, property: &Iri) -> BTreeSet<ConceptExpr>;

    /// Domain classes of a data property.
    fn data_property_domain(&self, property: &DataProperty) -> BTreeSet<ConceptExpr>;

    /// Individuals known to be instances of `class`.
    fn instances_of(&self, class: &ConceptExpr) -> BTreeSet<Iri>;

    /// Values an individual holds for a data property.
    fn data_property_values(&self, individual: &Iri, property: &DataProperty) -> BTreeSet<Literal>;
}

/// The vocabulary refinement is allowed to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Named classes.
    #[serde(default)]
    pub classes: BTreeSet<Iri>,
    /// Object properties.
    #[serde(default)]
    pub object_properties: BTreeSet<Iri>,
    /// Data properties.
    #[serde(default)]
    pub data_properties: BTreeSet<DataProperty>,
}

impl Signature {
    /// Whether `class` is `⊤`, `⊥`, or a named class of this signature.
    pub fn contains_class(&self, class: &ConceptExpr) -> bool {
        match class {
            ConceptExpr::Top | ConceptExpr::Bottom => true,
            ConceptExpr::Atomic(iri) => self.classes.contains(iri),
            _ => false,
        }
    }
}

/// Told facts held in memory.
///
/// Populate it with the chainable `with_*` methods, or deserialize it from
/// JSON. Symmetric facts (disjointness, equivalence, inverses) are stored in
/// both directions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryOracle {
    #[serde(default)]
    classes: BTreeSet<Iri>,
    /// class -> asserted direct superclasses
    #[serde(default)]
    superclasses: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    equivalents: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    disjoints: BTreeMap<Iri, BTreeSet<Iri>>,

    #[serde(default)]
    object_properties: BTreeSet<Iri>,
    #[serde(default)]
    superproperties: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    equivalent_properties: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    disjoint_properties: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    inverses: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    domains: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    ranges: BTreeMap<Iri, BTreeSet<Iri>>,

    #[serde(default)]
    data_properties: BTreeSet<DataProperty>,
    #[serde(default)]
    data_domains: BTreeMap<DataProperty, BTreeSet<Iri>>,

    /// individual -> asserted classes
    #[serde(default)]
    types: BTreeMap<Iri, BTreeSet<Iri>>,
    #[serde(default)]
    values: BTreeMap<Iri, BTreeMap<DataProperty, BTreeSet<Literal>>>,
}

fn link(map: &mut BTreeMap<Iri, BTreeSet<Iri>>, from: &Iri, to: &Iri) {
    map.entry(from.clone()).or_default().insert(to.clone());
}

fn named(set: Option<&BTreeSet<Iri>>) -> BTreeSet<ConceptExpr> {
    set.into_iter().flatten().cloned().map(ConceptExpr::Atomic).collect()
}

impl MemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON snapshot.
    pub fn from_json_str(content: &str) -> RefineResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a JSON snapshot from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> RefineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Render as a JSON snapshot.
    pub fn to_json_string(&self) -> RefineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Declare a class.
    pub fn with_class(mut self, class: impl Into<Iri>) -> Self {
        self.classes.insert(class.into());
        self
    }

    /// Declare `sub ⊑ sup` (both classes are declared as a side effect).
    pub fn with_subclass(mut self, sub: impl Into<Iri>, sup: impl Into<Iri>) -> Self {
        let (sub, sup) = (sub.into(), sup.into());
        self.classes.insert(sub.clone());
        self.classes.insert(sup.clone());
        link(&mut self.superclasses, &sub, &sup);
        self
    }

    /// Declare `a ≡ b`.
    pub fn with_equivalent(mut self, a: impl Into<Iri>, b: impl Into<Iri>) -> Self {
        let (a, b) = (a.into(), b.into());
        self.classes.insert(a.clone());
        self.classes.insert(b.clone());
        link(&mut self.equivalents, &a, &b);
        link(&mut self.equivalents, &b, &a);
        self
    }

    /// Declare `a ⊓ b ⊑ ⊥`.
    pub fn with_disjoint(mut self, a: impl Into<Iri>, b: impl Into<Iri>) -> Self {
        let (a, b) = (a.into(), b.into());
        self.classes.insert(a.clone());
        self.classes.insert(b.clone());
        link(&mut self.disjoints, &a, &b);
        link(&mut self.disjoints, &b, &a);
        self
    }

    /// Declare an object property.
    pub fn with_object_property(mut self, property: impl Into<Iri>) -> Self {
        self.object_properties.insert(property.into());
        self
    }

    /// Declare `sub ⊑ sup` between object properties.
    pub fn with_subproperty(mut self, sub: impl Into<Iri>, sup: impl Into<Iri>) -> Self {
        let (sub, sup) = (sub.into(), sup.into());
        self.object_properties.insert(sub.clone());
        self.object_properties.insert(sup.clone());
        link(&mut self.superproperties, &sub, &sup);
        self
    }

    /// Declare two object properties equivalent.
    pub fn with_equivalent_properties(mut self, a: impl Into<Iri>, b: impl Into<Iri>) -> Self {
        let (a, b) = (a.into(), b.into());
        self.object_properties.insert(a.clone());
        self.object_properties.insert(b.clone());
        link(&mut self.equivalent_properties, &a, &b);
        link(&mut self.equivalent_properties, &b, &a);
        self
    }

    /// Declare two object properties disjoint.
    pub fn with_disjoint_properties(mut self, a: impl Into<Iri>, b: impl Into<Iri>) -> Self {
        let (a, b) = (a.into(), b.into());
        self.object_properties.insert(a.clone());
        self.object_properties.insert(b.clone());
        link(&mut self.disjoint_properties, &a, &b);
        link(&mut self.disjoint_properties, &b, &a);
        self
    }

    /// Declare `a ≡ b⁻`.
    pub fn with_inverse(mut self, a: impl Into<Iri>, b: impl Into<Iri>) -> Self {
        let (a, b) = (a.into(), b.into());
        self.object_properties.insert(a.clone());
        self.object_properties.insert(b.clone());
        link(&mut self.inverses, &a, &b);
        link(&mut self.inverses, &b, &a);
        self
    }

    /// Declare a domain class for an object property.
    pub fn with_domain(mut self, property: impl Into<Iri>, class: impl Into<Iri>) -> Self {
        let (property, class) = (property.into(), class.into());
        self.object_properties.insert(property.clone());
        self.classes.insert(class.clone());
        link(&mut self.domains, &property, &class);
        self
    }

    /// Declare a range class for an object property.
    pub fn with_range(mut self, property: impl Into<Iri>, class: impl Into<Iri>) -> Self {
        let (property, class) = (property.into(), class.into());
        self.object_properties.insert(property.clone());
        self.classes.insert(class.clone());
        link(&mut self.ranges, &property, &class);
        self
    }

    /// Declare a data property.
    pub fn with_data_property(mut self, property: impl Into<DataProperty>) -> Self {
        self.data_properties.insert(property.into());
        self
    }

    /// Declare a domain class for a data property.
    pub fn with_data_domain(mut self, property: impl Into<DataProperty>, class: impl Into<Iri>) -> Self {
        let (property, class) = (property.into(), class.into());
        self.data_properties.insert(property.clone());
        self.classes.insert(class.clone());
        self.data_domains.entry(property).or_default().insert(class);
        self
    }

    /// Assert that `individual` is an instance of `class`.
    pub fn with_instance(mut self, individual: impl Into<Iri>, class: impl Into<Iri>) -> Self {
        let (individual, class) = (individual.into(), class.into());
        self.classes.insert(class.clone());
        link(&mut self.types, &individual, &class);
        self
    }

    /// Assert a data value for an individual. The individual is recorded even
    /// if it has no asserted class.
    pub fn with_value(
        mut self,
        individual: impl Into<Iri>,
        property: impl Into<DataProperty>,
        value: Literal,
    ) -> Self {
        let (individual, property) = (individual.into(), property.into());
        self.data_properties.insert(property.clone());
        self.types.entry(individual.clone()).or_default();
        self.values
            .entry(individual)
            .or_default()
            .entry(property)
            .or_default()
            .insert(value);
        self
    }

    /// Every declared term.
    pub fn signature(&self) -> Signature {
        Signature {
            classes: self.classes.clone(),
            object_properties: self.object_properties.clone(),
            data_properties: self.data_properties.clone(),
        }
    }

    /// `class` and every class asserted below it.
    fn descendants_or_self(&self, class: &Iri) -> BTreeSet<Iri> {
        let mut seen = BTreeSet::from([class.clone()]);
        let mut queue = VecDeque::from([class.clone()]);
        while let Some(c) = queue.pop_front() {
            for (sub, supers) in &self.superclasses {
                if supers.contains(&c) && seen.insert(sub.clone()) {
                    queue.push_back(sub.clone());
                }
            }
            for eq in self.equivalents.get(&c).into_iter().flatten() {
                if seen.insert(eq.clone()) {
                    queue.push_back(eq.clone());
                }
            }
        }
        seen
    }
}

impl Oracle for MemoryOracle {
    fn direct_subclasses(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr> {
        match class {
            ConceptExpr::Top => self
                .classes
                .iter()
                .filter(|c| self.superclasses.get(*c).map_or(true, BTreeSet::is_empty))
                .cloned()
                .map(ConceptExpr::Atomic)
                .collect(),
            ConceptExpr::Atomic(iri) => self
                .superclasses
                .iter()
                .filter(|(_, supers)| supers.contains(iri))
                .map(|(sub, _)| ConceptExpr::Atomic(sub.clone()))
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    fn direct_superclasses(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr> {
        match class {
            ConceptExpr::Atomic(iri) if self.classes.contains(iri) => {
                let supers = named(self.superclasses.get(iri));
                if supers.is_empty() {
                    BTreeSet::from([ConceptExpr::Top])
                } else {
                    supers
                }
            }
            ConceptExpr::Bottom => self
                .classes
                .iter()
                .filter(|c| !self.superclasses.values().any(|s| s.contains(*c)))
                .cloned()
                .map(ConceptExpr::Atomic)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    fn equivalent_classes(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr> {
        match class {
            ConceptExpr::Atomic(iri) => named(self.equivalents.get(iri)),
            _ => BTreeSet::new(),
        }
    }

    fn disjoint_classes(&self, class: &ConceptExpr) -> BTreeSet<ConceptExpr> {
        match class {
            ConceptExpr::Atomic(iri) => named(self.disjoints.get(iri)),
            _ => BTreeSet::new(),
        }
    }

    fn direct_subproperties(&self, property: &Iri) -> BTreeSet<Iri> {
        self.superproperties
            .iter()
            .filter(|(_, supers)| supers.contains(property))
            .map(|(sub, _)| sub.clone())
            .collect()
    }

    fn direct_superproperties(&self, property: &Iri) -> BTreeSet<Iri> {
        self.superproperties.get(property).cloned().unwrap_or_default()
    }

    fn equivalent_properties(&self, property: &Iri) -> BTreeSet<Iri> {
        self.equivalent_properties.get(property).cloned().unwrap_or_default()
    }

    fn disjoint_properties(&self, property: &Iri) -> BTreeSet<Iri> {
        self.disjoint_properties.get(property).cloned().unwrap_or_default()
    }

    fn inverse_properties(&self, property: &Iri) -> BTreeSet<Iri> {
        self.inverses.get(property).cloned().unwrap_or_default()
    }

    fn property_domain(&self, property: &Iri) -> BTreeSet<ConceptExpr> {
        named(self.domains.get(property))
    }

    fn property_range(&self, property: &Iri) -> BTreeSet<ConceptExpr> {
        named(self.ranges.get(property))
    }

    fn data_property_domain(&self, property: &DataProperty) -> BTreeSet<ConceptExpr> {
        named(self.data_domains.get(property))
    }

    fn instances_of(&self, class: &ConceptExpr) -> BTreeSet<Iri> {
        match class {
            ConceptExpr::Top => self.types.keys().cloned().collect(),
            ConceptExpr::Atomic(iri) => {
                let members = self.descendants_or_self(iri);
                self.types
                    .iter()
                    .filter(|(_, classes)| !classes.is_disjoint(&members))
                    .map(|(individual, _)| individual.clone())
                    .collect()
            }
            _ => BTreeSet::new(),
        }
    }

    fn data_property_values(&self, individual: &Iri, property: &DataProperty) -> BTreeSet<Literal> {
        self.values
            .get(individual)
            .and_then(|by_property| by_property.get(property))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &str) -> ConceptExpr {
        ConceptExpr::atomic(name)
    }

    fn family() -> MemoryOracle {
        MemoryOracle::new()
            .with_subclass("Employee", "Person")
            .with_subclass("Manager", "Employee")
            .with_class("Company")
            .with_disjoint("Person", "Company")
            .with_domain("worksFor", "Person")
            .with_range("worksFor", "Company")
            .with_instance("alice", "Manager")
            .with_instance("acme", "Company")
            .with_value("alice", "age", Literal::number(41.0))
    }

    #[test]
    fn top_subclasses_are_root_classes() {
        let oracle = family();
        assert_eq!(
            oracle.direct_subclasses(&ConceptExpr::Top),
            BTreeSet::from([atom("Company"), atom("Person")])
        );
        assert_eq!(
            oracle.direct_superclasses(&atom("Person")),
            BTreeSet::from([ConceptExpr::Top])
        );
    }

    #[test]
    fn direct_links_are_not_transitive() {
        let oracle = family();
        assert_eq!(
            oracle.direct_subclasses(&atom("Person")),
            BTreeSet::from([atom("Employee")])
        );
        assert!(oracle.direct_subclasses(&atom("Manager")).is_empty());
    }

    #[test]
    fn instances_include_subclass_members() {
        let oracle = family();
        assert_eq!(oracle.instances_of(&atom("Person")), BTreeSet::from([Iri::new("alice")]));
        assert_eq!(oracle.instances_of(&ConceptExpr::Top).len(), 2);
    }

    #[test]
    fn disjointness_is_symmetric() {
        let oracle = family();
        assert!(oracle.disjoint_classes(&atom("Company")).contains(&atom("Person")));
    }

    #[test]
    fn unknown_terms_answer_empty() {
        let oracle = family();
        assert!(oracle.direct_superclasses(&atom("Unicorn")).is_empty());
        assert!(oracle.property_domain(&Iri::new("nope")).is_empty());
    }

    #[test]
    fn json_snapshot_round_trip() {
        let oracle = family();
        let json = oracle.to_json_string().unwrap();
        let restored = MemoryOracle::from_json_str(&json).unwrap();
        assert_eq!(restored.signature(), oracle.signature());
        assert_eq!(
            restored.data_property_values(&Iri::new("alice"), &DataProperty::new("age")),
            BTreeSet::from([Literal::number(41.0)])
        );
    }
}
