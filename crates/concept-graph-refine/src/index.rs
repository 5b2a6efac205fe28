//! Precomputed class and property hierarchy.
//!
//! Built once from an [`Oracle`] and read-only afterwards. Every lookup is a
//! hash-map access; terms the index has never seen answer with empty sets,
//! so redundancy checks on them fail open.
//!
//! With negation enabled, every named class `A` also gets a synthetic
//! complement `¬A` whose hierarchy mirrors that of `A`:
//!
//! ```text
//! sub(¬A)   = { ¬B | B ∈ super(A), B ≠ ⊤ }   or {⊥} if A sits right below ⊤
//! super(¬A) = { ¬C | C ∈ sub(A),   C ≠ ⊥ }   or {⊤} if A is a leaf
//! ```
//!
//! so complements of leaves become direct subclasses of `⊤`.

use std::collections::{BTreeSet, HashMap, VecDeque};

use concept_graph_core::{ConceptExpr, DataProperty, Iri, LabelOrder, PropertyExpr};
use tracing::info;

use crate::oracle::{Oracle, Signature};

static NO_CLASSES: BTreeSet<ConceptExpr> = BTreeSet::new();
static NO_PROPERTIES: BTreeSet<PropertyExpr> = BTreeSet::new();

type ClassMap = HashMap<ConceptExpr, BTreeSet<ConceptExpr>>;
type PropertyMap = HashMap<PropertyExpr, BTreeSet<PropertyExpr>>;

/// Direct class and property relations plus transitive ancestors.
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    subclasses: ClassMap,
    superclasses: ClassMap,
    equivalents: ClassMap,
    disjoints: ClassMap,
    ancestors: ClassMap,

    subproperties: PropertyMap,
    superproperties: PropertyMap,
    equivalent_properties: PropertyMap,
    disjoint_properties: PropertyMap,
    inverse_properties: PropertyMap,
    domains: HashMap<PropertyExpr, BTreeSet<ConceptExpr>>,
    ranges: HashMap<PropertyExpr, BTreeSet<ConceptExpr>>,
    data_domains: HashMap<DataProperty, BTreeSet<ConceptExpr>>,

    object_properties: BTreeSet<PropertyExpr>,
    data_properties: BTreeSet<DataProperty>,
    negation: bool,
}

impl HierarchyIndex {
    /// Query `oracle` for every term of `signature`.
    pub fn build<O: Oracle + ?Sized>(oracle: &O, signature: &Signature, use_negation: bool) -> Self {
        let mut index = Self {
            negation: use_negation,
            ..Default::default()
        };
        let in_signature = |c: &ConceptExpr| signature.contains_class(c);

        let top = ConceptExpr::Top;
        let top_subs: BTreeSet<ConceptExpr> = oracle
            .direct_subclasses(&top)
            .into_iter()
            .filter(|c| in_signature(c) && !c.is_bottom())
            .collect();
        index.subclasses.insert(top, top_subs);

        for iri in &signature.classes {
            let class = ConceptExpr::Atomic(iri.clone());
            let subs = oracle
                .direct_subclasses(&class)
                .into_iter()
                .filter(|c| in_signature(c))
                .collect();
            let mut supers: BTreeSet<ConceptExpr> = oracle
                .direct_superclasses(&class)
                .into_iter()
                .filter(|c| in_signature(c))
                .collect();
            if supers.is_empty() {
                supers.insert(ConceptExpr::Top);
            }
            let equivalents = oracle
                .equivalent_classes(&class)
                .into_iter()
                .filter(|c| in_signature(c) && c != &class)
                .collect();
            let disjoints = oracle
                .disjoint_classes(&class)
                .into_iter()
                .filter(|c| in_signature(c))
                .collect();

            index.subclasses.insert(class.clone(), subs);
            index.superclasses.insert(class.clone(), supers);
            index.equivalents.insert(class.clone(), equivalents);
            index.disjoints.insert(class, disjoints);
        }

        if use_negation {
            index.add_complements(signature);
        }
        index.close_ancestors();
        index.add_properties(oracle, signature);

        info!(
            classes = signature.classes.len(),
            object_properties = signature.object_properties.len(),
            data_properties = signature.data_properties.len(),
            negation = use_negation,
            "index_build_complete"
        );
        index
    }

    fn add_complements(&mut self, signature: &Signature) {
        let mut top_additions = Vec::new();
        for iri in &signature.classes {
            let class = ConceptExpr::Atomic(iri.clone());
            let negated = ConceptExpr::not(class.clone());

            let mut subs: BTreeSet<ConceptExpr> = self
                .superclasses(&class)
                .iter()
                .filter(|b| !b.is_top())
                .map(|b| ConceptExpr::not(b.clone()))
                .collect();
            if subs.is_empty() {
                subs.insert(ConceptExpr::Bottom);
            }

            let mut supers: BTreeSet<ConceptExpr> = self
                .subclasses(&class)
                .iter()
                .filter(|c| !c.is_bottom())
                .map(|c| ConceptExpr::not(c.clone()))
                .collect();
            if supers.is_empty() {
                supers.insert(ConceptExpr::Top);
                top_additions.push(negated.clone());
            }

            let equivalents = self
                .equivalents(&class)
                .iter()
                .map(|e| ConceptExpr::not(e.clone()))
                .collect();

            self.subclasses.insert(negated.clone(), subs);
            self.superclasses.insert(negated.clone(), supers);
            self.equivalents.insert(negated.clone(), equivalents);
            self.disjoints.entry(negated.clone()).or_default().insert(class.clone());
            self.disjoints.entry(class).or_default().insert(negated);
        }
        self.subclasses
            .entry(ConceptExpr::Top)
            .or_default()
            .extend(top_additions);
    }

    /// Transitive superclasses (through equivalences too) of every class.
    fn close_ancestors(&mut self) {
        let keys: Vec<ConceptExpr> = self.superclasses.keys().cloned().collect();
        for class in keys {
            let mut seen = BTreeSet::new();
            let mut queue = VecDeque::from([class.clone()]);
            while let Some(c) = queue.pop_front() {
                let next = self.superclasses(&c).iter().chain(self.equivalents(&c));
                for n in next {
                    if n != &class && seen.insert(n.clone()) {
                        queue.push_back(n.clone());
                    }
                }
            }
            self.ancestors.insert(class, seen);
        }
    }

    fn add_properties<O: Oracle + ?Sized>(&mut self, oracle: &O, signature: &Signature) {
        let known = |set: BTreeSet<Iri>| -> BTreeSet<PropertyExpr> {
            set.into_iter()
                .filter(|p| signature.object_properties.contains(p))
                .map(PropertyExpr::named)
                .collect()
        };
        let flip = |set: &BTreeSet<PropertyExpr>| -> BTreeSet<PropertyExpr> {
            set.iter().map(PropertyExpr::inverse).collect()
        };
        let classes = |set: BTreeSet<ConceptExpr>| -> BTreeSet<ConceptExpr> {
            set.into_iter().filter(|c| signature.contains_class(c)).collect()
        };

        for iri in &signature.object_properties {
            let forward = PropertyExpr::named(iri.clone());
            let backward = forward.inverse();

            let subs = known(oracle.direct_subproperties(iri));
            let supers = known(oracle.direct_superproperties(iri));
            let equivalents = known(oracle.equivalent_properties(iri));
            let disjoints = known(oracle.disjoint_properties(iri));
            let inverses = known(oracle.inverse_properties(iri));
            let domain = classes(oracle.property_domain(iri));
            let range = classes(oracle.property_range(iri));

            // R⁻ mirrors R: sub(R⁻) = sub(R)⁻, domain(R⁻) = range(R), ...
            self.subproperties.insert(backward.clone(), flip(&subs));
            self.superproperties.insert(backward.clone(), flip(&supers));
            self.equivalent_properties.insert(backward.clone(), flip(&equivalents));
            self.disjoint_properties.insert(backward.clone(), flip(&disjoints));
            let mut backward_inverses = flip(&inverses);
            backward_inverses.insert(forward.clone());
            self.inverse_properties.insert(backward.clone(), backward_inverses);
            self.domains.insert(backward.clone(), range.clone());
            self.ranges.insert(backward, domain.clone());

            let mut inverse_exprs = inverses;
            inverse_exprs.insert(forward.inverse());
            self.subproperties.insert(forward.clone(), subs);
            self.superproperties.insert(forward.clone(), supers);
            self.equivalent_properties.insert(forward.clone(), equivalents);
            self.disjoint_properties.insert(forward.clone(), disjoints);
            self.inverse_properties.insert(forward.clone(), inverse_exprs);
            self.domains.insert(forward.clone(), domain);
            self.ranges.insert(forward.clone(), range);
            self.object_properties.insert(forward);
        }

        for property in &signature.data_properties {
            self.data_domains
                .insert(property.clone(), classes(oracle.data_property_domain(property)));
            self.data_properties.insert(property.clone());
        }
    }

    // =========================================================================
    // Class lookups
    // =========================================================================

    /// Direct subclasses. `subclasses(&ConceptExpr::Top)` lists the most
    /// general named classes (and, with negation, complements of leaves).
    pub fn subclasses(&self, class: &ConceptExpr) -> &BTreeSet<ConceptExpr> {
        self.subclasses.get(class).unwrap_or(&NO_CLASSES)
    }

    pub fn superclasses(&self, class: &ConceptExpr) -> &BTreeSet<ConceptExpr> {
        self.superclasses.get(class).unwrap_or(&NO_CLASSES)
    }

    pub fn equivalents(&self, class: &ConceptExpr) -> &BTreeSet<ConceptExpr> {
        self.equivalents.get(class).unwrap_or(&NO_CLASSES)
    }

    /// Classes told disjoint with `class` (not closed under subclassing; see
    /// [`HierarchyIndex::are_disjoint`]).
    pub fn disjoints(&self, class: &ConceptExpr) -> &BTreeSet<ConceptExpr> {
        self.disjoints.get(class).unwrap_or(&NO_CLASSES)
    }

    /// Every strict superclass, `⊤` included for known classes.
    pub fn ancestors(&self, class: &ConceptExpr) -> &BTreeSet<ConceptExpr> {
        self.ancestors.get(class).unwrap_or(&NO_CLASSES)
    }

    /// Whether the index was built with complements.
    pub fn uses_negation(&self) -> bool {
        self.negation
    }

    /// `specific ⊑ general` as far as the index knows. Disjunctions are
    /// compared member-wise.
    pub fn is_subclass_of(&self, specific: &ConceptExpr, general: &ConceptExpr) -> bool {
        if specific == general || general.is_top() || specific.is_bottom() {
            return true;
        }
        match (specific, general) {
            (ConceptExpr::Or(members), _) => members.iter().all(|m| self.is_subclass_of(m, general)),
            (_, ConceptExpr::Or(members)) => members.iter().any(|m| self.is_subclass_of(specific, m)),
            (ConceptExpr::And(members), _) => members.iter().any(|m| self.is_subclass_of(m, general)),
            _ => {
                self.ancestors(specific).contains(general) || self.equivalents(specific).contains(general)
            }
        }
    }

    /// Whether `a` and `b` are related by equality, equivalence or
    /// subsumption in either direction.
    pub fn are_related(&self, a: &ConceptExpr, b: &ConceptExpr) -> bool {
        self.is_subclass_of(a, b) || self.is_subclass_of(b, a)
    }

    /// Whether `a ⊓ b` is unsatisfiable according to told disjointness,
    /// inherited down the hierarchy, and complement pairs.
    pub fn are_disjoint(&self, a: &ConceptExpr, b: &ConceptExpr) -> bool {
        if a.is_bottom() || b.is_bottom() {
            return true;
        }
        if a.is_top() || b.is_top() {
            return false;
        }
        if let ConceptExpr::Not(inner) = a {
            if self.is_subclass_of(b, inner) {
                return true;
            }
        }
        if let ConceptExpr::Not(inner) = b {
            if self.is_subclass_of(a, inner) {
                return true;
            }
        }
        let a_side = std::iter::once(a).chain(self.ancestors(a));
        a_side
            .flat_map(|x| self.disjoints(x))
            .any(|d| d == b || self.is_subclass_of(b, d))
    }

    // =========================================================================
    // Property lookups
    // =========================================================================

    /// Named object properties of the signature, forward direction.
    pub fn object_properties(&self) -> &BTreeSet<PropertyExpr> {
        &self.object_properties
    }

    pub fn data_properties(&self) -> &BTreeSet<DataProperty> {
        &self.data_properties
    }

    pub fn subproperties(&self, property: &PropertyExpr) -> &BTreeSet<PropertyExpr> {
        self.subproperties.get(property).unwrap_or(&NO_PROPERTIES)
    }

    pub fn superproperties(&self, property: &PropertyExpr) -> &BTreeSet<PropertyExpr> {
        self.superproperties.get(property).unwrap_or(&NO_PROPERTIES)
    }

    pub fn equivalent_properties(&self, property: &PropertyExpr) -> &BTreeSet<PropertyExpr> {
        self.equivalent_properties.get(property).unwrap_or(&NO_PROPERTIES)
    }

    pub fn disjoint_properties(&self, property: &PropertyExpr) -> &BTreeSet<PropertyExpr> {
        self.disjoint_properties.get(property).unwrap_or(&NO_PROPERTIES)
    }

    /// Inverse property expressions; always contains the syntactic inverse
    /// for known properties.
    pub fn inverse_properties(&self, property: &PropertyExpr) -> &BTreeSet<PropertyExpr> {
        self.inverse_properties.get(property).unwrap_or(&NO_PROPERTIES)
    }

    /// Domain of a property expression; for `R⁻` this is the range of `R`.
    pub fn domain(&self, property: &PropertyExpr) -> &BTreeSet<ConceptExpr> {
        self.domains.get(property).unwrap_or(&NO_CLASSES)
    }

    /// Range of a property expression; for `R⁻` this is the domain of `R`.
    pub fn range(&self, property: &PropertyExpr) -> &BTreeSet<ConceptExpr> {
        self.ranges.get(property).unwrap_or(&NO_CLASSES)
    }

    pub fn data_domain(&self, property: &DataProperty) -> &BTreeSet<ConceptExpr> {
        self.data_domains.get(property).unwrap_or(&NO_CLASSES)
    }
}

impl LabelOrder for HierarchyIndex {
    fn label_subsumed(&self, specific: &ConceptExpr, general: &ConceptExpr) -> bool {
        self.is_subclass_of(specific, general)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MemoryOracle;

    fn atom(name: &str) -> ConceptExpr {
        ConceptExpr::atomic(name)
    }

    fn not(name: &str) -> ConceptExpr {
        ConceptExpr::not(atom(name))
    }

    fn oracle() -> MemoryOracle {
        MemoryOracle::new()
            .with_subclass("Employee", "Person")
            .with_subclass("Manager", "Employee")
            .with_class("Company")
            .with_disjoint("Person", "Company")
            .with_domain("worksFor", "Person")
            .with_range("worksFor", "Company")
    }

    fn index(negation: bool) -> HierarchyIndex {
        let oracle = oracle();
        HierarchyIndex::build(&oracle, &oracle.signature(), negation)
    }

    #[test]
    fn top_lists_root_classes() {
        let idx = index(false);
        assert_eq!(
            idx.subclasses(&ConceptExpr::Top),
            &BTreeSet::from([atom("Company"), atom("Person")])
        );
    }

    #[test]
    fn ancestors_are_transitive() {
        let idx = index(false);
        assert!(idx.is_subclass_of(&atom("Manager"), &atom("Person")));
        assert!(!idx.is_subclass_of(&atom("Person"), &atom("Manager")));
        assert!(idx.ancestors(&atom("Manager")).contains(&ConceptExpr::Top));
    }

    #[test]
    fn disjointness_is_inherited() {
        let idx = index(false);
        assert!(idx.are_disjoint(&atom("Manager"), &atom("Company")));
        assert!(idx.are_disjoint(&atom("Company"), &atom("Employee")));
        assert!(!idx.are_disjoint(&atom("Manager"), &atom("Person")));
    }

    #[test]
    fn complements_mirror_the_hierarchy() {
        let idx = index(true);
        // Manager is a leaf, so ¬Manager sits right below ⊤.
        assert!(idx.subclasses(&ConceptExpr::Top).contains(&not("Manager")));
        assert!(idx.subclasses(&ConceptExpr::Top).contains(&not("Company")));
        assert!(!idx.subclasses(&ConceptExpr::Top).contains(&not("Person")));
        // ¬Person ⊑ ¬Employee ⊑ ¬Manager
        assert_eq!(idx.subclasses(&not("Manager")), &BTreeSet::from([not("Employee")]));
        assert_eq!(idx.subclasses(&not("Person")), &BTreeSet::from([ConceptExpr::Bottom]));
        assert!(idx.is_subclass_of(&not("Person"), &not("Manager")));
        assert!(idx.are_disjoint(&atom("Person"), &not("Person")));
        assert!(idx.are_disjoint(&atom("Manager"), &not("Person")));
    }

    #[test]
    fn inverse_swaps_domain_and_range() {
        let idx = index(false);
        let works_for = PropertyExpr::named("worksFor");
        assert_eq!(idx.domain(&works_for), &BTreeSet::from([atom("Person")]));
        assert_eq!(idx.domain(&works_for.inverse()), &BTreeSet::from([atom("Company")]));
        assert!(idx.inverse_properties(&works_for).contains(&works_for.inverse()));
    }

    #[test]
    fn unknown_terms_fail_open() {
        let idx = index(true);
        let unicorn = atom("Unicorn");
        assert!(idx.subclasses(&unicorn).is_empty());
        assert!(!idx.are_disjoint(&unicorn, &atom("Person")));
        assert!(!idx.are_related(&unicorn, &atom("Person")));
    }

    #[test]
    fn hierarchy_aware_structural_order() {
        use concept_graph_core::ConceptGraph;
        let idx = index(false);
        let manager = ConceptGraph::from_expr(&atom("Manager"));
        let person = ConceptGraph::from_expr(&atom("Person"));
        assert!(manager.is_more_specific_than_in(&person, &idx));
        assert!(!person.is_more_specific_than_in(&manager, &idx));
    }
}
