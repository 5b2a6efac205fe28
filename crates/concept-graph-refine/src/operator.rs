//! The downward refinement operator.
//!
//! One call to [`RefinementOperator::refine`] walks every conceptual node of
//! the current concept and proposes local changes:
//!
//! - **label specialization**: `⊤` becomes a top-level class or a small
//!   disjunction of them; a conjunct is swapped for one of its direct
//!   subclasses; a disjunct is swapped for a subclass or dropped
//! - **label addition**: a top-level class is added as a new conjunct
//! - **edge extension**: `∃R.⊤`, optionally `∃R⁻.⊤`, `∀R.⊤` and numeric
//!   data restrictions are attached
//! - **threshold tightening**: `≥ v` moves up, `≤ v` moves down
//!
//! Every change is applied to its own deep clone of the current concept, so
//! candidates never share state with the input or with each other. Node
//! handles survive cloning, which is how the counterpart of a node is found
//! inside the clone.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};

use concept_graph_core::{
    Comparison, ConceptExpr, ConceptGraph, ConceptNode, ConceptResult, DataProperty, Edge,
    NodeIndex, NodeRef, Numeric, PropertyExpr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::RefinementConfig;
use crate::error::RefineResult;
use crate::index::HierarchyIndex;
use crate::redundancy;
use crate::thresholds::DataThresholds;

/// Counters for one refinement call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementStats {
    /// Conceptual nodes whose local refinements were computed.
    pub nodes_visited: usize,

    /// Distinct candidates returned.
    pub candidates: usize,

    /// Candidates dropped as structurally equal to an earlier one (or to
    /// the input).
    pub duplicates: usize,

    /// Local changes rejected by a redundancy predicate.
    pub pruned_redundant: usize,

    /// Candidates over the length or depth budget.
    pub pruned_budget: usize,

    /// Node-level failures that were logged and skipped.
    pub errors: usize,

    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

/// Candidates of one refinement call plus its statistics.
#[derive(Debug, Clone, Default)]
pub struct RefinementRun {
    pub candidates: Vec<ConceptGraph>,
    pub stats: RefinementStats,
}

/// One local change to a node.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    AddConjunct(ConceptExpr),
    ReplaceConjunct { old: ConceptExpr, new: ConceptExpr },
    SetDisjuncts(BTreeSet<ConceptExpr>),
    /// Drop every disjunct and keep the last one as a conjunct.
    Promote(ConceptExpr),
    AddExistential(PropertyExpr),
    AddUniversal(PropertyExpr),
    AddData {
        comparison: Comparison,
        property: DataProperty,
        value: Numeric,
    },
    SetThreshold { terminal: NodeIndex, value: Numeric },
}

impl Step {
    fn apply(&self, graph: &mut ConceptGraph, node: NodeIndex) -> ConceptResult<()> {
        match self {
            Step::AddConjunct(label) => {
                graph.add_conjunct(node, label.clone())?;
            }
            Step::ReplaceConjunct { old, new } => graph.replace_conjunct(node, old, new.clone())?,
            Step::SetDisjuncts(set) => graph.set_disjuncts(node, set.iter().cloned())?,
            Step::Promote(label) => {
                graph.set_disjuncts(node, std::iter::empty())?;
                graph.add_conjunct(node, label.clone())?;
            }
            Step::AddExistential(p) => {
                graph.add_existential(node, p.clone())?;
            }
            Step::AddUniversal(p) => {
                graph.add_universal(node, p.clone())?;
            }
            Step::AddData {
                comparison,
                property,
                value,
            } => {
                graph.add_data_restriction(node, *comparison, property.clone(), *value)?;
            }
            Step::SetThreshold { terminal, value } => graph.set_threshold(*terminal, *value)?,
        }
        Ok(())
    }
}

/// Budgets and position of the node being refined.
#[derive(Debug, Clone, Copy)]
struct Budget {
    length: usize,
    max_length: usize,
    node_depth: usize,
    max_depth: usize,
}

/// Generates one-step specializations of concept graphs.
#[derive(Debug, Clone)]
pub struct RefinementOperator<'a> {
    index: &'a HierarchyIndex,
    config: RefinementConfig,
    thresholds: DataThresholds,
}

impl<'a> RefinementOperator<'a> {
    /// Validate `config` and bind it to `index`.
    pub fn new(index: &'a HierarchyIndex, config: RefinementConfig) -> RefineResult<Self> {
        config.validate()?;
        if config.use_negation && !index.uses_negation() {
            debug!("negation enabled but the index holds no complements");
        }
        Ok(Self {
            index,
            config,
            thresholds: DataThresholds::default(),
        })
    }

    /// Thresholds used for data restrictions.
    pub fn with_thresholds(mut self, thresholds: DataThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub fn index(&self) -> &HierarchyIndex {
        self.index
    }

    /// One-step specializations of `current` within the budgets, distinct up
    /// to structural equality. Empty if `current` is already over budget.
    pub fn refine(&self, current: &ConceptGraph, max_length: usize, max_depth: usize) -> Vec<ConceptGraph> {
        self.refine_with(current, max_length, max_depth, &AtomicBool::new(false))
            .candidates
    }

    /// Like [`RefinementOperator::refine`], with statistics and a
    /// cancellation flag checked before each node.
    pub fn refine_with(
        &self,
        current: &ConceptGraph,
        max_length: usize,
        max_depth: usize,
        cancel: &AtomicBool,
    ) -> RefinementRun {
        let mut run = RefinementRun::default();
        let length = current.length();
        let depth = current.depth();

        debug!(length, depth, max_length, max_depth, "refine_start");

        if length > max_length || depth > max_depth {
            debug!(length, depth, "refine_over_budget");
            return run;
        }

        let depths = current.depths();
        let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();

        for n in current.traverse() {
            if cancel.load(Ordering::Relaxed) {
                run.stats.cancelled = true;
                break;
            }
            run.stats.nodes_visited += 1;

            let budget = Budget {
                length,
                max_length,
                node_depth: depths.get(&n).copied().unwrap_or(0),
                max_depth,
            };
            let steps = match self.local_steps(current, n, budget, &mut run.stats) {
                Ok(steps) => steps,
                Err(e) => {
                    warn!(node = ?n, error = %e, "node_refinement_error");
                    run.stats.errors += 1;
                    continue;
                }
            };
            trace!(node = ?n, steps = steps.len(), "node_refinements");

            for step in steps {
                let mut candidate = current.clone();
                if let Err(e) = step.apply(&mut candidate, n) {
                    warn!(node = ?n, ?step, error = %e, "node_refinement_error");
                    run.stats.errors += 1;
                    continue;
                }
                if candidate.length() > max_length || candidate.depth() > max_depth {
                    run.stats.pruned_budget += 1;
                    continue;
                }
                if candidate == *current {
                    run.stats.duplicates += 1;
                    continue;
                }

                let bucket = buckets.entry(structural_hash(&candidate)).or_default();
                if bucket.iter().any(|&i| run.candidates[i] == candidate) {
                    run.stats.duplicates += 1;
                    continue;
                }
                bucket.push(run.candidates.len());
                run.candidates.push(candidate);
            }
        }

        run.stats.candidates = run.candidates.len();
        debug!(
            candidates = run.stats.candidates,
            nodes = run.stats.nodes_visited,
            duplicates = run.stats.duplicates,
            pruned_redundant = run.stats.pruned_redundant,
            pruned_budget = run.stats.pruned_budget,
            errors = run.stats.errors,
            cancelled = run.stats.cancelled,
            "refine_complete"
        );
        run
    }

    /// Whether any node of `graph` carries a redundant label.
    pub fn is_redundant(&self, graph: &ConceptGraph) -> RefineResult<bool> {
        Ok(redundancy::is_redundant(self.index, graph)?)
    }

    fn local_steps(
        &self,
        current: &ConceptGraph,
        n: NodeIndex,
        budget: Budget,
        stats: &mut RefinementStats,
    ) -> ConceptResult<Vec<Step>> {
        let node = current.node(n)?;
        let mut steps = Vec::new();
        if node.concept().is_terminal() {
            return Ok(steps);
        }

        if node.concept().has_empty_labels() {
            self.specialize_top(&node, budget, &mut steps, stats);
        } else {
            self.specialize_conjuncts(&node, &mut steps, stats);
            self.specialize_disjuncts(&node, &mut steps, stats);
            if budget.length + 2 <= budget.max_length {
                self.add_labels(&node, &mut steps, stats);
            }
        }

        if self.config.use_data_properties {
            self.tighten_thresholds(&node, &mut steps)?;
        }

        if budget.length < budget.max_length && budget.node_depth < budget.max_depth {
            self.extend_edges(&node, &mut steps, stats);
        }

        Ok(steps)
    }

    /// Labels the operator may place on `node`.
    fn allowed_label(&self, label: &ConceptExpr, node: &ConceptNode) -> bool {
        match label {
            ConceptExpr::Top | ConceptExpr::Bottom => false,
            ConceptExpr::Atomic(_) => true,
            ConceptExpr::Not(_) => self.config.use_negation && !node.is_lightweight(),
            _ => !node.is_lightweight(),
        }
    }

    fn specialize_top(&self, node: &NodeRef<'_>, budget: Budget, steps: &mut Vec<Step>, stats: &mut RefinementStats) {
        let room = (budget.max_length + 1).saturating_sub(budget.length);
        let concept = node.concept();

        let mut usable = Vec::new();
        for class in self.index.subclasses(&ConceptExpr::Top) {
            if !self.allowed_label(class, concept) || class.length() > room {
                continue;
            }
            if redundancy::check_edges(self.index, class, node).is_some() {
                stats.pruned_redundant += 1;
                continue;
            }
            steps.push(Step::AddConjunct(class.clone()));
            usable.push(class);
        }

        if self.config.use_disjunction && !concept.is_lightweight() {
            let sets = disjunction_sets(self.index, &usable, self.config.max_disjunction_size, room);
            steps.extend(sets.into_iter().map(Step::SetDisjuncts));
        }
    }

    fn specialize_conjuncts(&self, node: &NodeRef<'_>, steps: &mut Vec<Step>, stats: &mut RefinementStats) {
        let concept = node.concept();
        for old in concept.conjuncts() {
            for new in self.index.subclasses(old) {
                if !self.allowed_label(new, concept) {
                    continue;
                }
                if redundancy::check_conjunct(self.index, new, node, Some(old)).is_some() {
                    stats.pruned_redundant += 1;
                    continue;
                }
                steps.push(Step::ReplaceConjunct {
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }

    fn specialize_disjuncts(&self, node: &NodeRef<'_>, steps: &mut Vec<Step>, stats: &mut RefinementStats) {
        let concept = node.concept();
        let disjuncts = concept.disjuncts();

        for dropped in disjuncts {
            let rest: BTreeSet<ConceptExpr> = disjuncts.iter().filter(|d| *d != dropped).cloned().collect();

            for finer in self.index.subclasses(dropped) {
                if !self.allowed_label(finer, concept) {
                    continue;
                }
                if redundancy::subsumed_by_siblings(self.index, finer, &rest)
                    || redundancy::check_edges(self.index, finer, node).is_some()
                {
                    stats.pruned_redundant += 1;
                    continue;
                }
                let mut next = rest.clone();
                next.insert(finer.clone());
                steps.push(Step::SetDisjuncts(next));
            }

            // Dropping the only disjunct would generalize to ⊤.
            match rest.len() {
                0 => {}
                1 => {
                    let Some(last) = rest.first() else { continue };
                    let entailed = concept
                        .conjuncts()
                        .iter()
                        .any(|c| self.index.is_subclass_of(c, last));
                    if entailed {
                        steps.push(Step::SetDisjuncts(BTreeSet::new()));
                    } else if redundancy::disjoint_with_siblings(self.index, last, concept.conjuncts())
                        || redundancy::check_edges(self.index, last, node).is_some()
                    {
                        stats.pruned_redundant += 1;
                    } else {
                        steps.push(Step::Promote(last.clone()));
                    }
                }
                _ => steps.push(Step::SetDisjuncts(rest)),
            }
        }
    }

    fn add_labels(&self, node: &NodeRef<'_>, steps: &mut Vec<Step>, stats: &mut RefinementStats) {
        let concept = node.concept();
        for class in self.index.subclasses(&ConceptExpr::Top) {
            if !self.allowed_label(class, concept) || concept.conjuncts().contains(class) {
                continue;
            }
            if redundancy::check_conjunct(self.index, class, node, None).is_some() {
                stats.pruned_redundant += 1;
                continue;
            }
            steps.push(Step::AddConjunct(class.clone()));
        }
    }

    fn tighten_thresholds(&self, node: &NodeRef<'_>, steps: &mut Vec<Step>) -> ConceptResult<()> {
        for e in node.out_edges() {
            let Some(property) = e.edge.data_property() else {
                continue;
            };
            let value = node
                .graph()
                .concept(e.object)?
                .terminal_value()
                .and_then(|literal| literal.as_numeric());
            let Some(value) = value else { continue };

            let next = match e.edge {
                Edge::GreaterOrEqual(_) => self.thresholds.next_above(property, value),
                Edge::LessOrEqual(_) => self.thresholds.next_below(property, value),
                _ => None,
            };
            if let Some(value) = next {
                steps.push(Step::SetThreshold {
                    terminal: e.object,
                    value,
                });
            }
        }
        Ok(())
    }

    fn extend_edges(&self, node: &NodeRef<'_>, steps: &mut Vec<Step>, stats: &mut RefinementStats) {
        let concept = node.concept();
        let clashes = |domain: &BTreeSet<ConceptExpr>| {
            domain
                .iter()
                .any(|d| redundancy::disjoint_with_siblings(self.index, d, concept.conjuncts()))
        };

        let mut properties: Vec<PropertyExpr> = self.index.object_properties().iter().cloned().collect();
        if self.config.use_inverse_properties {
            properties.extend(self.index.object_properties().iter().map(PropertyExpr::inverse));
        }

        for p in properties {
            if self.config.use_universal_restriction && !concept.is_lightweight() {
                steps.push(Step::AddUniversal(p.clone()));
            }
            if clashes(self.index.domain(&p)) {
                stats.pruned_redundant += 1;
                continue;
            }
            steps.push(Step::AddExistential(p));
        }

        if self.config.use_data_properties && !concept.is_lightweight() {
            for property in self.thresholds.properties() {
                if clashes(self.index.data_domain(property)) {
                    stats.pruned_redundant += 1;
                    continue;
                }
                if let Some(min) = self.thresholds.min(property) {
                    steps.push(Step::AddData {
                        comparison: Comparison::GreaterOrEqual,
                        property: property.clone(),
                        value: min,
                    });
                }
                if let Some(max) = self.thresholds.max(property) {
                    steps.push(Step::AddData {
                        comparison: Comparison::LessOrEqual,
                        property: property.clone(),
                        value: max,
                    });
                }
            }
        }
    }
}

/// Disjunct sets of 2 to `max_size` members whose combined length fits
/// `room`. Members of a set are pairwise unrelated and never complementary.
fn disjunction_sets(
    index: &HierarchyIndex,
    members: &[&ConceptExpr],
    max_size: usize,
    room: usize,
) -> Vec<BTreeSet<ConceptExpr>> {
    let mut sets = Vec::new();
    let mut stack: Vec<(usize, Vec<usize>, usize)> = vec![(0, Vec::new(), 0)];

    while let Some((start, chosen, length)) = stack.pop() {
        if chosen.len() >= 2 {
            sets.push(chosen.iter().map(|&i| members[i].clone()).collect());
        }
        if chosen.len() >= max_size {
            continue;
        }
        for (i, candidate) in members.iter().enumerate().skip(start) {
            let extra = candidate.length() + usize::from(!chosen.is_empty());
            if length + extra > room {
                continue;
            }
            let compatible = chosen.iter().all(|&j| {
                let other = members[j];
                !index.are_related(candidate, other) && !complementary(candidate, other)
            });
            if !compatible {
                continue;
            }
            let mut next = chosen.clone();
            next.push(i);
            stack.push((i + 1, next, length + extra));
        }
    }

    sets
}

fn complementary(a: &ConceptExpr, b: &ConceptExpr) -> bool {
    match (a, b) {
        (ConceptExpr::Not(inner), other) | (other, ConceptExpr::Not(inner)) => inner.as_ref() == other,
        _ => false,
    }
}

fn structural_hash(graph: &ConceptGraph) -> u64 {
    let mut hasher = DefaultHasher::new();
    graph.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MemoryOracle;
    use concept_graph_core::{LabelOrder, OrderedFloat};

    fn atom(name: &str) -> ConceptExpr {
        ConceptExpr::atomic(name)
    }

    fn build(oracle: &MemoryOracle, negation: bool) -> HierarchyIndex {
        HierarchyIndex::build(oracle, &oracle.signature(), negation)
    }

    fn has_root_labels(candidates: &[ConceptGraph], conjuncts: &[&str], disjuncts: &[&str]) -> bool {
        let conj: BTreeSet<ConceptExpr> = conjuncts.iter().map(|c| atom(c)).collect();
        let disj: BTreeSet<ConceptExpr> = disjuncts.iter().map(|c| atom(c)).collect();
        candidates.iter().any(|g| {
            let root = g.root_ref();
            root.concept().conjuncts() == &conj && root.concept().disjuncts() == &disj && root.is_leaf()
        })
    }

    #[test]
    fn over_budget_input_yields_nothing() {
        let oracle = MemoryOracle::new().with_class("A");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::el()).unwrap();
        let g = ConceptGraph::from_expr(&ConceptExpr::and([atom("A"), atom("B")]));
        assert!(op.refine(&g, 2, 5).is_empty());
    }

    #[test]
    fn top_specializes_into_disjunctions() {
        let oracle = MemoryOracle::new().with_class("A").with_class("B").with_class("C");
        let index = build(&oracle, false);
        let config = RefinementConfig {
            use_universal_restriction: false,
            max_disjunction_size: 2,
            ..RefinementConfig::default()
        };
        let op = RefinementOperator::new(&index, config).unwrap();
        let out = op.refine(&ConceptGraph::universal(), 3, 0);

        assert!(has_root_labels(&out, &["A"], &[]));
        assert!(has_root_labels(&out, &[], &["A", "B"]));
        assert!(has_root_labels(&out, &[], &["B", "C"]));
        // Size capped at two.
        assert!(!has_root_labels(&out, &[], &["A", "B", "C"]));
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn related_classes_never_share_a_disjunction() {
        let oracle = MemoryOracle::new().with_class("A").with_subclass("B", "A").with_class("C");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::default()).unwrap();
        let out = op.refine(&ConceptGraph::universal(), 5, 0);
        assert!(has_root_labels(&out, &[], &["A", "C"]));
        // B is not a direct subclass of ⊤, so it only appears through A.
        assert!(!has_root_labels(&out, &[], &["A", "B"]));
    }

    #[test]
    fn disjunct_is_specialized_or_dropped() {
        let oracle = MemoryOracle::new()
            .with_class("A")
            .with_subclass("A1", "A")
            .with_class("B");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::default()).unwrap();
        let g = ConceptGraph::from_expr(&ConceptExpr::or([atom("A"), atom("B")]));
        let out = op.refine(&g, 3, 0);

        assert!(has_root_labels(&out, &[], &["A1", "B"]));
        // Dropping one of two disjuncts promotes the other to a conjunct.
        assert!(has_root_labels(&out, &["A"], &[]));
        assert!(has_root_labels(&out, &["B"], &[]));
    }

    #[test]
    fn entailed_disjunction_is_dropped_not_promoted() {
        let oracle = MemoryOracle::new()
            .with_class("A")
            .with_subclass("A1", "A")
            .with_class("B");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::default()).unwrap();
        let g = ConceptGraph::from_expr(&ConceptExpr::and([
            atom("A1"),
            ConceptExpr::or([atom("A"), atom("B")]),
        ]));
        let out = op.refine(&g, 5, 0);
        // Dropping B leaves A, which A1 already entails.
        assert!(has_root_labels(&out, &["A1"], &[]));
        assert!(!has_root_labels(&out, &["A", "A1"], &[]));
    }

    #[test]
    fn edges_respect_domain_and_depth() {
        let oracle = MemoryOracle::new()
            .with_class("Person")
            .with_class("Company")
            .with_disjoint("Person", "Company")
            .with_domain("worksFor", "Person")
            .with_object_property("owns");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::el()).unwrap();

        let company = ConceptGraph::from_expr(&atom("Company"));
        let out = op.refine(&company, 6, 1);
        let with_edge = |name: &str| {
            out.iter().any(|g| {
                g.root_ref()
                    .out_edges()
                    .iter()
                    .any(|e| e.edge == &Edge::Existential(PropertyExpr::named(name)))
            })
        };
        assert!(with_edge("owns"));
        assert!(!with_edge("worksFor"));

        // No room for another level.
        assert!(op.refine(&company, 6, 0).iter().all(|g| g.depth() == 0));
    }

    #[test]
    fn inverse_and_universal_edges_follow_config() {
        let oracle = MemoryOracle::new().with_object_property("r");
        let index = build(&oracle, false);
        let r = PropertyExpr::named("r");

        let op = RefinementOperator::new(&index, RefinementConfig::el()).unwrap();
        assert_eq!(op.refine(&ConceptGraph::universal(), 3, 1).len(), 1);

        let op = RefinementOperator::new(&index, RefinementConfig::full()).unwrap();
        let out = op.refine(&ConceptGraph::universal(), 3, 1);
        let kinds: BTreeSet<Edge> = out
            .iter()
            .flat_map(|g| g.root_ref().out_edges().into_iter().map(|e| e.edge.clone()))
            .collect();
        assert_eq!(
            kinds,
            BTreeSet::from([
                Edge::Existential(r.clone()),
                Edge::Existential(r.inverse()),
                Edge::Universal(r.clone()),
                Edge::Universal(r.inverse()),
            ])
        );
    }

    #[test]
    fn data_thresholds_are_added_and_tightened() {
        let oracle = MemoryOracle::new()
            .with_value("a", "age", concept_graph_core::Literal::number(18.0))
            .with_value("b", "age", concept_graph_core::Literal::number(30.0))
            .with_value("c", "age", concept_graph_core::Literal::number(65.0));
        let index = build(&oracle, false);
        let config = RefinementConfig {
            use_data_properties: true,
            ..RefinementConfig::el()
        };
        let thresholds = DataThresholds::collect(&oracle, &oracle.signature(), 8);
        let op = RefinementOperator::new(&index, config).unwrap().with_thresholds(thresholds);

        let out = op.refine(&ConceptGraph::universal(), 3, 1);
        assert_eq!(out.len(), 2);

        let mut at_least = ConceptGraph::universal();
        let root = at_least.root();
        at_least
            .add_data_restriction(root, Comparison::GreaterOrEqual, DataProperty::new("age"), OrderedFloat(18.0))
            .unwrap();
        let out = op.refine(&at_least, 3, 1);
        assert_eq!(out.len(), 1);
        let terminal = out[0].root_ref().out_edges()[0].object;
        assert_eq!(
            out[0].concept(terminal).unwrap(),
            &ConceptNode::Numeric(OrderedFloat(30.0))
        );
        assert!(out[0].is_more_specific_than(&at_least));
    }

    #[test]
    fn cancellation_stops_before_first_node() {
        let oracle = MemoryOracle::new().with_class("A");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::el()).unwrap();
        let run = op.refine_with(&ConceptGraph::universal(), 3, 1, &AtomicBool::new(true));
        assert!(run.stats.cancelled);
        assert!(run.candidates.is_empty());
        assert_eq!(run.stats.nodes_visited, 0);
    }

    #[test]
    fn stats_count_pruned_candidates() {
        let oracle = MemoryOracle::new()
            .with_class("A")
            .with_class("B")
            .with_disjoint("A", "B");
        let index = build(&oracle, false);
        let op = RefinementOperator::new(&index, RefinementConfig::el()).unwrap();
        let run = op.refine_with(
            &ConceptGraph::from_expr(&atom("A")),
            3,
            0,
            &AtomicBool::new(false),
        );
        assert!(run.candidates.is_empty());
        assert_eq!(run.stats.pruned_redundant, 1);
        assert_eq!(run.stats.nodes_visited, 1);
    }

    #[test]
    fn refinements_are_more_specific() {
        let oracle = MemoryOracle::new()
            .with_subclass("Employee", "Person")
            .with_class("Animal")
            .with_object_property("knows");
        let index = build(&oracle, true);
        let op = RefinementOperator::new(&index, RefinementConfig::default()).unwrap();
        assert!(index.label_subsumed(&atom("Employee"), &atom("Person")));

        let g = ConceptGraph::from_expr(&ConceptExpr::exists(PropertyExpr::named("knows"), atom("Person")));
        let out = op.refine(&g, 8, 2);
        assert!(!out.is_empty());
        for r in out {
            assert!(
                r.is_more_specific_than_in(&g, &index),
                "{} is not more specific than {}",
                r.canonical_expr().unwrap(),
                g.canonical_expr().unwrap()
            );
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let index = HierarchyIndex::default();
        let config = RefinementConfig {
            max_disjunction_size: 0,
            ..RefinementConfig::default()
        };
        assert!(RefinementOperator::new(&index, config).is_err());
    }
}
