//! Integration tests for concept-graph-refine using small in-memory ontologies.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use concept_graph_core::{ConceptExpr, ConceptGraph, Edge, PropertyExpr};
use concept_graph_refine::{
    redundancy, DataThresholds, HierarchyIndex, MemoryOracle, Redundancy, RefineError,
    RefinementConfig, RefinementOperator,
};

// ============================================================================
// Fixtures
// ============================================================================

fn atom(name: &str) -> ConceptExpr {
    ConceptExpr::atomic(name)
}

fn labels(names: &[&str]) -> BTreeSet<ConceptExpr> {
    names.iter().map(|n| atom(n)).collect()
}

/// An oracle plus the index built from it.
struct Ontology {
    oracle: MemoryOracle,
    index: HierarchyIndex,
}

impl Ontology {
    fn new(oracle: MemoryOracle) -> Self {
        Self::with_negation(oracle, false)
    }

    fn with_negation(oracle: MemoryOracle, negation: bool) -> Self {
        let index = HierarchyIndex::build(&oracle, &oracle.signature(), negation);
        Self { oracle, index }
    }

    fn operator(&self, config: RefinementConfig) -> RefinementOperator<'_> {
        let thresholds = DataThresholds::collect(&self.oracle, &self.oracle.signature(), config.max_data_thresholds);
        RefinementOperator::new(&self.index, config)
            .expect("valid config")
            .with_thresholds(thresholds)
    }
}

/// Route `tracing` events to the test output when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn staff() -> Ontology {
    Ontology::new(
        MemoryOracle::new()
            .with_subclass("Employee", "Person")
            .with_subclass("Manager", "Employee")
            .with_class("Company")
            .with_disjoint("Person", "Company")
            .with_domain("worksFor", "Person")
            .with_range("worksFor", "Company"),
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn universal_with_one_class_yields_exactly_that_class() {
    let ontology = Ontology::new(MemoryOracle::new().with_class("Person"));
    let op = ontology.operator(RefinementConfig::el());

    let out = op.refine(&ConceptGraph::universal(), 2, 2);

    assert_eq!(out.len(), 1);
    let root = out[0].root_ref();
    assert_eq!(root.concept().conjuncts(), &labels(&["Person"]));
    assert!(root.concept().disjuncts().is_empty());
    assert!(root.is_leaf());
}

#[test]
fn conjunct_is_replaced_by_direct_subclass() {
    let ontology = Ontology::new(MemoryOracle::new().with_subclass("Employee", "Person"));
    let person = ConceptGraph::from_expr(&atom("Person"));

    for config in [RefinementConfig::el(), RefinementConfig::default()] {
        let out = ontology.operator(config).refine(&person, 3, 1);

        assert!(out
            .iter()
            .any(|g| g.root_ref().concept().conjuncts() == &labels(&["Employee"])));
        // Person never comes back as both conjunct and disjunct.
        assert!(out.iter().all(|g| {
            let concept = g.root_ref().concept();
            !(concept.disjuncts().contains(&atom("Person")) && concept.conjuncts().contains(&atom("Person")))
        }));
        assert!(out.iter().all(|g| !g
            .root_ref()
            .concept()
            .conjuncts()
            .is_superset(&labels(&["Person", "Employee"]))));
    }
}

#[test]
fn disjoint_class_is_never_added() {
    let ontology = Ontology::new(
        MemoryOracle::new()
            .with_class("A")
            .with_class("B")
            .with_class("C")
            .with_disjoint("A", "B"),
    );
    let op = ontology.operator(RefinementConfig::default());
    let a = ConceptGraph::from_expr(&atom("A"));

    let out = op.refine(&a, 5, 1);

    assert!(out
        .iter()
        .any(|g| g.root_ref().concept().conjuncts() == &labels(&["A", "C"])));
    assert!(out
        .iter()
        .all(|g| !g.root_ref().concept().conjuncts().contains(&atom("B"))));
}

#[test]
fn independent_clones_receive_their_own_edge() {
    let current = ConceptGraph::from_expr(&atom("Person"));
    let r = PropertyExpr::named("R");

    let mut first = current.clone();
    let mut second = current.clone();
    let root = current.root();
    first.add_existential(root, r.clone()).unwrap();
    second.add_existential(root, r.clone()).unwrap();

    assert_ne!(first, current);
    assert_ne!(second, current);
    assert_eq!(current.edge_count(), 0);
    assert_eq!(current.length(), 1);

    // Same shape, separate storage.
    assert_eq!(first, second);
    first.add_conjunct(root, atom("Employee")).unwrap();
    assert_eq!(second.root_ref().concept().conjuncts(), &labels(&["Person"]));
    assert_ne!(first, second);
}

#[test]
fn operator_emits_each_edge_once() {
    let ontology = Ontology::new(MemoryOracle::new().with_class("Person").with_object_property("R"));
    let op = ontology.operator(RefinementConfig::el());
    let current = ConceptGraph::from_expr(&atom("Person"));

    let out = op.refine(&current, 5, 1);
    let with_edge: Vec<_> = out
        .iter()
        .filter(|g| {
            g.root_ref()
                .out_edges()
                .iter()
                .any(|e| e.edge == &Edge::Existential(PropertyExpr::named("R")))
        })
        .collect();

    assert_eq!(with_edge.len(), 1);
    assert_eq!(with_edge[0].length(), 5);
    assert_eq!(current.edge_count(), 0);
}

#[test]
fn nested_nodes_are_refined_in_place() {
    init_tracing();
    let ontology = staff();
    let op = ontology.operator(RefinementConfig::el());
    let current = ConceptGraph::from_expr(&ConceptExpr::and([
        atom("Employee"),
        ConceptExpr::exists(PropertyExpr::named("worksFor"), ConceptExpr::Top),
    ]));

    let out = op.refine(&current, 5, 1);

    let refined_filler = ConceptGraph::from_expr(&ConceptExpr::and([
        atom("Employee"),
        ConceptExpr::exists(PropertyExpr::named("worksFor"), atom("Company")),
    ]));
    assert!(out.contains(&refined_filler));

    // Person would clash with the Company range of worksFor.
    let clashing = ConceptGraph::from_expr(&ConceptExpr::and([
        atom("Employee"),
        ConceptExpr::exists(PropertyExpr::named("worksFor"), atom("Person")),
    ]));
    assert!(!out.contains(&clashing));

    for r in &out {
        assert!(!redundancy::is_redundant(&ontology.index, r).unwrap());
        assert!(r.is_more_specific_than_in(&current, &ontology.index));
    }
}

#[test]
fn post_hoc_redundancy_reports_the_reason() {
    let ontology = staff();
    let op = ontology.operator(RefinementConfig::el());
    let clash = ConceptGraph::from_expr(&ConceptExpr::and([atom("Company"), atom("Employee")]));

    assert!(op.is_redundant(&clash).unwrap());
    let (node, why) = redundancy::find_redundancy(&ontology.index, &clash).unwrap().unwrap();
    assert_eq!(node, clash.root());
    assert_eq!(why, Redundancy::DisjointWithSibling);
}

#[test]
fn run_statistics_match_candidates() {
    init_tracing();
    let ontology = staff();
    let op = ontology.operator(RefinementConfig::full());
    let current = ConceptGraph::from_expr(&atom("Person"));

    let run = op.refine_with(&current, 6, 2, &AtomicBool::new(false));

    assert!(!run.stats.cancelled);
    assert_eq!(run.stats.errors, 0);
    assert_eq!(run.stats.nodes_visited, 1);
    assert_eq!(run.stats.candidates, run.candidates.len());
    assert!(run.stats.pruned_redundant > 0);
    assert_eq!(run.candidates.len(), op.refine(&current, 6, 2).len());

    let json = serde_json::to_value(&run.stats).unwrap();
    assert_eq!(json["nodes_visited"], 1);
}

#[test]
fn cancelled_run_returns_nothing() {
    let ontology = staff();
    let op = ontology.operator(RefinementConfig::default());
    let run = op.refine_with(&ConceptGraph::universal(), 6, 2, &AtomicBool::new(true));
    assert!(run.stats.cancelled);
    assert!(run.candidates.is_empty());
}

#[test]
fn exhausted_budget_is_not_an_error() {
    let ontology = staff();
    let op = ontology.operator(RefinementConfig::default());
    let deep = ConceptGraph::from_expr(&ConceptExpr::exists(
        PropertyExpr::named("worksFor"),
        ConceptExpr::exists(PropertyExpr::named("worksFor"), ConceptExpr::Top),
    ));
    assert!(op.refine(&deep, 20, 1).is_empty());
    assert!(op.refine(&deep, 4, 5).is_empty());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn config_loads_from_toml_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "use_negation = false")?;
    writeln!(file, "use_inverse_properties = true")?;
    writeln!(file, "max_disjunction_size = 2")?;

    let config = RefinementConfig::load(file.path())?;
    assert!(!config.use_negation);
    assert!(config.use_inverse_properties);
    assert!(config.use_universal_restriction);
    assert_eq!(config.max_disjunction_size, 2);

    let ontology = Ontology::new(MemoryOracle::new().with_object_property("R"));
    let out = ontology.operator(config).refine(&ConceptGraph::universal(), 3, 1);
    assert_eq!(out.len(), 4);
    Ok(())
}

#[test]
fn invalid_config_file_is_rejected() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "use_disjunction = true")?;
    writeln!(file, "max_disjunction_size = 1")?;

    let err = RefinementConfig::load(file.path()).unwrap_err();
    assert!(matches!(
        err,
        RefineError::InvalidConfig {
            field: "max_disjunction_size",
            ..
        }
    ));
    Ok(())
}

#[test]
fn oracle_loaded_from_json_drives_the_same_refinements() -> Result<()> {
    let original = staff();
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(original.oracle.to_json_string()?.as_bytes())?;

    let loaded = Ontology::new(MemoryOracle::load(file.path())?);
    let current = ConceptGraph::from_expr(&atom("Employee"));

    let expected = original.operator(RefinementConfig::el()).refine(&current, 5, 1);
    let actual = loaded.operator(RefinementConfig::el()).refine(&current, 5, 1);
    assert_eq!(expected.len(), actual.len());
    assert!(expected.iter().all(|g| actual.contains(g)));
    Ok(())
}
