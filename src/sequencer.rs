use indexmap::IndexMap;
use std::collections::HashMap;

use crate::error::{DevSweepError, Result};

/// A node in a pipeline stage graph.
///
/// Implemented by both stage summary types so the same ordering routine
/// covers build and deployment pipelines.
pub trait StageNode {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    /// Ids of the stages this stage depends on. Entries equal to the stage's
    /// own id or to the owning pipeline's id are containment artifacts of the
    /// remote service, not dependency edges, and are skipped.
    fn predecessor_ids(&self) -> Vec<&str>;
}

/// Computes a deletion-safe order for a set of pipeline stages: a stage
/// appears strictly before every stage it depends on, so deleting stages in
/// the returned order never removes a stage while a dependent still exists.
///
/// `owner_id` is the id of the enclosing pipeline; the remote service lists
/// it among stage predecessors and it must not be treated as an edge.
///
/// Ready stages surface in input order, but the only guarantee callers get is
/// dependents-before-dependencies; the relative order of independent stages
/// is unspecified.
///
/// # Errors
///
/// Returns [`DevSweepError::InconsistentPipeline`] when the remaining stages
/// contain a true cycle, i.e. no stage without dependents can be found.
pub fn deletion_order<'a, T: StageNode>(
    stages: &'a [T],
    owner_id: Option<&str>,
) -> Result<Vec<&'a T>> {
    let mut by_id: HashMap<&str, &T> = HashMap::with_capacity(stages.len());

    // Count, for each stage, how many other stages still list it as a
    // predecessor. Leaf stages (count 0) are safe to delete first.
    let mut rev_deps: IndexMap<&str, usize> = IndexMap::with_capacity(stages.len());
    for stage in stages {
        by_id.insert(stage.id(), stage);
        rev_deps.entry(stage.id()).or_insert(0);
        for pred in stage.predecessor_ids() {
            if pred == stage.id() || Some(pred) == owner_id {
                continue;
            }
            *rev_deps.entry(pred).or_insert(0) += 1;
        }
    }

    let mut ordered: Vec<&T> = Vec::with_capacity(stages.len());
    while !rev_deps.is_empty() {
        let ready: Vec<&str> = rev_deps
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();

        if ready.is_empty() {
            return Err(DevSweepError::InconsistentPipeline);
        }

        for id in ready {
            rev_deps.shift_remove(id);
            // Predecessor references may point outside the stage set; such
            // ids get counted but have nothing to delete.
            let Some(stage) = by_id.get(id).copied() else {
                continue;
            };
            ordered.push(stage);
            for pred in stage.predecessor_ids() {
                if pred == stage.id() || Some(pred) == owner_id {
                    continue;
                }
                let count = rev_deps.get(pred).copied().unwrap_or(1);
                rev_deps.insert(pred, count.saturating_sub(1));
            }
        }
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStage {
        id: String,
        name: String,
        predecessors: Vec<String>,
    }

    impl StageNode for TestStage {
        fn id(&self) -> &str {
            &self.id
        }

        fn display_name(&self) -> &str {
            &self.name
        }

        fn predecessor_ids(&self) -> Vec<&str> {
            self.predecessors.iter().map(String::as_str).collect()
        }
    }

    fn stage(id: &str, predecessors: &[&str]) -> TestStage {
        TestStage {
            id: id.to_string(),
            name: format!("stage {id}"),
            predecessors: predecessors.iter().map(ToString::to_string).collect(),
        }
    }

    fn position(ordered: &[&TestStage], id: &str) -> usize {
        ordered
            .iter()
            .position(|s| s.id == id)
            .unwrap_or_else(|| panic!("stage {id} missing from output"))
    }

    #[cfg(test)]
    mod deletion_order {
        use super::*;

        #[test]
        fn chain_orders_dependents_first() {
            let stages = vec![stage("A", &["B"]), stage("B", &["C"]), stage("C", &[])];

            let ordered = deletion_order(&stages, None).unwrap();

            let ids: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["A", "B", "C"], "Chain has a single valid order");
        }

        #[test]
        fn shared_predecessor_is_deleted_last() {
            let stages = vec![stage("A", &["C"]), stage("B", &["C"]), stage("C", &[])];

            let ordered = deletion_order(&stages, None).unwrap();

            assert_eq!(ordered.len(), 3);
            assert!(
                position(&ordered, "A") < position(&ordered, "C"),
                "A depends on C, so A must be deleted before C"
            );
            assert!(
                position(&ordered, "B") < position(&ordered, "C"),
                "B depends on C, so B must be deleted before C"
            );
        }

        #[test]
        fn self_reference_is_ignored() {
            let stages = vec![stage("A", &["A"])];

            let ordered = deletion_order(&stages, None).unwrap();

            assert_eq!(ordered.len(), 1);
            assert_eq!(ordered[0].id, "A", "Self-reference must not report a cycle");
        }

        #[test]
        fn owner_reference_is_ignored() {
            let stages = vec![stage("A", &["pipeline-1"]), stage("B", &["A", "pipeline-1"])];

            let ordered = deletion_order(&stages, Some("pipeline-1")).unwrap();

            assert_eq!(ordered.len(), 2);
            assert!(
                position(&ordered, "B") < position(&ordered, "A"),
                "B depends on A, so B must be deleted before A"
            );
        }

        #[test]
        fn owner_reference_without_matching_stage_is_tolerated() {
            let stages = vec![stage("A", &["P"])];

            let ordered = deletion_order(&stages, Some("P")).unwrap();

            let ids: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["A"]);
        }

        #[test]
        fn cycle_is_rejected() {
            let stages = vec![stage("A", &["B"]), stage("B", &["A"])];

            let result = deletion_order(&stages, None);

            assert!(matches!(
                result,
                Err(DevSweepError::InconsistentPipeline)
            ));
        }

        #[test]
        fn cycle_inside_larger_graph_is_rejected() {
            let stages = vec![
                stage("A", &[]),
                stage("B", &["C"]),
                stage("C", &["D"]),
                stage("D", &["B"]),
            ];

            let result = deletion_order(&stages, None);

            assert!(
                matches!(result, Err(DevSweepError::InconsistentPipeline)),
                "A is a leaf but B/C/D form a cycle"
            );
        }

        #[test]
        fn dangling_predecessor_is_tolerated() {
            let stages = vec![stage("A", &["missing"]), stage("B", &["A"])];

            let ordered = deletion_order(&stages, None).unwrap();

            assert_eq!(ordered.len(), 2, "Unknown ids are counted but never emitted");
            assert!(position(&ordered, "B") < position(&ordered, "A"));
        }

        #[test]
        fn empty_input_yields_empty_order() {
            let stages: Vec<TestStage> = vec![];

            let ordered = deletion_order(&stages, None).unwrap();

            assert!(ordered.is_empty());
        }

        #[test]
        fn single_stage_without_predecessors() {
            let stages = vec![stage("only", &[])];

            let ordered = deletion_order(&stages, None).unwrap();

            assert_eq!(ordered.len(), 1);
            assert_eq!(ordered[0].id, "only");
        }

        #[test]
        fn output_is_permutation_of_input() {
            let stages = vec![
                stage("build", &[]),
                stage("test", &["build"]),
                stage("package", &["test"]),
                stage("scan", &["build"]),
                stage("publish", &["package", "scan"]),
            ];

            let ordered = deletion_order(&stages, None).unwrap();

            assert_eq!(ordered.len(), stages.len());
            let mut ids: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec!["build", "package", "publish", "scan", "test"]);
        }

        #[test]
        fn every_edge_respects_deletion_order() {
            let stages = vec![
                stage("build", &[]),
                stage("test", &["build"]),
                stage("package", &["test"]),
                stage("scan", &["build"]),
                stage("publish", &["package", "scan"]),
            ];

            let ordered = deletion_order(&stages, None).unwrap();

            for s in &stages {
                for pred in s.predecessor_ids() {
                    assert!(
                        position(&ordered, &s.id) < position(&ordered, pred),
                        "{} depends on {pred} and must be deleted first",
                        s.id
                    );
                }
            }
        }

        #[test]
        fn repeated_runs_do_not_mutate_input() {
            let stages = vec![stage("A", &["B"]), stage("B", &[])];

            let first: Vec<String> = deletion_order(&stages, None)
                .unwrap()
                .iter()
                .map(|s| s.id.clone())
                .collect();
            let second: Vec<String> = deletion_order(&stages, None)
                .unwrap()
                .iter()
                .map(|s| s.id.clone())
                .collect();

            assert_eq!(first, second);
            assert_eq!(stages[0].predecessors, vec!["B".to_string()]);
        }

        #[test]
        fn independent_stages_all_appear() {
            let stages = vec![stage("A", &[]), stage("B", &[]), stage("C", &[])];

            let ordered = deletion_order(&stages, None).unwrap();

            assert_eq!(ordered.len(), 3, "No ordering constraint drops stages");
        }
    }
}
