//! The in-memory project tree: an ordered forest summing interval
//! durations bottom-up from flat `(project_id, duration)` rows.

use std::collections::BTreeMap;

/// Resolves a project id to its root-to-leaf path segments.
pub trait ProjectInfoProvider {
    fn path_parts(&self, project_id: i64) -> Vec<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectNode {
    pub duration: i64,
    pub children: BTreeMap<String, ProjectNode>,
}

/// Forest keyed by root category name. Insertion order is irrelevant;
/// render order is decided by the formatters.
pub type ProjectTree = BTreeMap<String, ProjectNode>;

/// Adds each row's duration to every node along its path, so every node
/// ends up holding the sum over itself and all descendants. Rows whose id
/// is unknown to the provider are skipped.
pub fn build_project_tree_from_ids(
    tree: &mut ProjectTree,
    id_records: &[(i64, i64)],
    provider: &dyn ProjectInfoProvider,
) {
    for &(project_id, duration) in id_records {
        let parts = provider.path_parts(project_id);
        let Some((root, rest)) = parts.split_first() else {
            continue;
        };

        let mut node = tree.entry(root.clone()).or_default();
        node.duration += duration;
        for segment in rest {
            node = node.children.entry(segment.clone()).or_default();
            node.duration += duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapProvider(HashMap<i64, Vec<&'static str>>);

    impl ProjectInfoProvider for MapProvider {
        fn path_parts(&self, project_id: i64) -> Vec<String> {
            self.0
                .get(&project_id)
                .map(|parts| parts.iter().map(|s| (*s).to_string()).collect())
                .unwrap_or_default()
        }
    }

    fn provider() -> MapProvider {
        MapProvider(HashMap::from([
            (1, vec!["study"]),
            (2, vec!["study", "math"]),
            (3, vec!["study", "english", "words"]),
            (4, vec!["rest"]),
        ]))
    }

    #[test]
    fn durations_accumulate_along_the_descent() {
        let mut tree = ProjectTree::new();
        build_project_tree_from_ids(&mut tree, &[(2, 3600), (3, 1800), (4, 600)], &provider());

        let study = &tree["study"];
        assert_eq!(study.duration, 5400);
        assert_eq!(study.children["math"].duration, 3600);
        assert_eq!(study.children["english"].duration, 1800);
        assert_eq!(study.children["english"].children["words"].duration, 1800);
        assert_eq!(tree["rest"].duration, 600);
    }

    #[test]
    fn node_duration_is_at_least_the_child_sum() {
        let mut tree = ProjectTree::new();
        build_project_tree_from_ids(&mut tree, &[(1, 900), (2, 3600)], &provider());

        let study = &tree["study"];
        let child_sum: i64 = study.children.values().map(|child| child.duration).sum();
        assert_eq!(study.duration, 4500);
        assert!(study.duration >= child_sum);
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let mut tree = ProjectTree::new();
        build_project_tree_from_ids(&mut tree, &[(99, 3600)], &provider());
        assert!(tree.is_empty());
    }
}
