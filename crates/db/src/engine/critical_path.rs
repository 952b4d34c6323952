//! Critical path calculation
//!
//! The critical path of a task is the heaviest chain through the dependency
//! subgraph reachable from it, weighted by estimated hours. The subgraph is
//! ordered with Kahn's algorithm and then scored with a longest-path DP.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::engine::TaskSummary;
use crate::engine::cycle::first_cycle;
use crate::engine::snapshot::{GraphSnapshot, positions};
use crate::error::{DbError, DbResult};

/// Options for the critical path calculation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriticalPathOptions {
    /// Leave completed and archived dependencies out of the subgraph
    pub remaining_only: bool,
}

/// The heaviest dependency chain ending at a task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    /// First task to do first; the requested task is last
    pub path: Vec<TaskSummary>,
    pub total_hours: f64,
    /// Ids of path tasks without an estimate (counted as zero hours)
    pub unestimated: Vec<String>,
}

/// Calculate the critical path ending at `root`.
///
/// # Errors
///
/// Returns `DbError::NotFound` if `root` is not in the snapshot, and
/// `DbError::CyclicGraph` if the reachable subgraph contains a cycle.
pub fn calculate(
    snapshot: &GraphSnapshot,
    root: &str,
    options: &CriticalPathOptions,
) -> DbResult<CriticalPath> {
    if !snapshot.contains(root) {
        return Err(DbError::NotFound {
            task_id: root.to_string(),
        });
    }

    let members = reachable(snapshot, root, options);
    let in_subgraph: HashSet<&str> = members.iter().copied().collect();
    let deps_of = |id: &str| {
        snapshot
            .dependencies(id)
            .iter()
            .map(String::as_str)
            .filter(|dep| in_subgraph.contains(dep))
            .collect::<Vec<&str>>()
    };

    // Kahn: a task becomes available once all of its dependencies are placed
    let mut pending: HashMap<&str, usize> = members
        .iter()
        .map(|&id| (id, deps_of(id).len()))
        .collect();
    let mut queue: VecDeque<&str> = members
        .iter()
        .copied()
        .filter(|id| pending.get(id) == Some(&0))
        .collect();
    let mut order: Vec<&str> = Vec::with_capacity(members.len());

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for dependent in snapshot.dependents(id) {
            let dependent = dependent.as_str();
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() < members.len() {
        let placed: HashSet<&str> = order.iter().copied().collect();
        let unplaced: Vec<&str> = members
            .iter()
            .copied()
            .filter(|id| !placed.contains(id))
            .collect();
        let cycle = first_cycle(snapshot, unplaced, |id| in_subgraph.contains(id))
            .unwrap_or_default();
        return Err(DbError::CyclicGraph {
            task_id: display_id(snapshot, root),
            cycle: cycle.iter().map(|id| display_id(snapshot, id)).collect(),
        });
    }

    // Longest path DP in topological order
    let position = positions(order.iter().copied());
    let mut best: HashMap<&str, f64> = HashMap::with_capacity(order.len());
    let mut via: HashMap<&str, &str> = HashMap::new();

    for &id in &order {
        let mut chosen: Option<(&str, f64)> = None;
        for dep in deps_of(id) {
            let weight = best.get(dep).copied().unwrap_or(0.0);
            chosen = match chosen {
                Some((current, current_weight))
                    if current_weight > weight
                        || (current_weight == weight && position[current] <= position[dep]) =>
                {
                    Some((current, current_weight))
                }
                _ => Some((dep, weight)),
            };
        }

        let own = snapshot.task(id).map(|task| task.weight()).unwrap_or(0.0);
        best.insert(id, own + chosen.map(|(_, weight)| weight).unwrap_or(0.0));
        if let Some((previous, _)) = chosen {
            via.insert(id, previous);
        }
    }

    // Ties for the heaviest node go to the root
    let mut end = root;
    let mut end_weight = best.get(root).copied().unwrap_or(0.0);
    for &id in &order {
        let weight = best.get(id).copied().unwrap_or(0.0);
        if weight > end_weight {
            end = id;
            end_weight = weight;
        }
    }

    let mut ids = vec![end];
    let mut cursor = end;
    while let Some(&previous) = via.get(cursor) {
        ids.push(previous);
        cursor = previous;
    }
    ids.reverse();

    let unestimated = ids
        .iter()
        .filter(|id| {
            snapshot
                .task(id)
                .is_some_and(|task| task.estimated_hours.is_none())
        })
        .map(|id| id.to_string())
        .collect();

    Ok(CriticalPath {
        path: TaskSummary::collect(snapshot, &ids),
        total_hours: end_weight,
        unestimated,
    })
}

/// Tasks reachable from `root` over dependency edges, root first.
fn reachable<'a>(
    snapshot: &'a GraphSnapshot,
    root: &'a str,
    options: &CriticalPathOptions,
) -> Vec<&'a str> {
    let mut visited: HashSet<&str> = HashSet::from([root]);
    let mut members = vec![root];
    let mut queue: VecDeque<&str> = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        for dep in snapshot.dependencies(current) {
            let dep = dep.as_str();
            let Some(task) = snapshot.task(dep) else {
                continue;
            };
            if options.remaining_only && task.status.is_terminal() {
                continue;
            }
            if visited.insert(dep) {
                members.push(dep);
                queue.push_back(dep);
            }
        }
    }

    members
}

fn display_id(snapshot: &GraphSnapshot, id: &str) -> String {
    snapshot
        .task(id)
        .map(|task| task.display_id.clone())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Status, Task};

    fn graph(tasks: &[(&str, Option<f64>)], edges: &[(&str, &str)]) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::new();
        for (n, (id, hours)) in tasks.iter().enumerate() {
            let mut task = Task::new(format!("T-{:04}", n + 1), id.to_uppercase());
            task.estimated_hours = *hours;
            snapshot.insert_task(*id, task);
        }
        for (task, dep) in edges {
            snapshot.add_dependency(task, dep);
        }
        snapshot
    }

    fn path_ids(path: &CriticalPath) -> Vec<&str> {
        path.path.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_chain_critical_path() {
        // a depends on b depends on c
        let snapshot = graph(
            &[("a", Some(2.0)), ("b", Some(3.0)), ("c", Some(1.0))],
            &[("a", "b"), ("b", "c")],
        );

        let result = calculate(&snapshot, "a", &CriticalPathOptions::default()).unwrap();
        assert_eq!(path_ids(&result), vec!["c", "b", "a"]);
        assert_eq!(result.total_hours, 6.0);
        assert!(result.unestimated.is_empty());
    }

    #[test]
    fn test_single_task() {
        let snapshot = graph(&[("solo", Some(4.0))], &[]);
        let result = calculate(&snapshot, "solo", &CriticalPathOptions::default()).unwrap();
        assert_eq!(path_ids(&result), vec!["solo"]);
        assert_eq!(result.total_hours, 4.0);
    }

    #[test]
    fn test_heavier_branch_wins() {
        // root depends on light (1h) and on heavy (2h) which depends on base (5h)
        let snapshot = graph(
            &[
                ("root", Some(1.0)),
                ("light", Some(1.0)),
                ("heavy", Some(2.0)),
                ("base", Some(5.0)),
            ],
            &[("root", "light"), ("root", "heavy"), ("heavy", "base")],
        );

        let result = calculate(&snapshot, "root", &CriticalPathOptions::default()).unwrap();
        assert_eq!(path_ids(&result), vec!["base", "heavy", "root"]);
        assert_eq!(result.total_hours, 8.0);
    }

    #[test]
    fn test_tie_prefers_earliest_topological_position() {
        // Both branches weigh 3; x is placed before y
        let snapshot = graph(
            &[("root", Some(1.0)), ("x", Some(3.0)), ("y", Some(3.0))],
            &[("root", "x"), ("root", "y")],
        );

        let result = calculate(&snapshot, "root", &CriticalPathOptions::default()).unwrap();
        assert_eq!(path_ids(&result), vec!["x", "root"]);

        let again = calculate(&snapshot, "root", &CriticalPathOptions::default()).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_unestimated_tasks_stay_on_path() {
        let snapshot = graph(
            &[("a", Some(2.0)), ("b", None), ("c", Some(1.0))],
            &[("a", "b"), ("b", "c")],
        );

        let result = calculate(&snapshot, "a", &CriticalPathOptions::default()).unwrap();
        assert_eq!(path_ids(&result), vec!["c", "b", "a"]);
        assert_eq!(result.total_hours, 3.0);
        assert_eq!(result.unestimated, vec!["b"]);
    }

    #[test]
    fn test_cycle_raises_cyclic_graph() {
        let snapshot = graph(
            &[("a", Some(1.0)), ("b", Some(1.0)), ("c", Some(1.0))],
            &[("a", "b"), ("b", "c"), ("c", "b")],
        );

        let result = calculate(&snapshot, "a", &CriticalPathOptions::default());
        match result {
            Err(DbError::CyclicGraph { task_id, cycle }) => {
                assert_eq!(task_id, "T-0001");
                assert_eq!(cycle, vec!["T-0002", "T-0003"]);
            }
            other => panic!("expected CyclicGraph, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_raises_cyclic_graph() {
        let snapshot = graph(&[("a", Some(1.0))], &[("a", "a")]);
        assert!(matches!(
            calculate(&snapshot, "a", &CriticalPathOptions::default()),
            Err(DbError::CyclicGraph { .. })
        ));
    }

    #[test]
    fn test_unreachable_cycle_is_ignored() {
        let snapshot = graph(
            &[("a", Some(1.0)), ("b", Some(1.0)), ("x", None), ("y", None)],
            &[("a", "b"), ("x", "y"), ("y", "x")],
        );
        let result = calculate(&snapshot, "a", &CriticalPathOptions::default()).unwrap();
        assert_eq!(path_ids(&result), vec!["b", "a"]);
    }

    #[test]
    fn test_remaining_only_skips_finished_work() {
        let mut snapshot = graph(
            &[("a", Some(2.0)), ("b", Some(3.0)), ("c", Some(1.0))],
            &[("a", "b"), ("b", "c")],
        );
        let done = snapshot.task("b").cloned().unwrap().with_status(Status::Completed);
        snapshot.insert_task("b", done);

        let all = calculate(&snapshot, "a", &CriticalPathOptions::default()).unwrap();
        assert_eq!(all.total_hours, 6.0);

        let remaining = calculate(
            &snapshot,
            "a",
            &CriticalPathOptions {
                remaining_only: true,
            },
        )
        .unwrap();
        assert_eq!(path_ids(&remaining), vec!["a"]);
        assert_eq!(remaining.total_hours, 2.0);
    }

    #[test]
    fn test_missing_root() {
        let snapshot = graph(&[("a", None)], &[]);
        assert!(matches!(
            calculate(&snapshot, "nope", &CriticalPathOptions::default()),
            Err(DbError::NotFound { task_id }) if task_id == "nope"
        ));
    }

    #[test]
    fn test_json_shape() {
        let snapshot = graph(&[("a", Some(1.5)), ("b", None)], &[("a", "b")]);
        let result = calculate(&snapshot, "a", &CriticalPathOptions::default()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalHours"], 1.5);
        assert_eq!(json["path"][0]["id"], "b");
        assert_eq!(json["unestimated"][0], "b");
    }
}
