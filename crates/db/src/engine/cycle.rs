//! Cycle detection over dependency edges
//!
//! Cycles are legal data, so nothing here fails on them: these functions
//! report whether a task sits on a cycle and which tasks form it. All
//! walks use explicit stacks and colour maps, touching each node once.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::engine::TaskSummary;
use crate::engine::snapshot::GraphSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

/// Whether `task` participates in a dependency cycle.
///
/// Three-colour DFS rooted at `task`. The root stays gray for the whole
/// walk, so any explored edge back into it closes a cycle through it.
/// Back edges to other gray nodes are cycles elsewhere and are ignored.
pub fn has_circular_dependency(snapshot: &GraphSnapshot, task: &str) -> bool {
    if !snapshot.contains(task) {
        return false;
    }

    let mut colours: HashMap<&str, Colour> = HashMap::new();
    colours.insert(task, Colour::Gray);
    let mut stack: Vec<(&str, usize)> = vec![(task, 0)];

    while let Some(top) = stack.last_mut() {
        let (node, next) = *top;
        let deps = snapshot.dependencies(node);
        if next >= deps.len() {
            colours.insert(node, Colour::Black);
            stack.pop();
            continue;
        }
        top.1 += 1;

        let dep = deps[next].as_str();
        if dep == task {
            return true;
        }
        if snapshot.contains(dep) && !colours.contains_key(dep) {
            colours.insert(dep, Colour::Gray);
            stack.push((dep, 0));
        }
    }

    false
}

/// The shortest cycle through `task`, or `None` if it is on no cycle.
///
/// The path starts at `task`, each entry depends on the next, and the last
/// entry depends on `task`. A self-loop yields `[task]`.
pub fn find_circular_path(snapshot: &GraphSnapshot, task: &str) -> Option<Vec<String>> {
    if !snapshot.contains(task) {
        return None;
    }
    if snapshot.dependencies(task).iter().any(|dep| dep == task) {
        return Some(vec![task.to_string()]);
    }

    // BFS from the task's dependencies back to the task itself
    let mut visited: HashSet<&str> = HashSet::from([task]);
    let mut parent_map: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::from([task]);

    while let Some(current) = queue.pop_front() {
        for dep in snapshot.dependencies(current) {
            let dep = dep.as_str();
            if !snapshot.contains(dep) {
                continue;
            }

            if dep == task {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(&previous) = parent_map.get(cursor) {
                    path.push(previous);
                    cursor = previous;
                }
                path.reverse();
                return Some(path.into_iter().map(str::to_string).collect());
            }

            if visited.insert(dep) {
                parent_map.insert(dep, current);
                queue.push_back(dep);
            }
        }
    }

    None
}

/// Any cycle in the snapshot, scanning tasks in insertion order.
pub fn find_any_cycle(snapshot: &GraphSnapshot) -> Option<Vec<String>> {
    first_cycle(snapshot, snapshot.task_ids(), |_| true)
}

/// First cycle found by a three-colour DFS from `starts`, restricted to
/// nodes accepted by `allowed`.
///
/// The cycle is returned in dependency order: each entry depends on the
/// next and the last depends on the first.
pub(crate) fn first_cycle<'a>(
    snapshot: &'a GraphSnapshot,
    starts: impl IntoIterator<Item = &'a str>,
    allowed: impl Fn(&str) -> bool,
) -> Option<Vec<String>> {
    let mut colours: HashMap<&'a str, Colour> = HashMap::new();

    for start in starts {
        if colours.contains_key(start) || !snapshot.contains(start) || !allowed(start) {
            continue;
        }

        colours.insert(start, Colour::Gray);
        let mut stack: Vec<(&'a str, usize)> = vec![(start, 0)];

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let deps = snapshot.dependencies(node);
            if next >= deps.len() {
                colours.insert(node, Colour::Black);
                stack.pop();
                continue;
            }
            top.1 += 1;

            let dep = deps[next].as_str();
            if !snapshot.contains(dep) || !allowed(dep) {
                continue;
            }
            match colours.get(dep) {
                None => {
                    colours.insert(dep, Colour::Gray);
                    stack.push((dep, 0));
                }
                Some(Colour::Gray) => {
                    let from = stack.iter().position(|(id, _)| *id == dep)?;
                    return Some(stack[from..].iter().map(|(id, _)| id.to_string()).collect());
                }
                Some(Colour::Black) => {}
            }
        }
    }

    None
}

/// Cycle diagnostics for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub has_cycle: bool,
    pub path: Option<Vec<TaskSummary>>,
}

impl CycleReport {
    /// Build a report from a cycle of task ids
    pub fn from_cycle(snapshot: &GraphSnapshot, cycle: Option<Vec<String>>) -> Self {
        let path = cycle.map(|ids| TaskSummary::collect(snapshot, &ids));
        Self {
            has_cycle: path.is_some(),
            path,
        }
    }
}
