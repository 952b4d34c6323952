//! In-memory view of the task graph
//!
//! A [`GraphSnapshot`] is loaded from a [`TaskStore`] once per engine call
//! and is immutable while the algorithms run. All store I/O happens in the
//! loaders below; everything after that is synchronous.

use std::collections::{HashMap, HashSet, VecDeque};

use surrealdb::sql::Thing;
use tracing::{debug, trace};

use crate::engine::store::TaskStore;
use crate::engine::tree::Relation;
use crate::error::DbResult;
use crate::models::Task;
use crate::repository::TaskFilter;

/// Tasks plus dependency, dependent and subtask adjacency.
///
/// Adjacency lists keep the order edges were added in and ignore
/// duplicates. Edges may point at ids with no task (dangling); the
/// algorithms skip those.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    tasks: HashMap<String, Task>,
    order: Vec<String>,
    dependencies: HashMap<String, Vec<String>>,
    dependents: HashMap<String, Vec<String>>,
    subtasks: HashMap<String, Vec<String>>,
    parents: HashMap<String, String>,
}

static_assertions::assert_impl_all!(GraphSnapshot: Send, Sync);

fn push_unique(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|existing| existing == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

impl GraphSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task under its record key.
    ///
    /// Tasks without a record id get one derived from `key`. Re-inserting
    /// a key replaces the task but keeps its original position.
    pub fn insert_task(&mut self, key: impl Into<String>, mut task: Task) {
        let key = key.into();
        if task.id.is_none() {
            task.id = Some(Thing::from(("task", key.as_str())));
        }
        if !self.tasks.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.tasks.insert(key, task);
    }

    /// Record that `task` depends on `dependency`.
    ///
    /// Returns `false` if the edge was already present.
    pub fn add_dependency(&mut self, task: &str, dependency: &str) -> bool {
        let added = push_unique(
            self.dependencies.entry(task.to_string()).or_default(),
            dependency,
        );
        if added {
            push_unique(
                self.dependents.entry(dependency.to_string()).or_default(),
                task,
            );
        }
        added
    }

    /// Record that `child` is a subtask of `parent`.
    pub fn add_subtask(&mut self, parent: &str, child: &str) -> bool {
        let added = push_unique(self.subtasks.entry(parent.to_string()).or_default(), child);
        if added {
            self.parents.insert(child.to_string(), parent.to_string());
        }
        added
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Ids `id` depends on, in edge order
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.dependencies.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids depending on `id` (transpose of [`GraphSnapshot::dependencies`])
    pub fn dependents(&self, id: &str) -> &[String] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subtasks(&self, id: &str) -> &[String] {
        self.subtasks.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Neighbours of `id` over one relation
    pub fn neighbours(&self, id: &str, relation: Relation) -> &[String] {
        match relation {
            Relation::Dependencies => self.dependencies(id),
            Relation::Dependents => self.dependents(id),
            Relation::Subtasks => self.subtasks(id),
        }
    }

    /// Task ids in insertion order
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Load every task and every edge between existing tasks.
pub async fn load_all<S: TaskStore>(store: &S) -> DbResult<GraphSnapshot> {
    let mut snapshot = GraphSnapshot::new();

    for task in store.list_candidate_tasks(&TaskFilter::all()).await? {
        if let Some(key) = task.key() {
            snapshot.insert_task(key, task);
        }
    }

    let ids: Vec<String> = snapshot.task_ids().map(str::to_string).collect();
    for id in &ids {
        for dependency in store.list_dependencies(id).await? {
            if snapshot.contains(&dependency) {
                snapshot.add_dependency(id, &dependency);
            } else {
                debug!("Skipping dangling dependency {} -> {}", id, dependency);
            }
        }
        for child in store.list_subtasks(id).await? {
            if snapshot.contains(&child) {
                snapshot.add_subtask(id, &child);
            }
        }
    }

    debug!("Loaded full graph with {} tasks", snapshot.len());
    Ok(snapshot)
}

/// Load the closure of `root` over `relations`.
///
/// Breadth-first from `root`; nodes at `max_depth` are loaded but their
/// edges are not. Returns an empty snapshot if `root` does not exist.
pub async fn load_reachable<S: TaskStore>(
    store: &S,
    root: &str,
    relations: &[Relation],
    max_depth: Option<usize>,
) -> DbResult<GraphSnapshot> {
    let mut snapshot = GraphSnapshot::new();
    let Some(task) = store.get_task(root).await? else {
        return Ok(snapshot);
    };
    snapshot.insert_task(root, task);

    let mut missing: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((root.to_string(), 0));

    while let Some((current, depth)) = queue.pop_front() {
        if let Some(max) = max_depth
            && depth >= max
        {
            continue;
        }

        for &relation in relations {
            let neighbours = match relation {
                Relation::Dependencies => store.list_dependencies(&current).await?,
                Relation::Dependents => store.list_dependents(&current).await?,
                Relation::Subtasks => store.list_subtasks(&current).await?,
            };

            for neighbour in neighbours {
                if missing.contains(&neighbour) {
                    continue;
                }
                if !snapshot.contains(&neighbour) {
                    match store.get_task(&neighbour).await? {
                        Some(task) => {
                            snapshot.insert_task(neighbour.clone(), task);
                            queue.push_back((neighbour.clone(), depth + 1));
                        }
                        None => {
                            debug!(
                                "Skipping dangling {} edge {} -> {}",
                                relation, current, neighbour
                            );
                            missing.insert(neighbour);
                            continue;
                        }
                    }
                }

                match relation {
                    Relation::Dependencies => snapshot.add_dependency(&current, &neighbour),
                    Relation::Dependents => snapshot.add_dependency(&neighbour, &current),
                    Relation::Subtasks => snapshot.add_subtask(&current, &neighbour),
                };
            }
        }
    }

    trace!("Loaded {} tasks reachable from {}", snapshot.len(), root);
    Ok(snapshot)
}

/// Load `seeds` plus their direct dependencies and dependents.
pub async fn load_neighbourhood<S: TaskStore>(
    store: &S,
    seeds: Vec<Task>,
) -> DbResult<GraphSnapshot> {
    let mut snapshot = GraphSnapshot::new();
    let mut seed_ids = Vec::with_capacity(seeds.len());
    for task in seeds {
        if let Some(key) = task.key() {
            seed_ids.push(key.clone());
            snapshot.insert_task(key, task);
        }
    }

    let mut missing: HashSet<String> = HashSet::new();
    for id in &seed_ids {
        for dependency in store.list_dependencies(id).await? {
            if resolve_into(store, &mut snapshot, &mut missing, &dependency).await? {
                snapshot.add_dependency(id, &dependency);
            }
        }
        for dependent in store.list_dependents(id).await? {
            if resolve_into(store, &mut snapshot, &mut missing, &dependent).await? {
                snapshot.add_dependency(&dependent, id);
            }
        }
    }

    Ok(snapshot)
}

/// Make sure `id` is in the snapshot, fetching it if needed.
///
/// Returns `false` for ids with no task behind them.
async fn resolve_into<S: TaskStore>(
    store: &S,
    snapshot: &mut GraphSnapshot,
    missing: &mut HashSet<String>,
    id: &str,
) -> DbResult<bool> {
    if snapshot.contains(id) {
        return Ok(true);
    }
    if missing.contains(id) {
        return Ok(false);
    }
    match store.get_task(id).await? {
        Some(task) => {
            snapshot.insert_task(id, task);
            Ok(true)
        }
        None => {
            debug!("Skipping dangling edge to {}", id);
            missing.insert(id.to_string());
            Ok(false)
        }
    }
}

/// Lookup table from id to position in `ids`
pub(crate) fn positions<'a>(ids: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    ids.into_iter()
        .enumerate()
        .map(|(index, id)| (id, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn chain() -> GraphSnapshot {
        // a -> b -> c, with d blocked by a and e a subtask of a
        let mut snapshot = GraphSnapshot::new();
        for (key, display) in [("a", "T-0001"), ("b", "T-0002"), ("c", "T-0003")] {
            snapshot.insert_task(key, Task::new(display, key.to_uppercase()));
        }
        snapshot.insert_task("d", Task::new("T-0004", "D"));
        snapshot.insert_task("e", Task::new("T-0005", "E"));
        snapshot.add_dependency("a", "b");
        snapshot.add_dependency("b", "c");
        snapshot.add_dependency("d", "a");
        snapshot.add_subtask("a", "e");
        snapshot
    }

    #[test]
    fn test_insert_assigns_record_id() {
        let mut snapshot = GraphSnapshot::new();
        snapshot.insert_task("abc", Task::new("T-0001", "Keyed"));
        assert_eq!(snapshot.task("abc").and_then(Task::key), Some("abc".into()));
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut snapshot = GraphSnapshot::new();
        snapshot.insert_task("a", Task::new("T-0001", "A"));
        snapshot.insert_task("b", Task::new("T-0002", "B"));
        snapshot.insert_task("a", Task::new("T-0001", "A2"));

        let ids: Vec<&str> = snapshot.task_ids().collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.task("a").map(|t| t.name.as_str()), Some("A2"));
    }

    #[test]
    fn test_dependents_are_transpose() {
        let snapshot = chain();
        assert_eq!(snapshot.dependencies("a"), ["b"]);
        assert_eq!(snapshot.dependents("b"), ["a"]);
        assert_eq!(snapshot.dependents("a"), ["d"]);
        assert!(snapshot.dependencies("c").is_empty());
        assert_eq!(snapshot.subtasks("a"), ["e"]);
        assert_eq!(snapshot.parent("e"), Some("a"));
        assert_eq!(snapshot.parent("a"), None);
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let mut snapshot = chain();
        assert!(!snapshot.add_dependency("a", "b"));
        assert!(!snapshot.add_subtask("a", "e"));
        assert_eq!(snapshot.dependencies("a").len(), 1);
        assert_eq!(snapshot.dependents("b").len(), 1);
    }

    #[tokio::test]
    async fn test_load_all_drops_dangling_edges() {
        let mut store = chain();
        store.add_dependency("c", "ghost");

        let snapshot = load_all(&store).await.unwrap();
        assert_eq!(snapshot.len(), 5);
        assert!(snapshot.dependencies("c").is_empty());
        assert_eq!(snapshot.dependencies("a"), ["b"]);
        assert_eq!(snapshot.subtasks("a"), ["e"]);
    }

    #[tokio::test]
    async fn test_load_all_includes_terminal_tasks() {
        let mut store = chain();
        store.insert_task("z", Task::new("T-0009", "Z").with_status(Status::Archived));

        let snapshot = load_all(&store).await.unwrap();
        assert!(snapshot.contains("z"));
    }

    #[tokio::test]
    async fn test_load_reachable_follows_requested_relations() {
        let store = chain();

        let deps = load_reachable(&store, "a", &[Relation::Dependencies], None)
            .await
            .unwrap();
        let mut ids: Vec<&str> = deps.task_ids().collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let both = load_reachable(&store, "a", &[Relation::Dependents, Relation::Subtasks], None)
            .await
            .unwrap();
        let mut ids: Vec<&str> = both.task_ids().collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "d", "e"]);
        assert_eq!(both.dependencies("d"), ["a"]);
    }

    #[tokio::test]
    async fn test_load_reachable_respects_depth() {
        let store = chain();

        let shallow = load_reachable(&store, "a", &[Relation::Dependencies], Some(1))
            .await
            .unwrap();
        assert!(shallow.contains("b"));
        assert!(!shallow.contains("c"));

        let root_only = load_reachable(&store, "a", &[Relation::Dependencies], Some(0))
            .await
            .unwrap();
        assert_eq!(root_only.len(), 1);
    }

    #[tokio::test]
    async fn test_load_reachable_terminates_on_cycle() {
        let mut store = chain();
        store.add_dependency("c", "a");

        let snapshot = load_reachable(&store, "a", &[Relation::Dependencies], None)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.dependencies("c"), ["a"]);
    }

    #[tokio::test]
    async fn test_load_reachable_missing_root() {
        let store = chain();
        let snapshot = load_reachable(&store, "nope", &[Relation::Dependencies], None)
            .await
            .unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_load_neighbourhood() {
        let mut store = chain();
        store.add_dependency("b", "ghost");
        let seed = store.task("b").cloned().unwrap();

        let snapshot = load_neighbourhood(&store, vec![seed]).await.unwrap();
        let mut ids: Vec<&str> = snapshot.task_ids().collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(snapshot.dependencies("b"), ["c"]);
        assert_eq!(snapshot.dependents("b"), ["a"]);
    }

    #[test]
    fn test_positions() {
        let ids = ["x", "y", "z"];
        let index = positions(ids);
        assert_eq!(index["x"], 0);
        assert_eq!(index["z"], 2);
    }
}
