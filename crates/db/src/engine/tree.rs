//! Tree projection of the task graph
//!
//! Renders the (possibly cyclic) graph around a root as a tree. The walk is
//! depth-first over an explicit frame stack; a node that repeats one of its
//! ancestors is emitted with `cycle` set and is not expanded again.
//!
//! Shared nodes are repeated under every branch that reaches them, so a
//! graph of `k` stacked diamonds expands to about `2^k` nodes when depth is
//! unbounded. `TreeOptions::max_nodes` caps the output; a node whose
//! children would overflow the cap is emitted with `truncated` set.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::engine::TaskSummary;
use crate::engine::snapshot::GraphSnapshot;
use crate::error::{DbError, DbResult};
use crate::models::display_id_order;

/// Edge kinds a tree can expand along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Tasks this task depends on
    Dependencies,
    /// Tasks depending on this task (it blocks them)
    Dependents,
    /// Direct subtasks
    Subtasks,
}

impl Relation {
    pub const ALL: [Relation; 3] = [
        Relation::Dependencies,
        Relation::Dependents,
        Relation::Subtasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Dependencies => "dependencies",
            Relation::Dependents => "dependents",
            Relation::Subtasks => "subtasks",
        }
    }

    /// Parse a comma separated list such as `dependencies,subtasks`.
    ///
    /// `all` selects every relation.
    pub fn parse_list(list: &str) -> DbResult<Vec<Relation>> {
        let mut relations = Vec::new();
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part == "all" {
                return Ok(Relation::ALL.to_vec());
            }
            let relation: Relation = part.parse()?;
            if !relations.contains(&relation) {
                relations.push(relation);
            }
        }
        if relations.is_empty() {
            return Err(DbError::invalid_parameter(
                "relations",
                "at least one relation is required",
            ));
        }
        Ok(relations)
    }
}

impl FromStr for Relation {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependencies" | "deps" => Ok(Relation::Dependencies),
            "dependents" | "blocks" => Ok(Relation::Dependents),
            "subtasks" => Ok(Relation::Subtasks),
            other => Err(DbError::invalid_parameter(
                "relations",
                format!(
                    "unknown relation '{}' (expected dependencies, dependents, subtasks or all)",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node cap applied by the default options
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Options for building a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Levels to expand below the root; `Some(0)` is the root alone
    pub max_depth: Option<usize>,
    /// Upper bound on emitted nodes, root included
    pub max_nodes: Option<usize>,
    pub include_dependencies: bool,
    pub include_dependents: bool,
    pub include_subtasks: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_nodes: Some(DEFAULT_MAX_NODES),
            include_dependencies: true,
            include_dependents: false,
            include_subtasks: true,
        }
    }
}

impl TreeOptions {
    /// Defaults for the forest view.
    ///
    /// Forest roots depend on nothing, so the forest expands downstream:
    /// the tasks each root blocks, and its subtasks.
    pub fn forest() -> Self {
        Self {
            include_dependencies: false,
            include_dependents: true,
            ..Self::default()
        }
    }

    /// Default options limited to `depth` levels.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidParameter` for a negative depth.
    pub fn from_depth(depth: i64) -> DbResult<Self> {
        Self::default().with_depth(depth)
    }

    /// Limit expansion to `depth` levels below the root.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidParameter` for a negative depth.
    pub fn with_depth(mut self, depth: i64) -> DbResult<Self> {
        let max_depth = usize::try_from(depth).map_err(|_| {
            DbError::invalid_parameter("depth", format!("must be zero or more, got {}", depth))
        })?;
        self.max_depth = Some(max_depth);
        Ok(self)
    }

    /// Cap the number of emitted nodes; `None` removes the cap
    pub fn with_max_nodes(mut self, max_nodes: Option<usize>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Expand exactly the given relations
    pub fn with_relations(mut self, relations: &[Relation]) -> Self {
        self.include_dependencies = relations.contains(&Relation::Dependencies);
        self.include_dependents = relations.contains(&Relation::Dependents);
        self.include_subtasks = relations.contains(&Relation::Subtasks);
        self
    }

    /// Relations switched on, in expansion order
    pub fn relations(&self) -> Vec<Relation> {
        Relation::ALL
            .into_iter()
            .filter(|relation| match relation {
                Relation::Dependencies => self.include_dependencies,
                Relation::Dependents => self.include_dependents,
                Relation::Subtasks => self.include_subtasks,
            })
            .collect()
    }
}

/// A task and the nodes expanded beneath it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub dependencies: Vec<TreeNode>,
    pub dependents: Vec<TreeNode>,
    pub subtasks: Vec<TreeNode>,
    /// Set when this node repeats an ancestor and was not expanded
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cycle: bool,
    /// Set when expanding this node would have exceeded the node cap
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl TreeNode {
    fn leaf(task: TaskSummary) -> Self {
        Self {
            task,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            subtasks: Vec::new(),
            cycle: false,
            truncated: false,
        }
    }

    /// Children under one relation
    pub fn children(&self, relation: Relation) -> &[TreeNode] {
        match relation {
            Relation::Dependencies => &self.dependencies,
            Relation::Dependents => &self.dependents,
            Relation::Subtasks => &self.subtasks,
        }
    }

    /// Number of nodes in this tree, root included
    pub fn size(&self) -> usize {
        1 + Relation::ALL
            .into_iter()
            .flat_map(|relation| self.children(relation))
            .map(TreeNode::size)
            .sum::<usize>()
    }
}

struct Frame<'a> {
    id: &'a str,
    depth: usize,
    parent: Option<(usize, Relation)>,
}

struct Slot<'a> {
    id: &'a str,
    parent: Option<usize>,
    cycle: bool,
    truncated: bool,
    children: Vec<(Relation, usize)>,
}

/// Build the tree rooted at `root`, or `None` if it is not in the snapshot.
pub fn build_tree(snapshot: &GraphSnapshot, root: &str, options: &TreeOptions) -> Option<TreeNode> {
    snapshot.task(root)?;
    let relations = options.relations();

    // Nodes are laid out in visit order, so children always sit after
    // their parent in the arena.
    let mut arena: Vec<Slot<'_>> = Vec::new();
    let mut stack = vec![Frame {
        id: root,
        depth: 0,
        parent: None,
    }];

    while let Some(frame) = stack.pop() {
        let index = arena.len();
        let cycle = is_ancestor(&arena, frame.parent.map(|(p, _)| p), frame.id);
        arena.push(Slot {
            id: frame.id,
            parent: frame.parent.map(|(p, _)| p),
            cycle,
            truncated: false,
            children: Vec::new(),
        });
        if let Some((parent, relation)) = frame.parent {
            arena[parent].children.push((relation, index));
        }

        if cycle || options.max_depth.is_some_and(|max| frame.depth >= max) {
            continue;
        }

        let mut pending = Vec::new();
        for &relation in &relations {
            for neighbour in snapshot.neighbours(frame.id, relation) {
                if snapshot.contains(neighbour) {
                    pending.push(Frame {
                        id: neighbour.as_str(),
                        depth: frame.depth + 1,
                        parent: Some((index, relation)),
                    });
                }
            }
        }
        // Every frame on the stack becomes a node, so the cap covers them too.
        if let Some(cap) = options.max_nodes
            && !pending.is_empty()
            && arena.len() + stack.len() + pending.len() > cap
        {
            arena[index].truncated = true;
            continue;
        }
        stack.extend(pending.into_iter().rev());
    }

    assemble(snapshot, arena)
}

/// Whether `id` appears on the parent chain starting at `from`
fn is_ancestor(arena: &[Slot<'_>], mut from: Option<usize>, id: &str) -> bool {
    while let Some(index) = from {
        if arena[index].id == id {
            return true;
        }
        from = arena[index].parent;
    }
    false
}

fn assemble(snapshot: &GraphSnapshot, arena: Vec<Slot<'_>>) -> Option<TreeNode> {
    let mut built: Vec<Option<TreeNode>> = vec![None; arena.len()];

    for (index, slot) in arena.iter().enumerate().rev() {
        let task = snapshot.task(slot.id)?;
        let mut node = TreeNode::leaf(TaskSummary::from_task(slot.id, task));
        node.cycle = slot.cycle;
        node.truncated = slot.truncated;
        for &(relation, child) in &slot.children {
            let Some(child_node) = built[child].take() else {
                continue;
            };
            match relation {
                Relation::Dependencies => node.dependencies.push(child_node),
                Relation::Dependents => node.dependents.push(child_node),
                Relation::Subtasks => node.subtasks.push(child_node),
            }
        }
        built[index] = Some(node);
    }

    built.into_iter().next().flatten()
}

/// Roots of the forest view: open tasks with no parent that depend on
/// nothing.
pub fn forest_roots(snapshot: &GraphSnapshot) -> Vec<&str> {
    let mut roots: Vec<&str> = snapshot
        .task_ids()
        .filter(|id| {
            snapshot
                .task(id)
                .is_some_and(|task| !task.status.is_terminal())
        })
        .filter(|id| snapshot.parent(id).is_none())
        .filter(|id| {
            !snapshot
                .dependencies(id)
                .iter()
                .any(|dep| snapshot.contains(dep))
        })
        .collect();
    roots.sort_by_key(|id| {
        snapshot
            .task(id)
            .map(|task| display_id_order(&task.display_id))
    });
    roots
}

/// Expand every forest root independently.
///
/// Callers normally pass [`TreeOptions::forest`].
pub fn build_forest(snapshot: &GraphSnapshot, options: &TreeOptions) -> Vec<TreeNode> {
    forest_roots(snapshot)
        .into_iter()
        .filter_map(|root| build_tree(snapshot, root, options))
        .collect()
}
