//! Output formatting module for Trellis
//!
//! Provides tree, table and path rendering for CLI output, plus JSON
//! rendering of the engine results.

use serde::Serialize;
use trellis_db::{CriticalPath, CycleReport, ReadyTask, Relation, TreeNode};

/// Maximum width for the name column before truncation
const MAX_NAME_WIDTH: usize = 40;

/// Truncate a string to the specified maximum width, adding ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    }
}

/// Format an hour count without a trailing `.0`
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}h", hours as i64)
    } else {
        format!("{:.1}h", hours)
    }
}

/// Pretty JSON for any engine result
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn relation_label(relation: Relation) -> &'static str {
    match relation {
        Relation::Dependencies => "depends on",
        Relation::Dependents => "blocks",
        Relation::Subtasks => "subtask",
    }
}

fn node_line(node: &TreeNode) -> String {
    let mut line = format!(
        "{} {} [{}]",
        node.task.display_id, node.task.name, node.task.status
    );
    if let Some(hours) = node.task.estimated_hours {
        line.push_str(&format!(" ({})", format_hours(hours)));
    }
    if node.cycle {
        line.push_str(" (cycle)");
    }
    if node.truncated {
        line.push_str(" (truncated)");
    }
    line
}

type PendingLine<'a> = (&'a TreeNode, Relation, String, bool);

fn push_children<'a>(stack: &mut Vec<PendingLine<'a>>, node: &'a TreeNode, prefix: &str) {
    let children: Vec<(Relation, &TreeNode)> = Relation::ALL
        .into_iter()
        .flat_map(|relation| node.children(relation).iter().map(move |c| (relation, c)))
        .collect();
    let count = children.len();
    for (index, (relation, child)) in children.into_iter().enumerate().rev() {
        stack.push((child, relation, prefix.to_string(), index + 1 == count));
    }
}

/// Render one tree with box-drawing connectors.
///
/// ```text
/// T-0001 Launch [todo] (2h)
/// ├── depends on: T-0002 API [in_progress]
/// │   └── depends on: T-0003 Schema [completed]
/// └── subtask: T-0004 Docs [todo]
/// ```
pub fn format_tree(root: &TreeNode) -> String {
    let mut lines = vec![node_line(root)];
    let mut stack: Vec<PendingLine<'_>> = Vec::new();
    push_children(&mut stack, root, "");

    while let Some((node, relation, prefix, last)) = stack.pop() {
        let connector = if last { "└── " } else { "├── " };
        lines.push(format!(
            "{}{}{}: {}",
            prefix,
            connector,
            relation_label(relation),
            node_line(node)
        ));
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        push_children(&mut stack, node, &child_prefix);
    }

    lines.join("\n")
}

/// Render a forest, one tree per root separated by blank lines.
pub fn format_forest(roots: &[TreeNode]) -> String {
    if roots.is_empty() {
        return "No open root tasks found.".to_string();
    }
    roots
        .iter()
        .map(format_tree)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format ready tasks into an aligned table string.
///
/// ```text
/// ID      Priority  Score  Unblocks  Est  Name
/// ------  --------  -----  --------  ---  ----------------
/// T-0002  high      3014   1         1h   Write migrations
/// ```
pub fn format_ready_table(tasks: &[ReadyTask]) -> String {
    if tasks.is_empty() {
        return "No ready tasks found.".to_string();
    }

    let headers = ["ID", "Priority", "Score", "Unblocks", "Est", "Name"];

    let rows: Vec<[String; 6]> = tasks
        .iter()
        .map(|ready| {
            [
                ready.task.display_id.clone(),
                ready.task.priority.to_string(),
                format!("{:.0}", ready.priority_score.floor()),
                ready.dependents_count.to_string(),
                ready
                    .task
                    .estimated_hours
                    .map(format_hours)
                    .unwrap_or_else(|| "-".to_string()),
                truncate(&ready.task.name, MAX_NAME_WIDTH),
            ]
        })
        .collect();

    let widths: Vec<usize> = (0..headers.len())
        .map(|column| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .max()
                .unwrap_or(0)
                .max(headers[column].len())
        })
        .collect();

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    lines.push(format_row(&header_cells));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(format_row(&separator));
    for row in &rows {
        lines.push(format_row(row));
    }

    lines.join("\n")
}

/// Render a critical path, first task first.
pub fn format_critical_path(path: &CriticalPath) -> String {
    let mut lines = Vec::with_capacity(path.path.len() + 2);
    lines.push(format!("Critical path ({} total):", format_hours(path.total_hours)));

    for (index, task) in path.path.iter().enumerate() {
        let hours = task
            .estimated_hours
            .map(format_hours)
            .unwrap_or_else(|| "unestimated".to_string());
        lines.push(format!(
            "  {}. {} {} [{}] ({})",
            index + 1,
            task.display_id,
            task.name,
            task.status,
            hours
        ));
    }

    if !path.unestimated.is_empty() {
        let codes: Vec<&str> = path
            .path
            .iter()
            .filter(|task| path.unestimated.contains(&task.id))
            .map(|task| task.display_id.as_str())
            .collect();
        lines.push(format!(
            "Warning: {} task(s) have no estimate and count as 0h: {}",
            codes.len(),
            codes.join(", ")
        ));
    }

    lines.join("\n")
}

/// Render cycle diagnostics as an arrow chain closing on its first task.
pub fn format_cycle_report(report: &CycleReport) -> String {
    match &report.path {
        Some(path) if !path.is_empty() => {
            let mut codes: Vec<&str> = path.iter().map(|t| t.display_id.as_str()).collect();
            codes.push(codes[0]);
            format!("Dependency cycle: {}", codes.join(" -> "))
        }
        _ => "No dependency cycles found.".to_string(),
    }
}
