use super::{NodeId, PathAddress, TreeStore};

/// A flattened representation of a visible tree node for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub node: NodeId,
    /// Zero for the root's children.
    pub depth: usize,
    pub is_last_sibling: bool,
    pub address: PathAddress,
}

/// Box-drawing pieces used by `row_prefix`.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub pipe: &'static str,
    pub branch: &'static str,
    pub last: &'static str,
    pub blank: &'static str,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        pipe: "│  ",
        branch: "├──",
        last: "└──",
        blank: "   ",
    };

    pub const ASCII: Glyphs = Glyphs {
        pipe: "|  ",
        branch: "|--",
        last: "`--",
        blank: "   ",
    };
}

/// Rows a view would show, in display order.
///
/// The root itself is not a row; its children are the top level. A node's
/// children are visible only while the node is expanded. Uses an explicit
/// stack so depth is not bounded by the call stack.
pub fn visible_rows(store: &TreeStore) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<VisibleRow> = Vec::new();
    push_children(store, store.root(), 0, &PathAddress::root(), &mut stack);

    while let Some(row) = stack.pop() {
        let expanded = store
            .node(row.node)
            .is_some_and(|n| n.expansion().is_expanded());
        if expanded {
            push_children(store, row.node, row.depth + 1, &row.address, &mut stack);
        }
        rows.push(row);
    }
    rows
}

fn push_children(
    store: &TreeStore,
    parent: NodeId,
    depth: usize,
    address: &PathAddress,
    stack: &mut Vec<VisibleRow>,
) {
    let children = store.children(parent);
    // Reversed so the first child is popped first.
    for (i, child) in children.iter().enumerate().rev() {
        stack.push(VisibleRow {
            node: *child,
            depth,
            is_last_sibling: i == children.len() - 1,
            address: address.child(i),
        });
    }
}

/// Index of `node` among the visible rows.
pub fn row_index(rows: &[VisibleRow], node: NodeId) -> Option<usize> {
    rows.iter().position(|row| row.node == node)
}

/// Build the indentation prefix for the row at `index`.
///
/// Each ancestor level draws a continuation line unless that ancestor was the
/// last of its siblings.
pub fn row_prefix(rows: &[VisibleRow], index: usize, glyphs: &Glyphs) -> String {
    let row = &rows[index];
    let mut prefix = String::new();

    for d in 0..row.depth {
        let mut ancestor_is_last = false;
        for j in (0..index).rev() {
            if rows[j].depth == d {
                ancestor_is_last = rows[j].is_last_sibling;
                break;
            }
            if rows[j].depth < d {
                break;
            }
        }
        prefix.push_str(if ancestor_is_last { glyphs.blank } else { glyphs.pipe });
    }

    prefix.push_str(if row.is_last_sibling {
        glyphs.last
    } else {
        glyphs.branch
    });
    prefix
}

/// Plain-text rendering of the visible rows, one line per row.
///
/// Directories get a trailing `/`, the selected row a leading `>` marker and
/// disabled rows are wrapped in parentheses.
pub fn render_text(store: &TreeStore, glyphs: &Glyphs) -> String {
    let rows = visible_rows(store);
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let Some(node) = store.node(row.node) else {
            continue;
        };
        let marker = if node.selection().is_selected() { "> " } else { " " };
        let slash = if node.is_directory() { "/" } else { "" };
        let label = if node.is_disabled() {
            format!("({}{})", node.label(), slash)
        } else {
            format!("{}{}", node.label(), slash)
        };
        out.push_str(&row_prefix(&rows, i, glyphs));
        out.push_str(marker);
        out.push_str(&label);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{sample_tree, Expansion, TreeNode};

    fn labels(store: &TreeStore, rows: &[VisibleRow]) -> Vec<String> {
        rows.iter()
            .map(|r| store.node(r.node).unwrap().label().to_string())
            .collect()
    }

    #[test]
    fn collapsed_tree_shows_top_level_only() {
        let store = sample_tree();
        let rows = visible_rows(&store);
        assert_eq!(labels(&store, &rows), vec!["proj", "notes.txt"]);
        assert!(!rows[0].is_last_sibling);
        assert!(rows[1].is_last_sibling);
    }

    #[test]
    fn expanded_tree_is_pre_order() {
        let mut store = sample_tree();
        store.expand_all();
        let rows = visible_rows(&store);
        assert_eq!(
            labels(&store, &rows),
            vec!["proj", "src", "main", "mod.rs", "README.md", "notes.txt"]
        );
        let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 1, 0]);
    }

    #[test]
    fn row_addresses_resolve_to_row_nodes() {
        let mut store = sample_tree();
        store.expand_all();
        for row in visible_rows(&store) {
            assert_eq!(store.resolve(&row.address), Some(row.node));
            assert_eq!(row.address.depth(), row.depth + 1);
        }
    }

    #[test]
    fn collapsed_branch_hides_descendants() {
        let mut store = sample_tree();
        store.expand_all();
        let src = store.find_by_id("/proj/src").unwrap();
        store.set_expansion(src, Expansion::Collapsed);
        let rows = visible_rows(&store);
        assert_eq!(
            labels(&store, &rows),
            vec!["proj", "src", "README.md", "notes.txt"]
        );
        assert_eq!(row_index(&rows, src), Some(1));
    }

    #[test]
    fn prefixes_draw_continuation_lines() {
        let mut store = sample_tree();
        store.expand_all();
        let rows = visible_rows(&store);
        let prefixes: Vec<String> = (0..rows.len())
            .map(|i| row_prefix(&rows, i, &Glyphs::ASCII))
            .collect();
        assert_eq!(
            prefixes,
            vec![
                "|--",
                "|  |--",
                "|  |  `--",
                "|  |     `--",
                "|  `--",
                "`--",
            ]
        );
    }

    #[test]
    fn render_text_marks_directories() {
        let store = sample_tree();
        let text = render_text(&store, &Glyphs::UNICODE);
        assert_eq!(text, "├── proj/\n└── notes.txt\n");
    }

    #[test]
    fn render_text_wraps_disabled_rows() {
        let mut store = sample_tree();
        let root = store.root();
        store
            .append_child(
                root,
                TreeNode::file("/locked.bin", "locked.bin", None).with_disabled(true),
            )
            .unwrap();
        let text = render_text(&store, &Glyphs::ASCII);
        assert_eq!(text, "|-- proj/\n|-- notes.txt\n`-- (locked.bin)\n");
    }
}
