//! ASCII tree of the selected cells, annotated with size and line count.

use crate::types::SelectedCell;

#[derive(Debug, Default)]
struct Node {
    name: String,
    children: Vec<Node>,
    annotation: Option<String>,
}

impl Node {
    fn child_mut(&mut self, name: &str) -> &mut Node {
        let position = match self.children.iter().position(|c| c.name == name) {
            Some(position) => position,
            None => {
                self.children.push(Node {
                    name: name.to_string(),
                    ..Node::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[position]
    }

    fn label(&self) -> String {
        match &self.annotation {
            Some(annotation) => format!("{} {}", self.name, annotation),
            None if !self.children.is_empty() => format!("{}/", self.name),
            None => self.name.clone(),
        }
    }
}

fn annotation(selected: &SelectedCell) -> String {
    match selected {
        SelectedCell::Ready { cell, .. } => {
            let content = cell.content();
            let lines = content.lines().count();
            let noun = if lines == 1 { "line" } else { "lines" };
            format!("({} B, {} {})", content.len(), lines, noun)
        }
        SelectedCell::Unreadable { .. } => "(unreadable)".to_string(),
    }
}

/// Render the selection as a tree rooted at `.`, entries in selection order.
pub fn render_tree(selection: &[SelectedCell]) -> String {
    let mut root = Node {
        name: ".".to_string(),
        ..Node::default()
    };

    for selected in selection {
        let components: Vec<&str> = selected
            .path()
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        let mut node = &mut root;
        for component in &components {
            node = node.child_mut(component);
        }
        if components.is_empty() {
            node = node.child_mut(selected.display_name());
        }
        node.annotation = Some(annotation(selected));
    }

    let mut lines = vec![root.name.clone()];
    walk(&root, "", &mut lines);
    lines.join("\n")
}

fn walk(node: &Node, prefix: &str, lines: &mut Vec<String>) {
    let total = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == total;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{}", child.label()));

        if !child.children.is_empty() {
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            walk(child, &child_prefix, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Intent};

    #[test]
    fn test_nested_tree() {
        let selection = vec![
            SelectedCell::ready(Cell::code("src/a.py", "x = 1\ny = 2\n"), Intent::Compressed),
            SelectedCell::ready(Cell::code("src/util/b.py", "z = 3"), Intent::Full),
            SelectedCell::ready(Cell::markdown("README.md", ""), Intent::Compressed),
            SelectedCell::unreadable("data/missing.py", "not found"),
        ];
        let expected = "\
.
├── src/
│   ├── a.py (12 B, 2 lines)
│   └── util/
│       └── b.py (5 B, 1 line)
├── README.md (0 B, 0 lines)
└── data/
    └── missing.py (unreadable)";
        assert_eq!(render_tree(&selection), expected);
    }

    #[test]
    fn test_notebook_cells_and_relative_prefix() {
        let selection = vec![
            SelectedCell::ready(Cell::code("./nb.ipynb#1", "a"), Intent::Compressed),
            SelectedCell::ready(Cell::code("./nb.ipynb#2", "b"), Intent::Compressed),
        ];
        assert_eq!(
            render_tree(&selection),
            ".\n├── nb.ipynb#1 (1 B, 1 line)\n└── nb.ipynb#2 (1 B, 1 line)"
        );
    }
}
