use serde::{Deserialize, Serialize};

/// Fields shared by every cell regardless of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellBase {
    /// Stable identity of the cell (file path or `notebook.ipynb#3`)
    pub path: String,
    /// Short label shown in FILE headers and the tree
    pub display_name: String,
    pub content: String,
    /// Captured execution output, if any
    #[serde(default)]
    pub output: Option<String>,
}

impl CellBase {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let display_name = display_name_for(&path);
        Self {
            path,
            display_name,
            content: content.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

/// One unit of source text. Only `Code` cells are ever skeletonized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Cell {
    Code(CellBase),
    Markdown(CellBase),
}

impl Cell {
    pub fn code(path: impl Into<String>, content: impl Into<String>) -> Self {
        Cell::Code(CellBase::new(path, content))
    }

    pub fn markdown(path: impl Into<String>, content: impl Into<String>) -> Self {
        Cell::Markdown(CellBase::new(path, content))
    }

    pub fn base(&self) -> &CellBase {
        match self {
            Cell::Code(base) | Cell::Markdown(base) => base,
        }
    }

    pub fn path(&self) -> &str {
        &self.base().path
    }

    pub fn display_name(&self) -> &str {
        &self.base().display_name
    }

    pub fn content(&self) -> &str {
        &self.base().content
    }

    pub fn output(&self) -> Option<&str> {
        self.base().output.as_deref()
    }

    /// The compressible view of this cell; `None` for markdown.
    pub fn as_code(&self) -> Option<&CellBase> {
        match self {
            Cell::Code(base) => Some(base),
            Cell::Markdown(_) => None,
        }
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self, Cell::Markdown(_))
    }
}

/// What the caller wants for a selected cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Full,
    #[default]
    Compressed,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Full => write!(f, "full"),
            Intent::Compressed => write!(f, "compressed"),
        }
    }
}

/// A cell picked for the output document, or the record of a failed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedCell {
    Ready { cell: Cell, intent: Intent },
    Unreadable {
        path: String,
        display_name: String,
        reason: String,
    },
}

impl SelectedCell {
    pub fn ready(cell: Cell, intent: Intent) -> Self {
        SelectedCell::Ready { cell, intent }
    }

    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        SelectedCell::Unreadable {
            display_name: display_name_for(&path),
            path,
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            SelectedCell::Ready { cell, .. } => cell.path(),
            SelectedCell::Unreadable { path, .. } => path,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SelectedCell::Ready { cell, .. } => cell.display_name(),
            SelectedCell::Unreadable { display_name, .. } => display_name,
        }
    }
}

/// Last path component, keeping a `#N` notebook cell suffix.
pub fn display_name_for(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(path)
        .to_string()
}

/// Count of lines that contain something other than whitespace.
pub fn non_blank_line_count(text: &str) -> usize {
    text.lines().filter(|line| !line.trim().is_empty()).count()
}
