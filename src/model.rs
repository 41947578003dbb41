use std::fmt::{Display, Formatter};
use unicode_width::UnicodeWidthStr;

/// A single list entry. The id is never rendered; it drives selection, deletion,
/// filtering and highlight carry-over.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Row {
    pub id: String,
    pub display_values: Vec<String>,
}

impl Row {
    pub fn new(id: impl Into<String>, display_values: Vec<String>) -> Self {
        Self {
            id: id.into(),
            display_values,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Column {
    pub label: String,
    pub width: usize,
    min_width: usize,
}

impl Column {
    pub fn new(label: impl Into<String>, min_width: usize) -> Self {
        let label = label.into();
        let width = min_width.max(label.width());
        Self {
            label,
            width,
            min_width,
        }
    }

    pub fn min_width(&self) -> usize {
        self.min_width
    }
}

/// Recomputes every column width from its minimum, its label and the widest cell.
pub fn fit_columns(columns: &mut [Column], rows: &[Row]) {
    for (index, column) in columns.iter_mut().enumerate() {
        let widest_cell = rows
            .iter()
            .filter_map(|row| row.display_values.get(index))
            .map(|value| value.width())
            .max()
            .unwrap_or(0);
        column.width = column.min_width.max(column.label.width()).max(widest_cell);
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContextEntry {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContextCatalog {
    pub entries: Vec<ContextEntry>,
    pub current: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct NamespaceSummary {
    pub name: String,
    pub status: String,
    pub age: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodSummary {
    pub name: String,
    pub ready: String,
    pub status: String,
    pub restarts: i32,
    pub age: String,
    pub node: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodEvent {
    pub age: String,
    pub kind: String,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContainerLog {
    pub container: String,
    pub text: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodDetail {
    pub name: String,
    pub namespace: String,
    pub fields: Vec<(String, String)>,
    pub events: Vec<PodEvent>,
    pub logs: Vec<ContainerLog>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DetailSection {
    Status,
    Events,
    Logs,
}

impl DetailSection {
    pub const ALL: [Self; 3] = [Self::Status, Self::Events, Self::Logs];

    pub fn title(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Events => "Events",
            Self::Logs => "Logs",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Status => Self::Events,
            Self::Events => Self::Logs,
            Self::Logs => Self::Status,
        }
    }
}

impl Display for DetailSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}
