use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, TableState};

use crate::input::{Action, KeyBindings};
use crate::model::{Column, Row, fit_columns};
use crate::ui::Theme;
use crate::widgets::text_input::TextInput;

/// Rows taken by the border, header, search line and footer around the table body.
pub const LIST_CHROME_ROWS: u16 = 5;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ListMode {
    Select,
    Search,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ListSignal {
    Selection { id: String },
    Deletion { id: String },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ListOptions {
    pub singular_item_name: String,
    pub start_in_search_mode: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            singular_item_name: "item".to_string(),
            start_in_search_mode: false,
        }
    }
}

/// Paginated, searchable, selectable list of rows.
///
/// Every transition recomputes the filtered set, page count, current page slice and
/// cursor so that the page and cursor always index into valid data. Signals are pure
/// notifications: the list never removes or reorders rows on its own, the hosting
/// screen does that through [`ListView::update_rows`].
#[derive(Debug, Clone)]
pub struct ListView {
    columns: Vec<Column>,
    rows: Vec<Row>,
    search: TextInput,
    mode: ListMode,
    current_page: usize,
    page_size: usize,
    num_pages: usize,
    cursor: usize,
    highlighted_id: String,
    allow_delete: bool,
    options: ListOptions,
    keys: KeyBindings,
    filtered: Vec<usize>,
    last_filtered_count: Option<usize>,
}

impl ListView {
    pub fn new(
        columns: Vec<Column>,
        rows: Vec<Row>,
        page_size: usize,
        highlighted_id: impl Into<String>,
        allow_delete: bool,
        options: ListOptions,
        keys: KeyBindings,
    ) -> Self {
        let mode = if options.start_in_search_mode {
            ListMode::Search
        } else {
            ListMode::Select
        };
        let mut list = Self {
            columns,
            rows,
            search: TextInput::default(),
            mode,
            current_page: 0,
            page_size,
            num_pages: 0,
            cursor: 0,
            highlighted_id: highlighted_id.into(),
            allow_delete,
            options,
            keys,
            filtered: Vec::new(),
            last_filtered_count: None,
        };
        fit_columns(&mut list.columns, &list.rows);
        list.recompute();
        list
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn search_text(&self) -> &str {
        self.search.value()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn highlighted_id(&self) -> &str {
        &self.highlighted_id
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn allow_delete(&self) -> bool {
        self.allow_delete
    }

    pub fn singular_item_name(&self) -> &str {
        &self.options.singular_item_name
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn current_page_slice(&self) -> Vec<&Row> {
        let Some(range) = self.page_range() else {
            return Vec::new();
        };
        self.filtered[range]
            .iter()
            .map(|index| &self.rows[*index])
            .collect()
    }

    pub fn selected_row(&self) -> Option<&Row> {
        let range = self.page_range()?;
        self.filtered[range]
            .get(self.cursor)
            .map(|index| &self.rows[*index])
    }

    pub fn update(&mut self, key: &KeyEvent) -> Option<ListSignal> {
        let signal = match self.mode {
            ListMode::Select => self.update_select(key),
            ListMode::Search => {
                self.update_search(key);
                None
            }
        };
        self.recompute();
        signal
    }

    pub fn update_rows(&mut self, rows: Vec<Row>, columns: Option<Vec<Column>>) {
        if let Some(columns) = columns {
            self.columns = columns;
        }
        self.rows = rows;
        fit_columns(&mut self.columns, &self.rows);
        self.recompute();
    }

    pub fn update_highlighted(&mut self, id: impl Into<String>) {
        self.highlighted_id = id.into();
        self.recompute();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if self.page_size == page_size {
            return;
        }
        self.page_size = page_size;
        self.recompute();
    }

    fn update_select(&mut self, key: &KeyEvent) -> Option<ListSignal> {
        match self.keys.action_for(key)? {
            Action::Up => {
                if self.cursor == 0 {
                    self.mode = ListMode::Search;
                } else {
                    self.cursor -= 1;
                }
                None
            }
            Action::Down => {
                let last = self.slice_len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(last);
                None
            }
            Action::Left => {
                self.current_page = self.current_page.saturating_sub(1);
                None
            }
            Action::Right => {
                if self.current_page + 1 < self.num_pages {
                    self.current_page += 1;
                }
                None
            }
            Action::Search => {
                self.mode = ListMode::Search;
                None
            }
            Action::Confirm => self
                .selected_row()
                .map(|row| ListSignal::Selection { id: row.id.clone() }),
            Action::Delete if self.allow_delete => self
                .selected_row()
                .map(|row| ListSignal::Deletion { id: row.id.clone() }),
            _ => None,
        }
    }

    fn update_search(&mut self, key: &KeyEvent) {
        let exits = matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Down)
            || self.keys.search.matches(key);
        if exits {
            self.mode = ListMode::Select;
            return;
        }
        self.search.handle_key(key);
    }

    fn recompute(&mut self) {
        let needle = self.search.value();
        self.filtered = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.id.contains(needle))
            .map(|(index, _)| index)
            .collect();

        let count = self.filtered.len();
        if self.last_filtered_count != Some(count) {
            self.current_page = 0;
            self.last_filtered_count = Some(count);
        }

        self.num_pages = if self.page_size == 0 {
            0
        } else {
            count.div_ceil(self.page_size)
        };
        self.current_page = self.current_page.min(self.num_pages.saturating_sub(1));

        let slice_len = self.slice_len();
        if slice_len == 0 || self.cursor >= slice_len {
            self.cursor = 0;
        }
    }

    fn page_range(&self) -> Option<std::ops::Range<usize>> {
        if self.page_size == 0 {
            return None;
        }
        let start = self.current_page.checked_mul(self.page_size)?;
        if start >= self.filtered.len() {
            return None;
        }
        let end = self.filtered.len().min(start + self.page_size);
        Some(start..end)
    }

    fn slice_len(&self) -> usize {
        self.page_range().map(|range| range.len()).unwrap_or(0)
    }

    pub fn help(&self) -> Vec<(String, String)> {
        let item = &self.options.singular_item_name;
        let mut lines = vec![
            (
                format!("{} {}", self.keys.up.hint(), self.keys.down.hint()),
                format!("move between {item}s"),
            ),
            (
                format!("{} {}", self.keys.left.hint(), self.keys.right.hint()),
                "change page".to_string(),
            ),
            (
                self.keys.search.hint().to_string(),
                format!("search {item}s by name"),
            ),
            (
                self.keys.confirm.hint().to_string(),
                format!("open {item}"),
            ),
        ];
        if self.allow_delete {
            lines.push((
                self.keys.delete.hint().to_string(),
                format!("delete {item}"),
            ));
        }
        lines
    }

    /// Number of table body rows that fit in `area` once the chrome is drawn.
    pub fn rows_fitting(area: Rect) -> usize {
        area.height.saturating_sub(LIST_CHROME_ROWS) as usize
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
        let block = Block::default()
            .title(format!("{title} ({})", self.filtered.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.panel));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        frame.render_widget(Paragraph::new(self.search_line(theme)), chunks[0]);

        if self.filtered.is_empty() {
            let message = if self.rows.is_empty() {
                format!("No {}s found", self.options.singular_item_name)
            } else {
                format!(
                    "No {}s match \"{}\"",
                    self.options.singular_item_name,
                    self.search.value()
                )
            };
            frame.render_widget(
                Paragraph::new(message).style(Style::default().fg(theme.muted)),
                chunks[1],
            );
        } else {
            self.render_table(frame, chunks[1], theme);
        }

        let footer = if self.num_pages == 0 {
            format!("page 0/0 · {} {}s", self.filtered.len(), self.options.singular_item_name)
        } else {
            format!(
                "page {}/{} · {} {}s",
                self.current_page + 1,
                self.num_pages,
                self.filtered.len(),
                self.options.singular_item_name
            )
        };
        frame.render_widget(
            Paragraph::new(footer).style(Style::default().fg(theme.muted)),
            chunks[2],
        );
    }

    fn search_line(&self, theme: &Theme) -> Line<'static> {
        let value = self.search.value().to_string();
        match self.mode {
            ListMode::Search => {
                let caret = self.search.caret();
                let before = value.chars().take(caret).collect::<String>();
                let at = value.chars().nth(caret).map(String::from).unwrap_or_else(|| " ".to_string());
                let after = value.chars().skip(caret + 1).collect::<String>();
                Line::from(vec![
                    Span::styled("search: ", Style::default().fg(theme.accent)),
                    Span::raw(before),
                    Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
                    Span::raw(after),
                ])
            }
            ListMode::Select if value.is_empty() => Line::from(Span::styled(
                format!("{} to search", self.keys.search.hint()),
                Style::default().fg(theme.muted),
            )),
            ListMode::Select => Line::from(vec![
                Span::styled("filter: ", Style::default().fg(theme.muted)),
                Span::raw(value),
            ]),
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let header = TableRow::new(self.columns.iter().map(|column| {
            Cell::from(column.label.clone()).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().fg(theme.accent));

        let rows = self.current_page_slice().into_iter().map(|row| {
            let style = if !self.highlighted_id.is_empty() && row.id == self.highlighted_id {
                Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            TableRow::new(row.display_values.iter().cloned().map(Cell::from)).style(style)
        });

        let widths = self
            .columns
            .iter()
            .map(|column| Constraint::Length(column.width as u16))
            .collect::<Vec<_>>();

        let row_highlight = if self.mode == ListMode::Select {
            Style::default().bg(theme.selection).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .row_highlight_style(row_highlight)
            .highlight_symbol("▶ ");

        let mut state = TableState::default();
        if self.mode == ListMode::Select {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }
}
