use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, Tabs, Wrap};
use tracing::warn;

use crate::event::{AppEvent, GenerationCounter, bounded};
use crate::highlight::highlight_log_text;
use crate::input::Action;
use crate::model::{DetailSection, PodDetail};
use crate::screen::{Effect, Navigation, Outcome, Params, RenderContext, Screen, SharedState};
use crate::screens::show_error;
use crate::ui::{Theme, render_notice};

pub struct PodDetailScreen {
    state: SharedState,
    namespace: String,
    pod: String,
    detail: Option<PodDetail>,
    section: DetailSection,
    container: usize,
    scroll: u16,
    loading: bool,
    generation: GenerationCounter,
}

impl PodDetailScreen {
    pub fn new(state: &SharedState, params: &Params) -> Self {
        let namespace = params
            .get("namespace")
            .cloned()
            .unwrap_or_else(|| state.backend.default_namespace());
        Self {
            state: state.clone(),
            namespace,
            pod: params.get("pod").cloned().unwrap_or_default(),
            detail: None,
            section: DetailSection::Status,
            container: 0,
            scroll: 0,
            loading: false,
            generation: GenerationCounter::default(),
        }
    }

    pub fn section(&self) -> DetailSection {
        self.section
    }

    fn load(&mut self) -> Effect {
        let generation = self.generation.issue();
        self.loading = true;
        let backend = self.state.backend.clone();
        let namespace = self.namespace.clone();
        let pod = self.pod.clone();
        let limit = self.state.settings.detail_timeout;
        let log_lines = self.state.settings.log_lines;
        Effect::new("pod.get", async move {
            let result = bounded("get pod", limit, backend.get_pod(&namespace, &pod, log_lines)).await;
            AppEvent::PodLoaded {
                namespace,
                pod,
                generation,
                result,
            }
        })
    }

    fn container_count(&self) -> usize {
        self.detail.as_ref().map(|detail| detail.logs.len()).unwrap_or(0)
    }

    fn on_action(&mut self, action: Action) -> Outcome {
        match action {
            Action::Back => Outcome::navigate(Navigation::Pop {
                reinitialize: false,
            }),
            Action::Refresh => Outcome::effect(self.load()),
            Action::NextSection => {
                self.section = self.section.next();
                self.scroll = 0;
                Outcome::none()
            }
            Action::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Outcome::none()
            }
            Action::Down => {
                self.scroll = self.scroll.saturating_add(1);
                Outcome::none()
            }
            Action::Left if self.section == DetailSection::Logs => {
                self.container = self.container.saturating_sub(1);
                self.scroll = 0;
                Outcome::none()
            }
            Action::Right if self.section == DetailSection::Logs => {
                if self.container + 1 < self.container_count() {
                    self.container += 1;
                    self.scroll = 0;
                }
                Outcome::none()
            }
            _ => Outcome::none(),
        }
    }

    fn section_text(&self, detail: &PodDetail, theme: &Theme) -> (String, Text<'static>) {
        match self.section {
            DetailSection::Status => {
                let width = detail
                    .fields
                    .iter()
                    .map(|(key, _)| key.chars().count())
                    .max()
                    .unwrap_or(0);
                let lines = detail
                    .fields
                    .iter()
                    .map(|(key, value)| {
                        Line::from(vec![
                            Span::styled(format!("{key:<width$}  "), Style::default().fg(theme.muted)),
                            Span::styled(value.clone(), Style::default().fg(theme.text)),
                        ])
                    })
                    .collect::<Vec<_>>();
                ("Status".to_string(), Text::from(lines))
            }
            DetailSection::Events => ("Events".to_string(), Text::default()),
            DetailSection::Logs => match detail.logs.get(self.container) {
                Some(log) => (
                    format!(
                        "Logs · {} ({}/{})",
                        log.container,
                        self.container + 1,
                        detail.logs.len()
                    ),
                    if log.text.is_empty() {
                        Text::styled("no log output", Style::default().fg(theme.muted))
                    } else {
                        highlight_log_text(&log.text, theme)
                    },
                ),
                None => (
                    "Logs".to_string(),
                    Text::styled("no containers", Style::default().fg(theme.muted)),
                ),
            },
        }
    }

    fn render_events(&self, frame: &mut Frame, area: Rect, detail: &PodDetail, theme: &Theme) {
        let block = Block::default()
            .title(format!("Events ({})", detail.events.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.panel));
        if detail.events.is_empty() {
            frame.render_widget(
                Paragraph::new("no events")
                    .style(Style::default().fg(theme.muted))
                    .block(block),
                area,
            );
            return;
        }

        let rows = detail.events.iter().skip(self.scroll as usize).map(|event| {
            let color = if event.kind == "Warning" {
                theme.warn
            } else {
                theme.text
            };
            TableRow::new(vec![
                Cell::from(event.age.clone()),
                Cell::from(event.kind.clone()),
                Cell::from(event.reason.clone()),
                Cell::from(event.message.clone()),
            ])
            .style(Style::default().fg(color))
        });
        let header = TableRow::new(["Age", "Type", "Reason", "Message"].map(|label| {
            Cell::from(label).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().fg(theme.accent));
        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Length(22),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(block);
        frame.render_widget(table, area);
    }
}

impl Screen for PodDetailScreen {
    fn title(&self) -> String {
        format!("Pod · {}/{}", self.namespace, self.pod)
    }

    fn init(&mut self) -> Option<Effect> {
        Some(self.load())
    }

    fn update(&mut self, event: AppEvent) -> Outcome {
        match event {
            AppEvent::Key(key) => match self.state.keys.action_for(&key) {
                Some(action) => self.on_action(action),
                None => Outcome::none(),
            },
            AppEvent::Tick => Outcome::effect(self.load()),
            AppEvent::PodLoaded {
                namespace,
                pod,
                generation,
                result,
            } => {
                if namespace != self.namespace
                    || pod != self.pod
                    || !self.generation.is_current(generation)
                {
                    warn!(%namespace, %pod, ?generation, "dropping stale pod detail");
                    return Outcome::none();
                }
                self.loading = false;
                match result {
                    Ok(detail) => {
                        self.container = self.container.min(detail.logs.len().saturating_sub(1));
                        self.detail = Some(detail);
                        Outcome::none()
                    }
                    Err(error) => {
                        warn!(%namespace, %pod, "{error}");
                        Outcome::navigate(show_error(&error))
                    }
                }
            }
            _ => Outcome::none(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
        let theme = ctx.theme;
        let Some(detail) = self.detail.as_ref() else {
            let message = if self.loading {
                format!("Loading {}/{}…", self.namespace, self.pod)
            } else {
                format!("No data yet, press {} to load", ctx.keys.refresh.hint())
            };
            render_notice(frame, area, "Pod", &message, theme.muted, theme);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);

        let selected = DetailSection::ALL
            .iter()
            .position(|section| *section == self.section)
            .unwrap_or(0);
        let tabs = Tabs::new(DetailSection::ALL.iter().map(|section| section.title()))
            .select(selected)
            .style(Style::default().fg(theme.muted))
            .highlight_style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        if self.section == DetailSection::Events {
            let last = detail.events.len().saturating_sub(1);
            self.scroll = self.scroll.min(u16::try_from(last).unwrap_or(u16::MAX));
            self.render_events(frame, chunks[1], detail, theme);
            return;
        }

        let (title, text) = self.section_text(detail, theme);
        let last = text.lines.len().saturating_sub(1);
        self.scroll = self.scroll.min(u16::try_from(last).unwrap_or(u16::MAX));
        let pane = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .style(Style::default().bg(theme.panel)),
            );
        frame.render_widget(pane, chunks[1]);
    }

    fn help(&self) -> Vec<(String, String)> {
        let keys = &self.state.keys;
        let mut lines = vec![
            (
                keys.next_section.hint().to_string(),
                "next section".to_string(),
            ),
            (
                format!("{} {}", keys.up.hint(), keys.down.hint()),
                "scroll".to_string(),
            ),
        ];
        if self.section == DetailSection::Logs {
            lines.push((
                format!("{} {}", keys.left.hint(), keys.right.hint()),
                "change container".to_string(),
            ));
        }
        lines.push((keys.refresh.hint().to_string(), "refresh".to_string()));
        lines
    }
}
