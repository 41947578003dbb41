use ratatui::Frame;
use ratatui::layout::Rect;
use tracing::warn;

use crate::event::{AppEvent, GenerationCounter, bounded};
use crate::input::Action;
use crate::model::{Column, NamespaceSummary, Row};
use crate::screen::{
    Effect, Navigation, Outcome, Params, RenderContext, Screen, SharedState, params,
};
use crate::screens::{PODS, show_error};
use crate::ui::render_notice;
use crate::widgets::{ListMode, ListOptions, ListSignal, ListView};

pub struct NamespacesScreen {
    state: SharedState,
    list: ListView,
    loaded: bool,
    loading: bool,
    generation: GenerationCounter,
}

impl NamespacesScreen {
    pub fn new(state: &SharedState, _params: &Params) -> Self {
        let min = state.settings.min_column_width;
        let list = ListView::new(
            vec![
                Column::new("Namespace", min),
                Column::new("Status", min),
                Column::new("Age", min),
            ],
            Vec::new(),
            state.settings.page_size,
            state.backend.default_namespace(),
            false,
            ListOptions {
                singular_item_name: "namespace".to_string(),
                start_in_search_mode: false,
            },
            state.keys.clone(),
        );
        Self {
            state: state.clone(),
            list,
            loaded: false,
            loading: false,
            generation: GenerationCounter::default(),
        }
    }

    fn load(&mut self) -> Effect {
        let generation = self.generation.issue();
        self.loading = true;
        let backend = self.state.backend.clone();
        let limit = self.state.settings.list_timeout;
        Effect::new("namespaces.list", async move {
            let result = bounded("list namespaces", limit, backend.list_namespaces()).await;
            AppEvent::NamespacesLoaded { generation, result }
        })
    }

    fn rows(namespaces: &[NamespaceSummary]) -> Vec<Row> {
        namespaces
            .iter()
            .map(|namespace| {
                Row::new(
                    namespace.name.clone(),
                    vec![
                        namespace.name.clone(),
                        namespace.status.clone(),
                        namespace.age.clone(),
                    ],
                )
            })
            .collect()
    }
}

impl Screen for NamespacesScreen {
    fn title(&self) -> String {
        format!("Namespaces · {}", self.state.backend.context())
    }

    fn init(&mut self) -> Option<Effect> {
        Some(self.load())
    }

    fn update(&mut self, event: AppEvent) -> Outcome {
        match event {
            AppEvent::Key(key) => {
                if self.list.mode() == ListMode::Select {
                    match self.state.keys.action_for(&key) {
                        Some(Action::Back) => {
                            return Outcome::navigate(Navigation::Pop {
                                reinitialize: false,
                            });
                        }
                        Some(Action::Refresh) => return Outcome::effect(self.load()),
                        _ => {}
                    }
                }
                match self.list.update(&key) {
                    Some(ListSignal::Selection { id }) => {
                        self.list.update_highlighted(id.clone());
                        Outcome::navigate(Navigation::push(
                            PODS,
                            params([("namespace", id.as_str())]),
                            false,
                        ))
                    }
                    _ => Outcome::none(),
                }
            }
            AppEvent::NamespacesLoaded { generation, result } => {
                if !self.generation.is_current(generation) {
                    warn!(?generation, "dropping stale namespace list");
                    return Outcome::none();
                }
                self.loading = false;
                match result {
                    Ok(namespaces) => {
                        self.loaded = true;
                        self.list.update_rows(Self::rows(&namespaces), None);
                        Outcome::none()
                    }
                    Err(error) => {
                        warn!("{error}");
                        Outcome::navigate(show_error(&error))
                    }
                }
            }
            _ => Outcome::none(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
        let theme = ctx.theme;
        if !self.loaded && self.loading {
            render_notice(frame, area, "Namespaces", "Loading namespaces…", theme.muted, theme);
            return;
        }
        self.list
            .set_page_size(self.state.page_size_for(ListView::rows_fitting(area)));
        self.list.render(frame, area, "Namespaces", theme);
    }

    fn help(&self) -> Vec<(String, String)> {
        let mut lines = self.list.help();
        lines.push((
            self.state.keys.refresh.hint().to_string(),
            "reload".to_string(),
        ));
        lines
    }

    fn captures_input(&self) -> bool {
        self.list.mode() == ListMode::Search
    }
}
