use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::contexts::purge_context;
use crate::event::{AppEvent, CollaboratorError, GenerationCounter, blocking, bounded};
use crate::input::Action;
use crate::model::{Column, ContextCatalog, ContextEntry, Row};
use crate::screen::{
    Effect, Navigation, Outcome, Params, RenderContext, Screen, SharedState,
};
use crate::screens::{NAMESPACES, dash_if_empty, show_error};
use crate::ui::render_notice;
use crate::widgets::{
    Dialog, DialogButton, DialogSignal, ListMode, ListOptions, ListSignal, ListView,
};

const DELETE_CONTEXT: &str = "context";
const DELETE_ALL: &str = "all";
const CANCEL: &str = "cancel";

pub struct ContextsScreen {
    state: SharedState,
    list: ListView,
    entries: Vec<ContextEntry>,
    pending_delete: Option<(Dialog, ContextEntry)>,
    loading: bool,
    switching: Option<String>,
    failure: Option<String>,
    generation: GenerationCounter,
}

impl ContextsScreen {
    pub fn new(state: &SharedState, _params: &Params) -> Self {
        let min = state.settings.min_column_width;
        let list = ListView::new(
            vec![
                Column::new("Context", min),
                Column::new("Cluster", min),
                Column::new("User", min),
                Column::new("Namespace", min),
            ],
            Vec::new(),
            state.settings.page_size,
            "",
            true,
            ListOptions {
                singular_item_name: "context".to_string(),
                start_in_search_mode: false,
            },
            state.keys.clone(),
        );
        Self {
            state: state.clone(),
            list,
            entries: Vec::new(),
            pending_delete: None,
            loading: false,
            switching: None,
            failure: None,
            generation: GenerationCounter::default(),
        }
    }

    fn load(&mut self) -> Effect {
        let generation = self.generation.issue();
        self.loading = true;
        let store = self.state.contexts.clone();
        let limit = self.state.settings.list_timeout;
        Effect::new("contexts.list", async move {
            let result = bounded("list contexts", limit, blocking(move || store.catalog())).await;
            AppEvent::ContextsLoaded { generation, result }
        })
    }

    fn switch(&mut self, context: String) -> Effect {
        self.switching = Some(context.clone());
        let store = self.state.contexts.clone();
        let backend = self.state.backend.clone();
        let limit = self.state.settings.detail_timeout;
        Effect::new("contexts.switch", async move {
            let result = bounded("switch context", limit, async {
                let name = context.clone();
                blocking(move || store.switch_context(&name, None)).await?;
                backend.use_context(&context, None).await
            })
            .await;
            AppEvent::ContextSwitched { context, result }
        })
    }

    fn delete(&self, entry: ContextEntry, with_references: bool) -> Effect {
        let store = self.state.contexts.clone();
        let limit = self.state.settings.list_timeout;
        Effect::new("contexts.delete", async move {
            let context = entry.name.clone();
            let result = bounded(
                "delete context",
                limit,
                blocking(move || {
                    if with_references {
                        purge_context(store.as_ref(), &entry)
                    } else {
                        store.delete_context(&entry.name)
                    }
                }),
            )
            .await;
            AppEvent::ContextDeleted { context, result }
        })
    }

    fn apply_catalog(&mut self, catalog: ContextCatalog) {
        let current = catalog.current.unwrap_or_default();
        let rows = catalog
            .entries
            .iter()
            .map(|entry| {
                let marker = if entry.name == current { "*" } else { " " };
                Row::new(
                    entry.name.clone(),
                    vec![
                        format!("{marker} {}", entry.name),
                        dash_if_empty(&entry.cluster),
                        dash_if_empty(&entry.user),
                        if entry.namespace.is_empty() {
                            "default".to_string()
                        } else {
                            entry.namespace.clone()
                        },
                    ],
                )
            })
            .collect();
        self.entries = catalog.entries;
        self.failure = None;
        self.list.update_rows(rows, None);
        self.list.update_highlighted(current);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Outcome {
        if let Some((dialog, _)) = self.pending_delete.as_mut() {
            let signal = dialog.update(&key);
            return self.on_dialog_signal(signal);
        }

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
            Some(ListSignal::Selection { id }) => Outcome::effect(self.switch(id)),
            Some(ListSignal::Deletion { id }) => {
                if let Some(entry) = self.entries.iter().find(|entry| entry.name == id) {
                    let mut dialog = Dialog::new(
                        format!("Delete context {id}?"),
                        vec![
                            DialogButton::new("Context only", DELETE_CONTEXT),
                            DialogButton::new("Context+user+cluster", DELETE_ALL),
                            DialogButton::new("Cancel", CANCEL),
                        ],
                        self.state.keys.clone(),
                    );
                    dialog.focus(CANCEL);
                    self.pending_delete = Some((dialog, entry.clone()));
                }
                Outcome::none()
            }
            None => Outcome::none(),
        }
    }

    fn on_dialog_signal(&mut self, signal: Option<DialogSignal>) -> Outcome {
        let Some(signal) = signal else {
            return Outcome::none();
        };
        let Some((_, entry)) = self.pending_delete.take() else {
            return Outcome::none();
        };
        match signal {
            DialogSignal::ButtonPress { id } if id == DELETE_CONTEXT => {
                Outcome::effect(self.delete(entry, false))
            }
            DialogSignal::ButtonPress { id } if id == DELETE_ALL => {
                Outcome::effect(self.delete(entry, true))
            }
            _ => Outcome::none(),
        }
    }

    fn on_failure(&mut self, error: CollaboratorError) -> Outcome {
        warn!("{error}");
        self.failure = Some(error.to_string());
        Outcome::navigate(show_error(&error))
    }
}

impl Screen for ContextsScreen {
    fn title(&self) -> String {
        match &self.switching {
            Some(context) => format!("Contexts · switching to {context}"),
            None => "Contexts".to_string(),
        }
    }

    fn init(&mut self) -> Option<Effect> {
        Some(self.load())
    }

    fn update(&mut self, event: AppEvent) -> Outcome {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::ContextsLoaded { generation, result } => {
                if !self.generation.is_current(generation) {
                    warn!(?generation, "dropping stale context list");
                    return Outcome::none();
                }
                self.loading = false;
                match result {
                    Ok(catalog) => {
                        self.apply_catalog(catalog);
                        Outcome::none()
                    }
                    Err(error) => self.on_failure(error),
                }
            }
            AppEvent::ContextSwitched { context, result } => {
                self.switching = None;
                match result {
                    Ok(()) => {
                        info!(context = %context, "context switched");
                        self.list.update_highlighted(context);
                        Outcome::navigate(Navigation::push(NAMESPACES, Params::new(), true))
                    }
                    Err(error) => self.on_failure(error),
                }
            }
            AppEvent::ContextDeleted { context, result } => match result {
                Ok(()) => {
                    info!(context = %context, "context deleted");
                    Outcome::effect(self.load())
                }
                Err(error) => self.on_failure(error),
            },
            _ => Outcome::none(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
        let theme = ctx.theme;
        if self.entries.is_empty() {
            if self.loading {
                render_notice(frame, area, "Contexts", "Loading contexts…", theme.muted, theme);
                return;
            }
            if let Some(failure) = &self.failure {
                let message = format!("{failure}\n\npress {} to retry", ctx.keys.refresh.hint());
                render_notice(frame, area, "Contexts", &message, theme.error, theme);
                return;
            }
        }

        self.list
            .set_page_size(self.state.page_size_for(ListView::rows_fitting(area)));
        self.list.render(frame, area, "Contexts", theme);
        if let Some((dialog, _)) = &self.pending_delete {
            dialog.render(frame, area, theme);
        }
    }

    fn help(&self) -> Vec<(String, String)> {
        let keys = &self.state.keys;
        let mut lines = self.list.help();
        if let Some(selection) = lines.iter_mut().find(|(_, text)| text == "open context") {
            selection.1 = "switch to context".to_string();
        }
        lines.push((keys.refresh.hint().to_string(), "reload".to_string()));
        lines
    }

    fn captures_input(&self) -> bool {
        self.list.mode() == ListMode::Search
    }
}
