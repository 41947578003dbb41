use futures::future::BoxFuture;
use ratatui::Frame;
use ratatui::layout::Rect;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::ClusterBackend;
use crate::contexts::ContextStore;
use crate::event::AppEvent;
use crate::input::KeyBindings;
use crate::ui::Theme;

pub type Params = BTreeMap<String, String>;

pub fn params<const N: usize>(pairs: [(&str, &str); N]) -> Params {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Deferred work. The loop spawns it and feeds the produced event back in.
pub struct Effect {
    label: String,
    future: BoxFuture<'static, AppEvent>,
}

impl Effect {
    pub fn new<F>(label: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        Self {
            label: label.into(),
            future: Box::pin(future),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn into_future(self) -> BoxFuture<'static, AppEvent> {
        self.future
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect").field("label", &self.label).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Push {
        target: String,
        params: Params,
        reinitialize: bool,
    },
    Pop {
        reinitialize: bool,
    },
    /// Pops `levels` screens at once, for leaving a screen together with the one
    /// that opened it.
    Unwind {
        levels: usize,
        reinitialize: bool,
    },
    Quit,
}

impl Navigation {
    pub fn push(target: &str, params: Params, reinitialize: bool) -> Self {
        Self::Push {
            target: target.to_string(),
            params,
            reinitialize,
        }
    }
}

#[derive(Debug, Default)]
pub struct Outcome {
    pub effect: Option<Effect>,
    pub navigation: Option<Navigation>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            effect: Some(effect),
            navigation: None,
        }
    }

    pub fn navigate(navigation: Navigation) -> Self {
        Self {
            effect: None,
            navigation: Some(navigation),
        }
    }
}

impl From<Option<Effect>> for Outcome {
    fn from(effect: Option<Effect>) -> Self {
        Self {
            effect,
            navigation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Fixed rows per page; 0 sizes pages to the terminal.
    pub page_size: usize,
    pub min_column_width: usize,
    pub log_lines: i64,
    pub list_timeout: Duration,
    pub detail_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 0,
            min_column_width: 4,
            log_lines: 200,
            list_timeout: Duration::from_secs(3),
            detail_timeout: Duration::from_secs(5),
        }
    }
}

/// Collaborators and configuration handed to every screen factory.
#[derive(Clone)]
pub struct SharedState {
    pub backend: Arc<dyn ClusterBackend>,
    pub contexts: Arc<dyn ContextStore>,
    pub keys: KeyBindings,
    pub settings: Settings,
}

impl SharedState {
    /// Page size for a list drawn into `rows_fitting` body rows.
    pub fn page_size_for(&self, rows_fitting: usize) -> usize {
        if self.settings.page_size > 0 {
            self.settings.page_size
        } else {
            rows_fitting
        }
    }
}

pub struct RenderContext<'a> {
    pub theme: &'a Theme,
    pub keys: &'a KeyBindings,
}

/// Lifecycle shared by every screen: `init` once after construction, `update` for
/// every event while active, `render` each frame, `destroy` once when left.
pub trait Screen {
    fn title(&self) -> String;

    fn init(&mut self) -> Option<Effect>;

    fn update(&mut self, event: AppEvent) -> Outcome;

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext<'_>);

    fn destroy(&mut self) -> Option<Effect> {
        None
    }

    /// Key hints for the footer and help modal.
    fn help(&self) -> Vec<(String, String)>;

    /// True while the screen consumes raw text, so global single-key bindings must
    /// not fire.
    fn captures_input(&self) -> bool {
        false
    }
}
