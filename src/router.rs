use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::screen::{Effect, Params, Screen, SharedState};

pub type ScreenFactory = Box<dyn Fn(&SharedState, &Params) -> Box<dyn Screen>>;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RouteError {
    #[error("no screen registered under '{0}'")]
    Unknown(String),
}

struct Entry {
    name: String,
    params: Params,
    screen: Box<dyn Screen>,
    /// `destroy` already ran; the instance must be initialised before it is active again.
    destroyed: bool,
    /// Built against collaborator state that has since changed.
    stale: bool,
}

impl Entry {
    fn new(name: &str, params: Params, screen: Box<dyn Screen>) -> Self {
        Self {
            name: name.to_string(),
            params,
            screen,
            destroyed: false,
            stale: false,
        }
    }
}

/// Owns the single active screen, the name → factory registry, the suspended
/// screens below it and the instances left behind by `pop`.
pub struct Router {
    factories: HashMap<String, ScreenFactory>,
    active: Entry,
    history: Vec<Entry>,
    cache: HashMap<String, Entry>,
}

#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, ScreenFactory>,
}

impl Registry {
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&SharedState, &Params) -> Box<dyn Screen> + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }
}

impl Router {
    /// Builds the router with `initial` as the active screen. `init` is not called;
    /// the loop does that before the first frame.
    pub fn new(
        registry: Registry,
        initial: &str,
        state: &SharedState,
        params: Params,
    ) -> Result<Self, RouteError> {
        let factory = registry
            .factories
            .get(initial)
            .ok_or_else(|| RouteError::Unknown(initial.to_string()))?;
        let screen = factory(state, &params);
        Ok(Self {
            factories: registry.factories,
            active: Entry::new(initial, params, screen),
            history: Vec::new(),
            cache: HashMap::new(),
        })
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&SharedState, &Params) -> Box<dyn Screen> + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn current(&self) -> &dyn Screen {
        self.active.screen.as_ref()
    }

    pub fn current_mut(&mut self) -> &mut dyn Screen {
        self.active.screen.as_mut()
    }

    pub fn current_name(&self) -> &str {
        &self.active.name
    }

    /// Names from the root screen to the active one.
    pub fn trail(&self) -> Vec<&str> {
        self.history
            .iter()
            .map(|entry| entry.name.as_str())
            .chain(std::iter::once(self.active.name.as_str()))
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Replaces the active screen with a fresh instance. The old instance is
    /// dropped; history is left untouched.
    pub fn navigate(
        &mut self,
        name: &str,
        state: &SharedState,
        params: Params,
    ) -> Result<&mut dyn Screen, RouteError> {
        let screen = self.build(name, state, &params)?;
        debug!(route = name, "navigate");
        self.active = Entry::new(name, params, screen);
        Ok(self.active.screen.as_mut())
    }

    /// Suspends the active screen and activates `name`. A cached instance with the
    /// same params is resumed with its state intact unless `reinitialize` is set;
    /// otherwise a new instance is built. Either way `init` runs when the instance
    /// has been destroyed or never initialised.
    pub fn push(
        &mut self,
        name: &str,
        state: &SharedState,
        params: Params,
        reinitialize: bool,
    ) -> Result<Option<Effect>, RouteError> {
        if !self.factories.contains_key(name) {
            return Err(RouteError::Unknown(name.to_string()));
        }

        let cached = self
            .cache
            .remove(name)
            .filter(|entry| !reinitialize && !entry.stale && entry.params == params);
        let (mut entry, effect) = match cached {
            Some(mut entry) => {
                debug!(route = name, destroyed = entry.destroyed, "resume cached screen");
                let effect = if entry.destroyed {
                    entry.screen.init()
                } else {
                    None
                };
                (entry, effect)
            }
            None => {
                let mut screen = self.build(name, state, &params)?;
                let effect = screen.init();
                debug!(route = name, "push new screen");
                (Entry::new(name, params, screen), effect)
            }
        };
        entry.destroyed = false;

        let previous = std::mem::replace(&mut self.active, entry);
        self.history.push(previous);
        Ok(effect)
    }

    /// Destroys the active screen and resumes its predecessor. Returns the effects
    /// to schedule: the cleanup effect first, then the predecessor's init effect when
    /// it was rebuilt. A stale predecessor is always rebuilt. Popping the root screen
    /// does nothing.
    pub fn pop(
        &mut self,
        state: &SharedState,
        reinitialize: bool,
    ) -> Result<Vec<Effect>, RouteError> {
        let Some(mut predecessor) = self.history.pop() else {
            debug!(route = %self.active.name, "pop at root ignored");
            return Ok(Vec::new());
        };

        let rebuild = reinitialize || predecessor.stale;
        let mut effects = Vec::new();
        if rebuild {
            match self.build(&predecessor.name, state, &predecessor.params) {
                Ok(screen) => {
                    predecessor.screen = screen;
                    predecessor.stale = false;
                }
                Err(error) => {
                    self.history.push(predecessor);
                    return Err(error);
                }
            }
        }

        let mut leaving = std::mem::replace(&mut self.active, predecessor);
        effects.extend(leaving.screen.destroy());
        leaving.destroyed = true;
        debug!(from = %leaving.name, to = %self.active.name, rebuild, "pop");
        self.cache.insert(leaving.name.clone(), leaving);

        if rebuild {
            effects.extend(self.active.screen.init());
        }
        Ok(effects)
    }

    /// Pops up to `levels` screens. Only the last pop honours `reinitialize`; the
    /// walk stops early at the root.
    pub fn unwind(
        &mut self,
        state: &SharedState,
        levels: usize,
        reinitialize: bool,
    ) -> Result<Vec<Effect>, RouteError> {
        let mut effects = Vec::new();
        for remaining in (0..levels).rev() {
            if self.history.is_empty() {
                break;
            }
            effects.extend(self.pop(state, reinitialize && remaining == 0)?);
        }
        Ok(effects)
    }

    /// Forgets every cached instance and marks the suspended screens for a rebuild
    /// on the way back. Used after the backend switched to another context.
    pub fn invalidate(&mut self) {
        debug!(cached = self.cache.len(), suspended = self.history.len(), "invalidate routes");
        self.cache.clear();
        for entry in &mut self.history {
            entry.stale = true;
        }
    }

    fn build(
        &self,
        name: &str,
        state: &SharedState,
        params: &Params,
    ) -> Result<Box<dyn Screen>, RouteError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RouteError::Unknown(name.to_string()))?;
        Ok(factory(state, params))
    }
}
