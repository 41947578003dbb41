//! In-memory collaborators for screen and loop tests.

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::KeyCode;
use std::sync::{Arc, Mutex};

use crate::backend::ClusterBackend;
use crate::contexts::ContextStore;
use crate::event::AppEvent;
use crate::input::{KeyBindings, key};
use crate::model::{ContextEntry, NamespaceSummary, PodDetail, PodSummary};
use crate::screen::{Settings, SharedState};

#[derive(Default)]
pub struct FakeBackend {
    pub pods: Mutex<Vec<PodSummary>>,
    pub namespaces: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn with_pods(names: &[&str]) -> Self {
        Self {
            pods: Mutex::new(names.iter().map(|name| pod(name)).collect()),
            namespaces: vec!["default".to_string(), "kube-system".to_string()],
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl ClusterBackend for FakeBackend {
    fn context(&self) -> String {
        "test".to_string()
    }

    fn default_namespace(&self) -> String {
        "default".to_string()
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>> {
        self.record("list_namespaces".to_string());
        Ok(self
            .namespaces
            .iter()
            .map(|name| NamespaceSummary {
                name: name.clone(),
                status: "Active".to_string(),
                age: "1d".to_string(),
            })
            .collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>> {
        self.record(format!("list_pods {namespace}"));
        Ok(self.pods.lock().map(|pods| pods.clone()).unwrap_or_default())
    }

    async fn get_pod(&self, namespace: &str, name: &str, _log_lines: i64) -> Result<PodDetail> {
        self.record(format!("get_pod {namespace}/{name}"));
        let exists = self
            .pods
            .lock()
            .map(|pods| pods.iter().any(|pod| pod.name == name))
            .unwrap_or_default();
        if !exists {
            anyhow::bail!("pods \"{name}\" not found");
        }
        Ok(PodDetail {
            name: name.to_string(),
            namespace: namespace.to_string(),
            fields: vec![("Phase".to_string(), "Running".to_string())],
            events: Vec::new(),
            logs: Vec::new(),
        })
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<String> {
        self.record(format!("delete_pod {namespace}/{name}"));
        if let Ok(mut pods) = self.pods.lock() {
            pods.retain(|pod| pod.name != name);
        }
        Ok(name.to_string())
    }

    async fn use_context(&self, context: &str, _namespace: Option<&str>) -> Result<()> {
        self.record(format!("use_context {context}"));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub entries: Mutex<Vec<ContextEntry>>,
    pub current: Mutex<Option<String>>,
}

impl FakeStore {
    pub fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().map(|entry| entry.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn with_contexts(names: &[&str], current: &str) -> Self {
        Self {
            entries: Mutex::new(
                names
                    .iter()
                    .map(|name| ContextEntry {
                        name: name.to_string(),
                        cluster: format!("{name}-cluster"),
                        user: format!("{name}-user"),
                        namespace: String::new(),
                    })
                    .collect(),
            ),
            current: Mutex::new(Some(current.to_string())),
        }
    }
}

impl ContextStore for FakeStore {
    fn list_contexts(&self) -> Result<Vec<ContextEntry>> {
        Ok(self
            .entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    fn current_context(&self) -> Result<Option<String>> {
        Ok(self.current.lock().ok().and_then(|current| current.clone()))
    }

    fn switch_context(&self, name: &str, _namespace: Option<&str>) -> Result<()> {
        if let Ok(mut current) = self.current.lock() {
            *current = Some(name.to_string());
        }
        Ok(())
    }

    fn delete_context(&self, name: &str) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|entry| entry.name != name);
        }
        Ok(())
    }

    fn delete_user(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn delete_cluster(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

pub fn pod(name: &str) -> PodSummary {
    PodSummary {
        name: name.to_string(),
        ready: "1/1".to_string(),
        status: "Running".to_string(),
        restarts: 0,
        age: "5m".to_string(),
        node: "node-a".to_string(),
    }
}

pub fn shared_state() -> SharedState {
    state_with(
        Arc::new(FakeBackend::with_pods(&[])),
        Arc::new(FakeStore::default()),
    )
}

pub fn state_with(backend: Arc<FakeBackend>, store: Arc<FakeStore>) -> SharedState {
    SharedState {
        backend,
        contexts: store,
        keys: KeyBindings::default(),
        settings: Settings {
            page_size: 10,
            ..Settings::default()
        },
    }
}

pub fn press(code: KeyCode) -> AppEvent {
    AppEvent::Key(key(code))
}
