use anyhow::Result;
use async_trait::async_trait;

use crate::model::{NamespaceSummary, PodDetail, PodSummary};

/// Cluster queries and mutations used by the screens. Implementations are plain
/// I/O wrappers; time bounds are applied by the caller.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    fn context(&self) -> String;

    fn default_namespace(&self) -> String;

    async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>>;

    async fn get_pod(&self, namespace: &str, name: &str, log_lines: i64) -> Result<PodDetail>;

    /// Deletes the pod and returns its name.
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<String>;

    /// Reconnects against another kubeconfig context.
    async fn use_context(&self, context: &str, namespace: Option<&str>) -> Result<()>;
}
