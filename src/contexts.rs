use anyhow::{Context, Result};
use kube::config::Kubeconfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::{ContextCatalog, ContextEntry};

/// Saved connection contexts. Persistence lives entirely behind this trait.
pub trait ContextStore: Send + Sync {
    fn list_contexts(&self) -> Result<Vec<ContextEntry>>;

    fn current_context(&self) -> Result<Option<String>>;

    fn switch_context(&self, name: &str, namespace: Option<&str>) -> Result<()>;

    fn delete_context(&self, name: &str) -> Result<()>;

    fn delete_user(&self, name: &str) -> Result<()>;

    fn delete_cluster(&self, name: &str) -> Result<()>;

    fn catalog(&self) -> Result<ContextCatalog> {
        Ok(ContextCatalog {
            entries: self.list_contexts()?,
            current: self.current_context()?,
        })
    }
}

/// Deletes a context together with the user and cluster entries it points at,
/// keeping entries still referenced by another context.
pub fn purge_context(store: &dyn ContextStore, entry: &ContextEntry) -> Result<()> {
    store.delete_context(&entry.name)?;
    let remaining = store.list_contexts()?;

    if !entry.user.is_empty() && !remaining.iter().any(|other| other.user == entry.user) {
        store.delete_user(&entry.user)?;
    }
    if !entry.cluster.is_empty() && !remaining.iter().any(|other| other.cluster == entry.cluster)
    {
        store.delete_cluster(&entry.cluster)?;
    }
    Ok(())
}

/// Context store backed by a kubeconfig file. Every call re-reads the file so edits
/// made by other tools are picked up.
#[derive(Debug, Clone)]
pub struct KubeconfigStore {
    path: PathBuf,
}

impl KubeconfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn discover(explicit: Option<PathBuf>) -> Result<Self> {
        discover_kubeconfig_path(explicit)
            .map(Self::new)
            .context("no kubeconfig found; pass --kubeconfig or set KUBECONFIG")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Kubeconfig> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read kubeconfig {}", self.path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse kubeconfig {}", self.path.display()))
    }

    fn save(&self, kubeconfig: &Kubeconfig) -> Result<()> {
        let raw = serde_yaml::to_string(kubeconfig).context("failed to serialize kubeconfig")?;
        let staging = self.path.with_extension("kdeck-tmp");
        fs::write(&staging, raw)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace kubeconfig {}", self.path.display()))?;
        Ok(())
    }

    fn modify<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Kubeconfig) -> Result<()>,
    {
        let mut kubeconfig = self.load()?;
        change(&mut kubeconfig)?;
        self.save(&kubeconfig)
    }
}

impl ContextStore for KubeconfigStore {
    fn list_contexts(&self) -> Result<Vec<ContextEntry>> {
        let kubeconfig = self.load()?;
        let mut entries = kubeconfig
            .contexts
            .iter()
            .map(|named| {
                let context = named.context.as_ref();
                ContextEntry {
                    name: named.name.clone(),
                    cluster: context.map(|ctx| ctx.cluster.clone()).unwrap_or_default(),
                    user: context.and_then(|ctx| ctx.user.clone()).unwrap_or_default(),
                    namespace: context
                        .and_then(|ctx| ctx.namespace.clone())
                        .unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    fn current_context(&self) -> Result<Option<String>> {
        Ok(self
            .load()?
            .current_context
            .filter(|name| !name.is_empty()))
    }

    fn switch_context(&self, name: &str, namespace: Option<&str>) -> Result<()> {
        self.modify(|kubeconfig| {
            let Some(named) = kubeconfig.contexts.iter_mut().find(|named| named.name == name)
            else {
                anyhow::bail!("context '{name}' was not found in kubeconfig");
            };
            if let Some(namespace) = namespace
                && let Some(context) = named.context.as_mut()
            {
                context.namespace = Some(namespace.to_string());
            }
            kubeconfig.current_context = Some(name.to_string());
            Ok(())
        })?;
        info!(context = name, "switched current context");
        Ok(())
    }

    fn delete_context(&self, name: &str) -> Result<()> {
        self.modify(|kubeconfig| {
            let before = kubeconfig.contexts.len();
            kubeconfig.contexts.retain(|named| named.name != name);
            if kubeconfig.contexts.len() == before {
                anyhow::bail!("context '{name}' was not found in kubeconfig");
            }
            if kubeconfig.current_context.as_deref() == Some(name) {
                kubeconfig.current_context = None;
            }
            Ok(())
        })?;
        info!(context = name, "deleted context");
        Ok(())
    }

    fn delete_user(&self, name: &str) -> Result<()> {
        self.modify(|kubeconfig| {
            let before = kubeconfig.auth_infos.len();
            kubeconfig.auth_infos.retain(|named| named.name != name);
            if kubeconfig.auth_infos.len() == before {
                anyhow::bail!("user '{name}' was not found in kubeconfig");
            }
            Ok(())
        })?;
        info!(user = name, "deleted user");
        Ok(())
    }

    fn delete_cluster(&self, name: &str) -> Result<()> {
        self.modify(|kubeconfig| {
            let before = kubeconfig.clusters.len();
            kubeconfig.clusters.retain(|named| named.name != name);
            if kubeconfig.clusters.len() == before {
                anyhow::bail!("cluster '{name}' was not found in kubeconfig");
            }
            Ok(())
        })?;
        info!(cluster = name, "deleted cluster");
        Ok(())
    }
}

fn discover_kubeconfig_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }

    if let Ok(value) = std::env::var("KUBECONFIG")
        && let Some(first) = std::env::split_paths(&value).find(|path| !path.as_os_str().is_empty())
    {
        return Some(first);
    }

    let home = std::env::var("HOME").ok()?;
    let candidate = PathBuf::from(home).join(".kube/config");
    candidate.exists().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::{ContextStore, KubeconfigStore, purge_context};
    use std::fs;
    use tempfile::TempDir;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
  - name: dev-cluster
    cluster:
      server: https://dev.example:6443
  - name: prod-cluster
    cluster:
      server: https://prod.example:6443
users:
  - name: dev-user
    user:
      token: dev-token
  - name: shared-user
    user:
      token: shared-token
contexts:
  - name: prod
    context:
      cluster: prod-cluster
      user: shared-user
  - name: dev
    context:
      cluster: dev-cluster
      user: dev-user
      namespace: apps
  - name: dev-admin
    context:
      cluster: dev-cluster
      user: shared-user
"#;

    fn store() -> (TempDir, KubeconfigStore) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config");
        fs::write(&path, KUBECONFIG).expect("write kubeconfig");
        (dir, KubeconfigStore::new(path))
    }

    #[test]
    fn lists_contexts_sorted_with_current() {
        let (_dir, store) = store();
        let catalog = store.catalog().expect("catalog");
        let names = catalog
            .entries
            .iter()
            .map(|entry| entry.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["dev", "dev-admin", "prod"]);
        assert_eq!(catalog.current.as_deref(), Some("dev"));
        assert_eq!(catalog.entries[0].namespace, "apps");
        assert_eq!(catalog.entries[0].user, "dev-user");
    }

    #[test]
    fn switch_context_persists_current_and_namespace() {
        let (_dir, store) = store();
        store
            .switch_context("prod", Some("payments"))
            .expect("switch");

        let reloaded = KubeconfigStore::new(store.path());
        assert_eq!(reloaded.current_context().expect("current").as_deref(), Some("prod"));
        let prod = reloaded
            .list_contexts()
            .expect("list")
            .into_iter()
            .find(|entry| entry.name == "prod")
            .expect("prod context");
        assert_eq!(prod.namespace, "payments");
    }

    #[test]
    fn switch_to_unknown_context_fails_without_writing() {
        let (_dir, store) = store();
        let error = store.switch_context("staging", None).expect_err("unknown");
        assert!(error.to_string().contains("staging"));
        assert_eq!(store.current_context().expect("current").as_deref(), Some("dev"));
    }

    #[test]
    fn deleting_current_context_clears_it() {
        let (_dir, store) = store();
        store.delete_context("dev").expect("delete");
        assert_eq!(store.current_context().expect("current"), None);
        assert_eq!(store.list_contexts().expect("list").len(), 2);
        assert!(store.delete_context("dev").is_err());
    }

    #[test]
    fn purge_keeps_entries_shared_with_other_contexts() {
        let (_dir, store) = store();
        let prod = store
            .list_contexts()
            .expect("list")
            .into_iter()
            .find(|entry| entry.name == "prod")
            .expect("prod");

        purge_context(&store, &prod).expect("purge");

        let kubeconfig = store.load().expect("load");
        let clusters = kubeconfig
            .clusters
            .iter()
            .map(|named| named.name.as_str())
            .collect::<Vec<_>>();
        let users = kubeconfig
            .auth_infos
            .iter()
            .map(|named| named.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(clusters, vec!["dev-cluster"]);
        assert_eq!(users, vec!["dev-user", "shared-user"]);
    }

    #[test]
    fn delete_user_and_cluster_report_missing_entries() {
        let (_dir, store) = store();
        store.delete_user("dev-user").expect("delete user");
        assert!(store.delete_user("dev-user").is_err());
        store.delete_cluster("prod-cluster").expect("delete cluster");
        assert!(store.delete_cluster("nope").is_err());
    }
}
