use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use k8s_openapi::api::core::v1::{Event, Namespace, Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{DeleteParams, ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use crate::backend::ClusterBackend;
use crate::model::{ContainerLog, NamespaceSummary, PodDetail, PodEvent, PodSummary};

/// [`ClusterBackend`] over the Kubernetes API. The client is rebuilt in place when
/// the user switches context.
pub struct KubeGateway {
    kubeconfig_path: Option<PathBuf>,
    connection: RwLock<Connection>,
}

#[derive(Clone)]
struct Connection {
    client: Client,
    context: String,
    default_namespace: String,
}

impl KubeGateway {
    /// Connects using `kubeconfig_path` (or in-cluster config when there is none).
    pub async fn connect(kubeconfig_path: Option<&Path>, namespace: Option<&str>) -> Result<Self> {
        let connection = Connection::open(kubeconfig_path, None, namespace).await?;
        info!(
            context = %connection.context,
            namespace = %connection.default_namespace,
            "connected to cluster"
        );
        Ok(Self {
            kubeconfig_path: kubeconfig_path.map(Path::to_path_buf),
            connection: RwLock::new(connection),
        })
    }

    fn connection(&self) -> Connection {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn client(&self) -> Client {
        self.connection().client
    }

    async fn events_for(&self, namespace: &str, pod_name: &str) -> Result<Vec<PodEvent>> {
        let events: Api<Event> = Api::namespaced(self.client(), namespace);
        let params = list_params().fields(&format!("involvedObject.name={pod_name}"));
        let mut list = events
            .list(&params)
            .await
            .with_context(|| format!("failed to list events for {namespace}/{pod_name}"))?
            .items;
        list.sort_by_key(event_timestamp_seconds);
        Ok(list.iter().map(pod_event).collect())
    }

    async fn logs_for(&self, pods: &Api<Pod>, pod: &Pod, log_lines: i64) -> Vec<ContainerLog> {
        let name = pod.name_any();
        let containers = pod
            .spec
            .as_ref()
            .map(|spec| {
                spec.containers
                    .iter()
                    .map(|container| container.name.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let mut logs = Vec::with_capacity(containers.len());
        for container in containers {
            let params = LogParams {
                container: Some(container.clone()),
                tail_lines: Some(log_lines),
                ..LogParams::default()
            };
            // A container that never started has no logs; show why instead of failing
            // the whole detail view.
            let text = match pods.logs(&name, &params).await {
                Ok(text) => text,
                Err(error) => {
                    debug!(pod = %name, %container, "log fetch failed: {error}");
                    format!("failed to load logs: {error}")
                }
            };
            logs.push(ContainerLog { container, text });
        }
        logs
    }
}

impl Connection {
    async fn open(
        kubeconfig_path: Option<&Path>,
        context: Option<String>,
        namespace: Option<&str>,
    ) -> Result<Self> {
        let kubeconfig = match kubeconfig_path {
            Some(path) if path.exists() => Some(
                Kubeconfig::read_from(path)
                    .with_context(|| format!("failed to read kubeconfig {}", path.display()))?,
            ),
            _ => None,
        };

        let config = if let Some(kubeconfig) = kubeconfig.clone() {
            let options = KubeConfigOptions {
                context: context.clone(),
                cluster: None,
                user: None,
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .context("failed to infer Kubernetes configuration")?
        } else {
            if context.is_some() {
                anyhow::bail!("kubeconfig not found; context switching is unavailable");
            }
            Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?
        };

        let default_namespace = namespace
            .filter(|namespace| !namespace.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| config.default_namespace.clone());
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        let context = context
            .or_else(|| kubeconfig.and_then(|cfg| cfg.current_context))
            .unwrap_or_else(|| "in-cluster".to_string());

        Ok(Self {
            client,
            context,
            default_namespace,
        })
    }
}

#[async_trait]
impl ClusterBackend for KubeGateway {
    fn context(&self) -> String {
        self.connection().context
    }

    fn default_namespace(&self) -> String {
        self.connection().default_namespace
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>> {
        let namespaces: Api<Namespace> = Api::all(self.client());
        let list = namespaces
            .list(&list_params())
            .await
            .context("failed to list namespaces")?;
        let mut summaries = list.iter().map(namespace_summary).collect::<Vec<_>>();
        summaries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(summaries)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>> {
        let pods: Api<Pod> = Api::namespaced(self.client(), namespace);
        let list = pods
            .list(&list_params())
            .await
            .with_context(|| format!("failed to list pods in {namespace}"))?;
        let mut summaries = list.iter().map(pod_summary).collect::<Vec<_>>();
        summaries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(summaries)
    }

    async fn get_pod(&self, namespace: &str, name: &str, log_lines: i64) -> Result<PodDetail> {
        let pods: Api<Pod> = Api::namespaced(self.client(), namespace);
        let pod = pods
            .get(name)
            .await
            .with_context(|| format!("failed to fetch pod {namespace}/{name}"))?;

        let events = self.events_for(namespace, name).await?;
        let logs = self.logs_for(&pods, &pod, log_lines).await;
        let mut fields = pod_fields(&pod);
        fields.push((
            "Fetched".to_string(),
            Local::now().format("%H:%M:%S").to_string(),
        ));

        Ok(PodDetail {
            name: name.to_string(),
            namespace: namespace.to_string(),
            fields,
            events,
            logs,
        })
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client(), namespace);
        let _ = pods
            .delete(name, &DeleteParams::default())
            .await
            .with_context(|| format!("failed to delete pod {namespace}/{name}"))?;
        info!(%namespace, pod = %name, "delete requested");
        Ok(name.to_string())
    }

    async fn use_context(&self, context: &str, namespace: Option<&str>) -> Result<()> {
        let connection = Connection::open(
            self.kubeconfig_path.as_deref(),
            Some(context.to_string()),
            namespace,
        )
        .await?;
        *self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = connection;
        info!(%context, "client rebuilt for context");
        Ok(())
    }
}

fn namespace_summary(namespace: &Namespace) -> NamespaceSummary {
    NamespaceSummary {
        name: namespace.name_any(),
        status: namespace
            .status
            .as_ref()
            .and_then(|status| status.phase.clone())
            .unwrap_or_else(|| "Active".to_string()),
        age: human_age(namespace.metadata.creation_timestamp.as_ref()),
    }
}

fn pod_summary(pod: &Pod) -> PodSummary {
    let (ready, total, restarts) = pod.status.as_ref().map(pod_readiness).unwrap_or((0, 0, 0));
    PodSummary {
        name: pod.name_any(),
        ready: format!("{ready}/{total}"),
        status: pod_phase(pod),
        restarts,
        age: human_age(pod.metadata.creation_timestamp.as_ref()),
        node: pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_name.clone())
            .unwrap_or_default(),
    }
}

fn pod_phase(pod: &Pod) -> String {
    if pod.metadata.deletion_timestamp.is_some() {
        return "Terminating".to_string();
    }
    pod.status
        .as_ref()
        .and_then(|status| status.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn pod_fields(pod: &Pod) -> Vec<(String, String)> {
    let status = pod.status.as_ref();
    let (ready, total, restarts) = status.map(pod_readiness).unwrap_or((0, 0, 0));
    let text = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    let owners = pod
        .metadata
        .owner_references
        .as_ref()
        .filter(|owners| !owners.is_empty())
        .map(|owners| {
            owners
                .iter()
                .map(|owner| format!("{}:{}", owner.kind, owner.name))
                .collect::<Vec<_>>()
                .join(", ")
        });
    let labels = pod
        .metadata
        .labels
        .as_ref()
        .filter(|labels| !labels.is_empty())
        .map(|labels| {
            let pairs = labels
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>();
            truncate(&pairs.join(", "), 180)
        });
    let images = pod.spec.as_ref().map(|spec| {
        spec.containers
            .iter()
            .map(|container| {
                format!(
                    "{}={}",
                    container.name,
                    container.image.as_deref().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    });

    vec![
        ("Phase".to_string(), pod_phase(pod)),
        ("Ready".to_string(), format!("{ready}/{total}")),
        ("Restarts".to_string(), restarts.to_string()),
        (
            "Node".to_string(),
            text(pod.spec.as_ref().and_then(|spec| spec.node_name.clone())),
        ),
        (
            "Pod IP".to_string(),
            text(status.and_then(|status| status.pod_ip.clone())),
        ),
        (
            "Host IP".to_string(),
            text(status.and_then(|status| status.host_ip.clone())),
        ),
        (
            "QoS".to_string(),
            text(status.and_then(|status| status.qos_class.clone())),
        ),
        (
            "Age".to_string(),
            human_age(pod.metadata.creation_timestamp.as_ref()),
        ),
        ("Owners".to_string(), text(owners)),
        ("Labels".to_string(), text(labels)),
        ("Containers".to_string(), text(images)),
    ]
}

fn pod_event(event: &Event) -> PodEvent {
    PodEvent {
        age: event_age(event),
        kind: event.type_.clone().unwrap_or_else(|| "-".to_string()),
        reason: event.reason.clone().unwrap_or_else(|| "-".to_string()),
        message: truncate(event.message.as_deref().unwrap_or("-"), 160),
    }
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}

fn pod_readiness(status: &PodStatus) -> (usize, usize, i32) {
    let container_statuses = status.container_statuses.as_deref().unwrap_or(&[]);
    let ready = container_statuses
        .iter()
        .filter(|container| container.ready)
        .count();
    let restarts = container_statuses
        .iter()
        .map(|container| container.restart_count)
        .sum();
    (ready, container_statuses.len(), restarts)
}

fn event_age(event: &Event) -> String {
    if let Some(event_time) = event.event_time.as_ref() {
        return human_age_timestamp(event_time.0);
    }
    let observed = event
        .last_timestamp
        .as_ref()
        .or(event.first_timestamp.as_ref())
        .or(event.metadata.creation_timestamp.as_ref());
    human_age(observed)
}

fn event_timestamp_seconds(event: &Event) -> i64 {
    event
        .event_time
        .as_ref()
        .map(|time| time.0.as_second())
        .or_else(|| event.last_timestamp.as_ref().map(|time| time.0.as_second()))
        .or_else(|| event.first_timestamp.as_ref().map(|time| time.0.as_second()))
        .or_else(|| {
            event
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|time| time.0.as_second())
        })
        .unwrap_or(0)
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out = value
        .chars()
        .take(max.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn human_age(timestamp: Option<&Time>) -> String {
    let Some(timestamp) = timestamp else {
        return "-".to_string();
    };
    human_age_timestamp(timestamp.0)
}

fn human_age_timestamp(ts: k8s_openapi::jiff::Timestamp) -> String {
    let elapsed = (k8s_openapi::jiff::Timestamp::now().as_second() - ts.as_second()).max(0);
    format_elapsed_seconds(elapsed)
}

fn format_elapsed_seconds(seconds: i64) -> String {
    match seconds {
        s if s >= 86_400 => format!("{}d", s / 86_400),
        s if s >= 3_600 => format!("{}h", s / 3_600),
        s if s >= 60 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}
