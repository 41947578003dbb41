use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::screen::{Params, params};
use crate::screens::{CONTEXTS, NAMESPACES, PODS};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kdeck",
    version,
    about = "Browse Kubernetes contexts, namespaces and pods from the terminal."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Kubeconfig file (default: $KUBECONFIG, then ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Open pods in this namespace instead of the namespace list
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Config file (default: $KDECK_CONFIG, ./kdeck.yaml, ~/.config/kdeck/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Rows per list page; 0 fits the terminal
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Seconds between automatic reloads; 0 disables
    #[arg(long, global = true)]
    pub refresh_secs: Option<u64>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file; logs are discarded otherwise
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Subcommand)]
pub enum Command {
    /// Manage kubeconfig contexts
    #[command(visible_alias = "ctx")]
    Contexts,
    /// Browse pods
    #[command(visible_alias = "po")]
    Pods,
}

impl CliArgs {
    /// Route and params of the screen the app boots into.
    pub fn root_screen(&self) -> (&'static str, Params) {
        match (self.command.unwrap_or(Command::Pods), &self.namespace) {
            (Command::Contexts, _) => (CONTEXTS, Params::new()),
            (Command::Pods, Some(namespace)) => (PODS, params([("namespace", namespace.as_str())])),
            (Command::Pods, None) => (NAMESPACES, Params::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, Command};
    use crate::screen::{Params, params};
    use crate::screens::{CONTEXTS, NAMESPACES, PODS};
    use clap::Parser;

    #[test]
    fn pods_is_the_default_command() {
        let args = CliArgs::parse_from(["kdeck"]);
        assert_eq!(args.command, None);
        assert_eq!(args.root_screen(), (NAMESPACES, Params::new()));
        assert_eq!(args.log_filter, "info");
    }

    #[test]
    fn aliases_select_root_screen() {
        let args = CliArgs::parse_from(["kdeck", "ctx"]);
        assert_eq!(args.command, Some(Command::Contexts));
        assert_eq!(args.root_screen(), (CONTEXTS, Params::new()));

        let args = CliArgs::parse_from(["kdeck", "po", "-n", "apps", "--page-size", "15"]);
        assert_eq!(args.command, Some(Command::Pods));
        assert_eq!(args.page_size, Some(15));
        assert_eq!(
            args.root_screen(),
            (PODS, params([("namespace", "apps")]))
        );
    }

    #[test]
    fn namespace_is_ignored_for_contexts() {
        let args = CliArgs::parse_from(["kdeck", "contexts", "--namespace", "apps"]);
        assert_eq!(args.root_screen().0, CONTEXTS);
    }
}
