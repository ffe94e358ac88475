// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::k3d::config_transform::{build_cluster_config, SimpleConfig};
use parking_lot::Mutex;

/// Replies to commands whose joined arguments start with a prefix.
#[derive(Default)]
struct FakeRunner {
    replies: Vec<(&'static str, CommandOutput)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    fn reply(mut self, prefix: &'static str, success: bool, stdout: &str) -> Self {
        self.replies.push((
            prefix,
            CommandOutput {
                success,
                stdout: stdout.to_string(),
                stderr: if success { String::new() } else { "boom".to_string() },
            },
        ));
        self
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, _ctx: &OpContext, command: &CommandLine) -> Result<CommandOutput, K3dError> {
        let args = command.args_lossy();
        self.calls.lock().push(args.clone());
        let joined = args.join(" ");
        self.replies
            .iter()
            .find(|(prefix, _)| joined.starts_with(prefix))
            .map(|(_, out)| out.clone())
            .ok_or_else(|| K3dError::Runtime(format!("unexpected command: {}", joined)))
    }
}

const LIST: &str = r#"[
  { "name": "dev", "network": { "name": "k3d-dev" },
    "nodes": [
      { "name": "k3d-dev-server-0", "role": "server", "image": "rancher/k3s:v1",
        "runtimeLabels": { "k3d.cluster": "dev", "k3d.server.api.port": "6550", "k3d.server.api.hostIP": "127.0.0.1" } }
    ] },
  { "name": "empty", "nodes": [] }
]"#;

const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: k3d-dev
  cluster:
    server: https://127.0.0.1:6550
contexts:
- name: k3d-dev
  context:
    cluster: k3d-dev
    user: admin@k3d-dev
users:
- name: admin@k3d-dev
  user:
    token: abc
current-context: k3d-dev
"#;

fn client(runner: FakeRunner) -> (CliK3dClient, Arc<FakeRunner>) {
    let runner = Arc::new(runner);
    (CliK3dClient::with_runner("k3d", runner.clone()), runner)
}

#[tokio::test]
async fn test_cluster_get_found() {
    let (client, _) = client(FakeRunner::default().reply("cluster list", true, LIST));
    let cluster = client.cluster_get(&OpContext::new(), "dev").await.unwrap();
    assert_eq!(cluster.name, "dev");
    assert_eq!(cluster.kube_api.unwrap().binding.host_port, "6550");
}

#[tokio::test]
async fn test_cluster_get_missing_or_empty() {
    let (client, _) = client(FakeRunner::default().reply("cluster list", true, LIST));
    let ctx = OpContext::new();
    assert!(client.cluster_get(&ctx, "nope").await.unwrap_err().is_not_found());
    assert!(client.cluster_get(&ctx, "empty").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_cluster_list_null_output() {
    let (client, _) = client(FakeRunner::default().reply("cluster list", true, "null\n"));
    assert!(client
        .cluster_get(&OpContext::new(), "dev")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_cluster_run_passes_config_file() {
    let (client, runner) = client(FakeRunner::default().reply("cluster create", true, ""));
    let config = build_cluster_config(SimpleConfig::new("dev")).unwrap();
    client.cluster_run(&OpContext::new(), &config).await.unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(&calls[0][..3], &["cluster", "create", "--config"]);
    assert!(calls[0][3].ends_with(".yaml"));
    assert!(calls[0].contains(&"--timeout=90s".to_string()));
    assert!(calls[0].contains(&"--wait".to_string()));
}

#[tokio::test]
async fn test_failed_command_reports_stderr() {
    let (client, _) = client(FakeRunner::default().reply("cluster delete", false, ""));
    let err = client
        .cluster_delete(&OpContext::new(), &Cluster::named("dev"), ClusterDeleteOpts::default())
        .await
        .unwrap_err();
    match err {
        K3dError::CommandFailed { command, message } => {
            assert_eq!(command, "k3d cluster delete dev");
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_node_list_parses_output() {
    let nodes = r#"[{ "name": "k3d-dev-server-0", "role": "server",
        "runtimeLabels": { "k3d.cluster": "dev" },
        "portMappings": { "6443/tcp": [ { "HostIp": "0.0.0.0", "HostPort": "6550" } ] } }]"#;
    let (client, _) = client(FakeRunner::default().reply("node list", true, nodes));
    let nodes = client.node_list(&OpContext::new()).await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].belongs_to("dev"));
}

#[tokio::test]
async fn test_node_list_bad_json() {
    let (client, _) = client(FakeRunner::default().reply("node list", true, "{not json"));
    let err = client.node_list(&OpContext::new()).await.unwrap_err();
    assert!(matches!(err, K3dError::Parse(_)));
}

#[tokio::test]
async fn test_kubeconfig_write_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let default_path = dir.path().join("config");
    let (client, _) = client(FakeRunner::default().reply("kubeconfig get dev", true, KUBECONFIG));
    let client = client.with_default_kubeconfig(Some(default_path.clone()));
    let ctx = OpContext::new();
    let cluster = Cluster::named("dev");

    let written = client
        .kubeconfig_get_write(&ctx, &cluster, None, WriteKubeconfigOptions::default())
        .await
        .unwrap();
    assert_eq!(written, default_path);
    assert!(Kubeconfig::load(&default_path).unwrap().unwrap().has_context("k3d-dev"));

    let standalone = dir.path().join("kubeconfig-dev.yaml");
    client
        .kubeconfig_get_write(&ctx, &cluster, Some(&standalone), WriteKubeconfigOptions::default())
        .await
        .unwrap();
    assert!(standalone.exists());

    client
        .kubeconfig_remove_cluster_from_default(&ctx, &cluster)
        .await
        .unwrap();
    let config = Kubeconfig::load(&default_path).unwrap().unwrap();
    assert!(!config.has_context("k3d-dev"));
    assert!(config.users.is_empty());
}
