//! Command builder and log streaming for llama-server.

use std::path::Path;
use std::process::Stdio;

use llmctl_core::ServiceConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Interface llama-server binds to.
pub const SERVER_HOST: &str = "127.0.0.1";

/// Build the argument list for one llama-server process.
pub fn server_args(model_path: &Path, port: u16, config: &ServiceConfig) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        model_path.display().to_string(),
        "--host".to_string(),
        SERVER_HOST.to_string(),
        "--port".to_string(),
        port.to_string(),
        "-c".to_string(),
        config.ctx_size.to_string(),
    ];

    if config.n_gpu_layers > 0 {
        args.push("-ngl".to_string());
        args.push(config.n_gpu_layers.to_string());
    }

    if let Some(threads) = config.n_threads {
        args.push("-t".to_string());
        args.push(threads.to_string());
    }

    args
}

/// Spawn llama-server with piped output.
///
/// The child is killed when its handle is dropped.
pub fn spawn_server(
    binary: &Path,
    model_path: &Path,
    port: u16,
    config: &ServiceConfig,
) -> anyhow::Result<Child> {
    let args = server_args(model_path, port, config);
    debug!(binary = %binary.display(), ?args, "Spawning llama-server");

    let mut cmd = Command::new(binary);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd.spawn().map_err(|e| {
        anyhow::anyhow!(
            "Failed to spawn llama-server at {}: {e}",
            binary.display()
        )
    })
}

/// Forward the child's stdout/stderr lines to tracing until the streams close.
pub fn spawn_log_readers(child: &mut Child, port: u16) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                debug!(port, "stdout: {text}");
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                debug!(port, "stderr: {text}");
            }
        });
    }
}
