//! Probe for servers started as local subprocesses speaking MCP over stdio.

use super::process::shutdown_child;
use super::ProbeInitError;
use crate::server_config::domain::StdioTransport;
use crate::verification::domain::{
    InitializeRequest, ProbeBudget, ProbeError, ProbeOutcome, ProbeSettings, StdoutTranscript,
};
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Runs the `initialize` handshake against a subprocess.
///
/// The request is written once and standard input is closed. Standard
/// output is scanned line by line; standard error is drained and discarded.
/// The process runs in its own process group, which is terminated on every
/// exit path.
#[derive(Debug, Clone)]
pub struct StdioProbe {
    request_line: Arc<str>,
    max_line_length: usize,
    max_output_bytes: usize,
}

impl StdioProbe {
    /// Creates a probe from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeInitError::Encode`] when the request cannot be encoded.
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeInitError> {
        let request_line = InitializeRequest::from_settings(settings)
            .to_line()
            .map_err(ProbeInitError::encode)?;
        Ok(Self {
            request_line: request_line.into(),
            max_line_length: settings.max_line_length,
            max_output_bytes: settings.max_output_bytes,
        })
    }

    /// Probes one `stdio` server within `budget`.
    pub async fn probe(&self, transport: &StdioTransport, budget: ProbeBudget) -> ProbeOutcome {
        ProbeOutcome::from_attempt(self.attempt(transport, budget).await)
    }

    async fn attempt(
        &self,
        transport: &StdioTransport,
        budget: ProbeBudget,
    ) -> Result<Option<Value>, ProbeError> {
        let command = transport.command();
        if command.is_empty() {
            return Err(ProbeError::MissingCommand);
        }

        let mut launcher = Command::new(command);
        launcher
            .args(transport.args())
            .envs(transport.env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        launcher.process_group(0);
        let mut child = launcher
            .spawn()
            .map_err(|err| ProbeError::spawn(command, err))?;
        debug!(command, pid = child.id(), "probe process started");

        let attempt = timeout(budget.timeout, self.converse(&mut child))
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Timeout {
                    budget: budget.timeout,
                })
            });
        shutdown_child(&mut child, budget.termination_grace).await;
        attempt
    }

    async fn converse(&self, child: &mut Child) -> Result<Option<Value>, ProbeError> {
        let _stderr_drain = child.stderr.take().map(drain);

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(error) = stdin.write_all(self.request_line.as_bytes()).await {
                debug!(%error, "probe process closed stdin before the request was written");
            }
            drop(stdin);
        }

        let mut transcript = StdoutTranscript::new(self.max_line_length, self.max_output_bytes);
        if let Some(mut stdout) = child.stdout.take() {
            let mut buffer = vec![0_u8; READ_CHUNK_BYTES];
            loop {
                let read = stdout
                    .read(&mut buffer)
                    .await
                    .map_err(|err| ProbeError::transport(&err))?;
                if read == 0 {
                    break;
                }
                let chunk = buffer.get(..read).unwrap_or_default();
                if let Some(handshake) = transcript.push(chunk) {
                    return Ok(handshake.server_info);
                }
            }
        }
        if let Some(handshake) = transcript.finish() {
            return Ok(handshake.server_info);
        }

        let status = child.wait().await.map_err(|err| ProbeError::transport(&err))?;
        debug!(%status, "probe process exited without a handshake");
        if status.success() {
            Err(ProbeError::Silent)
        } else {
            Err(ProbeError::ProcessExited(status))
        }
    }
}

/// Background task discarding a stream; aborted when dropped.
struct Drain(JoinHandle<()>);

impl Drop for Drain {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn drain<R>(mut stream: R) -> Drain
where
    R: AsyncRead + Unpin + Send + 'static,
{
    Drain(tokio::spawn(async move {
        if let Err(error) = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await {
            debug!(%error, "stopped draining probe stderr");
        }
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::verification::domain::VerificationStatus;
    use nix::sys::signal;
    use nix::unistd::Pid;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::time::{Duration, Instant};

    #[fixture]
    fn probe() -> StdioProbe {
        StdioProbe::new(&ProbeSettings::default()).expect("request encodes")
    }

    fn budget(timeout_ms: u64) -> ProbeBudget {
        ProbeBudget::new(Duration::from_millis(timeout_ms), Duration::from_millis(500))
    }

    fn shell(script: &str) -> StdioTransport {
        StdioTransport::new("sh").with_args(["-c".to_owned(), script.to_owned()])
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn handshake_reply_connects_with_server_info(probe: StdioProbe) {
        let transport = shell(
            r#"read -r line; echo '{"jsonrpc":"2.0","id":1,"result":{"serverInfo":{"name":"echo","version":"1.0"}}}'"#,
        );

        let outcome = probe.probe(&transport, budget(5000)).await;

        assert_eq!(outcome.status(), VerificationStatus::Connected);
        assert_eq!(outcome.server_info(), Some(&json!({"name": "echo", "version": "1.0"})));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unterminated_reply_connects_while_the_server_keeps_running(probe: StdioProbe) {
        let transport = shell(
            r#"printf '{"jsonrpc":"2.0","id":1,"result":{"serverInfo":{"name":"x"}}}'; exec sleep 30"#,
        );
        let started = Instant::now();

        let outcome = probe.probe(&transport, budget(1500)).await;

        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(outcome.status(), VerificationStatus::Connected);
        assert_eq!(outcome.server_info(), Some(&json!({"name": "x"})));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn request_is_sent_as_one_line(probe: StdioProbe) {
        let transport = shell(
            r#"read -r line; case "$line" in *'"method":"initialize"'*) echo '{"jsonrpc":"2.0","result":{}}';; *) exit 3;; esac"#,
        );

        let outcome = probe.probe(&transport, budget(5000)).await;

        assert_eq!(outcome.status(), VerificationStatus::Connected);
        assert_eq!(outcome.server_info(), None);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unresponsive_process_is_pending_and_terminated(probe: StdioProbe) {
        let dir = tempfile::tempdir().expect("temp dir");
        let pid_file = dir.path().join("pid");
        let transport = shell(&format!("echo $$ > '{}'; exec sleep 30", pid_file.display()));
        let started = Instant::now();

        let outcome = probe.probe(&transport, budget(300)).await;

        assert!(started.elapsed() < Duration::from_millis(300 + 500 + 1000));
        assert_eq!(outcome.status(), VerificationStatus::Pending);
        assert_eq!(outcome.error(), Some("No response within 300ms"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        let pid: i32 = std::fs::read_to_string(&pid_file)
            .expect("pid file written")
            .trim()
            .parse()
            .expect("numeric pid");
        assert!(signal::kill(Pid::from_raw(pid), None).is_err());
    }

    #[rstest]
    #[case("exit 0", VerificationStatus::Unknown)]
    #[case("echo oops >&2; exit 1", VerificationStatus::Failed)]
    #[case(r#"printf '{"jsonrpc":"2.0"}'"#, VerificationStatus::Connected)]
    #[tokio::test(flavor = "multi_thread")]
    async fn exit_without_handshake_is_classified(
        probe: StdioProbe,
        #[case] script: &str,
        #[case] expected: VerificationStatus,
    ) {
        let outcome = probe.probe(&shell(script), budget(5000)).await;

        assert_eq!(outcome.status(), expected);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn missing_executable_fails_immediately(probe: StdioProbe) {
        let transport = StdioTransport::new("/nonexistent/belvedere-mcp-server");

        let outcome = probe.probe(&transport, budget(5000)).await;

        assert_eq!(outcome.status(), VerificationStatus::Failed);
        assert!(outcome.error().is_some_and(|error| error.contains("failed to start")));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn blank_command_is_rejected_without_spawning(probe: StdioProbe) {
        let outcome = probe.probe(&StdioTransport::new("  "), budget(5000)).await;

        assert_eq!(outcome.error(), Some("No command specified"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn chatty_stderr_does_not_block_the_handshake(probe: StdioProbe) {
        let transport = shell(
            r#"head -c 1048576 /dev/zero >&2; echo '{"jsonrpc":"2.0","id":1,"result":{"serverInfo":{"name":"noisy"}}}'"#,
        );

        let outcome = probe.probe(&transport, budget(5000)).await;

        assert_eq!(outcome.server_info(), Some(&json!({"name": "noisy"})));
    }
}
