//! Guaranteed termination of probe processes.

use std::time::Duration;
use tokio::process::Child;
use tokio::time::timeout;
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

#[cfg(unix)]
type GroupId = Pid;
#[cfg(not(unix))]
type GroupId = u32;

/// Stops a probe process and everything it started, then reaps it.
///
/// The child is expected to lead its own process group. SIGTERM goes to the
/// group and the leader gets up to `grace` to exit before the group is sent
/// SIGKILL. Processes left behind in the group are killed even when the
/// leader exits on time. Never fails; problems are logged at debug level.
pub async fn shutdown_child(child: &mut Child, grace: Duration) {
    let group = process_group(child);
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(%status, "probe process already exited");
            kill_group(group);
            return;
        }
        Ok(None) => {}
        Err(error) => debug!(%error, "failed to poll probe process"),
    }

    if request_termination(group) {
        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "probe process exited after SIGTERM");
                kill_group(group);
                return;
            }
            Ok(Err(error)) => debug!(%error, "failed to wait for probe process"),
            Err(_) => debug!(grace = ?grace, "probe process ignored SIGTERM"),
        }
    }

    kill_group(group);
    if let Err(error) = child.kill().await {
        debug!(%error, "failed to kill probe process");
    }
}

#[cfg(unix)]
fn process_group(child: &Child) -> Option<GroupId> {
    child
        .id()
        .and_then(|raw| i32::try_from(raw).ok())
        .map(Pid::from_raw)
}

/// Sends SIGTERM; returns whether waiting for a graceful exit makes sense.
///
/// Falls back to signalling the child alone when it does not lead a group.
#[cfg(unix)]
fn request_termination(group: Option<GroupId>) -> bool {
    let Some(pid) = group else {
        return false;
    };
    let sent = match signal::killpg(pid, Signal::SIGTERM) {
        Err(Errno::ESRCH) => signal::kill(pid, Signal::SIGTERM),
        other => other,
    };
    match sent {
        Ok(()) | Err(Errno::ESRCH) => true,
        Err(error) => {
            debug!(pid = pid.as_raw(), %error, "failed to send SIGTERM to probe process");
            false
        }
    }
}

/// Sends SIGKILL to whatever remains of the group.
#[cfg(unix)]
fn kill_group(group: Option<GroupId>) {
    let Some(pid) = group else {
        return;
    };
    match signal::killpg(pid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(error) => debug!(pid = pid.as_raw(), %error, "failed to kill probe process group"),
    }
}

#[cfg(not(unix))]
fn process_group(child: &Child) -> Option<GroupId> {
    child.id()
}

/// Platforms without SIGTERM go straight to a forced kill.
#[cfg(not(unix))]
const fn request_termination(_group: Option<GroupId>) -> bool {
    false
}

#[cfg(not(unix))]
const fn kill_group(_group: Option<GroupId>) {}
