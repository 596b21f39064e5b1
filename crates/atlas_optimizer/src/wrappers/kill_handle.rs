use std::{
    io,
    process::{Child, Command},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use fxhash::FxHashSet;
use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::process_tree;

#[derive(Default)]
struct KillState {
    killed: AtomicBool,
    pids: Mutex<FxHashSet<u32>>,
}

/// Cancellation handle of a job, tracking every solver process it started.
///
/// Spawning and killing take the same lock so a process is either spawned
/// before a kill, and then killed with its descendants, or never spawned.
#[derive(Clone, Default)]
pub struct KillHandle {
    inner: Arc<KillState>,
}

/// A spawned solver and the pids recorded for it.
pub(crate) struct TrackedChild {
    pub child: Child,
    pub pids: Vec<u32>,
}

impl KillHandle {
    pub fn new() -> Self {
        KillHandle::default()
    }

    pub fn is_killed(&self) -> bool {
        self.inner.killed.load(Ordering::SeqCst)
    }

    /// Pids currently tracked, sorted.
    pub fn tracked_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.inner.pids.lock().iter().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// Spawns `command` unless a kill was already requested.
    pub(crate) fn spawn(&self, command: &mut Command) -> io::Result<Option<TrackedChild>> {
        let mut tracked = self.inner.pids.lock();
        if self.is_killed() {
            return Ok(None);
        }

        let child = command.spawn()?;
        let mut pids = vec![child.id()];
        pids.extend(process_tree::descendants(&pids));
        tracked.extend(pids.iter().copied());
        debug!(?pids, "spawned solver process");

        Ok(Some(TrackedChild { child, pids }))
    }

    /// Forgets the pids of a finished process.
    pub(crate) fn release(&self, pids: &[u32]) {
        let mut tracked = self.inner.pids.lock();
        for pid in pids {
            tracked.remove(pid);
        }
    }

    /// Kills every tracked process and the descendants they have now.
    pub fn kill(&self) {
        let tracked = self.inner.pids.lock();
        self.inner.killed.store(true, Ordering::SeqCst);

        let roots: Vec<u32> = tracked.iter().copied().collect();
        let mut targets = roots.clone();
        targets.extend(process_tree::descendants(&roots));
        targets.sort_unstable();
        targets.dedup();

        info!(pids = ?targets, "killing solver processes");
        for pid in targets {
            let Ok(raw) = i32::try_from(pid) else {
                continue;
            };
            if let Err(error) = signal::kill(Pid::from_raw(raw), Signal::SIGKILL) {
                debug!(pid, %error, "cannot signal process");
            }
        }
    }
}
