// DAGBENCH EXECUTOR RUNNER
// LAUNCHES ONE SCHEDULER EXECUTABLE, LETS IT RUN FOR THE MEASUREMENT WINDOW,
// THEN STOPS ITS WHOLE PROCESS GROUP.
//
// THE EXECUTORS ARE AUDIO LOOPS: THEY NEVER EXIT ON THEIR OWN. HITTING THE
// TIMEOUT IS THE NORMAL WAY A RUN ENDS. WHATEVER THEY FLUSHED TO THEIR LOG
// BEFORE THAT IS THE MEASUREMENT.

use std::fs;
use std::io::ErrorKind;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{Policy, SweepConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STOP_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    // THE EXECUTOR EXITED BY ITSELF WITH THIS EXIT CODE (NONE: KILLED BY A SIGNAL)
    Exited(Option<i32>),
    // THE MEASUREMENT WINDOW ELAPSED AND THE EXECUTOR WAS STOPPED
    TimedOut,
    // SHUTDOWN WAS REQUESTED WHILE THE EXECUTOR WAS RUNNING
    Interrupted,
    LaunchFailed(String),
}

impl RunOutcome {
    // THE LOG MAY HAVE BEEN CUT OFF MID-WRITE
    pub fn is_partial(&self) -> bool {
        match self {
            Self::Exited(code) => *code != Some(0),
            Self::TimedOut | Self::Interrupted => true,
            Self::LaunchFailed(_) => false,
        }
    }
}

// THE EXTERNAL-RUN BOUNDARY. BLOCKING; MUST RETURN WITHIN THE CONFIGURED
// TIMEOUT (PLUS STOP GRACE) OR AS SOON AS shutdown IS RAISED
pub trait Executor {
    fn run(&mut self, policy: Policy, input: &Path, shutdown: &AtomicBool) -> RunOutcome;
}

// ---------------------------------------------------------------------------
// PROCESS GROUP GUARD
// ---------------------------------------------------------------------------

struct ProcGuard {
    child: Option<Child>,
    pgid: i32,
}

impl ProcGuard {
    fn new(child: Child) -> Self {
        let pgid = child.id() as i32;
        Self {
            child: Some(child),
            pgid,
        }
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(c) => c.try_wait(),
            None => Ok(None),
        }
    }

    // SIGINT FIRST SO THE EXECUTOR CAN FLUSH, SIGKILL AFTER THE GRACE PERIOD
    fn stop(&mut self) {
        let child = match self.child.as_mut() {
            Some(c) => c,
            None => return,
        };
        if let Ok(Some(_)) = child.try_wait() {
            self.child = None;
            return;
        }
        unsafe {
            libc::killpg(self.pgid, libc::SIGINT);
        }
        let deadline = Instant::now() + STOP_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() >= deadline => {
                    unsafe {
                        libc::killpg(self.pgid, libc::SIGKILL);
                    }
                    let _ = child.wait();
                    break;
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(_) => {
                    unsafe {
                        libc::killpg(self.pgid, libc::SIGKILL);
                    }
                    let _ = child.wait();
                    break;
                }
            }
        }
        self.child = None;
    }
}

impl Drop for ProcGuard {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.stop();
        }
    }
}

// ---------------------------------------------------------------------------
// PROCESS EXECUTOR
// ---------------------------------------------------------------------------

// RUNS THE REAL SCHEDULER BINARIES FROM bin_dir INSIDE work_dir
pub struct ProcessExecutor {
    bin_dir: PathBuf,
    work_dir: PathBuf,
    threads: u32,
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            bin_dir: config.bin_dir.clone(),
            work_dir: config.work_dir.clone(),
            threads: config.threads,
            timeout: config.timeout,
        }
    }

    // EXECUTORS OPEN THEIR LOG WITH create_new: A LEFTOVER FILE WOULD MAKE
    // THEM FAIL, OR WORSE, GET ATTRIBUTED TO THIS RUN.
    fn prepare_log(&self, policy: Policy) -> Result<(), String> {
        let log = self.work_dir.join(policy.log_file());
        if let Some(dir) = log.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("CANNOT CREATE {}: {}", dir.display(), e))?;
        }
        match fs::remove_file(&log) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("CANNOT REMOVE STALE LOG {}: {}", log.display(), e)),
        }
    }

    fn spawn(&self, policy: Policy, input: &Path) -> Result<ProcGuard, String> {
        // THE CHILD RUNS IN work_dir: EVERY PATH HANDED TO IT MUST BE ABSOLUTE
        let exe = self.bin_dir.join(policy.executable());
        let exe = exe
            .canonicalize()
            .map_err(|e| format!("EXECUTABLE {} NOT FOUND: {}", exe.display(), e))?;
        let input = input.canonicalize().unwrap_or_else(|_| input.to_path_buf());

        let child = Command::new(&exe)
            .args(policy.args(&input, self.threads))
            .current_dir(&self.work_dir)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("FAILED TO START {}: {}", exe.display(), e))?;
        Ok(ProcGuard::new(child))
    }
}

impl Executor for ProcessExecutor {
    fn run(&mut self, policy: Policy, input: &Path, shutdown: &AtomicBool) -> RunOutcome {
        if let Err(msg) = self.prepare_log(policy) {
            return RunOutcome::LaunchFailed(msg);
        }
        let mut guard = match self.spawn(policy, input) {
            Ok(g) => g,
            Err(msg) => return RunOutcome::LaunchFailed(msg),
        };
        debug!(policy = policy.name(), pgid = guard.pgid, "executor started");

        let deadline = Instant::now() + self.timeout;
        loop {
            match guard.try_wait() {
                Ok(Some(status)) => {
                    guard.child = None;
                    return RunOutcome::Exited(status.code());
                }
                Ok(None) => {}
                Err(e) => {
                    guard.stop();
                    return RunOutcome::LaunchFailed(format!("WAIT FAILED: {}", e));
                }
            }

            if shutdown.load(Ordering::Relaxed) {
                guard.stop();
                return RunOutcome::Interrupted;
            }

            let now = Instant::now();
            if now >= deadline {
                guard.stop();
                return RunOutcome::TimedOut;
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}
