//! Subprocess management: start a child executable with
//! bidirectional pipes, expose its stdout readability and hangup as
//! `Event`s, and reap it on `unload`.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{DriverError, Result};
use crate::event::Event;

struct ReaderState {
    lines: Mutex<VecDeque<String>>,
    readable: Event,
}

/// A running child process with a dedicated reader thread draining its
/// stdout into a line queue, and an `Event` signalled whenever that queue
/// becomes non-empty (the "file-readable" event).
pub struct Subprocess {
    name: String,
    child: Child,
    stdin: ChildStdin,
    reader: Arc<ReaderState>,
    reader_thread: Option<JoinHandle<()>>,
}

impl Subprocess {
    /// Starts `exe` as a child process, optionally in `workdir`, with its
    /// stdin/stdout wired up as pipes for line-based UCI exchange.
    pub fn load(name: &str, exe: &Path, workdir: Option<&Path>) -> Result<Subprocess> {
        let mut command = Command::new(exe);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");

        let reader = Arc::new(ReaderState {
            lines: Mutex::new(VecDeque::new()),
            readable: Event::file_readable(),
        });

        let reader_for_thread = Arc::clone(&reader);
        let thread_name = name.to_string();
        let reader_thread = thread::Builder::new()
            .name(format!("chesscore-uci-reader-{thread_name}"))
            .spawn(move || Subprocess::reader_loop(stdout, reader_for_thread))
            .map_err(DriverError::Io)?;

        log::debug!("subprocess '{name}' loaded, pid {}", child.id());

        Ok(Subprocess {
            name: name.to_string(),
            child,
            stdin,
            reader,
            reader_thread: Some(reader_thread),
        })
    }

    fn reader_loop(stdout: std::process::ChildStdout, state: Arc<ReaderState>) {
        let mut reader = BufReader::new(stdout);
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    state.readable.mark_hangup();
                    return;
                }
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
                    state.lines.lock().unwrap().push_back(trimmed);
                    state.readable.set();
                }
                Err(_) => {
                    state.readable.mark_hangup();
                    return;
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// The event signalled whenever the child has produced at least one
    /// unread line, or has closed its stdout.
    pub fn stdout_event(&self) -> &Event {
        &self.reader.readable
    }

    pub fn is_hungup(&self) -> bool {
        self.reader.readable.is_hungup()
    }

    /// Pops the oldest buffered line, resetting the readable event once
    /// the queue drains (unless the child has hung up, in which case the
    /// event stays latched so future waits keep reporting hangup).
    pub fn try_read_line(&self) -> Option<String> {
        let mut lines = self.reader.lines.lock().unwrap();
        let line = lines.pop_front();
        if lines.is_empty() && !self.reader.readable.is_hungup() {
            self.reader.readable.reset();
        }
        line
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.stdin, "{line}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Lowers (or restores) the child's scheduling priority. Best-effort:
    /// platforms without a known mechanism log a warning and no-op.
    pub fn set_priority(&self, background: bool) -> Result<()> {
        platform::set_priority(self.child.id(), background)
    }

    /// Closes stdin (engines treat EOF as an implicit `quit`) and waits up
    /// to `timeout` for the child to exit, killing it otherwise.
    pub fn unload(mut self, timeout: Duration) -> Result<()> {
        // Closes the write end of the child's stdin; a well-behaved UCI
        // engine treats EOF there the same as an explicit `quit`.
        let stdin = self.stdin;
        drop(stdin);
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait()? {
                Some(_status) => break,
                None if Instant::now() >= deadline => {
                    log::warn!("subprocess '{}' did not exit in time, killing", self.name);
                    self.child.kill()?;
                    self.child.wait()?;
                    break;
                }
                None => thread::sleep(Duration::from_millis(10)),
            }
        }
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

#[cfg(unix)]
mod platform {
    use crate::error::Result;

    extern "C" {
        fn setpriority(which: i32, who: u32, prio: i32) -> i32;
    }

    const PRIO_PROCESS: i32 = 0;
    const NICE_BACKGROUND: i32 = 10;
    const NICE_NORMAL: i32 = 0;

    pub fn set_priority(pid: u32, background: bool) -> Result<()> {
        let nice = if background { NICE_BACKGROUND } else { NICE_NORMAL };
        // Best-effort: a non-zero return (e.g. insufficient privilege to
        // raise priority back) is not a hard failure for a GUI-driven
        // engine process.
        unsafe {
            if setpriority(PRIO_PROCESS, pid, nice) != 0 {
                log::warn!("setpriority(pid={pid}, nice={nice}) failed");
            }
        }
        Ok(())
    }
}

#[cfg(windows)]
mod platform {
    use crate::error::Result;

    pub fn set_priority(pid: u32, background: bool) -> Result<()> {
        log::warn!(
            "process priority adjustment not implemented on this platform (pid={pid}, background={background})"
        );
        Ok(())
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    use crate::error::Result;

    pub fn set_priority(pid: u32, background: bool) -> Result<()> {
        log::warn!(
            "process priority adjustment not supported on this platform (pid={pid}, background={background})"
        );
        Ok(())
    }
}
