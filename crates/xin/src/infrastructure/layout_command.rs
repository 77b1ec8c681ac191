//! Layout command runners.
//!
//! [`CommandLayoutRunner`] starts the real program (`setxkbmap <name>` by
//! default) with `tokio::process`.  The name is passed as a separate argument,
//! never through a shell.
//!
//! [`RecordingLayoutRunner`] is the test double: it records each requested
//! layout and, when given a [`MockEventQueue`], queues the keyboard
//! `MappingNotify` the real server would send.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use xin_core::LayoutName;

use super::display::mock::MockEventQueue;
use crate::application::display::{DisplayEvent, MappingNotify};
use crate::application::switch_layout::{CommandExit, LayoutCommandRunner};

/// Program used when nothing else is configured.
pub const DEFAULT_LAYOUT_COMMAND: &str = "setxkbmap";

/// Runs an external program with the layout name as its last argument.
#[derive(Debug, Clone)]
pub struct CommandLayoutRunner {
    program: String,
    args: Vec<String>,
}

impl CommandLayoutRunner {
    /// Builds a runner from a whitespace-separated command line such as
    /// `"setxkbmap -option ''"`.  An empty line falls back to `setxkbmap`.
    pub fn new(command_line: &str) -> Self {
        let mut words = command_line.split_whitespace().map(str::to_owned);
        match words.next() {
            Some(program) => Self {
                program,
                args: words.collect(),
            },
            None => Self::default(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for CommandLayoutRunner {
    fn default() -> Self {
        Self {
            program: DEFAULT_LAYOUT_COMMAND.to_owned(),
            args: Vec::new(),
        }
    }
}

#[async_trait]
impl LayoutCommandRunner for CommandLayoutRunner {
    async fn run(&self, layout: &LayoutName) -> io::Result<CommandExit> {
        debug!(program = %self.program, layout = %layout, "running layout command");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(layout.as_str())
            .status()
            .await?;

        Ok(if status.success() {
            CommandExit::Success
        } else {
            CommandExit::Failure(status.code())
        })
    }
}

/// Shared list of layouts a [`RecordingLayoutRunner`] was asked to apply.
pub type LayoutRuns = Arc<Mutex<Vec<String>>>;

/// A runner that records requests instead of starting a process.
#[derive(Debug, Default)]
pub struct RecordingLayoutRunner {
    runs: LayoutRuns,
    notify: Option<MockEventQueue>,
    exit: Option<CommandExit>,
}

impl RecordingLayoutRunner {
    /// A runner whose "command" produces a keyboard mapping notification on `queue`.
    pub fn notifying(queue: MockEventQueue) -> Self {
        Self {
            notify: Some(queue),
            ..Self::default()
        }
    }

    /// A runner that never produces a notification.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Reports `exit` instead of success.
    pub fn with_exit(mut self, exit: CommandExit) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Handle onto the recorded layout names.
    pub fn runs(&self) -> LayoutRuns {
        Arc::clone(&self.runs)
    }
}

#[async_trait]
impl LayoutCommandRunner for RecordingLayoutRunner {
    async fn run(&self, layout: &LayoutName) -> io::Result<CommandExit> {
        self.runs
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "layout run log poisoned"))?
            .push(layout.as_str().to_owned());
        if let Some(queue) = &self.notify {
            queue.push(DisplayEvent::Mapping(MappingNotify::keyboard(8, 248)));
        }
        Ok(self.exit.unwrap_or(CommandExit::Success))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
