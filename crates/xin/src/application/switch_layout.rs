//! LayoutSwitchCoordinator: changes the keyboard layout and waits until the
//! display has published the new keyboard mapping.
//!
//! # Why wait at all? (for beginners)
//!
//! Xlib caches the keysym/keycode table on the client side.  When an external
//! tool such as `setxkbmap` changes the layout, the server sends a
//! `MappingNotify` event and the client must refresh its cache before the next
//! keysym lookup, otherwise a key typed right after `l de` would be resolved
//! against the old layout.
//!
//! A client only receives `MappingNotify` for keys it has an interest in, so
//! the coordinator first grabs a sentinel key (`Super_L`) on the root window.
//! The sequence is:
//!
//! ```text
//! validate name ─► grab sentinel + sync ─► drain stale notifications
//!               ─► run layout command  ─► wait for a notification
//!               ─► drain again
//! ```
//!
//! The wait blocks the whole receive loop.  An optional deadline turns an
//! endless wait into a [`LayoutError::Timeout`] warning.

use std::io;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use xin_core::keymap::LAYOUT_SYNC_SENTINEL;
use xin_core::{LayoutName, LayoutNameError};

use super::display::{apply_mapping_notify, DisplayEvent, DisplaySession, MappingNotify};

/// How often the event queue is polled while waiting for a notification.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Error type for the layout switch.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The name was rejected before anything ran.
    #[error(transparent)]
    InvalidName(#[from] LayoutNameError),

    /// The layout command could not be started.  Fatal.
    #[error("failed to run layout command: {0}")]
    Spawn(#[source] io::Error),

    /// No mapping notification arrived before the deadline.
    #[error("no keyboard mapping change within {0:?}")]
    Timeout(Duration),
}

impl LayoutError {
    /// Only a failure to start the layout command stops the receiver.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LayoutError::Spawn(_))
    }
}

/// How the layout command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExit {
    Success,
    /// Non-zero exit; `None` when the process was killed by a signal.
    Failure(Option<i32>),
}

/// Runs the external program that changes the keyboard layout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LayoutCommandRunner: Send + Sync {
    /// Runs the command for `layout` and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the process could not be started.
    async fn run(&self, layout: &LayoutName) -> io::Result<CommandExit>;
}

/// The Switch Layout use case.
pub struct LayoutSwitchCoordinator {
    display: Rc<dyn DisplaySession>,
    runner: Box<dyn LayoutCommandRunner>,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl LayoutSwitchCoordinator {
    /// Creates a coordinator that waits without a deadline.
    pub fn new(display: Rc<dyn DisplaySession>, runner: Box<dyn LayoutCommandRunner>) -> Self {
        Self {
            display,
            runner,
            timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the deadline for the mapping-notification wait.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Switches to the layout named `raw` and returns the validated name.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::InvalidName`]: nothing was run.
    /// - [`LayoutError::Spawn`]: the command could not be started (fatal).
    /// - [`LayoutError::Timeout`]: the command ran but no notification came.
    pub async fn switch(&self, raw: &str) -> Result<LayoutName, LayoutError> {
        let name = LayoutName::parse(raw)?;

        self.arm_sentinel();
        let stale = self.drain_mapping_notifications();
        if stale > 0 {
            debug!(stale, "drained stale mapping notifications");
        }

        match self.runner.run(&name).await.map_err(LayoutError::Spawn)? {
            CommandExit::Success => {}
            CommandExit::Failure(Some(code)) => {
                warn!(layout = %name, code, "layout command exited with non-zero status")
            }
            CommandExit::Failure(None) => {
                warn!(layout = %name, "layout command was terminated by a signal")
            }
        }

        let notify = match self.timeout {
            None => self.wait_for_mapping().await,
            Some(deadline) => tokio::time::timeout(deadline, self.wait_for_mapping())
                .await
                .map_err(|_| LayoutError::Timeout(deadline))?,
        };
        trace!(?notify, "mapping change observed");

        self.drain_mapping_notifications();
        info!(layout = %name, "keyboard layout switched");
        Ok(name)
    }

    /// Grabs the sentinel key so the server reports mapping changes to us.
    fn arm_sentinel(&self) {
        match self.display.keysym_to_keycode(LAYOUT_SYNC_SENTINEL) {
            Some(keycode) => self.display.grab_key(keycode, self.display.root_window()),
            None => warn!("no keycode for Super_L; mapping notifications may not arrive"),
        }
        self.display.sync();
    }

    /// Applies every queued mapping notification without blocking.
    fn drain_mapping_notifications(&self) -> usize {
        let mut drained = 0;
        while let Some(notify) = self.display.check_mapping_notify() {
            apply_mapping_notify(self.display.as_ref(), &notify);
            drained += 1;
        }
        drained
    }

    /// Reads events until the first mapping notification, discarding the rest.
    async fn wait_for_mapping(&self) -> MappingNotify {
        loop {
            match self.display.poll_event() {
                Some(DisplayEvent::Mapping(notify)) => {
                    apply_mapping_notify(self.display.as_ref(), &notify);
                    return notify;
                }
                Some(DisplayEvent::Other(kind)) => trace!(kind, "discarding event"),
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::display::{MappingRequest, MappingNotify};
    use crate::infrastructure::display::mock::{
        DisplayCall, MockDisplaySession, MOCK_ROOT_WINDOW, MOCK_SUPER_KEYCODE,
    };

    fn make_coordinator(
        runner: MockLayoutCommandRunner,
    ) -> (LayoutSwitchCoordinator, Rc<MockDisplaySession>) {
        let display = Rc::new(MockDisplaySession::new());
        let coordinator = LayoutSwitchCoordinator::new(
            Rc::clone(&display) as Rc<dyn DisplaySession>,
            Box::new(runner),
        )
        .with_poll_interval(Duration::from_millis(1));
        (coordinator, display)
    }

    /// A runner that "changes the layout" by queuing a keyboard notification.
    fn notifying_runner(display: &MockDisplaySession) -> MockLayoutCommandRunner {
        let queue = display.event_queue();
        let mut runner = MockLayoutCommandRunner::new();
        runner.expect_run().times(1).returning(move |_| {
            queue.push(DisplayEvent::Mapping(MappingNotify::keyboard(8, 248)));
            Ok(CommandExit::Success)
        });
        runner
    }

    fn refreshes(display: &MockDisplaySession) -> usize {
        display
            .calls()
            .iter()
            .filter(|c| matches!(c, DisplayCall::RefreshMapping(_)))
            .count()
    }

    #[tokio::test]
    async fn test_invalid_name_runs_nothing() {
        // Arrange
        let mut runner = MockLayoutCommandRunner::new();
        runner.expect_run().times(0);
        let (coordinator, display) = make_coordinator(runner);

        // Act
        let result = coordinator.switch("; rm -rf").await;

        // Assert
        assert!(matches!(
            result,
            Err(LayoutError::InvalidName(LayoutNameError::InvalidCharacter(';')))
        ));
        assert!(display.calls().is_empty());
    }

    #[tokio::test]
    async fn test_switch_grabs_sentinel_before_running_command() {
        // Arrange
        let display = Rc::new(MockDisplaySession::new());
        let queue = display.event_queue();
        let recorder = Rc::clone(&display);
        let mut runner = MockLayoutCommandRunner::new();
        runner
            .expect_run()
            .withf(|name| name.as_str() == "us")
            .times(1)
            .returning(move |_| {
                queue.push(DisplayEvent::Mapping(MappingNotify::keyboard(8, 248)));
                Ok(CommandExit::Success)
            });
        let coordinator = LayoutSwitchCoordinator::new(
            Rc::clone(&display) as Rc<dyn DisplaySession>,
            Box::new(runner),
        )
        .with_poll_interval(Duration::from_millis(1));

        // Act
        let name = coordinator.switch("us").await.unwrap();

        // Assert
        assert_eq!(name.as_str(), "us");
        let calls = recorder.calls();
        assert_eq!(
            calls[0],
            DisplayCall::GrabKey { keycode: MOCK_SUPER_KEYCODE, window: MOCK_ROOT_WINDOW }
        );
        assert_eq!(calls[1], DisplayCall::Sync);
        assert_eq!(
            calls[2],
            DisplayCall::RefreshMapping(MappingNotify::keyboard(8, 248))
        );
    }

    #[tokio::test]
    async fn test_stale_notifications_are_drained_before_command_runs() {
        // Arrange
        let display = Rc::new(MockDisplaySession::new());
        let queue = display.event_queue();
        queue.push(DisplayEvent::Mapping(MappingNotify::keyboard(10, 1)));
        queue.push(DisplayEvent::Mapping(MappingNotify::keyboard(11, 1)));
        let inner = display.event_queue();
        let mut runner = MockLayoutCommandRunner::new();
        runner.expect_run().times(1).returning(move |_| {
            // Stale notifications must be gone by the time the command runs.
            assert!(inner.is_empty());
            inner.push(DisplayEvent::Mapping(MappingNotify::keyboard(8, 248)));
            Ok(CommandExit::Success)
        });
        let coordinator = LayoutSwitchCoordinator::new(
            Rc::clone(&display) as Rc<dyn DisplaySession>,
            Box::new(runner),
        )
        .with_poll_interval(Duration::from_millis(1));

        // Act
        coordinator.switch("de").await.unwrap();

        // Assert: two stale refreshes plus the one that ended the wait
        assert_eq!(refreshes(&display), 3);
    }

    #[tokio::test]
    async fn test_wait_discards_other_events_and_skips_non_keyboard_refresh() {
        // Arrange
        let display = Rc::new(MockDisplaySession::new());
        let queue = display.event_queue();
        let mut runner = MockLayoutCommandRunner::new();
        runner.expect_run().times(1).returning(move |_| {
            queue.push(DisplayEvent::Other(22));
            queue.push(DisplayEvent::Mapping(MappingNotify {
                request: MappingRequest::Pointer,
                first_keycode: 0,
                count: 0,
            }));
            Ok(CommandExit::Success)
        });
        let coordinator = LayoutSwitchCoordinator::new(
            Rc::clone(&display) as Rc<dyn DisplaySession>,
            Box::new(runner),
        )
        .with_poll_interval(Duration::from_millis(1));

        // Act
        coordinator.switch("fr").await.unwrap();

        // Assert
        assert_eq!(refreshes(&display), 0);
        assert!(display.event_queue().is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_still_waits_for_notification() {
        // Arrange
        let display = Rc::new(MockDisplaySession::new());
        let queue = display.event_queue();
        let mut runner = MockLayoutCommandRunner::new();
        runner.expect_run().times(1).returning(move |_| {
            queue.push(DisplayEvent::Mapping(MappingNotify::keyboard(8, 248)));
            Ok(CommandExit::Failure(Some(1)))
        });
        let coordinator = LayoutSwitchCoordinator::new(
            Rc::clone(&display) as Rc<dyn DisplaySession>,
            Box::new(runner),
        );

        // Act
        let result = coordinator.switch("xx").await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(refreshes(&display), 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_fatal() {
        // Arrange
        let mut runner = MockLayoutCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "no setxkbmap")));
        let (coordinator, _display) = make_coordinator(runner);

        // Act
        let err = coordinator.switch("us").await.unwrap_err();

        // Assert
        assert!(matches!(err, LayoutError::Spawn(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_deadline_without_notification_times_out() {
        // Arrange
        let mut runner = MockLayoutCommandRunner::new();
        runner.expect_run().returning(|_| Ok(CommandExit::Success));
        let (coordinator, _display) = make_coordinator(runner);
        let coordinator = coordinator.with_timeout(Some(Duration::from_millis(30)));

        // Act
        let err = coordinator.switch("us").await.unwrap_err();

        // Assert
        assert!(matches!(err, LayoutError::Timeout(d) if d == Duration::from_millis(30)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_notifying_runner_completes_within_deadline() {
        // Arrange
        let probe = MockDisplaySession::new();
        let runner = notifying_runner(&probe);
        let display = Rc::new(probe);
        let coordinator = LayoutSwitchCoordinator::new(
            Rc::clone(&display) as Rc<dyn DisplaySession>,
            Box::new(runner),
        )
        .with_timeout(Some(Duration::from_secs(5)));

        // Act
        let result = coordinator.switch("us").await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(refreshes(&display), 1);
    }
}
