//! Dispatcher: routes each input line to the matching use case and runs the
//! receive loop.
//!
//! Every line is handled to completion before the next one is read, so a
//! layout switch holds back the key commands that follow it until the new
//! keyboard mapping is in place.
//!
//! # Error policy
//!
//! | Problem                              | Effect                         |
//! |--------------------------------------|--------------------------------|
//! | malformed / truncated line           | one warning, line discarded    |
//! | keysym without keycode, bad button   | one warning, line discarded    |
//! | invalid layout name, layout timeout  | one warning, line discarded    |
//! | layout command cannot be started     | receive loop stops (fatal)     |
//! | stdin read error                     | receive loop stops (fatal)     |

use std::io;

use thiserror::Error;
use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};
use xin_core::{parse_line, Command, ParseError};

use super::inject_input::{InjectError, InjectInputUseCase};
use super::switch_layout::{LayoutError, LayoutSwitchCoordinator};
use crate::infrastructure::line_reader::{LineRead, LineReader};

/// Why a single line was not applied.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("parse error; truncated input")]
    Truncated,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Inject(#[from] InjectError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl LineError {
    /// `true` when the receiver must stop instead of moving to the next line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LineError::Layout(e) if e.is_fatal())
    }
}

/// Error that ends the receive loop.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("reading stdin: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fatal(LineError),
}

/// Counters reported when the receive loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub applied: u64,
    pub rejected: u64,
}

/// Routes decoded commands to the injection and layout use cases.
pub struct Dispatcher {
    input: InjectInputUseCase,
    layout: LayoutSwitchCoordinator,
}

impl Dispatcher {
    pub fn new(input: InjectInputUseCase, layout: LayoutSwitchCoordinator) -> Self {
        Self { input, layout }
    }

    pub fn input(&self) -> &InjectInputUseCase {
        &self.input
    }

    /// Parses and applies one line, returning the command that was applied.
    ///
    /// # Errors
    ///
    /// Returns a [`LineError`]; see [`LineError::is_fatal`].
    pub async fn dispatch(&mut self, line: &str) -> Result<Command, LineError> {
        let command = parse_line(line)?;
        debug!(%command, "dispatch");

        match &command {
            Command::Key(key) => self.input.handle_key(key)?,
            Command::Button(button) => self.input.handle_button(button)?,
            Command::Motion(motion) => {
                self.input.handle_motion(motion)?;
            }
            Command::Layout(layout) => {
                self.layout.switch(&layout.name).await?;
            }
        }
        Ok(command)
    }

    /// Reads lines until EOF, applying each one.
    ///
    /// Per-line errors are logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`ReceiveError::Io`] if the reader fails.
    /// - [`ReceiveError::Fatal`] if a line error is fatal.
    pub async fn run<R>(&mut self, reader: &mut LineReader<R>) -> Result<ReceiveStats, ReceiveError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = ReceiveStats::default();

        while let Some(item) = reader.next_line().await? {
            let result = match item {
                LineRead::Line(line) => self.dispatch(&line).await.map(|_| ()),
                LineRead::Truncated => Err(LineError::Truncated),
            };

            match result {
                Ok(()) => stats.applied += 1,
                Err(e) if e.is_fatal() => return Err(ReceiveError::Fatal(e)),
                Err(e) => {
                    warn!("{e}");
                    stats.rejected += 1;
                }
            }
        }

        info!(applied = stats.applied, rejected = stats.rejected, "end of input");
        Ok(stats)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::application::display::DisplaySession;
    use crate::application::inject_input::InjectionMethod;
    use crate::application::switch_layout::MockLayoutCommandRunner;
    use crate::infrastructure::display::mock::{DisplayCall, MockDisplaySession};
    use xin_core::{KeyAction, PointerPosition};

    fn make_dispatcher(runner: MockLayoutCommandRunner) -> (Dispatcher, Rc<MockDisplaySession>) {
        let display = Rc::new(MockDisplaySession::new().with_screen(800, 600).with_pointer(100, 100));
        let shared = Rc::clone(&display) as Rc<dyn DisplaySession>;
        let dispatcher = Dispatcher::new(
            InjectInputUseCase::new(Rc::clone(&shared), InjectionMethod::Replay),
            LayoutSwitchCoordinator::new(shared, Box::new(runner)),
        );
        (dispatcher, display)
    }

    #[tokio::test]
    async fn test_dispatch_key_line() {
        // Arrange
        let (mut dispatcher, display) = make_dispatcher(MockLayoutCommandRunner::new());

        // Act
        let command = dispatcher.dispatch("k 65").await.unwrap();

        // Assert
        assert!(matches!(command, Command::Key(_)));
        assert_eq!(
            display.injected(),
            vec![DisplayCall::FakeKey { keycode: 38, action: KeyAction::Press }]
        );
    }

    #[tokio::test]
    async fn test_dispatch_motion_updates_pointer() {
        let (mut dispatcher, _display) = make_dispatcher(MockLayoutCommandRunner::new());

        dispatcher.dispatch("m 5 5").await.unwrap();

        assert_eq!(
            dispatcher.input().pointer_position(),
            Some(PointerPosition::new(95, 95))
        );
    }

    #[tokio::test]
    async fn test_dispatch_parse_error_is_not_fatal() {
        let (mut dispatcher, display) = make_dispatcher(MockLayoutCommandRunner::new());

        let err = dispatcher.dispatch("garbage").await.unwrap_err();

        assert!(matches!(err, LineError::Parse(ParseError::InvalidFormat)));
        assert!(!err.is_fatal());
        assert!(display.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_control() {
        let (mut dispatcher, _display) = make_dispatcher(MockLayoutCommandRunner::new());

        let err = dispatcher.dispatch("x 1 2").await.unwrap_err();

        assert!(matches!(err, LineError::Parse(ParseError::UnknownControl('x'))));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_fatal_line_error() {
        // Arrange
        let mut runner = MockLayoutCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "missing")));
        let (mut dispatcher, _display) = make_dispatcher(runner);

        // Act
        let err = dispatcher.dispatch("l us").await.unwrap_err();

        // Assert
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_run_counts_truncated_line_as_rejected() {
        // Arrange: the 70-byte line overflows the 64-byte default buffer
        let (mut dispatcher, display) = make_dispatcher(MockLayoutCommandRunner::new());
        let mut input = vec![b'k'; 70];
        input.extend_from_slice(b"\nk 65\n");
        let mock = tokio_test::io::Builder::new().read(&input).build();
        let mut reader = LineReader::new(tokio::io::BufReader::new(mock));

        // Act
        let stats = dispatcher.run(&mut reader).await.unwrap();

        // Assert
        assert_eq!(stats, ReceiveStats { applied: 1, rejected: 1 });
        assert_eq!(
            display.injected(),
            vec![DisplayCall::FakeKey { keycode: 38, action: KeyAction::Press }]
        );
    }
}
