//! xin entry point.
//!
//! Parses the command line, loads the optional config file, connects to the X
//! display and runs the receive loop over stdin until end of input.
//!
//! # Usage
//!
//! ```text
//! xin [OPTIONS]
//!
//! Options:
//!   -s, --send-event              Deliver keys with XSendEvent instead of XTEST
//!   -c, --config <PATH>           TOML configuration file
//!       --display <NAME>          X display [env: DISPLAY]
//!       --layout-command <PROG>   Layout switch program [default: setxkbmap]
//!       --layout-timeout <MS>     Give up waiting for the new keymap after MS
//!       --line-buffer <BYTES>     Stdin line buffer size [default: 64]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Flag               |
//! |-------------------------|--------------------|
//! | `XIN_SEND_EVENT`        | `--send-event`     |
//! | `XIN_CONFIG`            | `--config`         |
//! | `DISPLAY`               | `--display`        |
//! | `XIN_LAYOUT_COMMAND`    | `--layout-command` |
//! | `XIN_LAYOUT_TIMEOUT_MS` | `--layout-timeout` |
//! | `XIN_LINE_BUFFER`       | `--line-buffer`    |
//!
//! Log output goes to stderr; set `RUST_LOG=debug` to see every command.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ ReceiverConfig::resolve()   -- file + flags
//!  └─ XlibSession::open()         -- display, XKB, XTEST checks
//!  └─ Dispatcher::run()           -- one line at a time
//!       ├─ k/K, b/B, m  -> InjectInputUseCase
//!       └─ l            -> LayoutSwitchCoordinator
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xin::infrastructure::config::{ConfigOverrides, ReceiverConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Replay forwarded keyboard, pointer and layout commands on the local X display.
///
/// Reads one command per line on stdin: `k`/`K <keysym>`, `k`/`K <state>
/// <keycode>`, `b`/`B <unused> <button>`, `m <dx> <dy>` and `l <layout>`.
#[derive(Debug, Parser)]
#[command(name = "xin", version)]
struct Cli {
    /// Deliver key events straight to the focused window (XSendEvent).
    ///
    /// Works without the XTEST extension but bypasses keyboard grabs.
    #[arg(short = 's', long = "send-event", env = "XIN_SEND_EVENT")]
    send_event: bool,

    /// Optional TOML configuration file.
    #[arg(short = 'c', long, value_name = "PATH", env = "XIN_CONFIG")]
    config: Option<PathBuf>,

    /// X display to connect to.
    #[arg(long, value_name = "NAME", env = "DISPLAY")]
    display: Option<String>,

    /// Program run with the layout name to switch layouts [default: setxkbmap].
    #[arg(long, value_name = "PROG", env = "XIN_LAYOUT_COMMAND")]
    layout_command: Option<String>,

    /// Stop waiting for the keyboard mapping change after this many milliseconds.
    ///
    /// Without it a layout switch waits until the change is observed.
    #[arg(long = "layout-timeout", value_name = "MS", env = "XIN_LAYOUT_TIMEOUT_MS")]
    layout_timeout_ms: Option<u64>,

    /// Size of the stdin line buffer in bytes [default: 64].
    #[arg(long, value_name = "BYTES", env = "XIN_LINE_BUFFER")]
    line_buffer: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            send_event: self.send_event,
            display: self.display.clone(),
            layout_command: self.layout_command.clone(),
            layout_timeout_ms: self.layout_timeout_ms,
            line_buffer: self.line_buffer,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.  Stdout is left alone.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => Some(
            ReceiverConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
        ),
        None => None,
    };
    let config =
        ReceiverConfig::resolve(file, &cli.overrides()).context("invalid configuration")?;

    info!(
        injection = ?config.injection,
        layout_command = %config.layout_command,
        layout_timeout_ms = ?config.layout_timeout_ms,
        line_buffer = config.line_buffer,
        "xin starting"
    );

    receive(config).await
}

#[cfg(all(unix, not(target_os = "macos")))]
async fn receive(config: ReceiverConfig) -> anyhow::Result<()> {
    use std::rc::Rc;

    use tokio::io::BufReader;
    use xin::application::dispatch::Dispatcher;
    use xin::application::display::DisplaySession;
    use xin::application::inject_input::{InjectInputUseCase, InjectionMethod};
    use xin::application::switch_layout::LayoutSwitchCoordinator;
    use xin::infrastructure::display::xlib::XlibSession;
    use xin::infrastructure::layout_command::CommandLayoutRunner;
    use xin::infrastructure::line_reader::LineReader;

    let session =
        XlibSession::open(config.display.as_deref()).context("opening the X display")?;
    if config.injection == InjectionMethod::Replay && !session.has_xtest() {
        anyhow::bail!("XTEST not available; try xin -s");
    }
    let display: Rc<dyn DisplaySession> = Rc::new(session);

    let input = InjectInputUseCase::new(Rc::clone(&display), config.injection);
    let layout = LayoutSwitchCoordinator::new(
        display,
        Box::new(CommandLayoutRunner::new(&config.layout_command)),
    )
    .with_timeout(config.layout_timeout());
    let mut dispatcher = Dispatcher::new(input, layout);

    let mut reader =
        LineReader::with_capacity(BufReader::new(tokio::io::stdin()), config.line_buffer);
    dispatcher.run(&mut reader).await?;
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
async fn receive(_config: ReceiverConfig) -> anyhow::Result<()> {
    anyhow::bail!("xin needs Xlib, which is not available on this platform")
}
