//! Terminal host and entry point.
//!
//! This is the thin layer between the netmodal library and a real terminal:
//! it parses the command line, starts the capture bridge, puts the terminal
//! into raw mode on the alternate screen, and runs the event loop.
//!
//! # Event Loop
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ poll terminal (≤ 50 ms, or next deadline)  │
//! │   Key    → App::handle_key                 │
//! │   Resize → App::resize                     │
//! │ App::tick (drain bridge, timers, commit)   │
//! │ execute actions (quit, clipboard)          │
//! │ redraw if the store committed              │
//! └────────────────────────────────────────────┘
//! ```
//!
//! # Clipboard
//!
//! Copies are sent with the OSC 52 escape sequence, which most terminal
//! emulators (and tmux with `set-clipboard on`) forward to the system
//! clipboard. Nothing is written when the terminal ignores it.

use anyhow::Context as _;
use base64::Engine as _;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use netmodal::app::{BareKey, Key};
use netmodal::capture::{CaptureSource, NullSource, ProcessBridge};
use netmodal::{observability, Action, App, Config};
use std::cell::Cell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Longest time the loop sleeps waiting for input.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A keyboard-only, vim-modal inspector for live network request streams.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (default: config.toml in the platform config dir)
    #[arg(long, env = "NETMODAL_CONFIG")]
    config: Option<PathBuf>,

    /// Capture bridge command line, split on whitespace
    #[arg(long, value_name = "COMMAND")]
    bridge: Option<String>,

    /// Built-in theme name (catppuccin-mocha, catppuccin-latte)
    #[arg(long)]
    theme: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    trace_level: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(self, config: &mut Config) {
        if let Some(bridge) = self.bridge {
            config.bridge_command = bridge.split_whitespace().map(String::from).collect();
        }
        if self.theme.is_some() {
            config.theme = self.theme;
            config.theme_file = None;
        }
        if self.trace_level.is_some() {
            config.trace_level = self.trace_level;
        }
    }
}

/// Restores the terminal when dropped, including on error paths.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut impl Write) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        if let Err(e) = execute!(out, cursor::Show, terminal::LeaveAlternateScreen) {
            tracing::error!(error = %e, "failed to leave alternate screen");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::error!(error = %e, "failed to disable raw mode");
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);

    observability::init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "netmodal starting");

    let source: Box<dyn CaptureSource> = if config.bridge_command.is_empty() {
        Box::new(NullSource)
    } else {
        let bridge = ProcessBridge::spawn(&config.bridge_command)
            .with_context(|| format!("failed to start capture bridge {:?}", config.bridge_command))?;
        Box::new(bridge)
    };

    let clock = Instant::now();
    let mut app = netmodal::initialize(&config, source, 0);

    let mut out = io::stdout();
    let guard = TerminalGuard::enter(&mut out).context("failed to set up the terminal")?;
    let result = run(&mut app, &mut out, clock);
    drop(guard);

    if let Err(e) = &result {
        tracing::error!(error = %e, "netmodal exited with an error");
    }
    result
}

fn run(app: &mut App, out: &mut impl Write, clock: Instant) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size()?;
    app.resize(usize::from(rows), usize::from(cols));

    let dirty = Rc::new(Cell::new(true));
    let flag = Rc::clone(&dirty);
    app.subscribe(move |_| flag.set(true));
    app.start();

    loop {
        let now = elapsed_ms(clock);
        let timeout = app
            .next_deadline()
            .map_or(POLL_INTERVAL, |deadline| {
                Duration::from_millis(deadline.saturating_sub(now)).min(POLL_INTERVAL)
            });

        let mut actions = Vec::new();
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(key) = convert_key(key) {
                        actions.extend(app.handle_key(key, elapsed_ms(clock)));
                    }
                }
                Event::Resize(cols, rows) => {
                    app.resize(usize::from(rows), usize::from(cols));
                    dirty.set(true);
                }
                _ => {}
            }
        }
        actions.extend(app.tick(elapsed_ms(clock)));

        for action in actions {
            match action {
                Action::Quit => {
                    tracing::info!("quit requested");
                    return Ok(());
                }
                Action::Copy { label, text } => copy_to_clipboard(out, &label, &text)?,
            }
        }

        if dirty.replace(false) {
            out.write_all(app.render().as_bytes())?;
            out.flush()?;
        }
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Translates a crossterm key event; keys the keymap never uses map to `None`.
fn convert_key(event: KeyEvent) -> Option<Key> {
    let bare = match event.code {
        KeyCode::Char(c) => BareKey::Char(c),
        KeyCode::Enter => BareKey::Enter,
        KeyCode::Esc => BareKey::Esc,
        KeyCode::Tab => BareKey::Tab,
        KeyCode::BackTab => BareKey::BackTab,
        KeyCode::Backspace => BareKey::Backspace,
        KeyCode::Up => BareKey::Up,
        KeyCode::Down => BareKey::Down,
        KeyCode::Left => BareKey::Left,
        KeyCode::Right => BareKey::Right,
        KeyCode::PageUp => BareKey::PageUp,
        KeyCode::PageDown => BareKey::PageDown,
        _ => return None,
    };
    Some(Key {
        bare,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
    })
}

/// Puts `text` on the clipboard with OSC 52.
fn copy_to_clipboard(out: &mut impl Write, label: &str, text: &str) -> io::Result<()> {
    tracing::debug!(label, bytes = text.len(), "copy to clipboard");
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    write!(out, "\u{1b}]52;c;{encoded}\u{7}")?;
    out.flush()
}
