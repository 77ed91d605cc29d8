//! Colored user-facing messages, distinct from the tracing log stream.
//! Colors are applied only when the target stream is a TTY.

use owo_colors::OwoColorize;

#[derive(Clone, Copy)]
enum Level {
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Info => "info:",
            Level::Success => "ok:",
            Level::Warn => "warn:",
            Level::Error => "error:",
        }
    }

    /// Warnings and errors go to stderr; informational output to stdout.
    fn to_stderr(self) -> bool {
        matches!(self, Level::Warn | Level::Error)
    }

    fn paint(self) -> String {
        match self {
            Level::Info => self.label().cyan().bold().to_string(),
            Level::Success => self.label().green().bold().to_string(),
            Level::Warn => self.label().yellow().bold().to_string(),
            Level::Error => self.label().red().bold().to_string(),
        }
    }
}

fn emit(level: Level, msg: &str) {
    let (stream, is_tty) = if level.to_stderr() {
        (atty::Stream::Stderr, atty::is(atty::Stream::Stderr))
    } else {
        (atty::Stream::Stdout, atty::is(atty::Stream::Stdout))
    };
    let label = if is_tty {
        level.paint()
    } else {
        level.label().to_string()
    };
    match stream {
        atty::Stream::Stderr => eprintln!("{label} {msg}"),
        _ => println!("{label} {msg}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Level::Info, msg);
}

pub fn print_success(msg: &str) {
    emit(Level::Success, msg);
}

pub fn print_warn(msg: &str) {
    emit(Level::Warn, msg);
}

pub fn print_error(msg: &str) {
    emit(Level::Error, msg);
}
