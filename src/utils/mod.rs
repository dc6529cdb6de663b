//! Utilities: logging (level derived from -v / -q, emitted through `tracing`) and the
//! output sink that help text, refusal reasons and usage errors are written to.
//!
//! Key items:
//!   init_logging / derive_level
//!   output::{OutputSink, StdioSink, BufferSink}

/// Logging helpers.
pub mod logging {
    use tracing_subscriber::EnvFilter;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "error",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
                LogLevel::Trace => "trace",
            }
        }
    }

    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Install the stderr subscriber. `RUST_LOG` wins over the derived level.
    ///
    /// Only the first call in a process installs anything; later calls are no-ops,
    /// so a dispatcher invoked repeatedly (tests, meta commands) stays quiet about it.
    pub fn init_logging(level: LogLevel) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// Where user-facing text goes.
pub mod output {
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    /// The `log(text)` sink. Hosts redirect output by supplying their own implementation.
    pub trait OutputSink {
        /// Help text and refusal reasons (standard output).
        fn log(&self, text: &str);
        /// Usage errors and command failures (standard error).
        fn error(&self, text: &str);
    }

    /// Default sink: stdout / stderr.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StdioSink;

    impl OutputSink for StdioSink {
        fn log(&self, text: &str) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", text.trim_end_matches('\n'));
        }

        fn error(&self, text: &str) {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "{text}");
        }
    }

    /// Captures both streams in memory. Clones share the same buffers, so a host can
    /// hand one clone to the dispatcher and inspect the other.
    #[derive(Debug, Default, Clone)]
    pub struct BufferSink {
        out: Rc<RefCell<String>>,
        err: Rc<RefCell<String>>,
    }

    impl BufferSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn stdout(&self) -> String {
            self.out.borrow().clone()
        }

        pub fn stderr(&self) -> String {
            self.err.borrow().clone()
        }

        pub fn clear(&self) {
            self.out.borrow_mut().clear();
            self.err.borrow_mut().clear();
        }
    }

    impl OutputSink for BufferSink {
        fn log(&self, text: &str) {
            let mut out = self.out.borrow_mut();
            out.push_str(text.trim_end_matches('\n'));
            out.push('\n');
        }

        fn error(&self, text: &str) {
            self.err.borrow_mut().push_str(text);
        }
    }
}

pub use output::{BufferSink, OutputSink, StdioSink};
