use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future returned by the collaborator traits.
///
/// The traits are used as `Arc<dyn ...>` inside the dispatcher, so every
/// async method hands back one of these instead of an `impl Future`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How a child's stdin/stdout/stderr are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Child shares the parent's terminal.
    #[default]
    Inherited,
    /// stdout/stderr are captured and surfaced as `data` events.
    Piped,
}

/// Whether `spawn` waits for the child to exit before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Return a handle immediately; lifecycle is reported through events.
    #[default]
    Asynchronous,
    /// Wait for the child to exit and return its status. Only for short
    /// auxiliary commands.
    Synchronous,
}

/// Sub-applications that are launched from disk once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubAppKind {
    WebForm,
    WebApp,
}

impl SubAppKind {
    /// Name of the CLI flag that grants auto-build permission.
    pub fn auto_build_flag(self) -> &'static str {
        match self {
            SubAppKind::WebForm => "auto-build-web-form",
            SubAppKind::WebApp => "auto-build-web-app",
        }
    }
}

impl fmt::Display for SubAppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubAppKind::WebForm => f.write_str("webform"),
            SubAppKind::WebApp => f.write_str("webapp"),
        }
    }
}
