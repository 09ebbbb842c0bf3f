//! Terminal implementations of the UI seams: toasts go to the log, and the print
//! fallback opens the system browser.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::export::{Navigator, Notifier, Toast, ToastLevel};

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Loading => info!("{}", toast.message),
            ToastLevel::Success => info!("✓ {}", toast.message),
            ToastLevel::Error => error!("✗ {}", toast.message),
        }
    }
}

/// Opens URLs with the platform opener (`xdg-open`, `open`, `start`).
///
/// The opener is spawned and left running: a browser that stays in the
/// foreground must not hold up the export that fell back to it.
#[derive(Debug, Clone)]
pub struct SystemNavigator {
    program: String,
    args: Vec<String>,
}

impl Default for SystemNavigator {
    fn default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        };
        Self::with_opener(program, args)
    }
}

impl SystemNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `program args... <url>` instead of the platform opener.
    pub fn with_opener(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl Navigator for SystemNavigator {
    /// Must be called from within a tokio runtime.
    fn open_new_tab(&self, url: &str) -> bool {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!("Could not run {}: {e}", self.program);
                return false;
            }
        };

        // Reap the opener in the background and log how it went.
        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("{program} finished"),
                Ok(status) => warn!("{program} exited with {status}"),
                Err(e) => warn!("Waiting for {program} failed: {e}"),
            }
        });
        true
    }

    /// There is no page to replace in a terminal; print the URL for the user.
    fn navigate(&self, url: &str) {
        println!("Open this URL to print your resume: {url}");
    }
}
