//! Print fallback: when an export fails the user is sent to the print-formatted
//! view, which opens the browser's native print dialog on load.
//!
//! Resumes the API knows are printed from `/print/:id`. A resume that only lives
//! in the local cache has no server route, so its print view is written to disk
//! and opened from there.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use vitae_core::{render_print_page, Resume};

pub use vitae_core::PRINT_FLAG;

/// Opens URLs for the user.
pub trait Navigator: Send + Sync {
    /// Opens `url` in a new tab or window. Returns `false` when that was refused,
    /// for example by a popup blocker.
    fn open_new_tab(&self, url: &str) -> bool;

    /// Replaces the current page with `url`.
    fn navigate(&self, url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Loading,
    Success,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Loading,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Where the fallback ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTarget {
    NewTab,
    SameTab,
}

/// `<base>/print/<id>?print=1` with the id percent-encoded.
pub fn print_url(base_url: &str, resume_id: &str) -> String {
    format!(
        "{}/print/{}?{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(resume_id),
        PRINT_FLAG
    )
}

/// Where a failed export sends the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintView {
    /// The API's `/print/:id` route.
    Server,
    /// A print page already written to this file.
    Local(PathBuf),
}

impl PrintView {
    pub fn url(&self, base_url: &str, resume_id: &str) -> String {
        match self {
            PrintView::Server => print_url(base_url, resume_id),
            PrintView::Local(path) => file_print_url(path),
        }
    }
}

/// `file://<path>?print=1`.
pub fn file_print_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    let path = path.trim_start_matches('/');
    let encoded = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("file:///{encoded}?{PRINT_FLAG}")
}

/// Writes the print page for `resume` into `dir` and returns its absolute path.
/// The page prints itself once `settle` has passed after load.
pub async fn write_local_print_page(
    dir: &Path,
    resume: &Resume,
    settle: Duration,
) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("print-{}.html", urlencoding::encode(resume.id())));
    tokio::fs::write(&path, render_print_page(resume, true, settle)).await?;
    let path = tokio::fs::canonicalize(&path).await?;
    debug!("Wrote print view of resume {} to {}", resume.id(), path.display());
    Ok(path)
}

/// Opens `url` in a new tab, or navigates in place when that is refused.
pub fn fallback_to_print(navigator: &dyn Navigator, url: &str) -> FallbackTarget {
    if navigator.open_new_tab(url) {
        info!("Opened print view {url}");
        FallbackTarget::NewTab
    } else {
        warn!("New tab refused, navigating to print view {url} in place");
        navigator.navigate(url);
        FallbackTarget::SameTab
    }
}
