//! Handing the consent URL to the user's desktop
//!
//! Opening a browser is best effort. The interactive flow always shows the
//! URL as well, so a failed launch only means the user copies it by hand.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tracing::debug;

use crate::error::{Error, Result};

/// Future returned by [`UrlOpener::open`].
pub type OpenFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Something that can show a URL to the user.
///
/// Uses `Pin<Box<dyn Future>>` so managers can hold `Arc<dyn UrlOpener>`.
pub trait UrlOpener: Send + Sync {
    fn open<'a>(&'a self, url: &'a str) -> OpenFuture<'a>;
}

/// Launches the platform's default URL handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

#[cfg(target_os = "macos")]
const LAUNCHER: (&str, &[&str]) = ("open", &[]);

// `cmd /C start` would split the query string on `&`
#[cfg(target_os = "windows")]
const LAUNCHER: (&str, &[&str]) = ("rundll32", &["url.dll,FileProtocolHandler"]);

#[cfg(target_os = "linux")]
const LAUNCHER: (&str, &[&str]) = ("xdg-open", &[]);

// freedesktop handler is the common denominator on other unixes
#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
const LAUNCHER: (&str, &[&str]) = ("xdg-open", &[]);

/// Program and leading arguments for this platform; the URL is appended.
pub fn launch_command() -> (&'static str, &'static [&'static str]) {
    LAUNCHER
}

impl UrlOpener for SystemOpener {
    fn open<'a>(&'a self, url: &'a str) -> OpenFuture<'a> {
        Box::pin(async move {
            let (program, args) = launch_command();
            debug!(program, "launching browser");

            let status = tokio::process::Command::new(program)
                .args(args)
                .arg(url)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|e| Error::Browser(format!("spawning {program}: {e}")))?;

            if status.success() {
                Ok(())
            } else {
                Err(Error::Browser(format!("{program} exited with {status}")))
            }
        })
    }
}

/// Never opens anything. For headless hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOpener;

impl UrlOpener for NoopOpener {
    fn open<'a>(&'a self, _url: &'a str) -> OpenFuture<'a> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_command_matches_platform() {
        let (program, args) = launch_command();
        #[cfg(target_os = "macos")]
        assert_eq!((program, args.len()), ("open", 0));
        #[cfg(target_os = "windows")]
        assert_eq!(program, "rundll32");
        #[cfg(target_os = "linux")]
        assert_eq!((program, args.len()), ("xdg-open", 0));
        let _ = (program, args);
    }

    #[tokio::test]
    async fn noop_opener_succeeds() {
        NoopOpener.open("https://example.com").await.unwrap();
    }

    #[tokio::test]
    async fn opener_is_object_safe() {
        let opener: std::sync::Arc<dyn UrlOpener> = std::sync::Arc::new(NoopOpener);
        opener.open("https://example.com/?a=1&b=2").await.unwrap();
    }
}
