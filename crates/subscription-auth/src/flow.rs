//! Hooks that customise the interactive login flow
//!
//! Every hook is optional. Unset hooks fall back to the terminal: the URL
//! is printed to stderr and the code is read as one line from stdin.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{Error, Result};

/// Future produced by a code prompt.
pub type PromptFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

type UrlHook = Box<dyn Fn(&str) + Send + Sync>;
type PromptHook = Box<dyn Fn() -> PromptFuture + Send + Sync>;
type SuccessHook = Box<dyn Fn() + Send + Sync>;
type ErrorHook = Box<dyn Fn(&Error) + Send + Sync>;

/// Optional callbacks for [`CredentialManager::authenticate`].
///
/// The code prompt has no timeout. Callers needing one should race the
/// returned future against a timer.
///
/// [`CredentialManager::authenticate`]: crate::CredentialManager::authenticate
#[derive(Default)]
pub struct FlowHooks {
    on_url: Option<UrlHook>,
    prompt_code: Option<PromptHook>,
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHook>,
}

impl FlowHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the consent URL once it is ready.
    pub fn on_url(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_url = Some(Box::new(hook));
        self
    }

    /// Supplies the `code#state` value shown on the callback page.
    pub fn prompt_code<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.prompt_code = Some(Box::new(move || -> PromptFuture { Box::pin(hook()) }));
        self
    }

    /// Called after the new credential has been persisted.
    pub fn on_success(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Called with the failure before it is returned to the caller.
    pub fn on_error(mut self, hook: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub(crate) fn url_ready(&self, url: &str) {
        match &self.on_url {
            Some(hook) => hook(url),
            None => {
                eprintln!("Open this URL in your browser to sign in:\n");
                eprintln!("  {url}\n");
                eprintln!("(If no browser opened, copy the URL above manually.)");
            }
        }
    }

    /// Obtain a trimmed, non-empty authorization code.
    pub(crate) async fn read_code(&self) -> Result<String> {
        let code = match &self.prompt_code {
            Some(hook) => hook().await?,
            None => read_code_from_stdin().await?,
        };

        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Prompt("no authorization code provided".into()));
        }
        Ok(code.to_owned())
    }

    pub(crate) fn succeeded(&self) {
        if let Some(hook) = &self.on_success {
            hook();
        }
    }

    pub(crate) fn failed(&self, error: &Error) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

impl fmt::Debug for FlowHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowHooks")
            .field("on_url", &self.on_url.is_some())
            .field("prompt_code", &self.prompt_code.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

async fn read_code_from_stdin() -> Result<String> {
    eprint!("Paste the authorization code: ");

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| Error::Prompt(format!("reading stdin: {e}")))?;

    if read == 0 {
        return Err(Error::Prompt("stdin closed before a code was entered".into()));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn prompt_hook_result_is_trimmed() {
        let hooks = FlowHooks::new().prompt_code(|| async { Ok("  abc#def\n".to_string()) });
        assert_eq!(hooks.read_code().await.unwrap(), "abc#def");
    }

    #[tokio::test]
    async fn blank_code_is_rejected() {
        let hooks = FlowHooks::new().prompt_code(|| async { Ok(" \n".to_string()) });
        assert!(matches!(hooks.read_code().await, Err(Error::Prompt(_))));
    }

    #[tokio::test]
    async fn prompt_hook_error_propagates() {
        let hooks = FlowHooks::new()
            .prompt_code(|| async { Err(Error::Prompt("user cancelled".into())) });
        let err = hooks.read_code().await.unwrap_err();
        assert!(err.to_string().contains("user cancelled"));
    }

    #[test]
    fn notification_hooks_fire() {
        let urls = Arc::new(AtomicUsize::new(0));
        let successes = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        let hooks = {
            let urls = urls.clone();
            let successes = successes.clone();
            let errors = errors.clone();
            FlowHooks::new()
                .on_url(move |_| {
                    urls.fetch_add(1, Ordering::SeqCst);
                })
                .on_success(move || {
                    successes.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |_| {
                    errors.fetch_add(1, Ordering::SeqCst);
                })
        };

        hooks.url_ready("https://example.com");
        hooks.succeeded();
        hooks.failed(&Error::Prompt("x".into()));

        assert_eq!(urls.load(Ordering::SeqCst), 1);
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unset_hooks_are_harmless() {
        let hooks = FlowHooks::new();
        hooks.succeeded();
        hooks.failed(&Error::Prompt("x".into()));
    }

    #[test]
    fn debug_reports_which_hooks_are_set() {
        let hooks = FlowHooks::new().on_success(|| {});
        let debug = format!("{hooks:?}");
        assert!(debug.contains("on_success: true"), "got: {debug}");
        assert!(debug.contains("on_url: false"), "got: {debug}");
    }
}
