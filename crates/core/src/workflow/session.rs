//! One browser session per workflow part.

use std::path::PathBuf;

use altoro_common::auth::Credentials;
use altoro_common::resilience::{DiagnosticCapture, SessionRecovery};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::WorkflowContext;
use crate::browser::{BrowserDriver, BrowserError, PageActions};
use crate::pages::LoginPage;

/// Saves a `{label}_failure` screenshot when a recovered operation gives up.
pub struct ScreenshotCapture<'a> {
    actions: PageActions<'a>,
    dir: PathBuf,
}

impl<'a> ScreenshotCapture<'a> {
    pub fn new(actions: PageActions<'a>, dir: impl Into<PathBuf>) -> Self {
        Self { actions, dir: dir.into() }
    }
}

#[async_trait]
impl DiagnosticCapture for ScreenshotCapture<'_> {
    async fn capture(&self, label: &str) -> Result<(), String> {
        let path = self
            .actions
            .screenshot(&self.dir, &format!("{label}_failure"))
            .await
            .map_err(|e| e.to_string())?;
        warn!(path = %path.display(), "failure screenshot saved");
        Ok(())
    }
}

/// A launched browser plus the context it was launched for.
pub struct BrowserSession<'c> {
    ctx: &'c WorkflowContext,
    driver: Box<dyn BrowserDriver>,
}

impl<'c> BrowserSession<'c> {
    pub async fn open(ctx: &'c WorkflowContext) -> Result<Self, BrowserError> {
        let driver = ctx.launcher().launch().await?;
        debug!("browser session opened");
        Ok(Self { ctx, driver })
    }

    pub fn actions(&self) -> PageActions<'_> {
        PageActions::new(self.driver.as_ref(), *self.ctx.settings().humanize())
    }

    pub fn login_page(&self) -> LoginPage<'_> {
        LoginPage::new(self.actions(), self.ctx.settings().site().url("login.jsp"))
    }

    pub fn credentials(&self) -> Credentials {
        let site = self.ctx.settings().site();
        Credentials::new(&site.username, &site.password)
    }

    /// Log in with the web credentials.
    pub async fn sign_in(&self) -> Result<(), BrowserError> {
        self.login_page().authenticate(&self.credentials()).await
    }

    /// Session recovery bounded by the configured retries, pausing with a
    /// doubling delay before each replay and capturing a screenshot on
    /// terminal failure.
    pub fn recovery(&self, label: &str) -> SessionRecovery<ScreenshotCapture<'_>> {
        let settings = self.ctx.settings();
        let session = settings.session();
        SessionRecovery::new(settings.session_retries())
            .with_recovery_delay(session.recovery_delay)
            .with_recovery_backoff(session.max_recovery_delay)
            .with_diagnostics(ScreenshotCapture::new(
                self.actions(),
                &settings.paths().screenshot_dir,
            ))
            .labelled(label)
    }

    /// Quit the browser. A failure to quit is logged, not returned.
    pub async fn close(self) {
        if let Err(error) = self.ctx.launcher().close(self.driver).await {
            warn!(%error, "failed to close browser session");
        }
    }
}
