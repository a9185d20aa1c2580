//! Part 1: log in with retries, then check that a wrong password is refused.

use std::path::PathBuf;

use altoro_common::auth::Credentials;
use altoro_domain::{AltoroError, Result};
use tracing::{info, instrument, warn};

use super::session::BrowserSession;
use super::WorkflowContext;
use crate::browser::Target;
use crate::pages::login::{ERROR_MESSAGE, LOGIN_WAIT};

/// Password submitted for the negative login.
pub const WRONG_PASSWORD: &str = "wrong_password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReport {
    /// Attempt that succeeded.
    pub attempts: u32,
    /// One screenshot per failed attempt.
    pub failed_attempt_screenshots: Vec<PathBuf>,
    pub negative_login_message: String,
    pub negative_login_screenshot: PathBuf,
}

#[instrument(skip(ctx))]
pub async fn run(ctx: &WorkflowContext) -> Result<LoginReport> {
    let session = BrowserSession::open(ctx).await?;
    let result = exercise_login(ctx, &session).await;
    session.close().await;
    result
}

async fn exercise_login(
    ctx: &WorkflowContext,
    session: &BrowserSession<'_>,
) -> Result<LoginReport> {
    let settings = ctx.settings();
    let dir = &settings.paths().screenshot_dir;
    let login = session.login_page();
    let actions = session.actions();
    let credentials = session.credentials();
    let max_attempts = settings.scrape().max_login_retries;

    let mut failed_attempt_screenshots = Vec::new();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let Err(error) = login.authenticate(&credentials).await else {
            info!(attempt, "login successful");
            break;
        };
        match actions.screenshot(dir, &format!("login_attempt_{attempt}")).await {
            Ok(path) => {
                warn!(
                    attempt,
                    max_attempts,
                    %error,
                    screenshot = %path.display(),
                    "login attempt failed"
                );
                failed_attempt_screenshots.push(path);
            }
            Err(shot_error) => {
                warn!(attempt, %error, %shot_error, "login attempt failed, no screenshot")
            }
        }
        if attempt >= max_attempts {
            return Err(error.into());
        }
    }

    login.goto().await?;
    login.submit(&Credentials::new(&credentials.username, WRONG_PASSWORD)).await?;
    if let Err(error) = actions.wait_for(&Target::css(ERROR_MESSAGE), LOGIN_WAIT).await {
        warn!(%error, "no login error banner after a wrong password");
    }
    let negative_login_message = login.error_message().await?;
    let negative_login_screenshot = actions.screenshot(dir, "negative_login").await?;
    if login.is_logged_in().await {
        return Err(AltoroError::Verification(format!(
            "login with a wrong password for '{}' was accepted",
            credentials.username
        )));
    }
    info!(
        message = %negative_login_message,
        screenshot = %negative_login_screenshot.display(),
        "captured negative login state"
    );

    Ok(LoginReport {
        attempts: attempt,
        failed_attempt_screenshots,
        negative_login_message,
        negative_login_screenshot,
    })
}
