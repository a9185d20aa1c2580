//! Login form and session-state checks.

use std::time::Duration;

use altoro_common::auth::Credentials;
use tracing::{debug, info};

use crate::browser::{BrowserError, PageActions, Target};

pub const LOGIN_WAIT: Duration = Duration::from_secs(5);
pub const ASSERT_LOGIN_WAIT: Duration = Duration::from_secs(7);
pub const SESSION_CHECK_WAIT: Duration = Duration::from_secs(2);

pub const USERNAME_FIELD: &str = "#uid";
pub const PASSWORD_FIELD: &str = "#passw";
pub const SUBMIT_BUTTON: &str = r#"input[name="btnSubmit"]"#;
pub const LOGIN_FORM_FIELD: &str = r#"input[name="uid"]"#;
pub const ERROR_MESSAGE: &str = "span#_ctl0__ctl0_Content_Main_message";
pub const LOGGED_IN_MARKER: &str = "MY ACCOUNT";

pub struct LoginPage<'a> {
    actions: PageActions<'a>,
    login_url: String,
}

impl<'a> LoginPage<'a> {
    /// `login_url` is the absolute URL of `login.jsp`.
    pub fn new(actions: PageActions<'a>, login_url: impl Into<String>) -> Self {
        Self { actions, login_url: login_url.into() }
    }

    pub async fn goto(&self) -> Result<(), BrowserError> {
        self.actions.goto(&self.login_url).await
    }

    /// Fill and submit the form without waiting for the outcome.
    pub async fn submit(&self, credentials: &Credentials) -> Result<(), BrowserError> {
        self.actions.fill(&Target::css(USERNAME_FIELD), &credentials.username).await?;
        self.actions.fill(&Target::css(PASSWORD_FIELD), &credentials.password).await?;
        self.actions.click(&Target::css(SUBMIT_BUTTON)).await
    }

    /// Submit and wait for the account menu.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), BrowserError> {
        self.submit(credentials).await?;
        self.actions.wait_for(&Target::text(LOGGED_IN_MARKER), LOGIN_WAIT).await
    }

    pub async fn assert_logged_in(&self) -> Result<(), BrowserError> {
        let marker = Target::text(LOGGED_IN_MARKER);
        self.actions.wait_for(&marker, ASSERT_LOGIN_WAIT).await?;
        if self.actions.driver().is_visible(&marker).await? {
            Ok(())
        } else {
            Err(BrowserError::UnexpectedState(format!(
                "'{LOGGED_IN_MARKER}' is not visible after login"
            )))
        }
    }

    /// Navigate, log in and verify. Used for the initial login and as the
    /// re-authentication step of session recovery.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<(), BrowserError> {
        self.goto().await?;
        self.login(credentials).await?;
        self.assert_logged_in().await?;
        info!(user = %credentials.username, "login successful");
        Ok(())
    }

    /// Account menu shows up within the session-check wait and the login
    /// form is gone. Errors count as "no".
    pub async fn is_logged_in(&self) -> bool {
        let driver = self.actions.driver();
        let menu =
            driver.wait_for(&Target::text(LOGGED_IN_MARKER), SESSION_CHECK_WAIT).await.is_ok();
        let form = driver.is_visible(&Target::css(LOGIN_FORM_FIELD)).await.unwrap_or(true);
        menu && !form
    }

    /// Login form visible, or the browser sits on the login or root page.
    /// Errors count as "yes".
    pub async fn is_logged_out(&self) -> bool {
        let driver = self.actions.driver();
        let form = match driver.is_visible(&Target::css(LOGIN_FORM_FIELD)).await {
            Ok(visible) => visible,
            Err(_) => return true,
        };
        let url = match driver.current_url().await {
            Ok(url) => url,
            Err(_) => return true,
        };
        form || url.contains("/login.jsp") || url.ends_with('/')
    }

    /// Re-authenticate only when the session is actually gone; otherwise
    /// leave the page as it is so the caller simply replays.
    pub async fn recover(&self, credentials: &Credentials) -> Result<(), BrowserError> {
        if self.is_logged_out().await {
            info!("session expired, logging in again");
            self.authenticate(credentials).await
        } else {
            debug!("still logged in, replaying without re-authentication");
            Ok(())
        }
    }

    /// The login error banner, or an empty string.
    pub async fn error_message(&self) -> Result<String, BrowserError> {
        let target = Target::css(ERROR_MESSAGE);
        if self.actions.driver().count(&target).await? == 0 {
            return Ok(String::new());
        }
        self.actions.driver().text(&target).await
    }
}
