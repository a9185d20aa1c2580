//! Shared page primitives with optional human-like pacing.
//!
//! Every page module holds a [`PageActions`] and goes through it for clicks,
//! fills, selects and waits. With humanization disabled each call maps
//! straight onto the driver.

use std::path::{Path, PathBuf};
use std::time::Duration;

use altoro_domain::config::HumanizeSettings;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use super::error::BrowserError;
use super::ports::{BrowserDriver, Target};

const POST_CLICK: (Duration, Duration) = (Duration::from_millis(100), Duration::from_millis(500));
const PRE_FILL: (Duration, Duration) = (Duration::from_millis(200), Duration::from_millis(600));
const POST_SELECT: (Duration, Duration) = (Duration::from_millis(100), Duration::from_millis(400));
const POST_WAIT: (Duration, Duration) = (Duration::from_millis(150), Duration::from_millis(400));

/// Uniform delay in `[min, max]`. A reversed range collapses to `min`.
pub fn human_delay<R: Rng + ?Sized>(min: Duration, max: Duration, rng: &mut R) -> Duration {
    if max <= min {
        return min;
    }
    let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rng.gen_range(min_ms..=max_ms))
}

/// Pause after one keystroke: `base * U(0.5, 1.5)`, stretched by `U(2, 4)`
/// one time in ten.
pub fn keystroke_delay<R: Rng + ?Sized>(base: Duration, rng: &mut R) -> Duration {
    let mut factor = rng.gen_range(0.5..1.5);
    if rng.gen_bool(0.1) {
        factor *= rng.gen_range(2.0..4.0);
    }
    base.mul_f64(factor)
}

/// `{tag}_{YYYYmmdd_HHMMSS}.png`
pub fn screenshot_name(tag: &str, at: DateTime<Utc>) -> String {
    format!("{tag}_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// Driver wrapper shared by the page modules.
#[derive(Clone, Copy)]
pub struct PageActions<'a> {
    driver: &'a dyn BrowserDriver,
    humanize: HumanizeSettings,
}

impl<'a> PageActions<'a> {
    pub fn new(driver: &'a dyn BrowserDriver, humanize: HumanizeSettings) -> Self {
        Self { driver, humanize }
    }

    pub fn driver(&self) -> &'a dyn BrowserDriver {
        self.driver
    }

    pub fn is_humanized(&self) -> bool {
        self.humanize.enabled
    }

    pub async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        debug!(url, "navigating");
        self.driver.goto(url).await
    }

    pub async fn click(&self, target: &Target) -> Result<(), BrowserError> {
        if !self.humanize.enabled {
            return self.driver.click(target).await;
        }
        self.pause(self.humanize.min_action_delay, self.humanize.max_action_delay).await;
        self.driver.click(target).await?;
        self.pause(POST_CLICK.0, POST_CLICK.1).await;
        Ok(())
    }

    /// Click `target` when it exists. Returns whether a click happened.
    pub async fn click_if_present(&self, target: &Target) -> Result<bool, BrowserError> {
        if self.driver.count(target).await? == 0 {
            debug!(%target, "nothing to click");
            return Ok(false);
        }
        self.click(target).await?;
        Ok(true)
    }

    /// Replace the field's content. Humanized fills type one character at a
    /// time.
    pub async fn fill(&self, target: &Target, text: &str) -> Result<(), BrowserError> {
        if !self.humanize.enabled {
            return self.driver.fill(target, text).await;
        }
        self.pause(PRE_FILL.0, PRE_FILL.1).await;
        self.driver.click(target).await?;
        self.driver.fill(target, "").await?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.driver.type_text(target, ch.encode_utf8(&mut buf)).await?;
            let delay = keystroke_delay(self.humanize.typing_speed, &mut rand::thread_rng());
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    pub async fn select(&self, target: &Target, value: &str) -> Result<(), BrowserError> {
        if !self.humanize.enabled {
            return self.driver.select_option(target, value).await;
        }
        self.pause(self.humanize.min_action_delay, self.humanize.max_action_delay).await;
        self.driver.select_option(target, value).await?;
        self.pause(POST_SELECT.0, POST_SELECT.1).await;
        Ok(())
    }

    pub async fn wait_for(&self, target: &Target, timeout: Duration) -> Result<(), BrowserError> {
        self.driver.wait_for(target, timeout).await?;
        if self.humanize.enabled {
            self.pause(POST_WAIT.0, POST_WAIT.1).await;
        }
        Ok(())
    }

    /// Save a screenshot as `{dir}/{tag}_{timestamp}.png`, creating `dir`.
    pub async fn screenshot(&self, dir: &Path, tag: &str) -> Result<PathBuf, BrowserError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| BrowserError::Io { path: dir.to_path_buf(), message: e.to_string() })?;
        let path = dir.join(screenshot_name(tag, Utc::now()));
        self.driver.screenshot(&path).await?;
        debug!(path = %path.display(), "screenshot saved");
        Ok(path)
    }

    async fn pause(&self, min: Duration, max: Duration) {
        let delay = human_delay(min, max, &mut rand::thread_rng());
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::testing::{FakeBrowser, FakeCall};

    fn humanized() -> HumanizeSettings {
        HumanizeSettings {
            enabled: true,
            min_action_delay: Duration::from_millis(300),
            max_action_delay: Duration::from_millis(1500),
            typing_speed: Duration::from_millis(150),
        }
    }

    fn direct() -> HumanizeSettings {
        HumanizeSettings { enabled: false, ..humanized() }
    }

    #[test]
    fn test_human_delay_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let d = human_delay(Duration::from_millis(300), Duration::from_millis(1500), &mut rng);
            assert!(d >= Duration::from_millis(300) && d <= Duration::from_millis(1500));
        }
        assert_eq!(
            human_delay(Duration::from_millis(500), Duration::from_millis(100), &mut rng),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_keystroke_delay_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let base = Duration::from_millis(150);
        for _ in 0..500 {
            let d = keystroke_delay(base, &mut rng);
            assert!(d >= base.mul_f64(0.5));
            assert!(d < base.mul_f64(1.5 * 4.0));
        }
    }

    #[test]
    fn test_screenshot_name_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).single().expect("valid");
        assert_eq!(screenshot_name("login_attempt_1", at), "login_attempt_1_20250304_050607.png");
    }

    #[tokio::test]
    async fn test_direct_fill_is_single_call() {
        let browser = FakeBrowser::new();
        let actions = PageActions::new(&browser, direct());

        actions.fill(&Target::css("#uid"), "jsmith").await.expect("fill");

        assert_eq!(browser.calls(), vec![FakeCall::Fill(Target::css("#uid"), "jsmith".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_humanized_fill_types_each_character() {
        let browser = FakeBrowser::new();
        let actions = PageActions::new(&browser, humanized());

        actions.fill(&Target::css("#passw"), "abc").await.expect("fill");

        let typed: Vec<_> = browser
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Type(_, s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(typed, vec!["a", "b", "c"]);
        assert_eq!(browser.field_value(&Target::css("#passw")), Some("abc".to_string()));
    }

    #[tokio::test]
    async fn test_click_if_present_skips_missing() {
        let browser = FakeBrowser::new();
        let actions = PageActions::new(&browser, direct());

        assert!(!actions.click_if_present(&Target::link("Transfer Funds")).await.expect("count"));

        browser.set_count(Target::link("Transfer Funds"), 1);
        assert!(actions.click_if_present(&Target::link("Transfer Funds")).await.expect("click"));
        assert_eq!(browser.clicks(), vec![Target::link("Transfer Funds")]);
    }

    #[tokio::test]
    async fn test_screenshot_creates_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shots = dir.path().join("nested/screens");
        let browser = FakeBrowser::new();
        let actions = PageActions::new(&browser, direct());

        let path = actions.screenshot(&shots, "negative_login").await.expect("screenshot");

        assert!(shots.is_dir());
        assert!(path.starts_with(&shots));
        assert_eq!(browser.screenshots(), vec![path]);
    }
}
