//! Transfer Funds page.

use std::path::Path;

use altoro_domain::utils::account_number;
use altoro_domain::{TransferReceipt, TransferStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::browser::{BrowserError, PageActions, Target};

pub const TRANSFER_LINK: &str = "Transfer Funds";
pub const FROM_ACCOUNT: &str = "#fromAccount";
pub const TO_ACCOUNT: &str = "#toAccount";
pub const AMOUNT_FIELD: &str = "#transferAmount";
pub const TRANSFER_BUTTON: &str = r#"input[type="submit"][value="Transfer Money"]"#;
pub const POST_RESPONSE: &str = "#_ctl0__ctl0_Content_Main_postResp";
pub const SOAP_RESPONSE: &str = "#soapResp";
pub const SUCCESS_TEXT: &str = "successfully transferred";

/// Message and status read back after submitting a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub message: String,
    pub reference_number: Option<String>,
    pub status: TransferStatus,
}

/// First token after "reference" or "confirmation" that contains a digit.
pub fn reference_number(message: &str) -> Option<String> {
    let words: Vec<&str> = message.split_whitespace().collect();
    words.iter().enumerate().find_map(|(i, word)| {
        let lower = word.to_lowercase();
        if !(lower.starts_with("reference") || lower.starts_with("confirmation")) {
            return None;
        }
        words[i + 1..]
            .iter()
            .take(3)
            .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
            .find(|w| w.chars().any(|c| c.is_ascii_digit()))
            .map(ToString::to_string)
    })
}

pub struct TransferPage<'a> {
    actions: PageActions<'a>,
}

impl<'a> TransferPage<'a> {
    pub fn new(actions: PageActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn open(&self) -> Result<(), BrowserError> {
        self.actions.click_if_present(&Target::link(TRANSFER_LINK)).await?;
        Ok(())
    }

    /// Submit a transfer between two account numbers.
    pub async fn execute(&self, from: &str, to: &str, amount: Decimal) -> Result<(), BrowserError> {
        self.actions.select(&Target::css(FROM_ACCOUNT), from).await?;
        self.actions.select(&Target::css(TO_ACCOUNT), to).await?;
        self.actions.fill(&Target::css(AMOUNT_FIELD), &format!("{amount:.2}")).await?;
        self.actions.click(&Target::css(TRANSFER_BUTTON)).await
    }

    /// Read the response spans in order, falling back to any element with
    /// the success phrase.
    pub async fn capture_confirmation(&self) -> Result<Confirmation, BrowserError> {
        let mut message = String::new();
        let mut status = TransferStatus::Unknown;
        for selector in [POST_RESPONSE, SOAP_RESPONSE] {
            let text = self.read_text(&Target::css(selector)).await?;
            if text.is_empty() {
                continue;
            }
            if TransferStatus::from_message(&text) == TransferStatus::Success {
                status = TransferStatus::Success;
            }
            if message.is_empty() {
                message = text;
            }
        }
        if message.is_empty() {
            message = self.read_text(&Target::text(SUCCESS_TEXT)).await?;
            if !message.is_empty() {
                status = TransferStatus::Success;
            }
        }
        debug!(%status, message = %message, "transfer confirmation");
        Ok(Confirmation { reference_number: reference_number(&message), message, status })
    }

    /// Navigate, submit, read the confirmation and take a `transfer`
    /// screenshot. Account arguments are option labels such as
    /// `800002 Savings`; only the leading number is submitted.
    pub async fn run_transfer(
        &self,
        from_label: &str,
        to_label: &str,
        amount: Decimal,
        screenshot_dir: &Path,
    ) -> Result<TransferReceipt, BrowserError> {
        let (from, to) = (account_number(from_label), account_number(to_label));
        self.open().await?;
        self.execute(from, to, amount).await?;
        let confirmation = self.capture_confirmation().await?;
        let screenshot = self.actions.screenshot(screenshot_dir, "transfer").await?;
        info!(from, to, %amount, status = %confirmation.status, "transfer submitted");
        Ok(TransferReceipt {
            from_account: from.to_string(),
            to_account: to.to_string(),
            amount,
            confirmation_message: confirmation.message,
            reference_number: confirmation.reference_number,
            status: confirmation.status,
            screenshot: Some(screenshot),
            timestamp: Utc::now(),
        })
    }

    async fn read_text(&self, target: &Target) -> Result<String, BrowserError> {
        let driver = self.actions.driver();
        if driver.count(target).await? == 0 {
            return Ok(String::new());
        }
        Ok(driver.text(target).await?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::testing::{no_humanize, FakeBrowser, FakeCall};

    #[test]
    fn test_reference_number_extraction() {
        assert_eq!(
            reference_number("Transfer complete. Reference #: 88231."),
            Some("88231".into())
        );
        assert_eq!(reference_number("250.00 was successfully transferred"), None);
    }

    #[tokio::test]
    async fn test_confirmation_prefers_post_response() {
        let browser = FakeBrowser::new();
        browser.set_texts(Target::css(POST_RESPONSE), &["  "]);
        browser.set_texts(
            Target::css(SOAP_RESPONSE),
            &["250.00 was successfully transferred from Account 800002"],
        );
        let page = TransferPage::new(PageActions::new(&browser, no_humanize()));

        let confirmation = page.capture_confirmation().await.expect("confirmation");

        assert!(confirmation.message.starts_with("250.00 was successfully"));
        assert_eq!(confirmation.status, TransferStatus::Success);
    }

    #[tokio::test]
    async fn test_confirmation_unknown_when_nothing_shown() {
        let browser = FakeBrowser::new();
        let page = TransferPage::new(PageActions::new(&browser, no_humanize()));

        let confirmation = page.capture_confirmation().await.expect("confirmation");

        assert_eq!(confirmation.message, "");
        assert_eq!(confirmation.status, TransferStatus::Unknown);
    }

    #[tokio::test]
    async fn test_run_transfer_submits_account_numbers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let browser = FakeBrowser::new();
        browser.on_click(Target::css(TRANSFER_BUTTON), |page| {
            page.show(Target::css(POST_RESPONSE), &["250.00 was successfully transferred"]);
        });
        let page = TransferPage::new(PageActions::new(&browser, no_humanize()));

        let receipt = page
            .run_transfer("800002 Savings", "800003 Checking", dec!(250), dir.path())
            .await
            .expect("transfer");

        let calls = browser.calls();
        assert!(calls.contains(&FakeCall::Select(Target::css(FROM_ACCOUNT), "800002".into())));
        assert!(calls.contains(&FakeCall::Select(Target::css(TO_ACCOUNT), "800003".into())));
        assert!(calls.contains(&FakeCall::Fill(Target::css(AMOUNT_FIELD), "250.00".into())));
        assert_eq!(receipt.status, TransferStatus::Success);
        assert_eq!(receipt.from_account, "800002");
        assert_eq!(browser.screenshots().len(), 1);
        assert!(receipt.screenshot.is_some_and(|p| p.starts_with(dir.path())));
    }
}
