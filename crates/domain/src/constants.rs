//! Application constants
//!
//! Sheet names, report labels and thresholds shared by the workflows and
//! the reconciliation engine.

use rust_decimal::Decimal;

// Workbook sheet names
pub const SHEET_ACCOUNT_SUMMARY: &str = "Account_Summary";
pub const SHEET_TRANSACTIONS_PREFIX: &str = "Transactions_";
pub const SHEET_FILTERED_TRANSACTIONS: &str = "Filtered_Transactions";
pub const SHEET_HIGH_VALUE_CREDITS: &str = "High_Value_Credits";
pub const SHEET_TRANSFER_DETAILS: &str = "Transfer_Details";
pub const SHEET_PRODUCT_CATALOG: &str = "Product_Catalog";
pub const SHEET_API_VALIDATION: &str = "API_Data_Validation";

/// Credits at or above this amount land on the high-value sheet.
pub const HIGH_VALUE_CREDIT_THRESHOLD: Decimal = Decimal::from_parts(15000, 0, 0, false, 2);

/// Absolute tolerance when comparing API and web amounts.
pub const VARIANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Display columns for scraped transaction sheets.
pub const TRANSACTION_DISPLAY_COLUMNS: [&str; 6] =
    ["Transaction ID", "Transaction Time", "Account ID", "Action", "Debit", "Credit"];

/// Display columns for the account summary sheet.
pub const ACCOUNT_SUMMARY_COLUMNS: [&str; 4] =
    ["Account ID/Number", "Account Name/Type", "Total Balance", "Available Balance"];

// API source labels carried on API-derived rows
pub const API_SOURCE_ACCOUNT_LIST: &str = "GET /api/account";
pub const API_SOURCE_ACCOUNT_DETAILS: &str = "GET /api/account/{accountNo}";
pub const API_SOURCE_TRANSACTIONS_POST: &str = "POST /api/account/{accountNo}/transactions";

/// Lower-case fragments that mark a browser failure as a lost session.
pub const SESSION_ERROR_KEYWORDS: [&str; 6] =
    ["target closed", "session", "timeout", "navigation", "detached", "not found"];

// Report section titles on the API validation sheet
pub const SECTION_AUTHENTICATION: &str = "1. API AUTHENTICATION STATUS";
pub const SECTION_SUMMARY: &str = "2. RECONCILIATION SUMMARY";
pub const SECTION_ACCOUNTS: &str = "3. ACCOUNT RECONCILIATION (API vs Web)";
pub const SECTION_TRANSACTIONS: &str = "4. TRANSACTION RECONCILIATION BY ACCOUNT (API vs Web)";

pub const NO_WEB_DATA: &str = "No web data for comparison";
