//! A scripted copy of the Altoro Mutual site on top of [`FakeBrowser`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use altoro_domain::utils::parse_money;
use rust_decimal::Decimal;

use super::browser::{FakeBrowser, FakePage};
use crate::browser::{Link, SelectOption, Target};
use crate::pages::{accounts, login, products, transactions, transfer};

pub const BASE_URL: &str = "https://demo.testfire.net";
pub const PASSWORD: &str = "demo1234";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Balance {
    total: Decimal,
    available: Decimal,
}

/// Live balances of the scripted site. Transfers submitted through the
/// fake move money between them.
#[derive(Clone)]
pub struct BankSite {
    balances: Arc<Mutex<BTreeMap<String, Balance>>>,
    skews: Arc<Mutex<BTreeMap<String, Decimal>>>,
}

impl BankSite {
    pub fn total(&self, account_id: &str) -> Option<Decimal> {
        self.balances.lock().expect("mutex poisoned").get(account_id).map(|b| b.total)
    }

    /// Make every later transfer touching `account_id` land `skew` off.
    pub fn skew(&self, account_id: &str, skew: Decimal) {
        self.skews.lock().expect("mutex poisoned").insert(account_id.to_string(), skew);
    }
}

fn money(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Script `browser` as the demo bank: login with password `demo1234`,
/// accounts 800002 Savings and 800003 Checking, recent transactions, the
/// transfer form and two product sections.
pub fn bank_site(browser: &FakeBrowser) -> BankSite {
    let site = BankSite {
        balances: Arc::new(Mutex::new(BTreeMap::from([
            (
                "800002".to_string(),
                Balance {
                    total: Decimal::new(1_000_000, 2),
                    available: Decimal::new(1_000_000, 2),
                },
            ),
            (
                "800003".to_string(),
                Balance {
                    total: Decimal::new(250_000, 2),
                    available: Decimal::new(240_000, 2),
                },
            ),
        ]))),
        skews: Arc::default(),
    };
    script_login(browser);
    script_accounts(browser, &site);
    script_transactions(browser);
    script_transfer(browser, &site);
    script_products(browser);
    site
}

fn script_login(browser: &FakeBrowser) {
    browser.script(|page| {
        page.url = format!("{BASE_URL}/");
        page.visible.insert(Target::css(login::LOGIN_FORM_FIELD), true);
    });
    browser.on_goto("login.jsp", |page| {
        page.visible.insert(Target::css(login::LOGIN_FORM_FIELD), true);
        page.hide(&Target::text(login::LOGGED_IN_MARKER));
    });
    browser.on_click(Target::css(login::SUBMIT_BUTTON), |page| {
        let password =
            page.fields.get(&Target::css(login::PASSWORD_FIELD)).cloned().unwrap_or_default();
        if password == PASSWORD {
            page.url = format!("{BASE_URL}/bank/main.jsp");
            page.visible.insert(Target::css(login::LOGIN_FORM_FIELD), false);
            page.show(Target::text(login::LOGGED_IN_MARKER), &[login::LOGGED_IN_MARKER]);
            page.hide(&Target::css(login::ERROR_MESSAGE));
        } else {
            page.show(
                Target::css(login::ERROR_MESSAGE),
                &[
                    "Login Failed: We're sorry, but this username or password was not found in our system.",
                ],
            );
        }
    });
}

fn script_accounts(browser: &FakeBrowser, site: &BankSite) {
    browser.script(|page| {
        page.counts.insert(Target::link(accounts::SUMMARY_LINK), 1);
        page.options.insert(
            Target::css(accounts::ACCOUNT_SELECT),
            vec![
                SelectOption::new("800002", "800002 Savings"),
                SelectOption::new("800003", "800003 Checking"),
            ],
        );
    });
    let balances = Arc::clone(&site.balances);
    browser.on_click(Target::css(accounts::GET_ACCOUNT_BUTTON), move |page| {
        let id =
            page.selected.get(&Target::css(accounts::ACCOUNT_SELECT)).cloned().unwrap_or_default();
        let Some(balance) = balances.lock().expect("mutex poisoned").get(&id).copied() else {
            return;
        };
        page.tables.insert(
            Target::xpath(accounts::BALANCE_TABLE),
            rows(&[
                &["Balance Detail", "Amount"],
                &["Ending balance as of 04/15/2025", &money(balance.total)],
                &["Available balance", &money(balance.available)],
            ]),
        );
        set_history(page, &id);
    });
}

fn set_history(page: &mut FakePage, account_id: &str) {
    for panel in [accounts::CREDITS_PANEL, accounts::DEBITS_PANEL] {
        let table = Target::css(format!("{panel} table"));
        page.tables.remove(&table);
        page.hide(&Target::css(panel));
    }
    if account_id != "800002" {
        return;
    }
    let panels = [
        (accounts::CREDITS_PANEL, ["", "2025-03-01", "Payroll", "$1,200.00"]),
        (accounts::DEBITS_PANEL, ["", "2025-03-03", "Utilities", "$85.40"]),
    ];
    for (panel, row) in panels {
        page.visible.insert(Target::css(panel), true);
        page.tables.insert(Target::css(format!("{panel} table")), rows(&[&row]));
    }
}

fn script_transactions(browser: &FakeBrowser) {
    browser.script(|page| {
        page.counts.insert(Target::link(transactions::RECENT_LINK), 1);
        page.counts.insert(Target::css(transactions::START_DATE_FIELD), 1);
        page.counts.insert(Target::css(transactions::END_DATE_FIELD), 1);
        page.tables.insert(
            Target::css(transactions::TRANSACTIONS_TABLE),
            rows(&[
                &["Transaction ID", "Transaction Time", "Account ID", "Action", "Amount"],
                &["2301", "2025-03-04 10:15", "800002", "Deposit", "$200.00"],
                &["2302", "2025-03-05 08:00", "800003", "Withdrawal", "-$125.50"],
                &["2303", "2025-03-06 12:30", "800003", "Deposit", "$150.00"],
                &["2304", "2025-03-07 09:45", "800002", "Deposit", "$99.99"],
            ]),
        );
    });
}

fn script_transfer(browser: &FakeBrowser, site: &BankSite) {
    browser.set_count(Target::link(transfer::TRANSFER_LINK), 1);
    let balances = Arc::clone(&site.balances);
    let skews = Arc::clone(&site.skews);
    browser.on_click(Target::css(transfer::TRANSFER_BUTTON), move |page| {
        let from =
            page.selected.get(&Target::css(transfer::FROM_ACCOUNT)).cloned().unwrap_or_default();
        let to = page.selected.get(&Target::css(transfer::TO_ACCOUNT)).cloned().unwrap_or_default();
        let amount = parse_money(
            page.fields.get(&Target::css(transfer::AMOUNT_FIELD)).map_or("", String::as_str),
        );
        let mut balances = balances.lock().expect("mutex poisoned");
        let skews = skews.lock().expect("mutex poisoned");
        for (id, delta) in [(&from, -amount), (&to, amount)] {
            let delta = delta + skews.get(id).copied().unwrap_or_default();
            if let Some(b) = balances.get_mut(id) {
                b.total += delta;
                b.available += delta;
            }
        }
        let message = format!(
            "{amount:.2} was successfully transferred from Account {from} into Account {to}"
        );
        page.show(Target::css(transfer::POST_RESPONSE), &[&message]);
    });
}

type Catalog = &'static [(&'static str, &'static [(&'static str, &'static [&'static str])])];

const CATALOG: Catalog = &[
    ("PERSONAL", &[("Deposit Product", &["Checking", "Savings"]), ("Cards", &["Platinum Card"])]),
    ("SMALL BUSINESS", &[("Lending Services", &["Business Loans", "Lines of Credit"])]),
];

fn script_products(browser: &FakeBrowser) {
    for &(section, categories) in CATALOG {
        browser.set_count(Target::link(section), 1);
        let links: Vec<Link> = categories
            .iter()
            .map(|(name, _)| {
                let slug = name.to_lowercase().replace(' ', "_");
                Link::new(*name, format!("index.jsp?content={slug}.htm"))
            })
            .collect();
        browser.on_click(Target::link(section), move |page| {
            page.links.insert(Target::css(products::CATEGORY_LINKS), links.clone());
        });
        for &(name, items) in categories {
            let target = products::category_target(name);
            browser.set_count(target.clone(), 1);
            let items: Vec<String> = items.iter().map(ToString::to_string).collect();
            let name = name.to_string();
            browser.on_click(target, move |page| {
                page.texts.insert(Target::css(products::CATEGORY_HEADING), vec![name.clone()]);
                page.texts.insert(
                    Target::css(products::PARAGRAPHS),
                    vec![
                        format!("{name} for every stage of life."),
                        "Earn a $100 bonus when you open an account.".to_string(),
                        "Note: Terms and fees apply.".to_string(),
                    ],
                );
                page.texts.insert(Target::xpath(products::PRODUCT_ITEMS), items.clone());
            });
        }
    }
}

fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter().map(|r| r.iter().map(ToString::to_string).collect()).collect()
}
