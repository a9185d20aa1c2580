//! One module per Altoro Mutual page, each driving the browser through
//! [`PageActions`](crate::browser::PageActions).

pub mod accounts;
pub mod login;
pub mod products;
pub mod transactions;
pub mod transfer;

pub use accounts::{AccountsPage, AccountsSnapshot};
pub use login::LoginPage;
pub use products::ProductsPage;
pub use transactions::TransactionsPage;
pub use transfer::{Confirmation, TransferPage};
