//! Typed API resources.

pub(crate) mod banks;

pub use banks::{Bank, BankType, BanksResponse};
