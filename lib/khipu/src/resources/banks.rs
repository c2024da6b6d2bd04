//! Banks available to pay into the account.

use serde::{Deserialize, Serialize};

use crate::{
    ApiRequestor, BaseAddress, HttpClient, Method, Params, RequestOptions, Result, from_json,
};

/// Path of the bank listing endpoint.
const BANKS_PATH: &str = "/v3/banks";

/// Response of `GET /v3/banks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanksResponse {
    /// Banks the payer can choose from.
    pub banks: Vec<Bank>,
}

/// A bank the payer can use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    /// Bank identifier.
    pub bank_id: String,
    /// Display name.
    pub name: String,
    /// Notice shown to the payer.
    #[serde(default)]
    pub message: String,
    /// Minimum payment amount accepted by the bank.
    pub min_amount: f64,
    /// Kind of account holder.
    #[serde(rename = "type")]
    pub bank_type: BankType,
    /// Parent bank identifier, empty for top level banks.
    #[serde(default)]
    pub parent: String,
    /// Logo URL.
    #[serde(default)]
    pub logo_url: String,
}

/// Account holder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankType {
    /// Personal accounts.
    Persona,
    /// Business accounts.
    Empresa,
}

pub(crate) async fn list<C: HttpClient>(requestor: &ApiRequestor<C>) -> Result<BanksResponse> {
    let response = requestor
        .request(
            Method::Get,
            BANKS_PATH,
            Params::new(),
            &RequestOptions::new(),
            BaseAddress::Api,
        )
        .await?;
    from_json(response.body().as_bytes())
}
