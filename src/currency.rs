use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const API_URL_BASE: &str = "https://v6.exchangerate-api.com/v6";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Conversion target shown in the UI.
pub const TARGET_CURRENCY: &str = "PHP";

#[derive(Debug, Deserialize)]
struct RatesResponse {
    conversion_rates: HashMap<String, f64>,
}

/// Fetch how much one unit of `base_currency` is worth in `target_currency`.
/// Returns `None` when the provider rejects the request or does not quote
/// the target; the UI reports that inline rather than failing the search.
pub async fn fetch_exchange_rate(
    client: &Client,
    api_key: &str,
    base_currency: &str,
    target_currency: &str,
) -> Result<Option<f64>> {
    debug!(base_currency, target_currency, "requesting exchange rate");
    let url = format!("{API_URL_BASE}/{api_key}/latest/{base_currency}");
    let response = client
        .get(&url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .context("exchange rate request failed")?;

    if !response.status().is_success() {
        return Ok(None);
    }
    let parsed: RatesResponse = response
        .json()
        .await
        .context("failed to parse exchange rate response")?;
    Ok(parsed.conversion_rates.get(target_currency).copied())
}

/// Currency code for an ISO country code, `"USD"` when unknown.
pub fn currency_for_country(country_code: &str) -> &'static str {
    match country_code {
        "AE" => "AED",
        "AF" => "AFN",
        "AG" => "XCD",
        "AL" => "ALL",
        "AM" => "AMD",
        "AN" => "ANG",
        "AO" => "AOA",
        "AQ" => "AQD",
        "AR" => "ARS",
        "AU" => "AUD",
        "AZ" => "AZN",
        "BA" => "BAM",
        "BB" => "BBD",
        "BD" => "BDT",
        "BE" => "XOF",
        "BR" => "BRL",
        "BG" => "BGN",
        "CA" => "CAD",
        "CH" => "CHF",
        "CN" => "CNY",
        "CO" => "COP",
        "CR" => "CRC",
        "CZ" => "CZK",
        "DE" => "EUR",
        "DK" => "DKK",
        "EG" => "EGP",
        "ES" => "EUR",
        "FR" => "EUR",
        "GB" => "GBP",
        "GR" => "EUR",
        "HK" => "HKD",
        "HU" => "HUF",
        "ID" => "IDR",
        "IL" => "ILS",
        "IN" => "INR",
        "IT" => "EUR",
        "JP" => "JPY",
        "KR" => "KRW",
        "LK" => "LKR",
        "MY" => "MYR",
        "MX" => "MXN",
        "NG" => "NGN",
        "NL" => "EUR",
        "NO" => "NOK",
        "NZ" => "NZD",
        "PH" => "PHP",
        "PK" => "PKR",
        "PL" => "PLN",
        "PT" => "EUR",
        "RU" => "RUB",
        "SA" => "SAR",
        "SE" => "SEK",
        "SG" => "SGD",
        "TH" => "THB",
        "TR" => "TRY",
        "TW" => "TWD",
        "US" => "USD",
        "VN" => "VND",
        "ZA" => "ZAR",
        "ZW" => "ZWD",
        _ => "USD",
    }
}

/// Caption for the currency line of the display. A zero rate is treated
/// as unavailable.
pub fn rate_caption(base_currency: &str, rate: Option<f64>) -> String {
    match rate.filter(|rate| *rate != 0.0) {
        Some(rate) => format!("1 {base_currency} = {rate:.2} {TARGET_CURRENCY}"),
        None => "Currency rate not available".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_countries_resolve() {
        assert_eq!(currency_for_country("GB"), "GBP");
        assert_eq!(currency_for_country("JP"), "JPY");
        assert_eq!(currency_for_country("DE"), "EUR");
        assert_eq!(currency_for_country("PH"), "PHP");
    }

    #[test]
    fn unknown_country_falls_back_to_usd() {
        assert_eq!(currency_for_country("XX"), "USD");
        assert_eq!(currency_for_country(""), "USD");
    }

    #[test]
    fn caption_rounds_to_two_decimals() {
        assert_eq!(rate_caption("USD", Some(0.8234)), "1 USD = 0.82 PHP");
        assert_eq!(rate_caption("GBP", Some(73.999)), "1 GBP = 74.00 PHP");
    }

    #[test]
    fn caption_for_missing_rate() {
        assert_eq!(rate_caption("USD", None), "Currency rate not available");
    }

    #[test]
    fn zero_rate_counts_as_missing() {
        assert_eq!(rate_caption("USD", Some(0.0)), "Currency rate not available");
    }

    #[test]
    fn rates_response_parses() {
        let json = r#"{
            "result": "success",
            "base_code": "USD",
            "conversion_rates": {"PHP": 56.21, "EUR": 0.92}
        }"#;
        let parsed: RatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.conversion_rates.get("PHP").copied(), Some(56.21));
        assert_eq!(parsed.conversion_rates.get("GBP"), None);
    }
}
