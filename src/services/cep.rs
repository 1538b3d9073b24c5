// src/services/cep.rs
//
// Brazilian postal-code (CEP) lookup and address geocoding.
// Both lookups are best-effort: any failure yields `None`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::common::helpers::digits_only;

const VIACEP_BASE_URL: &str = "https://viacep.com.br/ws";
const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "eufaco/1.0";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CepData {
    pub cep: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    cep: Option<String>,
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    // ViaCEP answers 200 with {"erro": true} for unknown codes; older
    // deployments send the string "true" instead.
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }

    fn into_cep_data(self, requested: &str) -> CepData {
        CepData {
            cep: self.cep.unwrap_or_else(|| format_cep(requested)),
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state: self.uf.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// Strip formatting and accept only 8-digit codes
pub fn normalize_cep(cep: &str) -> Option<String> {
    let digits = digits_only(cep);
    if digits.len() == 8 {
        Some(digits)
    } else {
        None
    }
}

/// Formats a CEP as XXXXX-XXX
pub fn format_cep(value: &str) -> String {
    let digits = digits_only(value);
    if digits.len() <= 5 {
        return digits;
    }
    let end = digits.len().min(8);
    format!("{}-{}", &digits[..5], &digits[5..end])
}

/// "neighborhood, city, state, Brazil" with blank parts skipped
pub fn geocode_query(city: &str, state: &str, neighborhood: Option<&str>) -> String {
    [neighborhood.unwrap_or(""), city, state, "Brazil"]
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub struct CepService {
    client: Client,
}

impl CepService {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    pub async fn lookup(&self, cep: &str) -> Option<CepData> {
        let clean_cep = normalize_cep(cep)?;
        let url = format!("{}/{}/json/", VIACEP_BASE_URL, clean_cep);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(cep = %clean_cep, error = %e, "CEP lookup request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(cep = %clean_cep, status = %response.status(), "CEP lookup returned non-success");
            return None;
        }

        let data = match response.json::<ViaCepResponse>().await {
            Ok(d) => d,
            Err(e) => {
                warn!(cep = %clean_cep, error = %e, "Failed to parse CEP lookup response");
                return None;
            }
        };

        if data.is_error() {
            debug!(cep = %clean_cep, "CEP not found");
            return None;
        }

        Some(data.into_cep_data(&clean_cep))
    }

    pub async fn geocode(
        &self,
        city: &str,
        state: &str,
        neighborhood: Option<&str>,
    ) -> Option<Coordinates> {
        let query = geocode_query(city, state, neighborhood);

        let response = match self
            .client
            .get(NOMINATIM_SEARCH_URL)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", "br"),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Geocoding request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            return None;
        }

        let results = response.json::<Vec<NominatimResult>>().await.ok()?;
        let first = results.into_iter().next()?;

        Some(Coordinates {
            latitude: first.lat.parse().ok()?,
            longitude: first.lon.parse().ok()?,
        })
    }
}

impl Default for CepService {
    fn default() -> Self {
        Self::new()
    }
}
