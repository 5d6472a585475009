use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{MetadataProvider, SearchQuery, finish_results, year_from_date};
use crate::error::ProviderError;
use crate::media::{Candidate, MediaType};

static URL_ENDPOINT: &str = "https://api4.thetvdb.com/v4";

/// TheTVDB v4 client used for series searches.
///
/// The bearer token is fetched on the first search and reused afterwards.
pub struct TvdbClient {
    api_key: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct SeriesResult {
    pub name: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub first_air_time: Option<String>,
}

impl TvdbClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_owned(),
            token: None,
            client: Client::new(),
        }
    }

    fn token(&mut self) -> Result<String, ProviderError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        info!("logging in to TheTVDB");
        let response = self
            .client
            .post(format!("{URL_ENDPOINT}/login"))
            .json(&json!({ "apikey": self.api_key }))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                code: status.as_u16(),
                message: envelope_message(&body),
            });
        }

        let envelope: Envelope<LoginData> = parse(status, &body)?;
        let token = envelope
            .data
            .map(|data| data.token)
            .ok_or_else(|| ProviderError::Api {
                code: status.as_u16(),
                message: "login response carried no token".to_string(),
            })?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Searches series by name, optionally narrowed to a first-aired year
    pub fn search_series(&mut self, name: &str, year: Option<&str>) -> Result<Vec<SeriesResult>, ProviderError> {
        let token = self.token()?;

        let mut params = vec![("query", name), ("type", "series")];
        if let Some(year) = year {
            params.push(("year", year));
        }

        debug!(name, ?year, "TheTVDB series search");
        let response = self
            .client
            .get(format!("{URL_ENDPOINT}/search"))
            .bearer_auth(token)
            .query(&params)
            .send()?;
        let status = response.status();
        let body = response.text()?;

        search_status(name, status, &body)?;
        let envelope: Envelope<Vec<SeriesResult>> = parse(status, &body)?;
        Ok(envelope.data.unwrap_or_default())
    }
}

impl MetadataProvider for TvdbClient {
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<Candidate>, ProviderError> {
        let results = self.search_series(&query.title, query.year.as_deref())?;
        finish_results(series_candidates(results, query.season.as_deref()), query)
    }
}

/// Maps series hits to candidates carrying the season that was asked for
pub fn series_candidates(results: Vec<SeriesResult>, season: Option<&str>) -> Vec<Candidate> {
    let season = season.unwrap_or("1");
    results
        .into_iter()
        .map(|series| {
            let year = series
                .year
                .filter(|y| !y.trim().is_empty())
                .or_else(|| year_from_date(series.first_air_time.as_deref()));
            Candidate {
                media_type: MediaType::Episode,
                title: series.name,
                year,
                season: Some(season.to_string()),
            }
        })
        .collect()
}

/// 404 means the series is unknown; every other failure status is fatal
fn search_status(name: &str, status: StatusCode, body: &str) -> Result<(), ProviderError> {
    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(name.to_string()));
    }
    if !status.is_success() {
        return Err(ProviderError::Api {
            code: status.as_u16(),
            message: envelope_message(body),
        });
    }
    Ok(())
}

fn parse<T: serde::de::DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Api {
        code: status.as_u16(),
        message: format!("Failed to parse response JSON: {e}"),
    })
}

fn envelope_message(body: &str) -> String {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}
