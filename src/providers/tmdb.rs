use std::collections::HashMap;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{MetadataProvider, SearchQuery, finish_results, year_from_date};
use crate::error::ProviderError;
use crate::media::{Candidate, MediaType};

static URL_ENDPOINT: &str = "https://api.themoviedb.org/3";

/// TheMovieDB client used for movie searches
pub struct TmdbClient {
    api_key: String,
    language: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
pub struct MovieSearchResponse {
    #[serde(default)]
    pub results: Vec<MovieResult>,
}

#[derive(Debug, Deserialize)]
pub struct MovieResult {
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    status_message: String,
}

impl TmdbClient {
    pub fn new(api_key: &str, language: &str) -> Self {
        Self {
            api_key: api_key.to_owned(),
            language: language.to_owned(),
            client: Client::new(),
        }
    }

    /// Searches movies by title, optionally narrowed to a release year
    pub fn search_movie(&self, query: &str, year: Option<&str>) -> Result<MovieSearchResponse, ProviderError> {
        let url = format!("{URL_ENDPOINT}/search/movie");

        let mut params = HashMap::new();
        params.insert("api_key", self.api_key.as_str());
        params.insert("language", self.language.as_str());
        params.insert("query", query);
        if let Some(year) = year {
            params.insert("primary_release_year", year);
        }

        debug!(query, ?year, "TMDb movie search");
        let request = self.client.get(url).query(&params);
        self.send_request(request)
    }

    fn send_request<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = request.send()?;
        let status = response.status();
        let text_body = response.text()?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(text_body));
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text_body)
                .map(|e| e.status_message)
                .unwrap_or(text_body);
            return Err(ProviderError::Api {
                code: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<T>(&text_body).map_err(|e| ProviderError::Api {
            code: status.as_u16(),
            message: format!("Failed to parse response JSON: {e}"),
        })
    }
}

impl MetadataProvider for TmdbClient {
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<Candidate>, ProviderError> {
        let response = self.search_movie(&query.title, query.year.as_deref())?;
        finish_results(movie_candidates(response), query)
    }
}

pub fn movie_candidates(response: MovieSearchResponse) -> Vec<Candidate> {
    response
        .results
        .into_iter()
        .map(|movie| Candidate {
            media_type: MediaType::Movie,
            year: year_from_date(movie.release_date.as_deref()),
            title: movie.title,
            season: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_candidates_from_response() {
        let body = r#"{
            "page": 1,
            "results": [
                {"id": 348, "title": "Alien", "release_date": "1979-05-25", "popularity": 50.1},
                {"id": 8077, "title": "Alien³", "release_date": ""},
                {"id": 1, "title": "Alien Untitled"}
            ],
            "total_results": 3
        }"#;

        let response: MovieSearchResponse = serde_json::from_str(body).unwrap();
        let candidates = movie_candidates(response);

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].title, "Alien");
        assert_eq!(candidates[0].year.as_deref(), Some("1979"));
        assert_eq!(candidates[1].year, None);
        assert_eq!(candidates[2].year, None);
        assert!(candidates.iter().all(|c| c.media_type == MediaType::Movie));
    }

    #[test]
    fn test_empty_response_is_not_found() {
        let response: MovieSearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        let query = SearchQuery {
            media_type: MediaType::Movie,
            title: "zzzz".to_string(),
            year: None,
            season: None,
            episode: None,
        };
        let err = finish_results(movie_candidates(response), &query).unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
