//! Metadata providers: one remote catalogue per media type

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::error::{ProviderError, ResolveError};
use crate::media::{Candidate, MediaType};

pub mod tmdb;
pub mod tvdb;

pub use tmdb::TmdbClient;
pub use tvdb::TvdbClient;

/// Most candidates shown to the user for one search
pub const MAX_CANDIDATES: usize = 10;

/// What a provider is asked to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

pub trait MetadataProvider {
    /// Candidates in the provider's own ranking.
    ///
    /// An empty answer is reported as `ProviderError::NotFound`, never as `Ok(vec![])`.
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<Candidate>, ProviderError>;
}

pub trait ProviderFactory {
    fn create(&self, media_type: MediaType) -> Result<Box<dyn MetadataProvider>>;
}

/// Settings for the production providers
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub tmdb_api_key: Option<String>,
    pub tvdb_api_key: Option<String>,
    pub language: String,
}

/// Builds TMDb for movies and TheTVDB for episodes
#[derive(Debug, Clone)]
pub struct HttpProviders {
    settings: ProviderSettings,
}

impl HttpProviders {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

impl ProviderFactory for HttpProviders {
    fn create(&self, media_type: MediaType) -> Result<Box<dyn MetadataProvider>> {
        match media_type {
            MediaType::Movie => {
                let api_key = self
                    .settings
                    .tmdb_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("TMDb API key is required to search movies (set TMDB_API_KEY)"))?;
                Ok(Box::new(TmdbClient::new(api_key, &self.settings.language)))
            }
            MediaType::Episode => {
                let api_key = self
                    .settings
                    .tvdb_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("TheTVDB API key is required to search series (set TVDB_API_KEY)"))?;
                Ok(Box::new(TvdbClient::new(api_key)))
            }
        }
    }
}

/// Provider handles, each created on first use and kept for the rest of the run
pub struct ProviderSlots {
    factory: Box<dyn ProviderFactory>,
    movie: Option<Box<dyn MetadataProvider>>,
    episode: Option<Box<dyn MetadataProvider>>,
}

impl ProviderSlots {
    pub fn new(factory: Box<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            movie: None,
            episode: None,
        }
    }

    pub fn get(&mut self, media_type: MediaType) -> Result<&mut dyn MetadataProvider, ResolveError> {
        let slot = match media_type {
            MediaType::Movie => &mut self.movie,
            MediaType::Episode => &mut self.episode,
        };

        if slot.is_none() {
            info!(%media_type, "initializing metadata provider");
            let provider = self
                .factory
                .create(media_type)
                .map_err(|e| ResolveError::ProviderSetup(format!("{e:#}")))?;
            *slot = Some(provider);
        }

        match slot {
            Some(provider) => Ok(provider.as_mut()),
            None => Err(ResolveError::ProviderSetup(format!("no {media_type} provider"))),
        }
    }
}

/// Applies the shared rules to a raw result list: empty means not found, long lists are capped
pub(crate) fn finish_results(
    mut candidates: Vec<Candidate>,
    query: &SearchQuery,
) -> Result<Vec<Candidate>, ProviderError> {
    if candidates.is_empty() {
        return Err(ProviderError::NotFound(query.title.clone()));
    }
    candidates.truncate(MAX_CANDIDATES);
    debug!(count = candidates.len(), query = %query.title, "provider results");
    Ok(candidates)
}

/// First four characters of a provider date (`1979-05-25` -> `1979`)
pub(crate) fn year_from_date(date: Option<&str>) -> Option<String> {
    let date = date?.trim();
    let year = date.get(..4)?;
    year.chars().all(|c| c.is_ascii_digit()).then(|| year.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct EmptyProvider;

    impl MetadataProvider for EmptyProvider {
        fn search(&mut self, query: &SearchQuery) -> Result<Vec<Candidate>, ProviderError> {
            finish_results(Vec::new(), query)
        }
    }

    struct CountingFactory {
        created: Rc<Cell<usize>>,
    }

    impl ProviderFactory for CountingFactory {
        fn create(&self, _media_type: MediaType) -> Result<Box<dyn MetadataProvider>> {
            self.created.set(self.created.get() + 1);
            Ok(Box::new(EmptyProvider))
        }
    }

    fn query() -> SearchQuery {
        SearchQuery {
            media_type: MediaType::Movie,
            title: "Nothing".to_string(),
            year: None,
            season: None,
            episode: None,
        }
    }

    #[test]
    fn test_slots_create_each_provider_once() {
        let created = Rc::new(Cell::new(0));
        let mut slots = ProviderSlots::new(Box::new(CountingFactory { created: created.clone() }));

        slots.get(MediaType::Movie).unwrap();
        slots.get(MediaType::Movie).unwrap();
        assert_eq!(created.get(), 1);

        slots.get(MediaType::Episode).unwrap();
        assert_eq!(created.get(), 2);
    }

    #[test]
    fn test_missing_api_key_is_a_setup_error() {
        let mut slots = ProviderSlots::new(Box::new(HttpProviders::new(ProviderSettings::default())));
        let err = slots.get(MediaType::Movie).err().unwrap();
        assert!(matches!(err, ResolveError::ProviderSetup(_)));
    }

    #[test]
    fn test_empty_results_are_not_found() {
        let err = EmptyProvider.search(&query()).unwrap_err();
        assert_eq!(err, ProviderError::NotFound("Nothing".to_string()));
    }

    #[test]
    fn test_results_are_capped() {
        let candidates: Vec<Candidate> = (0..25)
            .map(|i| Candidate {
                media_type: MediaType::Movie,
                title: format!("Movie {i}"),
                year: None,
                season: None,
            })
            .collect();
        let results = finish_results(candidates, &query()).unwrap();
        assert_eq!(results.len(), MAX_CANDIDATES);
        assert_eq!(results[0].title, "Movie 0");
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date(Some("1979-05-25")).as_deref(), Some("1979"));
        assert_eq!(year_from_date(Some("")), None);
        assert_eq!(year_from_date(Some("n/a")), None);
        assert_eq!(year_from_date(None), None);
    }
}
