//! The interactive loop that turns a noisy filename into a confirmed identity
//! and a readable link.
//!
//! Per file: guess from the name, search the provider for that media type,
//! let the user accept a candidate, edit the query, enter the metadata by
//! hand, skip or quit, then confirm (or edit) the link name and create the
//! link.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::LinkTarget;
use crate::console::{Console, Selection};
use crate::error::{ProviderError, ResolveError};
use crate::guess::Guesser;
use crate::media::{Candidate, Identity, MediaType, is_video_file, sanitize_link_name};
use crate::providers::{ProviderFactory, ProviderSlots, SearchQuery};
use crate::tracker::{SeriesTracker, TrackedShow};

/// Where links go and what they point at
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub links_dir: PathBuf,
    pub link_target: LinkTarget,
}

/// Links created during one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub linked: Vec<PathBuf>,
}

/// Outcome of the selection step after a search
enum Choice {
    Identity(Identity),
    EditQuery,
    Manual,
    Skip,
}

pub struct Resolver<R, W> {
    console: Console<R, W>,
    guesser: Guesser,
    providers: ProviderSlots,
    tracker: Box<dyn SeriesTracker>,
    options: ResolverOptions,
    media_type: MediaType,
    summary: RunSummary,
}

impl<R: BufRead, W: Write> Resolver<R, W> {
    pub fn new(
        console: Console<R, W>,
        providers: Box<dyn ProviderFactory>,
        tracker: Box<dyn SeriesTracker>,
        options: ResolverOptions,
    ) -> Result<Self> {
        Ok(Self {
            console,
            guesser: Guesser::new()?,
            providers: ProviderSlots::new(providers),
            tracker,
            options,
            media_type: MediaType::Movie,
            summary: RunSummary::default(),
        })
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    /// Processes a file or a whole directory tree
    pub fn run(&mut self, path: &Path) -> Result<RunSummary, ResolveError> {
        if !path.exists() {
            return Err(ResolveError::InvalidPath(path.to_path_buf()));
        }
        self.walk(path, None)?;
        Ok(std::mem::take(&mut self.summary))
    }

    /// Returns whether `path` (or anything under it) produced a link.
    ///
    /// Inside a directory the first file that gets linked ends the scan of
    /// that directory. Subdirectories never stop their siblings, so every
    /// directory can contribute one link. Symlinked subdirectories are not
    /// entered.
    pub fn walk(&mut self, path: &Path, linkpoint: Option<&Path>) -> Result<bool, ResolveError> {
        if path.is_dir() {
            let mut linked_any = false;
            for entry in sorted_entries(path)? {
                if is_symlinked_dir(&entry) {
                    debug!(path = %entry.display(), "not following directory symlink");
                    continue;
                }
                let linked = self.walk(&entry, Some(path))?;
                linked_any |= linked;
                if linked && !entry.is_dir() {
                    debug!(dir = %path.display(), "directory linked, skipping remaining entries");
                    break;
                }
            }
            return Ok(linked_any);
        }

        if !path.is_file() {
            return Ok(false);
        }

        let Some(identity) = self.extract_metadata(path)? else {
            return Ok(false);
        };
        let Some(link_name) = identity.link_name() else {
            debug!(path = %path.display(), "no link name for identity");
            return Ok(false);
        };

        let source = match (self.options.link_target, linkpoint) {
            (LinkTarget::Directory, Some(dir)) => std::path::absolute(dir)?,
            _ => std::path::absolute(path)?,
        };

        match self.create_link(&source, &link_name)? {
            Some(link_path) => {
                self.offer_tracking(&identity, &link_path)?;
                self.summary.linked.push(link_path);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Guesses what the file is and resolves it with the user.
    ///
    /// `None` for files that are not videos, names nothing could be guessed
    /// from, and files the user skipped.
    pub fn extract_metadata(&mut self, path: &Path) -> Result<Option<Identity>, ResolveError> {
        self.console.section("Processing:", path.display())?;

        if !is_video_file(path) {
            self.console.info("File hasn't been recognised as a video file")?;
            return Ok(None);
        }

        let Some(query) = self.guesser.guess(path).into_query() else {
            info!(path = %path.display(), "nothing usable in filename, skipping");
            return Ok(None);
        };
        self.search(query)
    }

    /// Queries the provider for `query.media_type` and lets the user choose.
    ///
    /// Whatever the provider answered, the selection step runs afterwards;
    /// editing the query goes through [`Resolver::retry_search`].
    pub fn search(&mut self, query: SearchQuery) -> Result<Option<Identity>, ResolveError> {
        self.media_type = query.media_type;
        let candidates = self.query_provider(&query)?;

        match self.select(candidates)? {
            Choice::Identity(identity) => Ok(Some(identity)),
            Choice::Skip => Ok(None),
            Choice::Manual => self.manual_entry().map(Some),
            Choice::EditQuery => self.retry_search(),
        }
    }

    fn query_provider(&mut self, query: &SearchQuery) -> Result<Vec<Candidate>, ResolveError> {
        debug!(?query, "searching");
        let outcome = self.providers.get(query.media_type)?.search(query);

        match outcome {
            Ok(candidates) => {
                self.console.print_candidates(&candidates)?;
                self.console
                    .print_options("[RETURN] default, [e]dit query, [m]anual, [s]kip, [q]uit")?;
                Ok(candidates)
            }
            Err(ProviderError::NotFound(_)) => {
                self.console.info("Nothing found")?;
                self.console.print_options("[e]dit query, [m]anual, [s]kip, [q]uit")?;
                Ok(Vec::new())
            }
            Err(err) => {
                warn!(error = %err, "metadata provider failed");
                Err(ResolveError::Fatal(err))
            }
        }
    }

    fn select(&mut self, candidates: Vec<Candidate>) -> Result<Choice, ResolveError> {
        loop {
            match self.console.parse_selection(candidates.len(), &['e', 'm'])? {
                Selection::Pick(index) => {
                    let identity = candidates
                        .into_iter()
                        .nth(index)
                        .map(Candidate::into_identity);
                    return match identity {
                        Some(identity) => Ok(Choice::Identity(identity)),
                        None => Ok(Choice::Skip),
                    };
                }
                Selection::Action('e') => return Ok(Choice::EditQuery),
                Selection::Action(_) => return Ok(Choice::Manual),
                Selection::Skip => return Ok(Choice::Skip),
                Selection::Accept => self.console.info("Nothing to accept")?,
            }
        }
    }

    /// Prompts for a fresh query and searches again
    pub fn retry_search(&mut self) -> Result<Option<Identity>, ResolveError> {
        let query = self.prompt_query()?;
        self.search(query)
    }

    fn prompt_query(&mut self) -> Result<SearchQuery, ResolveError> {
        let title = self.console.get_field("query", true, None)?.unwrap_or_default();
        let mut query = SearchQuery {
            media_type: self.media_type,
            title,
            year: None,
            season: None,
            episode: None,
        };

        match self.media_type {
            MediaType::Movie => query.year = self.console.get_field("year", false, None)?,
            MediaType::Episode => {
                query.season = self.console.get_field("season", false, Some("1"))?;
                query.episode = Some("1".to_string());
            }
        }
        Ok(query)
    }

    /// Asks for the whole identity by hand.
    ///
    /// The type offered by default is the opposite of the one that was just
    /// searched.
    pub fn manual_entry(&mut self) -> Result<Identity, ResolveError> {
        let preferred = self.media_type.opposite();
        let types = [preferred, preferred.opposite()];

        self.console.print_candidates(&types)?;
        self.console.print_options("[RETURN] default, [q]uit")?;
        let media_type = loop {
            match self.console.parse_selection(types.len(), &[])? {
                Selection::Pick(index) => break types[index],
                _ => self.console.info("Choose a media type")?,
            }
        };
        self.media_type = media_type;

        let title = self.console.get_field("title", true, None)?.unwrap_or_default();
        let identity = match self.media_type {
            MediaType::Movie => {
                let year = self.console.get_field("year", false, None)?;
                Identity::movie(title, year)
            }
            MediaType::Episode => {
                let season = self
                    .console
                    .get_field("season", false, Some("1"))?
                    .unwrap_or_else(|| "1".to_string());
                let year = self.console.get_field("year", false, None)?;
                Identity::episode(title, season, year)
            }
        };

        debug!(?identity, "manual entry");
        Ok(identity)
    }

    /// Confirms the link name with the user and creates the link.
    ///
    /// Returns the link path, or `None` when the user skipped or a link of
    /// that name already exists.
    pub fn create_link(&mut self, source: &Path, link_name: &str) -> Result<Option<PathBuf>, ResolveError> {
        self.console.header("Linkname:", link_name)?;
        self.console.print_options("[RETURN] to confirm or [e]dit the linkname")?;

        let link_name = match self.console.parse_selection(1, &['e'])? {
            Selection::Action(_) => self.console.inline_prompt("New Linkname: ", link_name)?,
            Selection::Skip => return Ok(None),
            _ => link_name.to_string(),
        };

        let link_path = self.options.links_dir.join(sanitize_link_name(&link_name));
        match make_symlink(source, &link_path) {
            Ok(()) => {
                self.console.header("Symlink:", link_path.display())?;
                self.console.header("      ->", source.display())?;
                info!(link = %link_path.display(), target = %source.display(), "created link");
                Ok(Some(link_path))
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                self.console.info("File already exists. Skipping")?;
                Ok(None)
            }
            Err(err) => Err(ResolveError::Io(err)),
        }
    }

    /// Offers to follow an episode's series. Tracking failures are only logged.
    pub fn offer_tracking(&mut self, identity: &Identity, link_path: &Path) -> Result<(), ResolveError> {
        if identity.media_type() != MediaType::Episode {
            return Ok(());
        }

        self.console.info("Would you like to track this TV Show?")?;
        self.console.print_options("[RETURN] to confirm or [s]kip this step")?;
        loop {
            match self.console.parse_selection(0, &[])? {
                Selection::Accept => break,
                Selection::Skip => return Ok(()),
                _ => self.console.info("Press RETURN or [s]kip")?,
            }
        }

        let show = TrackedShow {
            link: link_path.to_path_buf(),
            title: identity.title().to_string(),
        };
        if let Err(err) = self.tracker.track(&show) {
            warn!(error = %err, title = %show.title, "failed to track show");
            self.console.info("Couldn't track this TV Show")?;
        }
        Ok(())
    }
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn is_symlinked_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink()) && path.is_dir()
}

#[cfg(unix)]
fn make_symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn make_symlink(source: &Path, link: &Path) -> io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, link)
    } else {
        std::os::windows::fs::symlink_file(source, link)
    }
}
