use std::path::Path;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::media::MediaType;
use crate::providers::SearchQuery;

/// Release tags that never belong to a title. An undated title is cut at the
/// first one that follows its first word.
const NOISE_TOKENS: &[&str] = &[
    // Resolutions
    "2160p", "1080p", "1080i", "720p", "576p", "480p", "4k", "uhd",
    // Sources
    "bluray", "blu-ray", "brrip", "bdrip", "dvdrip", "dvd", "webrip", "web-dl", "webdl", "web",
    "hdtv", "hdrip", "camrip", "cam", "screener", "r5", "remux",
    // Video codecs
    "x264", "x265", "h264", "h265", "hevc", "avc", "xvid", "divx", "vp9", "av1", "10bit", "hdr",
    // Audio
    "aac", "ac3", "dts", "dts-hd", "mp3", "flac", "atmos", "ddp5", "dd5",
    // Release info
    "extended", "unrated", "remastered", "limited", "internal", "proper", "repack", "multi",
    // Groups
    "yify", "yts", "rarbg", "1337x", "tgx", "eztv", "ettv",
];

/// Unconfirmed attributes extracted from a filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    pub media_type: MediaType,
    pub title: Option<String>,
    pub year: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

impl Guess {
    /// Turns the guess into a provider query, or `None` when no title was found
    pub fn into_query(self) -> Option<SearchQuery> {
        let title = self.title?;
        Some(SearchQuery {
            media_type: self.media_type,
            title,
            year: self.year,
            season: self.season,
            episode: self.episode,
        })
    }
}

/// Filename heuristics
#[derive(Debug)]
pub struct Guesser {
    standard_pattern: Regex,
    cross_pattern: Regex,
    year_pattern: Regex,
    bracket_pattern: Regex,
}

impl Guesser {
    pub fn new() -> Result<Self> {
        let standard_pattern = Regex::new(
            r"(?i)^(?P<title>.*?)(?:^|[\s._-]+)S(?P<season>\d{1,2})[\s._-]*E(?P<episode>\d{1,3})",
        )?;

        let cross_pattern = Regex::new(
            r"(?i)^(?P<title>.*?)(?:^|[\s._-]+)(?P<season>\d{1,2})x(?P<episode>\d{2,3})(?:[\s._-]|$)",
        )?;

        let year_pattern = Regex::new(
            r"^(?P<title>.+?)[\s._\-(\[]+(?P<year>(?:19|20)\d{2})(?:[\s._\-)\]]|$)",
        )?;

        let bracket_pattern = Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}")?;

        Ok(Self {
            standard_pattern,
            cross_pattern,
            year_pattern,
            bracket_pattern,
        })
    }

    pub fn guess(&self, path: &Path) -> Guess {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut guess = self.guess_name(&stem);

        // Files named only by their episode marker take the title from the folder
        if guess.media_type == MediaType::Episode && guess.title.is_none() {
            if let Some(parent) = path.parent().and_then(|p| p.file_name()) {
                let (title, year) = self.split_title(&parent.to_string_lossy());
                guess.title = title;
                if guess.year.is_none() {
                    guess.year = year;
                }
            }
        }

        debug!(path = %path.display(), ?guess, "guessed from filename");
        guess
    }

    fn guess_name(&self, stem: &str) -> Guess {
        let episode_match = self
            .standard_pattern
            .captures(stem)
            .or_else(|| self.cross_pattern.captures(stem));

        if let Some(captures) = episode_match {
            let (title, year) = self.split_title(&captures["title"]);
            return Guess {
                media_type: MediaType::Episode,
                title,
                year,
                season: normalize_number(&captures["season"]),
                episode: normalize_number(&captures["episode"]),
            };
        }

        let (title, year) = self.split_title(stem);
        Guess {
            media_type: MediaType::Movie,
            title,
            year,
            season: None,
            episode: None,
        }
    }

    /// Splits a raw name into a cleaned title and an optional release year
    fn split_title(&self, raw: &str) -> (Option<String>, Option<String>) {
        match self.year_pattern.captures(raw) {
            Some(captures) => {
                // The year already ends the title, so release tags can't follow it
                let title = self.clean_title(&captures["title"], false);
                // Keep the number as the title when nothing precedes it
                if title.is_none() {
                    return (self.clean_title(raw, true), None);
                }
                (title, Some(captures["year"].to_string()))
            }
            None => (self.clean_title(raw, true), None),
        }
    }

    /// Tidies a raw title. With `cut_noise` the title ends at the first
    /// release tag after its first word.
    fn clean_title(&self, raw: &str, cut_noise: bool) -> Option<String> {
        let without_brackets = self.bracket_pattern.replace_all(raw, " ");
        let spaced = without_brackets.replace(['.', '_'], " ");

        let mut words = spaced.split_whitespace();
        let mut kept: Vec<&str> = words.next().into_iter().collect();
        if cut_noise {
            kept.extend(words.take_while(|word| !is_noise(word)));
        } else {
            kept.extend(words);
        }
        let words = kept;

        let title = words
            .join(" ")
            .trim_matches(&['-', ' ', ','] as &[char])
            .to_string();

        if title.is_empty() { None } else { Some(title) }
    }
}

fn is_noise(word: &str) -> bool {
    let word = word
        .trim_matches(&['-', ',', '+'] as &[char])
        .to_lowercase();
    NOISE_TOKENS.contains(&word.as_str())
}

fn normalize_number(digits: &str) -> Option<String> {
    digits.parse::<u32>().ok().map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guesser() -> Guesser {
        Guesser::new().unwrap()
    }

    #[test]
    fn test_standard_episode() {
        let guess = guesser().guess(Path::new("Show.Name.S01E02.mkv"));
        assert_eq!(guess.media_type, MediaType::Episode);
        assert_eq!(guess.title.as_deref(), Some("Show Name"));
        assert_eq!(guess.season.as_deref(), Some("1"));
        assert_eq!(guess.episode.as_deref(), Some("2"));
        assert_eq!(guess.year, None);
    }

    #[test]
    fn test_cross_episode() {
        let guess = guesser().guess(Path::new("the_office_3x07_the_convict.avi"));
        assert_eq!(guess.media_type, MediaType::Episode);
        assert_eq!(guess.title.as_deref(), Some("the office"));
        assert_eq!(guess.season.as_deref(), Some("3"));
        assert_eq!(guess.episode.as_deref(), Some("7"));
    }

    #[test]
    fn test_episode_with_year_in_title() {
        let guess = guesser().guess(Path::new("Doctor.Who.2005.S01E01.720p.mkv"));
        assert_eq!(guess.title.as_deref(), Some("Doctor Who"));
        assert_eq!(guess.year.as_deref(), Some("2005"));
        assert_eq!(guess.season.as_deref(), Some("1"));
    }

    #[test]
    fn test_movie_with_year_and_noise() {
        let guess = guesser().guess(Path::new("The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv"));
        assert_eq!(guess.media_type, MediaType::Movie);
        assert_eq!(guess.title.as_deref(), Some("The Matrix"));
        assert_eq!(guess.year.as_deref(), Some("1999"));
    }

    #[test]
    fn test_movie_with_parenthesised_year() {
        let guess = guesser().guess(Path::new("Alien (1979) [YTS.MX].mp4"));
        assert_eq!(guess.title.as_deref(), Some("Alien"));
        assert_eq!(guess.year.as_deref(), Some("1979"));
    }

    #[test]
    fn test_title_that_starts_with_a_year() {
        let guess = guesser().guess(Path::new("2001.A.Space.Odyssey.1968.mkv"));
        assert_eq!(guess.title.as_deref(), Some("2001 A Space Odyssey"));
        assert_eq!(guess.year.as_deref(), Some("1968"));
    }

    #[test]
    fn test_movie_without_year() {
        let guess = guesser().guess(Path::new("Some_Movie.720p.WEBRip.mkv"));
        assert_eq!(guess.title.as_deref(), Some("Some Movie"));
        assert_eq!(guess.year, None);
    }

    #[test]
    fn test_title_from_parent_directory() {
        let guess = guesser().guess(Path::new("/videos/Breaking Bad (2008)/S02E03.mkv"));
        assert_eq!(guess.media_type, MediaType::Episode);
        assert_eq!(guess.title.as_deref(), Some("Breaking Bad"));
        assert_eq!(guess.year.as_deref(), Some("2008"));
        assert_eq!(guess.season.as_deref(), Some("2"));
    }

    #[test]
    fn test_no_title_yields_no_query() {
        let guess = guesser().guess(Path::new("/downloads/[YTS.MX].mkv"));
        assert_eq!(guess.media_type, MediaType::Movie);
        assert_eq!(guess.title, None);
        assert!(guess.into_query().is_none());
    }

    #[test]
    fn test_title_starting_with_a_release_tag() {
        let guess = guesser().guess(Path::new("/downloads/Cam.2018.mkv"));
        assert_eq!(guess.media_type, MediaType::Movie);
        assert_eq!(guess.title.as_deref(), Some("Cam"));
        assert_eq!(guess.year.as_deref(), Some("2018"));

        let guess = guesser().guess(Path::new("/downloads/Internal.Affairs.1990.mkv"));
        assert_eq!(guess.title.as_deref(), Some("Internal Affairs"));
        assert_eq!(guess.year.as_deref(), Some("1990"));
    }

    #[test]
    fn test_release_tag_inside_a_dated_title() {
        let guess = guesser().guess(Path::new("/downloads/Charlottes.Web.2006.720p.mkv"));
        assert_eq!(guess.title.as_deref(), Some("Charlottes Web"));
        assert_eq!(guess.year.as_deref(), Some("2006"));
    }

    #[test]
    fn test_undated_title_keeps_its_first_word() {
        let guess = guesser().guess(Path::new("/downloads/Extended.Family.WEBRip.x264.mkv"));
        assert_eq!(guess.title.as_deref(), Some("Extended Family"));
    }

    #[test]
    fn test_movies_never_take_the_folder_name() {
        let guess = guesser().guess(Path::new("/downloads/Some Folder/1080p.mkv"));
        assert_eq!(guess.media_type, MediaType::Movie);
        assert_eq!(guess.title.as_deref(), Some("1080p"));
        assert_ne!(guess.title.as_deref(), Some("Some Folder"));
    }
}
