use std::fmt;
use std::path::Path;

/// Recognized container extensions, in order of frequency
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mkv", "m4v", "avi", "mp4", "mpg", "ts"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Movie,
    Episode,
}

impl MediaType {
    pub fn opposite(self) -> Self {
        match self {
            MediaType::Movie => MediaType::Episode,
            MediaType::Episode => MediaType::Movie,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Episode => "episode",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One possible match returned by a metadata provider
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<String>,
    pub season: Option<String>,
}

impl Candidate {
    pub fn into_identity(self) -> Identity {
        match self.media_type {
            MediaType::Movie => Identity::movie(self.title, self.year),
            MediaType::Episode => Identity::episode(
                self.title,
                self.season.unwrap_or_else(|| "1".to_string()),
                self.year,
            ),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(year) = &self.year {
            write!(f, " ({year})")?;
        }
        if let Some(season) = &self.season {
            write!(f, ", season {season}")?;
        }
        Ok(())
    }
}

/// A user-confirmed match.
///
/// Only the two constructors can build one, so an episode always carries a
/// season and a movie never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    media_type: MediaType,
    title: String,
    year: Option<String>,
    season: Option<String>,
}

impl Identity {
    pub fn movie(title: impl Into<String>, year: Option<String>) -> Self {
        Self {
            media_type: MediaType::Movie,
            title: title.into(),
            year: non_empty(year),
            season: None,
        }
    }

    pub fn episode(series: impl Into<String>, season: impl Into<String>, year: Option<String>) -> Self {
        let season = season.into();
        let season = match season.trim() {
            "" => "1".to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            media_type: MediaType::Episode,
            title: series.into(),
            year: non_empty(year),
            season: Some(season),
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Movie title or series name
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn season(&self) -> Option<&str> {
        self.season.as_deref()
    }

    /// Renders the name the link is created under.
    ///
    /// `[M] Title (Year)` for movies and `[T] Series (S01, Year)` for episodes;
    /// the season is always padded to two digits. Returns `None` when there is
    /// no title to name the link after.
    pub fn link_name(&self) -> Option<String> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }

        let name = match (self.media_type, &self.year) {
            (MediaType::Movie, Some(year)) => format!("[M] {title} ({year})"),
            (MediaType::Movie, None) => format!("[M] {title}"),
            (MediaType::Episode, year) => {
                let season = self.season.as_deref().unwrap_or("1");
                match year {
                    Some(year) => format!("[T] {title} (S{season:0>2}, {year})"),
                    None => format!("[T] {title} (S{season:0>2})"),
                }
            }
        };
        Some(name)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Makes a link name safe to use as a single path component
pub fn sanitize_link_name(name: &str) -> String {
    name.replace(['/', '\0'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_link_name() {
        let identity = Identity::movie("Alien", Some("1979".to_string()));
        assert_eq!(identity.link_name().as_deref(), Some("[M] Alien (1979)"));
    }

    #[test]
    fn test_episode_season_is_padded() {
        let identity = Identity::episode("Show Name", "1", Some("2020".to_string()));
        assert_eq!(identity.link_name().as_deref(), Some("[T] Show Name (S01, 2020)"));

        let identity = Identity::episode("Show Name", "12", Some("2020".to_string()));
        assert_eq!(identity.link_name().as_deref(), Some("[T] Show Name (S12, 2020)"));
    }

    #[test]
    fn test_link_name_without_year() {
        assert_eq!(Identity::movie("Foo", None).link_name().as_deref(), Some("[M] Foo"));
        assert_eq!(
            Identity::episode("Bar", "3", Some("  ".to_string())).link_name().as_deref(),
            Some("[T] Bar (S03)")
        );
    }

    #[test]
    fn test_empty_title_has_no_link_name() {
        assert_eq!(Identity::movie("   ", Some("2001".to_string())).link_name(), None);
    }

    #[test]
    fn test_identity_season_invariant() {
        assert_eq!(Identity::movie("Foo", None).season(), None);
        assert_eq!(Identity::episode("Foo", "", None).season(), Some("1"));
    }

    #[test]
    fn test_candidate_into_identity() {
        let candidate = Candidate {
            media_type: MediaType::Episode,
            title: "Show".to_string(),
            year: Some("2020".to_string()),
            season: None,
        };
        let identity = candidate.into_identity();
        assert_eq!(identity.media_type(), MediaType::Episode);
        assert_eq!(identity.season(), Some("1"));
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("/tmp/Show.S01E01.mkv")));
        assert!(is_video_file(Path::new("Movie.MP4")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_media_type_opposite() {
        assert_eq!(MediaType::Movie.opposite(), MediaType::Episode);
        assert_eq!(MediaType::Episode.opposite(), MediaType::Movie);
        assert_eq!(MediaType::Episode.to_string(), "episode");
    }

    #[test]
    fn test_sanitize_link_name() {
        assert_eq!(sanitize_link_name("[M] AC/DC Live (1991)"), "[M] AC-DC Live (1991)");
        assert_eq!(sanitize_link_name("[M] Plain (2000)"), "[M] Plain (2000)");
    }
}
