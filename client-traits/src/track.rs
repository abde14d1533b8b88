//! Track metadata exchanged with the protocol layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recorded listen, used both as the unit the submitter flushes and as
/// the subject of a now-playing notification.
///
/// `started_at` is the logical timestamp of the listen. Now-playing
/// coalescing compares these timestamps, not arrival order: when two
/// notifications race, the one describing the later listen wins.
///
/// # Examples
///
/// ```
/// use client_traits::Track;
/// use chrono::Utc;
///
/// let track = Track::new("Boards of Canada", "Roygbiv", Utc::now())
///     .with_album("Music Has the Right to Children")
///     .with_duration_secs(148);
///
/// assert_eq!(track.artist, "Boards of Canada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Artist name
    pub artist: String,
    /// Track title
    pub title: String,
    /// Album name, if known
    pub album: Option<String>,
    /// Track length in seconds, if known
    pub duration_secs: Option<u32>,
    /// When playback of this track started (UTC)
    pub started_at: DateTime<Utc>,
}

impl Track {
    /// Create a track with the required fields.
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
            duration_secs: None,
            started_at,
        }
    }

    /// Sets the album name.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Sets the track length in seconds.
    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}
