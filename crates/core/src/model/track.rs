use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three learning curricula.
///
/// A track partitions both the project catalog and a user's progress rows;
/// the client only ever holds data for one track at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    #[serde(rename = "php")]
    Php,
    #[serde(rename = "html-css")]
    HtmlCss,
    #[serde(rename = "react")]
    React,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown track: {0}")]
pub struct ParseTrackError(String);

impl Track {
    /// All tracks, in navigation order.
    pub const ALL: [Track; 3] = [Track::Php, Track::HtmlCss, Track::React];

    /// Returns the wire literal used by the backend for this track.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Php => "php",
            Track::HtmlCss => "html-css",
            Track::React => "react",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = ParseTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "php" => Ok(Track::Php),
            "html-css" => Ok(Track::HtmlCss),
            "react" => Ok(Track::React),
            other => Err(ParseTrackError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_literals_round_trip() {
        for track in Track::ALL {
            let parsed: Track = track.as_str().parse().unwrap();
            assert_eq!(parsed, track);
        }
    }

    #[test]
    fn rejects_unknown_literal() {
        assert!("ruby".parse::<Track>().is_err());
    }

    #[test]
    fn serde_uses_wire_literals() {
        let json = serde_json::to_string(&Track::HtmlCss).unwrap();
        assert_eq!(json, "\"html-css\"");
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Track::HtmlCss);
    }
}
