//! Media type identification
//!
//! Recordings and previews are tagged with a container/codec pair in the
//! `essence;codecs=...` form, e.g. `video/webm;codecs=h264`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Container formats handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Webm,
    Mp4,
}

impl Container {
    /// Get the file extension for this container
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Webm => "webm",
            Container::Mp4 => "mp4",
        }
    }

    /// Get the essence part of the media type
    pub fn essence(&self) -> &'static str {
        match self {
            Container::Webm => "video/webm",
            Container::Mp4 => "video/mp4",
        }
    }

    /// Get the FFmpeg muxer name for this container
    ///
    /// WebM is a matroska subset; browser recorders producing
    /// `video/webm;codecs=h264` emit matroska in practice, and only the
    /// matroska muxer accepts H.264.
    pub fn muxer(&self) -> &'static str {
        match self {
            Container::Webm => "matroska",
            Container::Mp4 => "mp4",
        }
    }
}

/// Error returned when a media type string cannot be parsed
#[derive(Debug, Clone, Error)]
#[error("unrecognized media type: \"{0}\"")]
pub struct MediaTypeParseError(pub String);

/// A container/codec pair identifying recorded or converted media
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaType {
    pub container: Container,
    /// Codec parameter, when present (e.g. `h264`)
    pub codecs: Option<String>,
}

impl MediaType {
    /// The source recording format: H.264 in a WebM wrapper
    pub fn webm_h264() -> Self {
        Self {
            container: Container::Webm,
            codecs: Some("h264".to_string()),
        }
    }

    /// The conversion target format
    pub fn mp4() -> Self {
        Self {
            container: Container::Mp4,
            codecs: None,
        }
    }

    /// Whether this type can be recorded and later remuxed to MP4 without
    /// re-encoding. Only H.264 carries over with `-c:v copy`.
    pub fn is_supported_source(&self) -> bool {
        self.container == Container::Webm && self.codecs.as_deref() == Some("h264")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.codecs {
            Some(codecs) => write!(f, "{};codecs={}", self.container.essence(), codecs),
            None => write!(f, "{}", self.container.essence()),
        }
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';');
        let essence = parts.next().unwrap_or("").trim();

        let container = match essence {
            "video/webm" => Container::Webm,
            "video/mp4" => Container::Mp4,
            _ => return Err(MediaTypeParseError(s.to_string())),
        };

        let mut codecs = None;
        for param in parts {
            if let Some(value) = param.trim().strip_prefix("codecs=") {
                codecs = Some(value.trim().to_string());
            }
        }

        Ok(Self { container, codecs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_type() {
        let mt: MediaType = "video/webm;codecs=h264".parse().unwrap();
        assert_eq!(mt, MediaType::webm_h264());
        assert!(mt.is_supported_source());
    }

    #[test]
    fn parses_bare_essence() {
        let mt: MediaType = "video/mp4".parse().unwrap();
        assert_eq!(mt.container, Container::Mp4);
        assert_eq!(mt.codecs, None);
    }

    #[test]
    fn rejects_unknown_essence() {
        assert!("video/unknown".parse::<MediaType>().is_err());
        assert!("audio/ogg".parse::<MediaType>().is_err());
    }

    #[test]
    fn vp9_webm_is_not_a_copy_source() {
        let mt: MediaType = "video/webm;codecs=vp9".parse().unwrap();
        assert!(!mt.is_supported_source());
    }

    #[test]
    fn display_round_trips() {
        let mt = MediaType::webm_h264();
        assert_eq!(mt.to_string(), "video/webm;codecs=h264");
        assert_eq!(mt.to_string().parse::<MediaType>().unwrap(), mt);
    }
}
