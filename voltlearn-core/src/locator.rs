//! Resource locators for media assets.
//!
//! A locator is either a local file path or a remote URL. The loader treats
//! the two differently: local assets get an existence check before probing,
//! remote assets rely on the playability probe alone.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// Points at a media asset, either on local disk or behind a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceLocator {
    /// Local filesystem path.
    Local(PathBuf),
    /// Remote HTTP(S) URL.
    Remote(Url),
}

impl ResourceLocator {
    /// Parses a locator from user input.
    ///
    /// `http`/`https` strings become remote locators, `file://` URLs are
    /// resolved to their path, and anything else is taken as a local path.
    pub fn parse(input: &str) -> Self {
        if let Ok(url) = Url::parse(input) {
            match url.scheme() {
                "http" | "https" => return Self::Remote(url),
                "file" => {
                    if let Ok(path) = url.to_file_path() {
                        return Self::Local(path);
                    }
                }
                _ => {}
            }
        }
        Self::Local(PathBuf::from(input))
    }

    /// Returns the local path when this locator points at the filesystem.
    pub fn as_local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path.as_path()),
            Self::Remote(_) => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

impl From<PathBuf> for ResourceLocator {
    fn from(path: PathBuf) -> Self {
        Self::Local(path)
    }
}

impl From<Url> for ResourceLocator {
    fn from(url: Url) -> Self {
        Self::Remote(url)
    }
}
