//! Where the source media comes from and what kind of media it is.

use crate::compliance;
use crate::display;
use crate::prelude::*;
use image::ImageFormat;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Path(Utf8PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

impl FromStr for Input {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let is_url = ["http://", "https://"]
            .iter()
            .any(|scheme| input.starts_with(scheme));

        Ok(if is_url {
            Self::Url(input.to_owned())
        } else {
            Self::Path(input.into())
        })
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{path}"),
            Self::Url(url) => f.write_str(url),
            Self::Bytes(bytes) => write!(f, "<{} in memory>", display::human_size(bytes.len())),
        }
    }
}

impl Input {
    /// Local path of the input if it has one.
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Url(_) | Self::Bytes(_) => None,
        }
    }

    #[instrument(skip_all, fields(input = %self))]
    pub async fn load(self) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Path(path) => fs::read(&path).await?,
            Self::Url(url) => download(&url)
                .await
                .with_context(|| format!("Failed to download `{url}`"))?,
            Self::Bytes(bytes) => bytes,
        };

        ensure!(!bytes.is_empty(), "The input is empty");

        debug!(size = %display::human_size(bytes.len()), "Loaded the input");

        Ok(bytes)
    }
}

async fn download(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;

    Ok(response.bytes().await?.to_vec())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// An image that `image` can decode with a single frame.
    Still(ImageFormat),

    /// An animated WebP or GIF.
    Animated(ImageFormat),

    /// Anything else. It's left to ffmpeg to make sense of it.
    Video,
}

pub fn sniff(bytes: &[u8]) -> MediaKind {
    match compliance::inspect(bytes) {
        Ok(info) if info.frames > 1 => MediaKind::Animated(info.format),
        Ok(info) => MediaKind::Still(info.format),
        Err(err) => {
            debug!("Input isn't an image, treating it as a video: {err:#}");
            MediaKind::Video
        }
    }
}
