use crate::prelude::*;
use tempfile::TempDir;

const PREFIX: &str = "wasticker-";

/// Where the intermediate files handed to ffmpeg are written.
///
/// Every call to [`Scratch::dir`] creates a fresh directory with a random
/// name that is removed together with its contents when dropped.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    root: Option<Utf8PathBuf>,
}

impl Scratch {
    /// Directories go into the system temp directory.
    pub fn system() -> Self {
        Self::default()
    }

    pub fn in_dir(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub(crate) fn dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);

        match &self.root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}
