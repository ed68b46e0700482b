use crate::prelude::*;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Default limit for a single ffmpeg invocation. A hung encoder counts
/// as a failed attempt instead of blocking the whole conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Failures of the environment rather than of the encoding parameters.
/// Retrying with other parameters can't fix them.
#[derive(thiserror::Error, Debug)]
pub enum Aborted {
    #[error("Process `{program}` was killed with Ctrl+C")]
    Interrupted { program: String },

    #[error("Couldn't spawn `{program}`, is it installed and on PATH?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// The media transcoding engine. Every encode goes through it, so tests
/// can substitute a mock that never spawns a process.
#[async_trait]
pub trait Ffmpeg: fmt::Debug + Send + Sync {
    /// Invoke ffmpeg process with the given arguments.
    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>>;

    /// Same as [`Self::run`], but automatically appends the output path
    /// to the arguments and returns the contents of the file at that path.
    ///
    /// This is useful for mocking to avoid reading files from disk,
    /// especially when they aren't written by the mock.
    async fn run_with_output_file(
        &self,
        args: Vec<String>,
        output_file: &Utf8Path,
    ) -> Result<Vec<u8>> {
        let mut args = args;
        args.push(output_file.to_string());

        self.run(args).await?;

        fs::read(output_file).await.err_into()
    }
}

/// Spawns the `ffmpeg` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegProcess {
    timeout: Option<Duration>,
}

impl Default for FfmpegProcess {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl FfmpegProcess {
    /// `None` lets the process run for as long as it wants.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Ffmpeg for FfmpegProcess {
    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>> {
        crate::util::cmd::ffmpeg(args, self.timeout).await
    }
}
