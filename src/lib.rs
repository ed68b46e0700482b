mod cmd;
mod display;
mod util;

pub mod compliance;
pub mod ffmpeg;
pub mod input;
pub mod metadata;
pub mod sticker;

use clap::Parser;
use cmd::Cmd;

mod prelude {
    pub(crate) use crate::util::error::ResultExt as _;
    pub(crate) use anyhow::{bail, ensure, Context as _};
    pub(crate) use camino::{Utf8Path, Utf8PathBuf};
    pub(crate) use fs_err::tokio as fs;
    pub(crate) use itertools::Itertools as _;
    pub(crate) use tracing::{debug, info, info_span, instrument, warn, Instrument as _};

    pub(crate) type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

/// A tool that creates and validates WhatsApp stickers
#[derive(Parser, Debug)]
#[command(version)]
enum Args {
    Create(cmd::Create),
    Validate(cmd::Validate),
    Meta(cmd::Meta),
}

pub async fn run() -> anyhow::Result<()> {
    match Args::parse() {
        Args::Create(cmd) => cmd.run().await,
        Args::Validate(cmd) => cmd.run().await,
        Args::Meta(cmd) => cmd.run().await,
    }
}
