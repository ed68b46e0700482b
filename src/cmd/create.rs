use crate::display;
use crate::ffmpeg::{Ffmpeg, FfmpegProcess, DEFAULT_TIMEOUT};
use crate::input::Input;
use crate::metadata::StickerMetadata;
use crate::prelude::*;
use crate::sticker::{Scratch, Shape, Sticker, StickerKind};
use crate::util::{byte_size, duration, fs as util_fs};
use async_trait::async_trait;
use clap::Parser;
use image::Rgba;
use std::sync::Arc;
use std::time::Duration;

/// Create a WhatsApp sticker from an image, a GIF or a video using ffmpeg
///
/// The output file will be put next to the input file with the `.webp`
/// extension by default.
///
/// Still images are composited into the 512x512 canvas, animations and videos
/// are transcoded by trying quality presets one by one until the output fits
/// into the size limit.
#[derive(Parser, Debug)]
pub struct Create {
    /// Path or an http(s) URL of the input media
    input: Input,

    /// Path to the output. By default, the output is put into the same
    /// directory as the input with the `.webp` extension.
    output: Option<Utf8PathBuf>,

    /// Name of the sticker pack
    #[clap(long, default_value = "")]
    pack: String,

    /// Publisher of the sticker pack
    #[clap(long, default_value = "")]
    author: String,

    /// Unique pack identifier. A random one is generated if not specified.
    #[clap(long, default_value = "")]
    id: String,

    /// Emoji associated with the sticker. May be repeated up to 3 times.
    #[clap(long = "category")]
    categories: Vec<String>,

    /// How a still image is fitted into the sticker canvas. Masking shapes
    /// are ignored for animations.
    #[clap(long, value_enum, default_value_t)]
    shape: Shape,

    /// Color of the canvas around a still image in `#RRGGBB[AA]` format
    #[clap(long, value_parser = crate::sticker::parse_background)]
    background: Option<Rgba<u8>>,

    /// Kind of the sticker to generate. Detected from the input by default.
    #[clap(long, value_enum)]
    kind: Option<StickerKind>,

    /// The time from which the video will be cut.
    #[clap(long, value_parser = duration::parse)]
    begin: Option<Duration>,

    /// The value of the video filter flag that will be passed to ffmpeg
    /// before rescaling it to the needed size
    #[clap(long)]
    filter: Option<String>,

    /// Size limit for the output in KiB. Defaults to the WhatsApp limit,
    /// which is 100 KiB for static and 500 KiB for animated stickers.
    #[clap(long, value_parser = byte_size::parse_kib)]
    target_size: Option<usize>,

    /// Don't transcode the input if it is already a compliant sticker
    #[clap(long)]
    skip_compliant: bool,

    /// Check the output against the WhatsApp requirements and print a report
    #[clap(long)]
    validate: bool,

    /// Overwrite the output file without asking
    #[clap(long)]
    overwrite: bool,

    /// Directory for the intermediate files. The system temp directory is
    /// used by default.
    #[clap(long, env = "WASTICKER_SCRATCH_DIR")]
    scratch_dir: Option<Utf8PathBuf>,

    /// Time limit for a single ffmpeg invocation, 2 minutes by default.
    /// `0` or `off` disables the limit.
    #[clap(long, env = "WASTICKER_FFMPEG_TIMEOUT", value_parser = duration::parse_limit)]
    timeout: Option<duration::Limit>,

    /// Additional arguments that will be passed to ffmpeg after the encoding args.
    /// Beware that they may break the internal logic of generating the `ffmpeg` command.
    /// For example, if you need additional video filter use `--filter` flag instead.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    ffmpeg_args: Vec<String>,
}

#[async_trait]
impl crate::cmd::Cmd for Create {
    async fn run(self) -> Result {
        let output = match &self.output {
            Some(output) => output.clone(),
            None => util_fs::default_output_path(self.input.path())?,
        };

        util_fs::confirm_output_overwrite(self.overwrite, &output).await?;

        let timeout = self.timeout.unwrap_or(Some(DEFAULT_TIMEOUT));

        let ffmpeg: Arc<dyn Ffmpeg> = Arc::new(FfmpegProcess::with_timeout(timeout));

        let scratch = self
            .scratch_dir
            .map(Scratch::in_dir)
            .unwrap_or_else(Scratch::system);

        let metadata = StickerMetadata {
            pack: self.pack,
            author: self.author,
            id: self.id,
            categories: self.categories,
        };

        let sticker = Sticker::builder()
            .input(self.input)
            .metadata(metadata)
            .shape(self.shape)
            .and_background(self.background)
            .and_target_size(self.target_size)
            .and_kind(self.kind)
            .ffmpeg(ffmpeg)
            .scratch(scratch)
            .and_begin(self.begin)
            .and_filter(self.filter)
            .ffmpeg_args(self.ffmpeg_args)
            .skip_compliant(self.skip_compliant)
            .validate(self.validate)
            .build()
            .create()
            .await?;

        fs::write(&output, &sticker.buffer).await?;

        info!(
            "🔥 Saved the {} sticker ({}) at {}",
            sticker.kind,
            display::bold_human_size(sticker.buffer.len()),
            display::bold(&output),
        );

        if let Some(report) = &sticker.report {
            println!("{}", crate::compliance::generate_report(report));
        }

        Ok(())
    }
}
