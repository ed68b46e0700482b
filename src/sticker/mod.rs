//! Turning arbitrary media into a WhatsApp sticker.
//!
//! Stills are composited into the sticker canvas with `image` and then
//! encoded, animations and videos go straight to ffmpeg. In both cases the
//! encoding walks a quality ladder until the output fits into the size limit.

pub mod ladder;

mod codec;
mod scratch;
mod shape;
mod transcode;

#[cfg(test)]
mod testing;

use crate::compliance::{self, limits, ComplianceReport};
use crate::display;
use crate::ffmpeg::Ffmpeg;
use crate::input::{self, Input, MediaKind};
use crate::metadata::{self, StickerMetadata};
use crate::prelude::*;
use buildstructor::buildstructor;
use image::Rgba;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub use codec::Framing;
pub use scratch::Scratch;
pub use shape::{composite, parse_background, Shape, ROUNDED_CORNER_RADIUS, TRANSPARENT};
pub use transcode::{AttemptOutcome, TranscodeAttempt, TranscodeError, TranscodeResult, Transcoder};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    clap::ValueEnum,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StickerKind {
    #[default]
    Static,
    Animated,
}

impl StickerKind {
    pub fn max_bytes(self) -> usize {
        match self {
            Self::Static => limits::MAX_STATIC_BYTES,
            Self::Animated => limits::MAX_ANIMATED_BYTES,
        }
    }
}

/// The finished sticker with everything that was learned while making it.
#[derive(Debug, Clone)]
pub struct StickerOutput {
    /// The WebP with the metadata embedded.
    pub buffer: Vec<u8>,
    pub kind: StickerKind,

    /// The metadata as embedded, i.e. with the id filled in.
    pub metadata: StickerMetadata,

    pub transcode: TranscodeResult,

    /// Present only if validation was requested.
    pub report: Option<ComplianceReport>,
}

#[derive(Debug)]
pub struct Sticker {
    input: Input,
    metadata: StickerMetadata,
    shape: Shape,
    background: Rgba<u8>,
    target_size: Option<usize>,
    kind: Option<StickerKind>,
    ffmpeg: Arc<dyn Ffmpeg>,
    scratch: Scratch,
    begin: Option<Duration>,
    filter: Option<String>,
    ffmpeg_args: Vec<String>,
    skip_compliant: bool,
    validate: bool,
}

#[buildstructor]
impl Sticker {
    #[builder]
    pub fn new(
        input: Input,
        metadata: Option<StickerMetadata>,

        shape: Option<Shape>,
        background: Option<Rgba<u8>>,

        // Defaults to the platform limit for the sticker kind
        target_size: Option<usize>,

        // Detected from the input by default
        kind: Option<StickerKind>,

        ffmpeg: Option<Arc<dyn Ffmpeg>>,
        scratch: Option<Scratch>,

        begin: Option<Duration>,
        filter: Option<String>,
        ffmpeg_args: Vec<String>,

        skip_compliant: Option<bool>,
        validate: Option<bool>,
    ) -> Self {
        Self {
            input,
            metadata: metadata.unwrap_or_default(),
            shape: shape.unwrap_or_default(),
            background: background.unwrap_or(TRANSPARENT),
            target_size,
            kind,
            ffmpeg: ffmpeg.unwrap_or_else(|| Arc::new(crate::ffmpeg::FfmpegProcess::default())),
            scratch: scratch.unwrap_or_default(),
            begin,
            filter,
            ffmpeg_args,
            skip_compliant: skip_compliant.unwrap_or(false),
            validate: validate.unwrap_or(false),
        }
    }
}

impl Sticker {
    #[instrument(skip_all, fields(input = %self.input))]
    pub async fn create(self) -> Result<StickerOutput> {
        let bytes = self.input.clone().load().await?;
        let media = input::sniff(&bytes);

        let kind = self.kind.unwrap_or(match media {
            MediaKind::Still(_) => StickerKind::Static,
            MediaKind::Animated(_) | MediaKind::Video => StickerKind::Animated,
        });

        let target_size = self.target_size.unwrap_or(kind.max_bytes());

        if target_size > kind.max_bytes() {
            warn!(
                "Target size {} exceeds the platform limit of {} for {kind} stickers",
                display::bold_human_size(target_size),
                display::bold_human_size(kind.max_bytes()),
            );
        }

        info!(?media, %kind, "🎨 Creating a sticker");

        let transcode = self.encode(bytes, media, kind, target_size).await?;

        if !transcode.within_target {
            warn!(
                "The sticker is {}, which is over the target of {}. \
                WhatsApp may refuse to send it",
                display::bold_human_size(transcode.buffer.len()),
                display::bold_human_size(target_size),
            );
        }

        let mut metadata = self.metadata;
        metadata.ensure_id();
        metadata.categories = metadata.categories.into_iter().unique().collect();

        let buffer = metadata::embed(&transcode.buffer, &metadata)
            .context("Failed to embed the sticker metadata")?;

        let report = self.validate.then(|| {
            let report = compliance::validate(&buffer, &metadata);
            for error in &report.errors {
                warn!("Compliance error: {error}");
            }
            report
        });

        Ok(StickerOutput {
            buffer,
            kind,
            metadata,
            transcode,
            report,
        })
    }

    async fn encode(
        &self,
        bytes: Vec<u8>,
        media: MediaKind,
        kind: StickerKind,
        target_size: usize,
    ) -> Result<TranscodeResult> {
        let still = matches!(media, MediaKind::Still(_)) && kind == StickerKind::Static;

        let framing = if still {
            // The composite is already a square canvas
            Framing::Letterbox
        } else {
            self.shape.framing().unwrap_or_else(|| {
                warn!(
                    "The {} shape can only be applied to still images, \
                    the animation will be letterboxed instead",
                    display::bold(&self.shape)
                );
                Framing::default()
            })
        };

        let transcoder = Transcoder::builder()
            .kind(kind)
            .ffmpeg(self.ffmpeg.clone())
            .scratch(self.scratch.clone())
            .and_begin(self.begin)
            .and_filter(self.filter.clone())
            .framing(framing)
            .ffmpeg_args(self.ffmpeg_args.clone())
            .skip_compliant(self.skip_compliant)
            .build();

        let source = if still && !transcoder.accepts_as_is(&bytes, target_size) {
            shape::render(&bytes, self.shape, self.background)?
        } else {
            bytes
        };

        let result = transcoder
            .transcode(&source, target_size, ladder::presets(kind))
            .await?;

        Ok(result)
    }
}
