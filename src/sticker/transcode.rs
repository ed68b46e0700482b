use super::codec::{CodecOptions, EncodeArgs, Framing};
use super::ladder::EncodingPreset;
use super::scratch::Scratch;
use super::StickerKind;
use crate::compliance::{self, limits::STICKER_DIMENSION};
use crate::display;
use crate::ffmpeg::{Aborted, Ffmpeg};
use crate::prelude::*;
use crate::util::path::PathExt;
use buildstructor::buildstructor;
use image::ImageFormat;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeAttempt {
    pub preset: EncodingPreset,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Encoded { size: usize },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct TranscodeResult {
    pub buffer: Vec<u8>,

    /// `None` when the input already complied and was returned untouched.
    pub chosen_preset: Option<EncodingPreset>,

    /// `false` means the ladder was exhausted and [`Self::buffer`] is the
    /// smallest output produced, but it's still larger than the target.
    pub within_target: bool,

    /// Every preset that was tried, in order.
    pub attempts: Vec<TranscodeAttempt>,
}

#[derive(thiserror::Error, Debug)]
pub enum TranscodeError {
    #[error("The quality ladder has no presets to try")]
    EmptyLadder,

    #[error(
        "None of the {} presets produced any output, the input is probably \
        not a media file ffmpeg can read\n{}",
        .attempts.len(),
        format_failures(.attempts),
    )]
    Exhausted { attempts: Vec<TranscodeAttempt> },

    #[error("Couldn't prepare scratch files for ffmpeg")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Aborted(#[from] Aborted),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_failures(attempts: &[TranscodeAttempt]) -> String {
    attempts
        .iter()
        .filter_map(|attempt| match &attempt.outcome {
            AttemptOutcome::Failed { error } => Some((attempt.preset.quality, error)),
            AttemptOutcome::Encoded { .. } => None,
        })
        .format_with("\n", |(quality, error), f| {
            f(&format_args!("- quality {quality}: {error}"))
        })
        .to_string()
}

/// Walks a quality ladder until ffmpeg produces an output that fits into
/// the size limit.
#[derive(Debug)]
pub struct Transcoder {
    kind: StickerKind,
    ffmpeg: Arc<dyn Ffmpeg>,
    scratch: Scratch,
    codec: CodecOptions,
    skip_compliant: bool,
}

#[buildstructor]
impl Transcoder {
    #[builder]
    pub fn new(
        kind: StickerKind,
        ffmpeg: Option<Arc<dyn Ffmpeg>>,
        scratch: Option<Scratch>,

        begin: Option<Duration>,
        filter: Option<String>,
        framing: Option<Framing>,
        ffmpeg_args: Vec<String>,

        skip_compliant: Option<bool>,
    ) -> Self {
        Self {
            kind,
            ffmpeg: ffmpeg.unwrap_or_else(|| Arc::new(crate::ffmpeg::FfmpegProcess::default())),
            scratch: scratch.unwrap_or_default(),
            codec: CodecOptions {
                begin,
                filter,
                framing: framing.unwrap_or_default(),
                ffmpeg_args,
            },
            skip_compliant: skip_compliant.unwrap_or(false),
        }
    }
}

impl Transcoder {
    /// Tries the presets strictly in order and accepts the first output
    /// that is at most `target_size` bytes.
    ///
    /// A preset that fails is skipped. If nothing fits, the output of the
    /// last preset that succeeded is returned with `within_target: false`.
    /// Only when every preset failed the result is
    /// [`TranscodeError::Exhausted`].
    #[instrument(
        name = "transcode",
        skip_all,
        fields(kind = %self.kind, target = %display::human_size(target_size))
    )]
    pub async fn transcode(
        &self,
        input: &[u8],
        target_size: usize,
        ladder: &[EncodingPreset],
    ) -> Result<TranscodeResult, TranscodeError> {
        if ladder.is_empty() {
            return Err(TranscodeError::EmptyLadder);
        }

        if self.accepts_as_is(input, target_size) {
            info!("⏩ The input is already a compliant {} sticker", self.kind);

            return Ok(TranscodeResult {
                buffer: input.to_vec(),
                chosen_preset: None,
                within_target: true,
                attempts: vec![],
            });
        }

        let start = Instant::now();

        info!(
            "🚀 Trying up to {} presets to fit into {}",
            ladder.len(),
            display::bold_human_size(target_size)
        );

        // Removed on drop, i.e. on every return path below
        let input_dir = self.scratch.dir()?;
        let input_path = input_dir.path().to_utf8()?.join("input");

        fs::write(&input_path, input).await?;

        let mut attempts = Vec::with_capacity(ladder.len());
        let mut fallback = None;

        for (i, preset) in ladder.iter().enumerate() {
            let output = self
                .attempt(preset, &input_path, target_size)
                .instrument(info_span!("preset", n = i + 1, of = ladder.len()))
                .await;

            let output = match output.map_err(|err| err.downcast::<Aborted>()) {
                Ok(output) => output,
                Err(Ok(aborted)) => {
                    warn!("🛑 Stopping at quality {}: {aborted}", preset.quality);
                    return Err(aborted.into());
                }
                Err(Err(err)) => {
                    warn!(
                        "❌ Quality {} failed, trying the next preset: {err:#}",
                        preset.quality
                    );
                    attempts.push(TranscodeAttempt {
                        preset: *preset,
                        outcome: AttemptOutcome::Failed {
                            error: format!("{err:#}"),
                        },
                    });
                    continue;
                }
            };

            attempts.push(TranscodeAttempt {
                preset: *preset,
                outcome: AttemptOutcome::Encoded { size: output.len() },
            });

            if output.len() <= target_size {
                info!(
                    "🎉 Quality {} fits with {} in {}",
                    display::bold(&preset.quality),
                    display::bold_human_size(output.len()),
                    display::elapsed(start),
                );

                return Ok(TranscodeResult {
                    buffer: output,
                    chosen_preset: Some(*preset),
                    within_target: true,
                    attempts,
                });
            }

            fallback = Some((*preset, output));
        }

        let Some((preset, buffer)) = fallback else {
            return Err(TranscodeError::Exhausted { attempts });
        };

        warn!(
            "The output can't fit into the limit of {}. The smallest output \
            was generated with quality {} and is {}",
            display::bold_human_size(target_size),
            display::bold(&preset.quality),
            display::bold_human_size(buffer.len()),
        );

        Ok(TranscodeResult {
            buffer,
            chosen_preset: Some(preset),
            within_target: false,
            attempts,
        })
    }

    async fn attempt(
        &self,
        preset: &EncodingPreset,
        input: &Utf8Path,
        target_size: usize,
    ) -> Result<Vec<u8>> {
        let start = Instant::now();

        let output_dir = self.scratch.dir()?;
        let output = output_dir.path().to_utf8()?.join("output.webp");

        let args = EncodeArgs {
            kind: self.kind,
            preset,
            input,
            options: &self.codec,
        }
        .build();

        let buffer = self.ffmpeg.run_with_output_file(args, &output).await?;

        ensure!(!buffer.is_empty(), "ffmpeg produced an empty file");

        let (checkbox, color) = if buffer.len() > target_size {
            ('❌', nu_ansi_term::Color::Red)
        } else {
            ('✅', nu_ansi_term::Color::Green)
        };

        let size_display = color.bold().paint(display::human_size(buffer.len()));

        info!(
            "{checkbox} Quality {} generated {size_display} in {}",
            display::bold(&preset.quality),
            display::elapsed(start),
        );

        Ok(buffer)
    }

    /// Whether the input is already a sticker of the requested kind that
    /// fits into the target, and the shortcut for such inputs is enabled.
    pub(crate) fn accepts_as_is(&self, input: &[u8], target_size: usize) -> bool {
        if !self.skip_compliant {
            return false;
        }

        let info = match compliance::inspect(input) {
            Ok(info) => info,
            Err(err) => {
                debug!("Input isn't an image, it can't be passed through: {err:#}");
                return false;
            }
        };

        let compliant = info.format == ImageFormat::WebP
            && info.kind() == self.kind
            && info.width == STICKER_DIMENSION
            && info.height == STICKER_DIMENSION
            && input.len() <= target_size;

        if !compliant {
            debug!(?info, size = input.len(), "Input needs transcoding");
        }

        compliant
    }
}
