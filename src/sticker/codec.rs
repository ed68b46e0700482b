use super::ladder::EncodingPreset;
use super::StickerKind;
use crate::compliance::limits::STICKER_DIMENSION;
use crate::prelude::*;
use crate::util::iter;
use std::time::Duration;

/// How the source frame is fitted into the square sticker canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Framing {
    /// Scale to fit and pad the rest with transparent pixels.
    #[default]
    Letterbox,
    /// Scale to cover the canvas and cut off the overflow around the center.
    Crop,
    /// Scale to the canvas ignoring the aspect ratio.
    Stretch,
}

/// Knobs that are the same for every preset of a single conversion.
#[derive(Debug, Clone, Default)]
pub(crate) struct CodecOptions {
    pub(crate) begin: Option<Duration>,
    pub(crate) filter: Option<String>,
    pub(crate) framing: Framing,
    pub(crate) ffmpeg_args: Vec<String>,
}

/// Arguments for a single ffmpeg invocation. The output path isn't
/// included, it's appended by [`crate::ffmpeg::Ffmpeg::run_with_output_file`].
pub(crate) struct EncodeArgs<'a> {
    pub(crate) kind: StickerKind,
    pub(crate) preset: &'a EncodingPreset,
    pub(crate) input: &'a Utf8Path,
    pub(crate) options: &'a CodecOptions,
}

impl EncodeArgs<'_> {
    pub(crate) fn build(&self) -> Vec<String> {
        let preset = self.preset;

        let begin = self
            .options
            .begin
            .map(|begin| begin.as_secs_f64().to_string());

        let timing = match self.kind {
            StickerKind::Animated => vec![
                "-t".to_owned(),
                preset.max_duration.as_secs_f64().to_string(),
            ],
            StickerKind::Static => vec![],
        };

        let looping: &[&str] = match self.kind {
            // Variable frame timing must survive `mpdecimate`, so the
            // frames are passed to the muxer as they are
            StickerKind::Animated => &["-loop", "0", "-fps_mode", "passthrough"],
            StickerKind::Static => &["-frames:v", "1"],
        };

        iter::strs(["-y", "-i", self.input.as_str()])
            .chain(iter::optional_named_arg("-ss", begin))
            .chain(timing)
            .chain(iter::strs([
                // Audio streams must be removed from the output
                "-an",
                "-vcodec",
                "libwebp",
                "-lossless",
                "0",
                "-q:v",
            ]))
            .chain([preset.quality.to_string()])
            .chain(iter::strs(["-compression_level"]))
            .chain([preset.compression_effort.to_string()])
            .chain(iter::strs(looping))
            .chain(iter::strs(["-filter:v"]))
            .chain([self.video_filter()])
            .chain(self.options.ffmpeg_args.iter().cloned())
            .collect()
    }

    fn video_filter(&self) -> String {
        let side = STICKER_DIMENSION;
        let animated = self.kind == StickerKind::Animated;

        let frame_rate = animated.then(|| format!("fps={}", self.preset.frame_rate));

        let decimate = (animated && self.preset.decimate_duplicate_frames)
            .then(|| "mpdecimate".to_owned());

        // The fitting scale expression is inspired by this answer:
        // https://superuser.com/a/547406
        let fit = match self.options.framing {
            Framing::Letterbox => vec![
                format!(
                    "scale=iw * min({side} / iw\\, {side} / ih):\
                    ih * min({side} / iw\\, {side} / ih):\
                    flags=lanczos"
                ),
                "format=rgba".to_owned(),
                format!("pad={side}:{side}:-1:-1:color=0x00000000"),
            ],
            Framing::Crop => vec![
                format!("scale={side}:{side}:force_original_aspect_ratio=increase:flags=lanczos"),
                format!("crop={side}:{side}"),
                "format=rgba".to_owned(),
            ],
            Framing::Stretch => vec![
                format!("scale={side}:{side}:flags=lanczos"),
                "format=rgba".to_owned(),
            ],
        };

        self.options
            .filter
            .iter()
            .cloned()
            .chain(frame_rate)
            .chain(decimate)
            .chain(fit)
            .join(",")
    }
}
