//! Checks a finished sticker against the WhatsApp platform constraints.
//!
//! Nothing reported by earlier stages is trusted: whether the sticker is
//! animated and what its dimensions are is re-derived from the buffer.

pub mod limits;
mod report;

use self::limits::*;
use crate::metadata::StickerMetadata;
use crate::prelude::*;
use crate::sticker::StickerKind;
use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, ImageDecoder, ImageFormat, ImageReader};
use serde::Serialize;
use std::io::Cursor;

pub use report::generate_report;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    /// `true` exactly when [`Self::errors`] is empty. Warnings never affect it.
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub file_size: FileSizeReport,
    pub dimensions: DimensionsReport,
    pub metadata: MetadataReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSizeReport {
    pub size: usize,
    pub is_valid: bool,
    pub limit: usize,
    pub kind: StickerKind,
}

impl Default for FileSizeReport {
    fn default() -> Self {
        Self {
            size: 0,
            is_valid: true,
            limit: MAX_STATIC_BYTES,
            kind: StickerKind::Static,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionsReport {
    pub width: u32,
    pub height: u32,
    pub is_valid: bool,
}

impl Default for DimensionsReport {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            is_valid: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataReport {
    pub pack: TextFieldReport,
    pub author: TextFieldReport,
    pub id: TextFieldReport,
    pub categories: CategoriesReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFieldReport {
    pub value: String,
    pub is_valid: bool,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesReport {
    pub value: Vec<String>,
    pub is_valid: bool,
    pub count: usize,
}

/// What could be decoded from the sticker buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub frames: usize,
}

impl ImageInfo {
    pub fn kind(&self) -> StickerKind {
        if self.frames > 1 {
            StickerKind::Animated
        } else {
            StickerKind::Static
        }
    }
}

/// Decodes just enough of the image to learn its format, dimensions and
/// the number of frames. Animated WebP and GIF frames are decoded one by
/// one to be counted.
pub fn inspect(buffer: &[u8]) -> Result<ImageInfo> {
    let format = image::guess_format(buffer).context("Unrecognized image format")?;

    let (width, height, frames) = match format {
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(Cursor::new(buffer))?;
            let (width, height) = decoder.dimensions();
            let frames = if decoder.has_animation() {
                count_frames(decoder.into_frames())?
            } else {
                1
            };
            (width, height, frames)
        }
        ImageFormat::Gif => {
            let decoder = GifDecoder::new(Cursor::new(buffer))?;
            let (width, height) = decoder.dimensions();
            (width, height, count_frames(decoder.into_frames())?)
        }
        _ => {
            let (width, height) =
                ImageReader::with_format(Cursor::new(buffer), format).into_dimensions()?;
            (width, height, 1)
        }
    };

    Ok(ImageInfo {
        format,
        width,
        height,
        frames,
    })
}

fn count_frames(mut frames: image::Frames<'_>) -> Result<usize> {
    frames
        .try_fold(0, |count, frame| frame.map(|_| count + 1))
        .context("Failed to decode an animation frame")
}

/// Never fails: a buffer that can't be decoded yields a report with a
/// single error describing why.
pub fn validate(buffer: &[u8], metadata: &StickerMetadata) -> ComplianceReport {
    let info = match inspect(buffer) {
        Ok(info) => info,
        Err(err) => return ComplianceReport::unreadable(&err, metadata),
    };

    let mut findings = Findings::default();

    let file_size = check_file_size(buffer.len(), info.kind(), &mut findings);
    let dimensions = check_dimensions(info.width, info.height, &mut findings);
    let metadata = check_metadata(metadata, &mut findings);

    if info.kind() == StickerKind::Animated {
        check_frame_count(info.frames, &mut findings);
    }

    findings.warn(
        "Consider adding a white stroke around the sticker to keep it visible \
        on both light and dark chat backgrounds",
    );

    ComplianceReport {
        is_valid: findings.errors.is_empty(),
        errors: findings.errors,
        warnings: findings.warnings,
        file_size,
        dimensions,
        metadata,
    }
}

impl ComplianceReport {
    fn unreadable(err: &anyhow::Error, metadata: &StickerMetadata) -> Self {
        Self {
            is_valid: false,
            errors: vec![format!("Failed to read the sticker: {err:#}")],
            warnings: vec![],
            file_size: FileSizeReport::default(),
            dimensions: DimensionsReport::default(),
            metadata: MetadataReport::unchecked(metadata),
        }
    }
}

impl MetadataReport {
    fn unchecked(metadata: &StickerMetadata) -> Self {
        let text = |value: &str, limit| TextFieldReport {
            value: value.to_owned(),
            is_valid: true,
            limit,
        };

        Self {
            pack: text(&metadata.pack, MAX_PACK_CHARS),
            author: text(&metadata.author, MAX_AUTHOR_CHARS),
            id: text(&metadata.id, MAX_ID_CHARS),
            categories: CategoriesReport {
                value: metadata.categories.clone(),
                is_valid: true,
                count: metadata.categories.len(),
            },
        }
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

fn check_file_size(size: usize, kind: StickerKind, findings: &mut Findings) -> FileSizeReport {
    let limit = kind.max_bytes();
    let is_valid = size <= limit;

    if !is_valid {
        findings.error(format!(
            "File size of {size} bytes exceeds the {limit} bytes limit for {kind} stickers"
        ));
    }

    if size > OVERSIZE_ADVISORY_FACTOR * RECOMMENDED_BYTES {
        findings.warn(format!(
            "File size of {size} bytes is more than {OVERSIZE_ADVISORY_FACTOR}x \
            the recommended {RECOMMENDED_BYTES} bytes"
        ));
    }

    FileSizeReport {
        size,
        is_valid,
        limit,
        kind,
    }
}

fn check_dimensions(width: u32, height: u32, findings: &mut Findings) -> DimensionsReport {
    let is_valid = width == STICKER_DIMENSION && height == STICKER_DIMENSION;

    if !is_valid {
        findings.error(format!(
            "Sticker must be {STICKER_DIMENSION}x{STICKER_DIMENSION} pixels, \
            but it is {width}x{height}"
        ));
    }

    DimensionsReport {
        width,
        height,
        is_valid,
    }
}

fn check_metadata(metadata: &StickerMetadata, findings: &mut Findings) -> MetadataReport {
    let pack = check_length("Pack name", &metadata.pack, MAX_PACK_CHARS, findings);
    let author = check_length("Author name", &metadata.author, MAX_AUTHOR_CHARS, findings);
    let mut id = check_length("ID", &metadata.id, MAX_ID_CHARS, findings);

    if !metadata.id.is_empty() && !lazy_regex::regex_is_match!(r"^[A-Za-z0-9_\-. ]+$", &metadata.id)
    {
        id.is_valid = false;
        findings.error(format!(
            "ID {:?} may only contain ASCII letters, digits, spaces, `_`, `-` and `.`",
            metadata.id
        ));
    }

    let count = metadata.categories.len();
    let categories_valid = count <= MAX_CATEGORIES;

    if !categories_valid {
        findings.error(format!(
            "{count} emoji categories were given, but the limit is {MAX_CATEGORIES}"
        ));
    }

    if count < MIN_CATEGORIES {
        findings.warn(format!(
            "No emoji categories were given, at least {MIN_CATEGORIES} makes \
            the sticker easier to find"
        ));
    }

    MetadataReport {
        pack,
        author,
        id,
        categories: CategoriesReport {
            value: metadata.categories.clone(),
            is_valid: categories_valid,
            count,
        },
    }
}

fn check_length(field: &str, value: &str, limit: usize, findings: &mut Findings) -> TextFieldReport {
    let len = value.chars().count();
    let is_valid = len <= limit;

    if !is_valid {
        findings.error(format!(
            "{field} is {len} characters long, but the limit is {limit}"
        ));
    }

    TextFieldReport {
        value: value.to_owned(),
        is_valid,
        limit,
    }
}

fn check_frame_count(frames: usize, findings: &mut Findings) {
    if frames <= FRAME_COUNT_ADVISORY {
        return;
    }

    findings.warn(format!(
        "Animation has {frames} frames. More than {FRAME_COUNT_ADVISORY} frames usually \
        means it lasts longer than {}s or its frames are shorter than {}ms. \
        This is only an estimate, the exact frame timings aren't checked",
        MAX_ANIMATION_DURATION.as_secs(),
        MIN_FRAME_DURATION.as_millis(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::byte_size::KIB;
    use crate::util::testing;
    use expect_test::expect;

    fn metadata() -> StickerMetadata {
        StickerMetadata {
            pack: "Cats".to_owned(),
            author: "Whiskers".to_owned(),
            id: "cats.v1".to_owned(),
            categories: vec!["😺".to_owned()],
        }
    }

    fn file_size(size: usize, kind: StickerKind) -> (FileSizeReport, Findings) {
        let mut findings = Findings::default();
        (check_file_size(size, kind, &mut findings), findings)
    }

    fn dimensions(width: u32, height: u32) -> bool {
        check_dimensions(width, height, &mut Findings::default()).is_valid
    }

    fn metadata_findings(metadata: &StickerMetadata) -> (MetadataReport, Findings) {
        let mut findings = Findings::default();
        (check_metadata(metadata, &mut findings), findings)
    }

    #[test]
    fn file_size_boundaries() {
        let (report, findings) = file_size(100 * KIB, StickerKind::Static);
        assert!(report.is_valid);
        assert!(findings.errors.is_empty());

        let (report, findings) = file_size(100 * KIB + 1, StickerKind::Static);
        assert!(!report.is_valid);
        expect![[r#"
            [
                "File size of 102401 bytes exceeds the 102400 bytes limit for static stickers",
            ]
        "#]]
        .assert_debug_eq(&findings.errors);

        assert!(file_size(500 * KIB, StickerKind::Animated).0.is_valid);
        assert!(!file_size(500 * KIB + 1, StickerKind::Animated).0.is_valid);
    }

    #[test]
    fn oversize_advisory_is_only_a_warning() {
        let (report, findings) = file_size(45 * KIB, StickerKind::Static);
        assert!(report.is_valid);
        assert!(findings.warnings.is_empty());

        let (report, findings) = file_size(45 * KIB + 1, StickerKind::Static);
        assert!(report.is_valid);
        assert!(findings.errors.is_empty());
        expect![[r#"
            [
                "File size of 46081 bytes is more than 3x the recommended 15360 bytes",
            ]
        "#]]
        .assert_debug_eq(&findings.warnings);
    }

    #[test]
    fn dimension_boundaries() {
        assert!(dimensions(512, 512));
        assert!(!dimensions(511, 512));
        assert!(!dimensions(512, 511));
        assert!(!dimensions(1024, 1024));
    }

    #[test]
    fn pack_name_boundary() {
        let mut meta = metadata();

        meta.pack = "A".repeat(128);
        assert!(metadata_findings(&meta).0.pack.is_valid);

        meta.pack = "A".repeat(129);
        let (report, findings) = metadata_findings(&meta);
        assert!(!report.pack.is_valid);
        expect![[r#"
            [
                "Pack name is 129 characters long, but the limit is 128",
            ]
        "#]]
        .assert_debug_eq(&findings.errors);
    }

    #[test]
    fn lengths_are_counted_in_characters() {
        let mut meta = metadata();
        meta.author = "é".repeat(128);

        assert!(meta.author.len() > 128);
        assert!(metadata_findings(&meta).0.author.is_valid);
    }

    #[test]
    fn id_charset() {
        let mut meta = metadata();

        meta.id = "a_b-c.d e".to_owned();
        assert!(metadata_findings(&meta).0.id.is_valid);

        meta.id = String::new();
        assert!(metadata_findings(&meta).0.id.is_valid);

        meta.id = "me@home".to_owned();
        let (report, findings) = metadata_findings(&meta);
        assert!(!report.id.is_valid);
        expect![[r#"
            [
                "ID \"me@home\" may only contain ASCII letters, digits, spaces, `_`, `-` and `.`",
            ]
        "#]]
        .assert_debug_eq(&findings.errors);

        meta.id = "x".repeat(129);
        let (_, findings) = metadata_findings(&meta);
        expect![[r#"
            [
                "ID is 129 characters long, but the limit is 128",
            ]
        "#]]
        .assert_debug_eq(&findings.errors);
    }

    #[test]
    fn category_bounds() {
        let mut meta = metadata();

        meta.categories = ["😺", "🐱", "🐈"].map(str::to_owned).to_vec();
        let (report, findings) = metadata_findings(&meta);
        assert!(report.categories.is_valid);
        assert!(findings.errors.is_empty());
        assert!(findings.warnings.is_empty());

        meta.categories.push("🐾".to_owned());
        let (report, findings) = metadata_findings(&meta);
        assert!(!report.categories.is_valid);
        assert_eq!(report.categories.count, 4);
        assert_eq!(findings.errors.len(), 1);

        meta.categories.clear();
        let (report, findings) = metadata_findings(&meta);
        assert!(report.categories.is_valid);
        assert!(findings.errors.is_empty());
        assert_eq!(findings.warnings.len(), 1);
    }

    #[test]
    fn compliant_static_sticker() {
        let report = validate(&testing::still_webp(512, 512), &metadata());

        assert!(report.is_valid, "{report:#?}");
        assert_eq!(report.file_size.kind, StickerKind::Static);
        assert_eq!(report.file_size.limit, MAX_STATIC_BYTES);
        assert_eq!(
            (report.dimensions.width, report.dimensions.height),
            (512, 512)
        );
        // Only the design advisory
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn decoded_dimensions_are_checked() {
        for (width, height) in [(511, 512), (512, 511)] {
            let report = validate(&testing::still_webp(width, height), &metadata());

            assert!(!report.is_valid);
            assert!(!report.dimensions.is_valid);
            assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        }
    }

    #[test]
    fn animated_sticker_is_classified_by_frame_count() {
        let report = validate(&testing::animated_webp(512, 512, 3, 100), &metadata());

        assert!(report.is_valid, "{report:#?}");
        assert_eq!(report.file_size.kind, StickerKind::Animated);
        assert_eq!(report.file_size.limit, MAX_ANIMATED_BYTES);
    }

    #[test]
    fn frame_count_heuristic_only_warns() {
        let report = validate(&testing::animated_webp(16, 16, 151, 10), &metadata());

        // Only the dimensions are wrong
        assert_eq!(report.errors.len(), 1);
        assert!(
            report.warnings.iter().any(|w| w.contains("151 frames")),
            "{:?}",
            report.warnings
        );

        let report = validate(&testing::animated_webp(16, 16, 150, 10), &metadata());
        assert!(!report.warnings.iter().any(|w| w.contains("frames")));
    }

    #[test]
    fn non_webp_images_are_measured_too() {
        let report = validate(&testing::png(512, 512), &metadata());

        assert!(report.is_valid, "{report:#?}");
        assert_eq!(report.file_size.kind, StickerKind::Static);
    }

    #[test]
    fn unreadable_buffer_yields_a_single_error() {
        let report = validate(b"definitely not an image", &metadata());

        assert!(!report.is_valid);
        assert!(report.warnings.is_empty());
        assert_eq!(report.file_size, FileSizeReport::default());
        assert_eq!(report.dimensions, DimensionsReport::default());
        assert!(report.metadata.pack.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(
            report.errors[0].starts_with("Failed to read the sticker: Unrecognized image format"),
            "{:?}",
            report.errors
        );
    }

    #[test]
    fn long_pack_name_without_categories() {
        let meta = StickerMetadata {
            pack: "A".repeat(140),
            author: "ok".to_owned(),
            id: String::new(),
            categories: vec![],
        };

        let report = validate(&testing::still_webp(512, 512), &meta);

        assert!(!report.is_valid);
        assert!(!report.metadata.pack.is_valid);
        assert!(report.metadata.author.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("limit is 128")));
        assert!(report.warnings.iter().any(|w| w.contains("No emoji categories")));
    }

    #[test]
    fn validation_is_idempotent() {
        let buffers = [
            testing::still_webp(512, 512),
            testing::animated_webp(512, 512, 2, 50),
            b"garbage".to_vec(),
        ];

        for buffer in buffers {
            assert_eq!(validate(&buffer, &metadata()), validate(&buffer, &metadata()));
        }
    }

    #[test]
    fn validity_matches_absence_of_errors() {
        let mut meta = metadata();
        meta.categories.clear();

        let reports = [
            validate(&testing::still_webp(512, 512), &meta),
            validate(&testing::still_webp(100, 100), &meta),
            validate(b"", &meta),
        ];

        for report in reports {
            assert_eq!(report.is_valid, report.errors.is_empty(), "{report:#?}");
            assert!(!report.warnings.is_empty() || !report.is_valid);
        }
    }
}
