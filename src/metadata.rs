//! WhatsApp sticker metadata stored as JSON inside the WebP `EXIF` chunk.

use crate::prelude::*;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};
use serde::{Deserialize, Serialize};

/// Minimal little-endian TIFF structure that WhatsApp expects in front of
/// the JSON payload.
///
/// - `II*\0`, offset 8 to the first IFD
/// - one IFD entry with the custom tag `0x5741`, type 7 (UNDEFINED)
/// - payload length (patched in), payload offset 22
const EXIF_HEADER: [u8; 22] = [
    0x49, 0x49, 0x2A, 0x00, // Little-endian TIFF
    0x08, 0x00, 0x00, 0x00, // Offset to IFD
    0x01, 0x00, // Number of entries
    0x41, 0x57, // Tag ID
    0x07, 0x00, // Type (UNDEFINED)
    0x00, 0x00, 0x00, 0x00, // Count
    0x16, 0x00, 0x00, 0x00, // Offset to data
];

const EXIF_LENGTH_OFFSET: usize = 14;

const EXIF_TAG: u16 = 0x5741;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StickerMetadata {
    /// Name of the sticker pack
    pub pack: String,

    /// Publisher of the sticker pack
    pub author: String,

    /// Unique pack identifier
    pub id: String,

    /// Emoji the sticker is associated with
    pub categories: Vec<String>,
}

impl StickerMetadata {
    /// Generates a random id if none was given.
    pub(crate) fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
    }

    fn to_exif(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&ExifJsonRef {
            id: &self.id,
            pack: &self.pack,
            author: &self.author,
            categories: &self.categories,
        })?;

        let len = u32::try_from(json.len()).context("Sticker metadata is too large")?;

        let mut exif = Vec::with_capacity(EXIF_HEADER.len() + json.len());
        exif.extend_from_slice(&EXIF_HEADER);
        exif.extend_from_slice(&json);
        exif[EXIF_LENGTH_OFFSET..EXIF_LENGTH_OFFSET + 4].copy_from_slice(&len.to_le_bytes());

        Ok(exif)
    }
}

#[derive(Serialize)]
struct ExifJsonRef<'a> {
    #[serde(rename = "sticker-pack-id")]
    id: &'a str,
    #[serde(rename = "sticker-pack-name")]
    pack: &'a str,
    #[serde(rename = "sticker-pack-publisher")]
    author: &'a str,
    #[serde(rename = "emojis")]
    categories: &'a [String],
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ExifJson {
    #[serde(rename = "sticker-pack-id")]
    id: String,
    #[serde(rename = "sticker-pack-name")]
    pack: String,
    #[serde(rename = "sticker-pack-publisher")]
    author: String,
    #[serde(rename = "emojis")]
    categories: Vec<String>,
}

impl From<ExifJson> for StickerMetadata {
    fn from(json: ExifJson) -> Self {
        Self {
            pack: json.pack,
            author: json.author,
            id: json.id,
            categories: json.categories,
        }
    }
}

fn parse_webp(webp: &[u8]) -> Result<WebP> {
    WebP::from_bytes(Bytes::copy_from_slice(webp))
        .map_err(|err| anyhow::anyhow!("Invalid WebP: {err}"))
}

/// Returns a copy of the WebP with the metadata in its `EXIF` chunk,
/// replacing whatever EXIF data was there before.
pub fn embed(webp: &[u8], metadata: &StickerMetadata) -> Result<Vec<u8>> {
    let mut webp = parse_webp(webp)?;

    webp.set_exif(Some(Bytes::from(metadata.to_exif()?)));

    Ok(webp.encoder().bytes().to_vec())
}

/// Reads the metadata back. Missing EXIF data or missing fields yield
/// empty values instead of an error.
pub fn extract(webp: &[u8]) -> Result<StickerMetadata> {
    let webp = parse_webp(webp)?;

    let Some(exif) = webp.exif() else {
        return Ok(StickerMetadata::default());
    };

    let tagged = tagged_payload(&exif).and_then(|json| {
        serde_json::from_slice::<ExifJson>(json)
            .map_err(|err| debug!("The tagged EXIF payload isn't sticker JSON: {err}"))
            .ok()
    });

    if let Some(json) = tagged {
        return Ok(json.into());
    }

    // Other tools don't always write a well-formed TIFF structure, so the
    // JSON object is looked up at every `{` until one of them parses
    let mut candidates = exif
        .iter()
        .positions(|&byte| byte == b'{')
        .map(|start| {
            serde_json::Deserializer::from_slice(&exif[start..])
                .into_iter::<ExifJson>()
                .next()
        })
        .peekable();

    if candidates.peek().is_none() {
        return Ok(StickerMetadata::default());
    }

    let mut last_error = None;

    for candidate in candidates {
        match candidate {
            Some(Ok(json)) => return Ok(json.into()),
            Some(Err(err)) => last_error = Some(err),
            None => {}
        }
    }

    match last_error {
        Some(err) => Err(err).context("Invalid sticker metadata JSON in the EXIF chunk"),
        None => Ok(StickerMetadata::default()),
    }
}

/// Slices the payload of the [`EXIF_TAG`] entry out of a little-endian
/// TIFF structure, if the data is one and has such entry.
fn tagged_payload(exif: &[u8]) -> Option<&[u8]> {
    if !exif.starts_with(&EXIF_HEADER[..4]) {
        return None;
    }

    let u16_at = |pos: usize| {
        let bytes = exif.get(pos..pos.checked_add(2)?)?;
        Some(u16::from_le_bytes(bytes.try_into().ok()?))
    };
    let u32_at = |pos: usize| {
        let bytes = exif.get(pos..pos.checked_add(4)?)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?) as usize)
    };

    let ifd = u32_at(4)?;
    let entries = usize::from(u16_at(ifd)?);

    (0..entries).find_map(|i| {
        // Every IFD entry is 12 bytes: tag, type, count and offset
        let entry = ifd + 2 + i * 12;

        if u16_at(entry)? != EXIF_TAG {
            return None;
        }

        let count = u32_at(entry + 4)?;
        let offset = u32_at(entry + 8)?;

        exif.get(offset..offset.checked_add(count)?)
    })
}
