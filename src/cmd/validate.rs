use crate::compliance;
use crate::metadata;
use crate::prelude::*;
use async_trait::async_trait;
use clap::Parser;

/// Check a WebP sticker against the WhatsApp requirements
///
/// The metadata embedded into the sticker is validated along with the image.
/// Exits with an error if the sticker is not valid.
#[derive(Parser, Debug)]
pub struct Validate {
    /// Path to the sticker
    input: Utf8PathBuf,

    /// Print the report as JSON instead of text
    #[clap(long)]
    json: bool,
}

#[async_trait]
impl crate::cmd::Cmd for Validate {
    async fn run(self) -> Result {
        let buffer = fs::read(&self.input).await?;

        // An unreadable sticker is reported by the validator itself
        let metadata = metadata::extract(&buffer)
            .warn_err("Couldn't read the embedded sticker metadata")
            .unwrap_or_default();

        let report = compliance::validate(&buffer, &metadata);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", compliance::generate_report(&report));
        }

        ensure!(
            report.is_valid,
            "The sticker has {} compliance errors",
            report.errors.len()
        );

        Ok(())
    }
}
