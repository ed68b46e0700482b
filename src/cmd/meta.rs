use crate::metadata;
use crate::prelude::*;
use async_trait::async_trait;
use clap::Parser;

/// Print the metadata embedded into a WebP sticker as JSON
#[derive(Parser, Debug)]
pub struct Meta {
    /// Path to the sticker
    input: Utf8PathBuf,
}

#[async_trait]
impl crate::cmd::Cmd for Meta {
    async fn run(self) -> Result {
        let buffer = fs::read(&self.input).await?;

        let metadata = metadata::extract(&buffer)
            .with_context(|| format!("Failed to read the metadata from `{}`", self.input))?;

        println!("{}", serde_json::to_string_pretty(&metadata)?);

        Ok(())
    }
}
