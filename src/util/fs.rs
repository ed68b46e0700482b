use crate::display;
use crate::prelude::*;
use crate::util::input;

/// Asks the user whether an already existing output file may be replaced.
/// `overwrite` confirms the replacement up front.
pub(crate) async fn confirm_output_overwrite(overwrite: bool, path: &Utf8Path) -> Result {
    let exists = path
        .try_exists()
        .with_context(|| format!("Failed to check if the output file exists: `{path}`"))?;

    if !exists {
        return Ok(());
    }

    let message = format!(
        "The output file {} already exists. Overwrite it?",
        display::bold(&path)
    );

    input::read_confirmation(&message, overwrite).await
}

/// Default output location: next to the input, with the `.webp` extension.
pub(crate) fn default_output_path(input: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    let Some(input) = input else {
        return Ok(Utf8PathBuf::from("sticker.webp"));
    };

    let stem = input
        .file_stem()
        .with_context(|| format!("Input must have a file name, but got `{input}`"))?;

    let file_name = if input.extension() == Some("webp") {
        format!("{stem}-sticker.webp")
    } else {
        format!("{stem}.webp")
    };

    Ok(input.with_file_name(file_name))
}
