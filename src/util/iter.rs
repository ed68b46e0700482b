pub(crate) fn strs<'a>(
    input: impl IntoIterator<Item = impl AsRef<str>> + 'a,
) -> impl Iterator<Item = String> + 'a {
    input.into_iter().map(|val| val.as_ref().to_owned())
}

/// Yields `[name, value]` when the value is present and nothing otherwise.
pub(crate) fn optional_named_arg(
    name: &str,
    option: Option<String>,
) -> impl Iterator<Item = String> + '_ {
    option
        .into_iter()
        .flat_map(move |value| [name.to_owned(), value])
}
