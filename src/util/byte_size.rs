pub const KIB: usize = 1024;

/// Parses a size given in KiB on the command line, e.g. `500` or `99.5`.
pub(crate) fn parse_kib(arg: &str) -> anyhow::Result<usize> {
    let kib: f64 = arg.parse()?;
    anyhow::ensure!(kib > 0., "Size must be positive, but got {arg}");
    Ok((kib * KIB as f64).round() as usize)
}
