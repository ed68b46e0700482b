use anyhow::{bail, ensure, Ok, Result};
use std::time::Duration;

/// Parses `SS[.frac]`, `MM:SS[.frac]` or `HH:MM:SS[.frac]`.
pub(crate) fn parse(arg: &str) -> Result<Duration> {
    let uint = |arg: &str| arg.parse::<u32>().map(f64::from);
    let uf64 = |arg: &str| {
        let val: f64 = arg.parse()?;
        ensure!(val >= 0., "Negative duration is not allowed");
        Ok(val)
    };

    let segments: Vec<_> = arg.split(':').collect();

    let seconds = match segments.as_slice() {
        [seconds] => uf64(seconds)?,
        [minutes, seconds] => uint(minutes)? * 60. + uf64(seconds)?,
        [hours, minutes, seconds] => {
            uint(hours)? * (60. * 60.) + uint(minutes)? * 60. + uf64(seconds)?
        }
        _ => bail!("Unknown duration format"),
    };

    Ok(Duration::try_from_secs_f64(seconds)?)
}

/// Time limit where `None` means unlimited.
pub(crate) type Limit = Option<Duration>;

/// Same as [`parse`], but `0`, `off` and `none` mean there is no limit.
pub(crate) fn parse_limit(arg: &str) -> Result<Limit> {
    if matches!(arg, "off" | "none") {
        return Ok(None);
    }

    let limit = parse(arg)?;

    Ok((!limit.is_zero()).then_some(limit))
}
