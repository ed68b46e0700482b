use crate::display;
use crate::ffmpeg::Aborted;
use crate::prelude::*;
use nu_ansi_term::{Color, Style};
use std::iter;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const DEFAULT_FF_OPTIONS: &[&str] = &["-hide_banner", "-loglevel", "error"];

/// If the CLI display string length exceeds this value, then the command
/// will be printed using multiline format.
const LONG_CMD_THRESHOLD: usize = 100;

/// Only the tail of the stderr is kept in the error message, ffmpeg may be
/// very chatty even with `-loglevel error` when the input is broken.
const MAX_STDERR_LINES: usize = 10;

pub(crate) async fn ffmpeg(
    args: impl IntoIterator<Item = impl Into<String>>,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let args = DEFAULT_FF_OPTIONS
        .iter()
        .copied()
        .map(ToOwned::to_owned)
        .chain(args.into_iter().map(Into::into));

    run_cmd("ffmpeg", args, timeout).await
}

async fn run_cmd(
    program: &str,
    args: impl IntoIterator<Item = impl Into<String>>,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let args: Vec<_> = args.into_iter().map(Into::into).collect();

    let cli = render_cli(program, args.iter().map(String::as_str));
    debug!("{cli}");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| Aborted::Spawn {
            program: program.to_owned(),
            source,
        })?
        .wait_with_output();

    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };

    let output = tokio::select! {
        ctrlc = tokio::signal::ctrl_c() => {
            ctrlc.context("couldn't Ctrl+C")?;
            return Err(Aborted::Interrupted { program: program.to_owned() }.into());
        }
        () = deadline => {
            let timeout = display::duration(timeout.unwrap_or_default());
            bail!("Process `{program}` was killed because it didn't finish in {timeout}");
        }
        output = output => {
            output.context("couldn't run command")?
        }
    };

    if !output.status.success() {
        let status = output.status;
        let stderr = stderr_tail(&output.stderr);

        bail!("Process `{program}` failed with {status}{stderr}");
    }

    Ok(output.stdout)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let lines = stderr.trim().lines().collect_vec();

    if lines.is_empty() {
        return String::new();
    }

    let tail = &lines[lines.len().saturating_sub(MAX_STDERR_LINES)..];

    format!(":\n{}", tail.iter().join("\n"))
}

fn render_cli<'a>(
    program: &'a str,
    args: impl ExactSizeIterator<Item = &'a str> + Clone,
) -> String {
    let program = Color::Blue.paint(shlex::quote(program));

    let args = args.map(|arg| {
        let arg = shlex::quote(arg);
        if arg.starts_with('-') {
            Color::Blue.paint(arg)
        } else {
            Style::new().paint(arg)
        }
    });

    let parts = iter::once(program).chain(args);

    let compact = parts.clone().join(" ");
    if compact.len() <= LONG_CMD_THRESHOLD {
        return compact;
    }
    format!("(\n  {}\n)", { parts }.format(" \n    "))
}
