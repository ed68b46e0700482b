use crate::prelude::*;

/// Asks a yes/no question on `stdin`. Returns an error unless the user
/// confirms. `auto_confirm` skips the question.
pub(crate) async fn read_confirmation(question: &str, auto_confirm: bool) -> Result {
    if auto_confirm {
        debug!("Confirmed up front: {question}");
        return Ok(());
    }

    warn!("{question} [y/N]");

    // Stdin reads block, so they must not happen on the runtime threads
    // https://docs.rs/tokio/latest/tokio/io/struct.Stdin.html
    let answer = tokio::task::spawn_blocking(|| -> Result<String> {
        let mut line = String::new();
        let read = std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read the answer from `stdin`")?;

        ensure!(read > 0, "`stdin` was closed before an answer was given");

        Ok(line)
    })
    .await
    .context("The task reading `stdin` panicked")??;

    ensure!(
        is_confirmation(&answer),
        "Cancelled, the answer was {:?}",
        answer.trim()
    );

    Ok(())
}

fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_yes_confirms() {
        for answer in ["y\n", "Yes", " YES \r\n"] {
            assert!(is_confirmation(answer), "{answer:?}");
        }
        for answer in ["", "\n", "n", "no", "yep", "sure"] {
            assert!(!is_confirmation(answer), "{answer:?}");
        }
    }

    #[test_log::test(tokio::test)]
    async fn auto_confirm_doesnt_read_stdin() {
        read_confirmation("Overwrite?", true).await.unwrap();
    }
}
