use crate::ffmpeg::Aborted;
use crate::prelude::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub(crate) enum MockOutput {
    Buffer(Vec<u8>),
    Failure(String),

    /// Ctrl+C was pressed while ffmpeg was running.
    Interrupted,

    /// The ffmpeg binary couldn't be found.
    SpawnFailure,
}

pub(crate) fn sized(len: usize) -> MockOutput {
    MockOutput::Buffer(vec![0; len])
}

pub(crate) fn failure(message: &str) -> MockOutput {
    MockOutput::Failure(message.to_owned())
}

#[derive(Debug)]
pub(crate) struct SharedMockFfmpeg(Mutex<MockFfmpeg>);

#[derive(Debug)]
pub(crate) struct MockFfmpeg {
    /// Output per `-q:v` value.
    outputs: Vec<(u8, MockOutput)>,

    /// Used for the qualities that aren't listed in [`Self::outputs`].
    fallback: Option<MockOutput>,

    args_log: Vec<Vec<String>>,
    qualities_log: Vec<u8>,
}

impl SharedMockFfmpeg {
    pub(crate) fn new(outputs: impl IntoIterator<Item = (u8, MockOutput)>) -> Arc<Self> {
        Self::with_fallback(outputs, None)
    }

    /// Every call produces the same output regardless of the quality.
    pub(crate) fn always(output: MockOutput) -> Arc<Self> {
        Self::with_fallback([], Some(output))
    }

    fn with_fallback(
        outputs: impl IntoIterator<Item = (u8, MockOutput)>,
        fallback: Option<MockOutput>,
    ) -> Arc<Self> {
        Arc::new(Self(Mutex::new(MockFfmpeg {
            outputs: Vec::from_iter(outputs),
            fallback,
            args_log: Default::default(),
            qualities_log: Default::default(),
        })))
    }

    pub(crate) fn qualities(&self) -> Vec<u8> {
        self.0.lock().unwrap().qualities_log.clone()
    }

    pub(crate) fn args_log(&self) -> Vec<Vec<String>> {
        self.0.lock().unwrap().args_log.clone()
    }
}

#[async_trait]
impl crate::ffmpeg::Ffmpeg for SharedMockFfmpeg {
    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>> {
        let quality_pos = args.iter().position(|arg| arg == "-q:v").unwrap();
        let quality = args[quality_pos + 1].parse().unwrap();

        let mut me = self.0.lock().unwrap();

        me.qualities_log.push(quality);
        me.args_log.push(args);

        let output = me
            .outputs
            .iter()
            .find(|(suspect, _)| *suspect == quality)
            .map(|(_, output)| output)
            .or(me.fallback.as_ref())
            .unwrap_or_else(|| panic!("No mock output for quality {quality}"));

        match output {
            MockOutput::Buffer(buffer) => Ok(buffer.clone()),
            MockOutput::Failure(message) => bail!("{message}"),
            MockOutput::Interrupted => Err(Aborted::Interrupted {
                program: "ffmpeg".to_owned(),
            }
            .into()),
            MockOutput::SpawnFailure => Err(Aborted::Spawn {
                program: "ffmpeg".to_owned(),
                source: std::io::ErrorKind::NotFound.into(),
            }
            .into()),
        }
    }

    async fn run_with_output_file(
        &self,
        args: Vec<String>,
        _output_file: &Utf8Path,
    ) -> Result<Vec<u8>> {
        self.run(args).await
    }
}
