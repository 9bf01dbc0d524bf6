//! Shell application layer
//!
//! Reads one command per line, hands it to the synchronizer and prints the resulting state.
//! The shell keeps no poll state of its own; everything it prints comes from a
//! [`SyncSnapshot`](crate::sync::SyncSnapshot).

pub mod commands;
pub mod render;

use crate::error::{ErrorKind, Result};
use crate::service::PollService;
use crate::sync::PollSynchronizer;
use commands::{ShellCommand, HELP};
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Line-oriented front end over a [`PollSynchronizer`].
pub struct Application<S> {
    sync: PollSynchronizer<S>,
    refresh_on_start: bool,
    prompt: String,
}

impl<S: PollService + 'static> Application<S> {
    pub fn new(sync: PollSynchronizer<S>) -> Self {
        Self {
            sync,
            refresh_on_start: true,
            prompt: "polls> ".to_string(),
        }
    }

    pub fn refresh_on_start(mut self, enabled: bool) -> Self {
        self.refresh_on_start = enabled;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Run until `quit` or end of input. Only output failures end the loop with an error.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.refresh_on_start {
            self.execute_command(ShellCommand::Refresh, &mut output)
                .await?;
        }

        let mut lines = input.lines();
        loop {
            output.write_all(self.prompt.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let command = ShellCommand::parse(&line);
            debug!("shell command: {:?}", command);
            if !self.execute_command(command, &mut output).await? {
                break;
            }
        }

        output.flush().await
    }

    /// Execute a command - returns false if the shell should quit
    async fn execute_command<W: AsyncWrite + Unpin>(
        &mut self,
        command: ShellCommand,
        output: &mut W,
    ) -> std::io::Result<bool> {
        let text = match command {
            ShellCommand::Quit => return Ok(false),
            ShellCommand::NoAction => return Ok(true),
            ShellCommand::Help => format!("{}\n", HELP),
            ShellCommand::Invalid(message) => format!("error: {}\n", message),
            ShellCommand::List => render::render_polls(&self.sync.snapshot()),
            ShellCommand::Status => render::render_status(&self.sync.snapshot()),
            ShellCommand::Refresh => match self.sync.refresh().await {
                Ok(_) => render::render_polls(&self.sync.snapshot()),
                Err(err) => render::render_error(&err),
            },
            ShellCommand::Create { title, options } => {
                self.after_command(self.sync.create_poll(&title, &options).await)
            }
            ShellCommand::Vote { poll_id, option_id } => {
                self.after_command(self.sync.vote(poll_id, option_id).await)
            }
            ShellCommand::Close { poll_id } => {
                self.after_command(self.sync.close_poll(poll_id).await)
            }
        };

        output.write_all(text.as_bytes()).await?;
        Ok(true)
    }

    fn after_command(&self, outcome: Result<()>) -> String {
        let snapshot = self.sync.snapshot();
        match outcome {
            Ok(()) => {
                let mut text = render::render_polls(&snapshot);
                if let Some(report) = &snapshot.last_error {
                    text.push_str(&format!("warning: {}\n", report.message));
                }
                text
            }
            Err(err) => {
                let mut text = render::render_error(&err);
                if err.kind() == ErrorKind::CommandRejected {
                    text.push_str(&render::render_polls(&snapshot));
                }
                text
            }
        }
    }
}
