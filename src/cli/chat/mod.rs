pub mod command;
pub mod conversation_state;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub mod test_support;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use color_print::cwriteln;
use command::Command;
use eyre::{Result, WrapErr};
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use session::SessionController;
use tracing::{debug, error, info};

use crate::error::SessionError;

const WELCOME_TEXT: &str = "
Enhanced Q&A Chatbot With OpenAI

Go ahead and ask any question.

/record       Ask your question out loud
/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Enhanced Q&A Chatbot With OpenAI

<question>              Ask a question
/record                 Record a spoken question (edit it, then press Enter)
/send                   Send the pending question as it is
/history                Show the conversation history
/export                 Save the conversation to chat_history.txt
/clear                  Clear the conversation history
/model <id>             Switch model (see `models` subcommand)
/temperature <0.0-1.0>  Set the sampling temperature
/max-tokens <50-300>    Set the maximum answer length
/key <secret>           Set the OpenAI API key for this session
/settings               Show the current settings
/help                   Show this help dialogue
/quit                   Quit the application
";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    session: SessionController,
    export_dir: PathBuf,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        session: SessionController,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            output,
            input,
            session,
            export_dir,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        self.session.start();

        // Single question from the command line
        if let Some(input) = self.input.take() {
            let ok = self.ask(&input).await?;
            return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }

        writeln!(self.output, "{}", WELCOME_TEXT)?;
        self.run_interactive().await?;

        Ok(ExitCode::SUCCESS)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(Some(self.session.parameters().model()));
            let pending = self.session.question().to_string();
            let readline = if pending.is_empty() {
                rl.readline(&prompt_text)
            } else {
                rl.readline_with_initial(&prompt_text, (pending.as_str(), ""))
            };

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    match self.handle_input(&line, &mut rl).await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => writeln!(self.output, "Error: {}", e)?,
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        info!("Chat session ended");
        Ok(())
    }

    /// Handles one line. Returns `true` when the user asked to quit.
    async fn handle_input(
        &mut self,
        input: &str,
        rl: &mut rustyline::Editor<()>,
    ) -> Result<bool> {
        let command = Command::parse(input)?;
        if !command.is_sensitive() {
            rl.add_history_entry(input.trim());
        }
        self.execute(command).await
    }

    async fn execute(&mut self, command: Command) -> Result<bool> {
        debug!("Executing {:?} while {}", command, self.session.state());

        match command {
            Command::Ask { question } => {
                self.ask(&question).await?;
            }
            Command::Send => {
                let question = self.session.question().to_string();
                self.ask(&question).await?;
            }
            Command::Record => self.record().await?,
            Command::History => self.print_history()?,
            Command::Export => self.export().await?,
            Command::Clear => {
                self.session.clear();
                writeln!(self.output, "Conversation cleared.")?;
            }
            Command::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Command::Quit => return Ok(true),
            Command::Settings => self.print_settings()?,
            Command::Model { model } => {
                self.session.set_model(model);
                writeln!(self.output, "Model set to {}.", model)?;
            }
            Command::Temperature { value } => match self.session.set_temperature(value) {
                Ok(()) => writeln!(self.output, "Temperature set to {}.", value)?,
                Err(e) => self.report(&SessionError::from(e))?,
            },
            Command::MaxTokens { value } => match self.session.set_max_tokens(value) {
                Ok(()) => writeln!(self.output, "Max tokens set to {}.", value)?,
                Err(e) => self.report(&SessionError::from(e))?,
            },
            Command::Key { credential } => {
                let set = credential.is_some();
                self.session.set_credential(credential);
                if set {
                    writeln!(self.output, "API key set for this session.")?;
                } else {
                    writeln!(self.output, "API key cleared.")?;
                }
            }
        }

        Ok(false)
    }

    /// Sends a question. Returns whether an answer was displayed.
    async fn ask(&mut self, question: &str) -> Result<bool> {
        self.session.set_question(question);

        match self.session.submit().await {
            Ok(turn) => {
                cwriteln!(self.output, "\n<green>Assistant:</> {}\n", turn.answer())?;
                self.session.finish_display();
                Ok(true)
            }
            Err(e) => {
                self.report(&e)?;
                Ok(false)
            }
        }
    }

    async fn record(&mut self) -> Result<()> {
        writeln!(self.output, "Listening...")?;
        self.output.flush()?;

        match self.session.transcribe().await {
            Ok(text) => {
                let text = text.to_string();
                cwriteln!(self.output, "<cyan>Heard:</> {}", text)?;
                writeln!(self.output, "Press Enter to send it, or edit it first.")?;
            }
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        if self.session.log().is_empty() {
            writeln!(self.output, "No conversation yet.")?;
            return Ok(());
        }

        cwriteln!(self.output, "<bold>Conversation History:</>")?;
        for turn in self.session.log().all() {
            cwriteln!(self.output, "<blue>You:</> {}", turn.question())?;
            cwriteln!(self.output, "<green>Assistant:</> {}", turn.answer())?;
        }
        Ok(())
    }

    async fn export(&mut self) -> Result<()> {
        let artifact = match self.session.export() {
            Ok(artifact) => artifact,
            Err(e) => return self.report(&e),
        };

        let path = self.export_dir.join(artifact.file_name);
        tokio::fs::write(&path, artifact.contents)
            .await
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;

        info!("Exported conversation to {}", path.display());
        writeln!(self.output, "Chat exported to {}", path.display())?;
        Ok(())
    }

    fn print_settings(&mut self) -> Result<()> {
        let params = self.session.parameters();
        let key_state = if params.credential().is_some() {
            "set"
        } else {
            "not set"
        };
        let speech_state = if self.session.has_transcription() {
            "enabled"
        } else {
            "disabled"
        };

        writeln!(
            self.output,
            "Model: {}\nTemperature: {}\nMax tokens: {}\nAPI key: {}\nSpeech input: {}",
            params.model(),
            params.temperature(),
            params.max_tokens(),
            key_state,
            speech_state
        )?;
        Ok(())
    }

    fn report(&mut self, e: &SessionError) -> Result<()> {
        if e.is_warning() {
            cwriteln!(self.output, "<yellow>Warning:</> {}", e)?;
        } else {
            error!("{}", e);
            cwriteln!(self.output, "<red>Error:</> {}", e)?;
        }
        Ok(())
    }
}
