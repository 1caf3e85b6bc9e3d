use eyre::{Result, bail, eyre};

use crate::parameters::{Credential, ModelId};

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ask { question: String },
    Send,
    Record,
    History,
    Export,
    Clear,
    Help,
    Quit,
    Settings,
    Model { model: ModelId },
    Temperature { value: f32 },
    MaxTokens { value: u32 },
    Key { credential: Option<Credential> },
}

impl Command {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Self::Ask {
                question: input.to_string(),
            });
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        Ok(match name {
            "send" => Self::Send,
            "record" => Self::Record,
            "history" => Self::History,
            "export" => Self::Export,
            "clear" => Self::Clear,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "settings" => Self::Settings,
            "model" => Self::Model {
                model: required(name, arg)?.parse()?,
            },
            "temperature" => Self::Temperature {
                value: required(name, arg)?
                    .parse()
                    .map_err(|_| eyre!("temperature must be a number, got '{}'", arg))?,
            },
            "max-tokens" => Self::MaxTokens {
                value: required(name, arg)?
                    .parse()
                    .map_err(|_| eyre!("max tokens must be a whole number, got '{}'", arg))?,
            },
            "key" => Self::Key {
                credential: Credential::new(arg),
            },
            _ => bail!("Unknown command: /{}. Type /help for the list of commands.", name),
        })
    }

    /// Lines that must stay out of the editor history.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::Key { .. })
    }
}

fn required<'a>(name: &str, arg: &'a str) -> Result<&'a str> {
    if arg.is_empty() {
        bail!("/{} needs a value", name);
    }
    Ok(arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            Command::parse("  What is 2+2?  ").unwrap(),
            Command::Ask {
                question: "What is 2+2?".to_string()
            }
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("/clear").unwrap(), Command::Clear);
        assert_eq!(Command::parse("/export").unwrap(), Command::Export);
        assert_eq!(Command::parse("/record").unwrap(), Command::Record);
        assert_eq!(Command::parse("/send").unwrap(), Command::Send);
        assert_eq!(Command::parse("/history").unwrap(), Command::History);
        assert_eq!(Command::parse("/exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parameter_commands() {
        assert_eq!(
            Command::parse("/model gpt-4o").unwrap(),
            Command::Model {
                model: ModelId::Gpt4o
            }
        );
        assert_eq!(
            Command::parse("/temperature 0.3").unwrap(),
            Command::Temperature { value: 0.3 }
        );
        assert_eq!(
            Command::parse("/max-tokens 200").unwrap(),
            Command::MaxTokens { value: 200 }
        );
    }

    #[test]
    fn test_bad_arguments() {
        assert!(Command::parse("/model").is_err());
        assert!(Command::parse("/model gpt-2").is_err());
        assert!(Command::parse("/temperature warm").is_err());
        assert!(Command::parse("/max-tokens -5").is_err());
        assert!(Command::parse("/nope").is_err());
    }

    #[test]
    fn test_key_command_is_sensitive() {
        let command = Command::parse("/key sk-abc").unwrap();
        assert!(command.is_sensitive());
        assert_eq!(
            command,
            Command::Key {
                credential: Credential::new("sk-abc")
            }
        );
        assert_eq!(
            Command::parse("/key").unwrap(),
            Command::Key { credential: None }
        );
    }
}
