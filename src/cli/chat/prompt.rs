use rustyline::{Config, Editor, Result};

use crate::parameters::ModelId;

pub fn generate_prompt(model: Option<ModelId>) -> String {
    match model {
        Some(model) => format!("[{}] You: ", model),
        None => "You: ".to_string(),
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}
