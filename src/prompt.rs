// src/prompt.rs

//! Interactive task selection.

use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;

use crate::errors::{QuasarError, Result};
use crate::types::BoxFuture;

/// Offered instead of task names when none are available. Choosing it runs
/// nothing.
pub const NO_TASKS_SENTINEL: &str = "uhhh nevermind";

pub trait Prompter: Send + Sync {
    /// Present a single-choice list and return the chosen item.
    fn select(&self, message: &str, choices: Vec<String>) -> BoxFuture<'_, Result<String>>;
}

/// Terminal prompt backed by `dialoguer`.
#[derive(Debug, Clone, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn select(&self, message: &str, choices: Vec<String>) -> BoxFuture<'_, Result<String>> {
        let message = message.to_string();
        Box::pin(async move {
            // dialoguer blocks on terminal input.
            tokio::task::spawn_blocking(move || {
                let index = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt(message)
                    .items(&choices)
                    .default(0)
                    .interact()
                    .map_err(|e| QuasarError::Other(e.into()))?;
                choices
                    .get(index)
                    .cloned()
                    .ok_or(QuasarError::NoTaskSelected)
            })
            .await
            .map_err(|e| QuasarError::Other(e.into()))?
        })
    }
}
