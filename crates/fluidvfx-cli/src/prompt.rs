//! Interactive API key selection.

use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;

use async_trait::async_trait;
use fluidvfx_genai::{ApiKey, CredentialError, CredentialProvider, CredentialSlot};
use tracing::debug;

/// Credential provider that asks for a key on the terminal when needed.
///
/// The entered key is stored in the wrapped [`CredentialSlot`] for the rest
/// of the process.
pub struct TerminalCredentials {
    slot: Arc<CredentialSlot>,
    interactive: bool,
}

impl TerminalCredentials {
    pub fn new(slot: Arc<CredentialSlot>) -> Self {
        Self {
            slot,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    #[cfg(test)]
    fn non_interactive(slot: Arc<CredentialSlot>) -> Self {
        Self {
            slot,
            interactive: false,
        }
    }
}

#[async_trait]
impl CredentialProvider for TerminalCredentials {
    async fn is_present(&self) -> bool {
        self.slot.get().is_some()
    }

    async fn current(&self) -> Option<ApiKey> {
        self.slot.get()
    }

    async fn request_selection(&self) -> Result<(), CredentialError> {
        if !self.interactive {
            debug!("stdin is not a terminal; cannot prompt for an API key");
            return self.slot.request_selection().await;
        }

        let line = tokio::task::spawn_blocking(read_key)
            .await
            .map_err(|e| CredentialError::SelectionFailed(e.to_string()))?
            .map_err(|e| CredentialError::SelectionFailed(e.to_string()))?;

        match line {
            Some(key) => {
                self.slot.set(ApiKey::new(key));
                Ok(())
            }
            None => Err(CredentialError::Cancelled),
        }
    }
}

/// Prompt on stderr and read one line. `None` on EOF or an empty answer.
fn read_key() -> std::io::Result<Option<String>> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Enter a Gemini API key from a paid project (blank to cancel): ")?;
    stderr.flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    let key = line.trim();

    Ok((read > 0 && !key.is_empty()).then(|| key.to_string()))
}
