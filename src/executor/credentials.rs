//! Credential prompt capability for the custodial path.
//!
//! The dispatcher asks for the wallet secret right before each relay
//! submission. `None` means the user cancelled.

use console::Term;
use tracing::debug;

/// What the prompt is being shown for
#[derive(Debug, Clone)]
pub struct CredentialPrompt {
    pub wallet_id: String,
    pub action: String,
}

/// Supplies the custodial wallet secret, synchronously
pub trait CredentialProvider: Send + Sync {
    fn request_secret(&self, prompt: &CredentialPrompt) -> Option<String>;
}

/// Fixed answer, for non-interactive runs and tests
pub struct StaticCredential {
    secret: Option<String>,
}

impl StaticCredential {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn cancelled() -> Self {
        Self { secret: None }
    }
}

impl CredentialProvider for StaticCredential {
    fn request_secret(&self, _prompt: &CredentialPrompt) -> Option<String> {
        self.secret.clone()
    }
}

/// Reads the secret from the terminal without echo; an empty line cancels
pub struct TerminalCredential {
    term: Term,
}

impl TerminalCredential {
    pub fn new() -> Self {
        Self { term: Term::stderr() }
    }
}

impl Default for TerminalCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for TerminalCredential {
    fn request_secret(&self, prompt: &CredentialPrompt) -> Option<String> {
        let _ = self.term.write_line(&format!(
            "🔐 Enter PIN for wallet {} to {}:",
            prompt.wallet_id, prompt.action
        ));

        match self.term.read_secure_line() {
            Ok(line) => secret_from_line(&line),
            Err(e) => {
                debug!("Credential prompt failed: {}", e);
                None
            }
        }
    }
}

/// The entered secret as typed, minus the line terminator; an empty line cancels
fn secret_from_line(line: &str) -> Option<String> {
    let secret = line.trim_end_matches(['\r', '\n']);
    if secret.is_empty() {
        None
    } else {
        Some(secret.to_string())
    }
}
