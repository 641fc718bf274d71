//! Terminal host capabilities
//!
//! Clipboard goes through the system clipboard, URLs open in the default
//! browser, and messages are printed.

use tracing::warn;

use savvylinks_core::Host;

use crate::output::Output;

pub struct CliHost {
    output: Output,
}

impl CliHost {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

impl Host for CliHost {
    fn copy_to_clipboard(&self, text: &str) {
        let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match result {
            Ok(()) => self.output.success(&format!("Copied {}", text)),
            Err(e) => {
                warn!("Clipboard unavailable: {}", e);
                // Fall back to printing so the link is still usable
                self.output.message(text);
            }
        }
    }

    fn open_url(&self, url: &str) {
        match open::that(url) {
            Ok(()) => self.output.success(&format!("Opened {}", url)),
            Err(e) => {
                warn!("Failed to open browser: {}", e);
                self.output.message(url);
            }
        }
    }

    fn show_message(&self, message: &str) {
        self.output.message(message);
    }
}
