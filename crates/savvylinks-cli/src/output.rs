//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use savvylinks_core::{ActionItem, ResultItem, Snapshot};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print search results
    pub fn print_results(&self, items: &[ResultItem]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("No links found.");
                    return;
                }
                for item in items {
                    let subtitle = if item.subtitle.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", truncate(&item.subtitle, 25))
                    };
                    println!(
                        "{} | {}{} | {}",
                        truncate(&item.record.id, 12),
                        truncate(&item.title, 35),
                        subtitle,
                        item.record.link
                    );
                }
                println!("\n{} link(s)", items.len());
            }
            OutputFormat::Json => {
                println!("{}", to_json(items));
            }
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.record.link);
                }
            }
        }
    }

    /// Print the actions available for a link
    pub fn print_menu(&self, menu: &[ActionItem]) {
        match self.format {
            OutputFormat::Human => {
                if let Some(first) = menu.first() {
                    println!("{}", first.subtitle);
                }
                for item in menu {
                    println!("  - {}", item.title);
                }
            }
            OutputFormat::Json => {
                println!("{}", to_json(menu));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a short summary of the cache
    pub fn print_snapshot_summary(&self, snapshot: &Snapshot) {
        let refreshed = snapshot
            .refreshed_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        match self.format {
            OutputFormat::Human => {
                println!(
                    "{} link(s) cached, refreshed {}",
                    snapshot.len(),
                    refreshed.as_deref().unwrap_or("never")
                );
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"links": snapshot.len(), "refreshed_at": refreshed})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a failure message (stderr in human mode)
    pub fn failure(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("✗ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
