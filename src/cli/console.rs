//! Terminal implementations of the login host interfaces.

use std::io::Write;

use tokio_util::sync::CancellationToken;

use crate::auth::{LoginUi, ProgressHandle};

/// Prints prompts to the terminal. Ctrl-C cancels through `cancel`.
#[derive(Debug, Clone)]
pub struct ConsoleUi {
    cancel: CancellationToken,
}

impl ConsoleUi {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl LoginUi for ConsoleUi {
    fn show_message(&self, text: &str) {
        println!("{text}");
    }

    fn show_notification(&self, title: &str, text: &str) {
        if title.ends_with(text) {
            eprintln!("⚠️  {title}");
        } else {
            eprintln!("⚠️  {title}\n   {text}");
        }
    }

    fn confirm(&self, title: &str, text: &str) {
        println!("🔐 {title}");
        println!("   {text}\n");
    }

    fn create_progress(&self, heading: &str, text: &str) -> Box<dyn ProgressHandle> {
        println!("{heading}");
        for line in text.lines() {
            println!("📋 {line}");
        }
        println!("⏳ Waiting for authorization... (Ctrl-C to cancel)");
        Box::new(ConsoleProgress {
            cancel: self.cancel.clone(),
            total: 0,
            position: 0,
            open: true,
        })
    }

    fn refresh_view(&self) {
        tracing::debug!("View refresh requested");
    }
}

/// One line of progress on stderr.
struct ConsoleProgress {
    cancel: CancellationToken,
    total: u32,
    position: u32,
    open: bool,
}

impl ProgressHandle for ConsoleProgress {
    fn set_total(&mut self, total: u32) {
        self.total = total;
    }

    fn update(&mut self) {
        if !self.open {
            return;
        }
        self.position = self.position.saturating_add(1);
        let percent = if self.total == 0 {
            0
        } else {
            (u64::from(self.position.min(self.total)) * 100 / u64::from(self.total)) as u32
        };
        eprint!("\r   attempt {}/{} ({percent}%)", self.position, self.total);
        let _ = std::io::stderr().flush();
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            eprintln!();
        }
    }
}
