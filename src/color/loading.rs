use std::{
    io::{IsTerminal, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

use ansi_term::Style;
use jrequest::LoadingIndicator;
use tokio::sync::Notify;

/// Loading tip on stderr, cleared on hide.
#[derive(Default)]
pub struct TerminalLoading {
    visible: AtomicBool,
    hidden: Notify,
}

impl TerminalLoading {
    /// Waits for a pending hide, so the tip is never cut short by exiting.
    pub async fn wait_hidden(&self) {
        while self.visible.load(Ordering::SeqCst) {
            self.hidden.notified().await;
        }
    }
}

impl LoadingIndicator for TerminalLoading {
    fn show_loading(&self, title: &str) {
        self.visible.store(true, Ordering::SeqCst);
        if stderr().is_terminal() {
            eprint!("{}", Style::new().dimmed().paint(format!("{}...", title)));
        } else {
            eprintln!("{}...", title);
        }
    }

    fn hide_loading(&self) {
        if self.visible.swap(false, Ordering::SeqCst) && stderr().is_terminal() {
            eprint!("\r\x1b[2K");
        }
        self.hidden.notify_one();
    }
}
