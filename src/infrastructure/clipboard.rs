use std::fmt;

use arboard::Clipboard;

use crate::domain::{ClipboardBackend, ClipboardPayload, DomainError, DomainResult};

/// The desktop clipboard, opened on first use.
///
/// Opening can fail on headless sessions; every call retries so a clipboard
/// that appears later is picked up.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("connected", &self.inner.is_some())
            .finish()
    }
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn connect(&mut self) -> DomainResult<&mut Clipboard> {
        if self.inner.is_none() {
            let clipboard = Clipboard::new().map_err(|e| DomainError::Clipboard(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| DomainError::Clipboard("not connected".to_string()))
    }
}

impl ClipboardBackend for SystemClipboard {
    fn write(&mut self, payload: &ClipboardPayload) -> DomainResult<()> {
        let clipboard = self.connect()?;
        clipboard
            .set_html(payload.html.as_str(), Some(payload.text.as_str()))
            .or_else(|_| clipboard.set_text(payload.text.as_str()))
            .map_err(|e| DomainError::Clipboard(e.to_string()))
    }

    fn read_text(&mut self) -> DomainResult<Option<String>> {
        let clipboard = self.connect()?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(DomainError::Clipboard(e.to_string())),
        }
    }
}
