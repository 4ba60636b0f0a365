//! Clipboard sampling.

use crate::error::{AgentError, AgentResult};
use crossclip_protocol::ClipKind;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Content read from, or written to, a clipboard.
///
/// Two snapshots are equal when both kind and payload are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Text content.
    Text(String),
    /// PNG-encoded image.
    Image(Vec<u8>),
}

impl Snapshot {
    /// Returns the clip kind of this snapshot.
    pub fn kind(&self) -> ClipKind {
        match self {
            Snapshot::Text(_) => ClipKind::Text,
            Snapshot::Image(_) => ClipKind::Image,
        }
    }

    /// Returns the payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Snapshot::Text(text) => text.len(),
            Snapshot::Image(bytes) => bytes.len(),
        }
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Access to a platform clipboard.
///
/// Implementations report missing content as `Ok(None)`; errors are for a
/// clipboard that could not be accessed at all.
pub trait ClipboardProvider: Send + Sync {
    /// Reads the clipboard image as PNG bytes.
    fn read_image(&self) -> AgentResult<Option<Vec<u8>>>;

    /// Reads the clipboard text.
    fn read_text(&self) -> AgentResult<Option<String>>;

    /// Replaces the clipboard content with text.
    fn write_text(&self, text: &str) -> AgentResult<()>;

    /// Replaces the clipboard content with a PNG image.
    fn write_image(&self, png: &[u8]) -> AgentResult<()>;
}

/// Reads and writes clipboard content through a [`ClipboardProvider`].
pub struct ClipboardSampler<C: ClipboardProvider> {
    provider: C,
}

impl<C: ClipboardProvider> ClipboardSampler<C> {
    /// Creates a sampler over a provider.
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &C {
        &self.provider
    }

    /// Samples the clipboard.
    ///
    /// Images win over text. Blank text counts as no content. Provider
    /// failures are logged and reported as no content.
    pub fn sample(&self) -> Option<Snapshot> {
        match self.provider.read_image() {
            Ok(Some(png)) if !png.is_empty() => return Some(Snapshot::Image(png)),
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Clipboard image read failed");
                return None;
            }
        }

        match self.provider.read_text() {
            Ok(Some(text)) if !text.trim().is_empty() => Some(Snapshot::Text(text)),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Clipboard text read failed");
                None
            }
        }
    }

    /// Writes a snapshot to the clipboard and returns what the clipboard now holds.
    ///
    /// Platforms re-encode images, so an applied image is read back to get
    /// the bytes later samples will see. If the read-back fails the applied
    /// bytes are returned.
    pub fn apply(&self, snapshot: &Snapshot) -> AgentResult<Snapshot> {
        match snapshot {
            Snapshot::Text(text) => {
                self.provider.write_text(text)?;
                Ok(snapshot.clone())
            }
            Snapshot::Image(png) => {
                self.provider.write_image(png)?;
                match self.provider.read_image() {
                    Ok(Some(read_back)) if !read_back.is_empty() => Ok(Snapshot::Image(read_back)),
                    _ => Ok(snapshot.clone()),
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct MemoryContent {
    text: Option<String>,
    image: Option<Vec<u8>>,
}

/// An in-process clipboard for tests and headless agents.
///
/// Writing one kind of content replaces the other, as platform clipboards do.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<MemoryContent>,
    failing: AtomicBool,
}

impl MemoryClipboard {
    /// Creates an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets text content, as a user copy would.
    pub fn set_text(&self, text: impl Into<String>) {
        let mut content = self.content.lock();
        content.text = Some(text.into());
        content.image = None;
    }

    /// Sets image content, as a user copy would.
    pub fn set_image(&self, png: impl Into<Vec<u8>>) {
        let mut content = self.content.lock();
        content.image = Some(png.into());
        content.text = None;
    }

    /// Empties the clipboard.
    pub fn clear(&self) {
        *self.content.lock() = MemoryContent::default();
    }

    /// Returns the current text.
    pub fn text(&self) -> Option<String> {
        self.content.lock().text.clone()
    }

    /// Returns the current image.
    pub fn image(&self) -> Option<Vec<u8>> {
        self.content.lock().image.clone()
    }

    /// Makes every access fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AgentResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AgentError::Clipboard("clipboard unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn read_image(&self) -> AgentResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.image())
    }

    fn read_text(&self) -> AgentResult<Option<String>> {
        self.check()?;
        Ok(self.text())
    }

    fn write_text(&self, text: &str) -> AgentResult<()> {
        self.check()?;
        self.set_text(text);
        Ok(())
    }

    fn write_image(&self, png: &[u8]) -> AgentResult<()> {
        self.check()?;
        self.set_image(png);
        Ok(())
    }
}

impl<C: ClipboardProvider> ClipboardProvider for std::sync::Arc<C> {
    fn read_image(&self) -> AgentResult<Option<Vec<u8>>> {
        (**self).read_image()
    }

    fn read_text(&self) -> AgentResult<Option<String>> {
        (**self).read_text()
    }

    fn write_text(&self, text: &str) -> AgentResult<()> {
        (**self).write_text(text)
    }

    fn write_image(&self, png: &[u8]) -> AgentResult<()> {
        (**self).write_image(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_clipboard_samples_nothing() {
        let sampler = ClipboardSampler::new(MemoryClipboard::new());
        assert_eq!(sampler.sample(), None);
    }

    #[test]
    fn samples_text() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let sampler = ClipboardSampler::new(Arc::clone(&clipboard));

        clipboard.set_text("hello");
        assert_eq!(sampler.sample(), Some(Snapshot::Text("hello".into())));
    }

    #[test]
    fn blank_text_is_no_content() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let sampler = ClipboardSampler::new(Arc::clone(&clipboard));

        clipboard.set_text("  \n\t");
        assert_eq!(sampler.sample(), None);
    }

    #[test]
    fn image_wins_over_text() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let sampler = ClipboardSampler::new(Arc::clone(&clipboard));

        // Both present at once, as some platforms expose
        {
            let mut content = clipboard.content.lock();
            content.text = Some("caption".into());
            content.image = Some(vec![1, 2, 3]);
        }
        assert_eq!(sampler.sample(), Some(Snapshot::Image(vec![1, 2, 3])));
    }

    #[test]
    fn provider_failure_is_swallowed() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let sampler = ClipboardSampler::new(Arc::clone(&clipboard));

        clipboard.set_text("hello");
        clipboard.set_failing(true);
        assert_eq!(sampler.sample(), None);

        clipboard.set_failing(false);
        assert!(sampler.sample().is_some());
    }

    #[test]
    fn apply_writes_clipboard() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let sampler = ClipboardSampler::new(Arc::clone(&clipboard));

        let applied = sampler.apply(&Snapshot::Text("remote".into())).unwrap();
        assert_eq!(applied, Snapshot::Text("remote".into()));
        assert_eq!(clipboard.text().as_deref(), Some("remote"));

        let applied = sampler.apply(&Snapshot::Image(vec![9, 9])).unwrap();
        assert_eq!(applied, Snapshot::Image(vec![9, 9]));
        assert_eq!(clipboard.image(), Some(vec![9, 9]));
        assert_eq!(clipboard.text(), None);
    }

    #[test]
    fn apply_failure_is_reported() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let sampler = ClipboardSampler::new(Arc::clone(&clipboard));
        clipboard.set_failing(true);
        assert!(matches!(
            sampler.apply(&Snapshot::Text("x".into())),
            Err(AgentError::Clipboard(_))
        ));
    }

    #[test]
    fn snapshot_kind() {
        assert_eq!(Snapshot::Text("a".into()).kind(), ClipKind::Text);
        assert_eq!(Snapshot::Image(vec![]).kind(), ClipKind::Image);
        assert_ne!(Snapshot::Text("a".into()), Snapshot::Image(b"a".to_vec()));
    }
}
