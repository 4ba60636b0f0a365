//! System clipboard through `arboard`.
//!
//! arboard exchanges images as raw RGBA; the agent works in PNG, so images
//! are converted with the `image` crate on the way in and out.

use crate::error::{AgentError, AgentResult};
use crate::sampler::ClipboardProvider;
use arboard::{Clipboard, ImageData};
use image::{DynamicImage, ImageFormat, RgbaImage};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::io::Cursor;

/// The platform clipboard.
///
/// Holds one arboard handle for the agent's lifetime; on X11 the handle must
/// stay alive for written content to remain available.
pub struct SystemClipboard {
    inner: Mutex<Clipboard>,
}

impl SystemClipboard {
    /// Opens the platform clipboard.
    pub fn new() -> AgentResult<Self> {
        let clipboard = Clipboard::new().map_err(clipboard_error)?;
        Ok(Self {
            inner: Mutex::new(clipboard),
        })
    }
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

fn clipboard_error(e: arboard::Error) -> AgentError {
    AgentError::Clipboard(e.to_string())
}

fn image_error(e: image::ImageError) -> AgentError {
    AgentError::Clipboard(format!("image conversion failed: {e}"))
}

/// Encodes raw RGBA clipboard data as PNG.
fn rgba_to_png(data: ImageData<'_>) -> AgentResult<Vec<u8>> {
    let width = u32::try_from(data.width)
        .map_err(|_| AgentError::Clipboard("image too wide".into()))?;
    let height = u32::try_from(data.height)
        .map_err(|_| AgentError::Clipboard("image too tall".into()))?;
    let buffer = RgbaImage::from_raw(width, height, data.bytes.into_owned())
        .ok_or_else(|| AgentError::Clipboard("image buffer size mismatch".into()))?;

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(image_error)?;
    Ok(png)
}

/// Decodes PNG into raw RGBA clipboard data.
fn png_to_rgba(png: &[u8]) -> AgentResult<ImageData<'static>> {
    let rgba = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(image_error)?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageData {
        width: width as usize,
        height: height as usize,
        bytes: Cow::Owned(rgba.into_raw()),
    })
}

impl ClipboardProvider for SystemClipboard {
    fn read_image(&self) -> AgentResult<Option<Vec<u8>>> {
        let image = self.inner.lock().get_image();
        match image {
            Ok(data) => rgba_to_png(data).map(Some),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(clipboard_error(e)),
        }
    }

    fn read_text(&self) -> AgentResult<Option<String>> {
        match self.inner.lock().get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(clipboard_error(e)),
        }
    }

    fn write_text(&self, text: &str) -> AgentResult<()> {
        self.inner
            .lock()
            .set_text(text.to_owned())
            .map_err(clipboard_error)
    }

    fn write_image(&self, png: &[u8]) -> AgentResult<()> {
        let data = png_to_rgba(png)?;
        self.inner.lock().set_image(data).map_err(clipboard_error)
    }
}
