// SPDX-License-Identifier: MIT OR Apache-2.0
//! Image loading for canvas previews.
//!
//! Local image files are read and decoded on a worker thread running a
//! tokio runtime, downscaled, and uploaded as egui textures on the UI
//! thread. Remote URLs are not fetched; the canvas shows a placeholder.

use image::{DynamicImage, GenericImageView};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Longest side of an uploaded preview texture
pub const MAX_PREVIEW_SIZE: u32 = 1024;

/// Load state of one media source
#[derive(Clone)]
pub enum MediaState {
    /// Being decoded
    Loading,
    /// Uploaded and ready to draw
    Ready(egui::TextureHandle),
    /// Decoding failed
    Failed(String),
    /// Not a local image; drawn as a placeholder
    Unsupported,
}

/// Errors from decoding a preview
#[derive(Debug, Clone, thiserror::Error)]
pub enum MediaError {
    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
    /// Image decoding error
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Decoded pixels ready for upload
#[derive(Debug)]
struct DecodedImage {
    source: String,
    result: Result<egui::ColorImage, MediaError>,
}

/// Texture cache keyed by the element's source string
pub struct MediaCache {
    states: RwLock<HashMap<String, MediaState>>,
    request_tx: Option<mpsc::UnboundedSender<(String, PathBuf)>>,
    result_rx: mpsc::UnboundedReceiver<DecodedImage>,
}

impl MediaCache {
    /// Create the cache and start its worker thread
    pub fn new() -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        let spawned = std::thread::Builder::new()
            .name("media-decoder".to_string())
            .spawn(move || media_worker(request_rx, result_tx));
        let request_tx = match spawned {
            Ok(_) => Some(request_tx),
            Err(e) => {
                tracing::error!("Failed to start media decoder: {}", e);
                None
            }
        };

        Self {
            states: RwLock::new(HashMap::new()),
            request_tx,
            result_rx,
        }
    }

    /// Current state of `source`, queueing a decode on first use
    pub fn get(&self, source: &str) -> MediaState {
        if let Some(state) = self.states.read().get(source) {
            return state.clone();
        }

        let state = match (local_path(source), &self.request_tx) {
            (Some(path), Some(tx)) => {
                if tx.send((source.to_string(), path)).is_ok() {
                    MediaState::Loading
                } else {
                    MediaState::Failed("media decoder stopped".to_string())
                }
            }
            (Some(_), None) => MediaState::Failed("media decoder unavailable".to_string()),
            (None, _) => MediaState::Unsupported,
        };
        self.states.write().insert(source.to_string(), state.clone());
        state
    }

    /// Upload finished decodes. Returns true if anything changed.
    pub fn update(&mut self, ctx: &egui::Context) -> bool {
        let mut changed = false;
        while let Ok(decoded) = self.result_rx.try_recv() {
            let state = match decoded.result {
                Ok(image) => {
                    tracing::debug!("Loaded preview for {}", decoded.source);
                    MediaState::Ready(ctx.load_texture(&decoded.source, image, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    tracing::warn!("Preview for {} failed: {}", decoded.source, e);
                    MediaState::Failed(e.to_string())
                }
            };
            self.states.write().insert(decoded.source, state);
            changed = true;
        }
        changed
    }

    /// Whether any decode is outstanding
    pub fn is_loading(&self) -> bool {
        self.states
            .read()
            .values()
            .any(|state| matches!(state, MediaState::Loading))
    }
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Filesystem path for a local source, `None` for remote URLs and empty strings
fn local_path(source: &str) -> Option<PathBuf> {
    let source = source.trim();
    if source.is_empty() || source.starts_with("http://") || source.starts_with("https://") {
        return None;
    }
    Some(PathBuf::from(source.strip_prefix("file://").unwrap_or(source)))
}

/// Worker thread that decodes preview requests
fn media_worker(
    mut request_rx: mpsc::UnboundedReceiver<(String, PathBuf)>,
    result_tx: mpsc::UnboundedSender<DecodedImage>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create media runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        while let Some((source, path)) = request_rx.recv().await {
            let result = decode_preview(&path, MAX_PREVIEW_SIZE).await;
            if result_tx.send(DecodedImage { source, result }).is_err() {
                break;
            }
        }
    });
}

/// Read and decode an image, downscaled to fit `max_size`
async fn decode_preview(path: &Path, max_size: u32) -> Result<egui::ColorImage, MediaError> {
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MediaError::NotFound(path.display().to_string()),
        _ => MediaError::Io(e.to_string()),
    })?;

    let img = image::load_from_memory(&data).map_err(|e| MediaError::Decode(e.to_string()))?;
    let img = fit_within(&img, max_size);
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// Resize maintaining aspect ratio
fn fit_within(img: &DynamicImage, max_size: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_size && height <= max_size {
        return img.clone();
    }
    img.resize(max_size, max_size, image::imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_local_path_detection() {
        assert_eq!(local_path("https://cdn.streali.tv/a.png"), None);
        assert_eq!(local_path("  "), None);
        assert_eq!(local_path("file:///tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(local_path("assets/a.png"), Some(PathBuf::from("assets/a.png")));
    }

    #[test]
    fn test_large_images_are_downscaled() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(2048, 512));
        let fitted = fit_within(&img, 1024);
        assert_eq!(fitted.dimensions(), (1024, 256));

        let small = DynamicImage::ImageRgba8(image::RgbaImage::new(10, 20));
        assert_eq!(fit_within(&small, 1024).dimensions(), (10, 20));
    }

    #[test]
    fn test_cache_decodes_local_file() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "logo.png", 8, 4);
        let source = path.display().to_string();

        let ctx = egui::Context::default();
        let mut cache = MediaCache::new();
        assert!(matches!(cache.get(&source), MediaState::Loading));

        for _ in 0..100 {
            if cache.update(&ctx) {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        match cache.get(&source) {
            MediaState::Ready(texture) => assert_eq!(texture.size(), [8, 4]),
            _ => panic!("expected a ready texture"),
        }
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("missing.png").display().to_string();

        let ctx = egui::Context::default();
        let mut cache = MediaCache::new();
        cache.get(&source);
        for _ in 0..100 {
            if cache.update(&ctx) {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        assert!(matches!(cache.get(&source), MediaState::Failed(_)));
        assert!(!cache.is_loading());
    }

    #[test]
    fn test_remote_urls_are_unsupported() {
        let cache = MediaCache::new();
        assert!(matches!(cache.get("https://cdn.streali.tv/a.png"), MediaState::Unsupported));
    }
}
