//! Display that writes every accepted frame to a PNG file.

use std::path::{Path, PathBuf};

use field_engine::FieldFrame;
use render_scheduler::Renderable;
use tracing::{error, info};

pub struct PngSink {
    dir: PathBuf,
    written: usize,
    failures: usize,
    last: Option<PathBuf>,
    opacity: f32,
}

impl PngSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
            failures: 0,
            last: None,
            opacity: 1.0,
        }
    }

    /// Path of the most recently written frame.
    pub fn last_written(&self) -> Option<&Path> {
        self.last.as_deref()
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    fn write(&mut self, frame: &FieldFrame) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("field-{:04}.png", self.written + 1));
        // Files have no layer to carry opacity, so it goes into the pixels.
        let png = if self.opacity < 1.0 {
            frame.with_opacity(self.opacity).to_png()?
        } else {
            frame.to_png()?
        };
        std::fs::write(&path, &png)?;
        std::fs::copy(&path, self.dir.join("latest.png"))?;
        Ok(path)
    }
}

impl Renderable for PngSink {
    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn invalidate(&mut self) {
        let latest = self.dir.join("latest.png");
        if latest.exists() {
            if let Err(e) = std::fs::remove_file(&latest) {
                error!(error = %e, "Failed to clear latest frame");
            }
        }
        self.last = None;
    }

    fn render(&mut self, frame: &FieldFrame) {
        match self.write(frame) {
            Ok(path) => {
                self.written += 1;
                info!(
                    path = %path.display(),
                    width = frame.width,
                    height = frame.height,
                    visible = frame.visible_pixel_count(),
                    "Frame written"
                );
                self.last = Some(path);
            }
            Err(e) => {
                self.failures += 1;
                error!(error = %e, "Failed to write frame");
            }
        }
    }
}
