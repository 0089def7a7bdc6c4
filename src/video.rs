use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Frames, RgbaImage};
use tracing::warn;

use crate::background::WeatherBackground;

/// Fixed frame interval, roughly 16-17 fps. Playback speed is not tied to
/// the animation's native frame delays.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(60);

/// If playback falls this far behind (window hidden, long stall), resync
/// instead of decoding every missed frame.
const MAX_LAG: Duration = Duration::from_millis(500);

/// Looping frame source for the window background.
///
/// Owns at most one open animation at a time. Reaching the end of the
/// stream (or hitting a broken frame) rewinds to frame zero, so the
/// animation loops indefinitely.
pub struct BackgroundPlayer {
    dir: PathBuf,
    background: WeatherBackground,
    frames: Option<Frames<'static>>,
    next_frame: Instant,
}

impl BackgroundPlayer {
    /// Open the player on the default background. The default animation
    /// must exist; the seven weather-specific ones are opened on demand.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let background = WeatherBackground::Default;
        let frames = open_frames(&dir.join(background.file_name()))
            .context("failed to open the default background animation")?;
        Ok(BackgroundPlayer {
            dir,
            background,
            frames: Some(frames),
            next_frame: Instant::now(),
        })
    }

    pub fn background(&self) -> WeatherBackground {
        self.background
    }

    /// Select the background animation. Releases the open source first and
    /// starts from frame zero, even when the same background is selected
    /// again.
    pub fn set_background(&mut self, background: WeatherBackground) {
        self.background = background;
        self.frames = None;
        match open_frames(&self.source_path()) {
            Ok(frames) => self.frames = Some(frames),
            Err(err) => warn!("failed to open background animation: {err:#}"),
        }
    }

    /// Decode frames that are due at `now`. Returns the newest decoded
    /// frame (if any became due) and the time until the next one.
    pub fn poll(&mut self, now: Instant) -> (Option<RgbaImage>, Duration) {
        let mut latest = None;
        while now >= self.next_frame {
            if let Some(frame) = self.advance() {
                latest = Some(frame);
            }
            self.next_frame += FRAME_INTERVAL;
            if now.saturating_duration_since(self.next_frame) > MAX_LAG {
                self.next_frame = now + FRAME_INTERVAL;
                break;
            }
        }
        (latest, self.next_frame.saturating_duration_since(now))
    }

    /// Decode the next frame, rewinding to frame zero at end of stream.
    pub fn advance(&mut self) -> Option<RgbaImage> {
        let frames = self.frames.as_mut()?;
        if let Some(Ok(frame)) = frames.next() {
            return Some(frame.into_buffer());
        }
        // End of stream: reopen the source and continue from frame zero.
        match open_frames(&self.source_path()) {
            Ok(frames) => {
                self.frames = Some(frames);
                match self.frames.as_mut()?.next() {
                    Some(Ok(frame)) => Some(frame.into_buffer()),
                    _ => {
                        // An animation with no decodable frames; stop polling it.
                        self.frames = None;
                        None
                    }
                }
            }
            Err(err) => {
                warn!("failed to rewind background animation: {err:#}");
                self.frames = None;
                None
            }
        }
    }

    fn source_path(&self) -> PathBuf {
        self.dir.join(self.background.file_name())
    }
}

fn open_frames(path: &Path) -> Result<Frames<'static>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let decoder = GifDecoder::new(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(decoder.into_frames())
}
