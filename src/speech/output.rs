//! Playback of synthesized speech.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::{AppError, Result};

/// Destination for synthesized audio.
pub trait AudioSink: Send + Sync {
    /// Play 16-bit little-endian mono PCM, resolving when playback ends.
    fn play<'a>(&'a self, pcm: &'a [u8]) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Sink without an output device: decodes the clip and waits for as long
/// as it would take to play.
#[derive(Debug, Clone, Copy)]
pub struct PacedSink {
    sample_rate: u32,
}

impl PacedSink {
    /// Create a sink for audio at `sample_rate` Hz.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Playback length of `pcm`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedData` for a truncated sample or a zero
    /// sample rate.
    pub fn clip_duration(&self, pcm: &[u8]) -> Result<Duration> {
        if self.sample_rate == 0 {
            return Err(AppError::MalformedData("sample rate is zero".into()));
        }
        let samples = decode_pcm16(pcm)?;
        let micros = samples.len() as u64 * 1_000_000 / u64::from(self.sample_rate);
        Ok(Duration::from_micros(micros))
    }
}

impl AudioSink for PacedSink {
    fn play<'a>(&'a self, pcm: &'a [u8]) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let duration = self.clip_duration(pcm)?;
            debug!(?duration, "playing speech clip");
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }
}

/// Decode raw 16-bit little-endian samples.
///
/// # Errors
///
/// Returns `AppError::MalformedData` if `pcm` has an odd length.
pub fn decode_pcm16(pcm: &[u8]) -> Result<Vec<i16>> {
    if pcm.len() % 2 != 0 {
        return Err(AppError::MalformedData(format!(
            "pcm payload has odd length {}",
            pcm.len()
        )));
    }
    Ok(pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
