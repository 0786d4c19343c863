//! Frame-quantized timeline arithmetic.
//!
//! The host stores positions in whole microseconds, which 30 fps does not
//! divide. Frames are grouped into three-frame cycles of exactly 100 ms so
//! the rounding error never accumulates past one cycle.

use serde::Serialize;

use crate::{
    error::{DocumentError, DocumentResult},
    model::DEFAULT_FPS,
};

pub const CYCLE_MICROSECONDS: u64 = 100_000;
pub const FRAMES_PER_CYCLE: u64 = 3;
const REMAINDER_MICROSECONDS: [u64; 3] = [0, 33_333, 66_666];
const MICROSECONDS_PER_SECOND: u128 = 1_000_000;

// Probe durations carry at most microsecond precision, so anything this
// close to a frame boundary is float noise.
const FRAME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimelineMetrics {
    pub total_frames: u64,
    pub timeline_duration_us: u64,
    pub remaining_frames: u64,
}

/// Converts a real duration into its compensated timeline duration.
///
/// Negative, infinite and NaN inputs, and durations too long for `u64`
/// microseconds, fail with [`DocumentError::InvalidDuration`]; callers that only want the zero
/// fallback can use `unwrap_or_default()`.
pub fn timeline_duration(real_seconds: f64, fps: u32) -> DocumentResult<TimelineMetrics> {
    if !real_seconds.is_finite() || real_seconds < 0.0 {
        return Err(DocumentError::InvalidDuration(format!(
            "{real_seconds} is not a non-negative number of seconds"
        )));
    }
    if fps == 0 {
        return Err(DocumentError::InvalidDuration(
            "frame rate must be positive".to_string(),
        ));
    }
    if real_seconds == 0.0 {
        return Ok(TimelineMetrics::default());
    }

    let frames = (real_seconds * f64::from(fps) - FRAME_EPSILON).ceil().max(0.0);
    if frames >= u64::MAX as f64 {
        return Err(too_long(real_seconds));
    }
    metrics_from_frames(frames as u64).map_err(|_| too_long(real_seconds))
}

/// Same as [`timeline_duration`] at the default 30 fps.
pub fn timeline_duration_default(real_seconds: f64) -> DocumentResult<TimelineMetrics> {
    timeline_duration(real_seconds, DEFAULT_FPS)
}

/// Metrics for a whole number of frames. Fails when the duration does not
/// fit in `u64` microseconds.
pub fn metrics_from_frames(total_frames: u64) -> DocumentResult<TimelineMetrics> {
    let cycles = total_frames / FRAMES_PER_CYCLE;
    let remainder = total_frames % FRAMES_PER_CYCLE;
    let timeline_duration_us = cycles
        .checked_mul(CYCLE_MICROSECONDS)
        .and_then(|whole| whole.checked_add(REMAINDER_MICROSECONDS[remainder as usize]))
        .ok_or_else(|| {
            DocumentError::InvalidDuration(format!(
                "{total_frames} frames overflow the microsecond timeline"
            ))
        })?;
    Ok(TimelineMetrics {
        total_frames,
        timeline_duration_us,
        remaining_frames: remainder,
    })
}

fn too_long(real_seconds: f64) -> DocumentError {
    DocumentError::InvalidDuration(format!(
        "{real_seconds} seconds does not fit on the timeline"
    ))
}

/// Number of frames needed to cover `microseconds`, rounded up.
#[must_use]
pub fn frames_in(microseconds: u64, fps: u32) -> u64 {
    let scaled = u128::from(microseconds) * u128::from(fps);
    u64::try_from(scaled.div_ceil(MICROSECONDS_PER_SECOND)).unwrap_or(u64::MAX)
}

/// Frames left over after the last full cycle covering `microseconds`.
#[must_use]
pub fn remaining_frames(microseconds: u64, fps: u32) -> u64 {
    frames_in(microseconds, fps) % FRAMES_PER_CYCLE
}

/// One-microsecond pad for a segment starting at `start` whose source spans
/// `source_duration`, applied once the two leftovers complete a cycle.
#[must_use]
pub fn boundary_pad(start: u64, source_duration: u64, fps: u32) -> u64 {
    let carried = remaining_frames(start, fps) + remaining_frames(source_duration, fps);
    u64::from(carried >= FRAMES_PER_CYCLE)
}

#[must_use]
pub fn microseconds_to_seconds(microseconds: u64) -> f64 {
    microseconds as f64 / 1_000_000.0
}
