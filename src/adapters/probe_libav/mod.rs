// Probe LibAV adapter - Frame rate discovery using libav

use std::path::Path;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::error::{LabelerError, LabelerResult};
use crate::ports::*;

/// LibAV-based frame rate probe
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg_next::init().map_err(|e| DomainError::Probe(format!("Failed to initialize FFmpeg: {}", e)))?;
        Ok(Self)
    }

    /// Average frame rate of the best video stream
    fn read_frame_rate(path: &Path) -> LabelerResult<f64> {
        let input_ctx = ffmpeg_next::format::input(&path)?;
        let stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| {
                LabelerError::Domain(DomainError::Probe(format!(
                    "{} has no video stream",
                    path.display()
                )))
            })?;

        let avg = stream.avg_frame_rate();
        let rate = if avg.denominator() != 0 && avg.numerator() > 0 {
            avg
        } else {
            stream.rate()
        };
        if rate.denominator() == 0 {
            return Err(LabelerError::Domain(DomainError::Probe(format!(
                "{} does not report a frame rate",
                path.display()
            ))));
        }

        Ok(rate.numerator() as f64 / rate.denominator() as f64)
    }
}

impl VideoProbePort for ProbeLibavAdapter {
    fn probe_frame_rate(&self, path: &Path) -> Result<FrameRate, DomainError> {
        if !path.exists() {
            return Err(DomainError::Probe(format!("File does not exist: {}", path.display())));
        }

        let measured = Self::read_frame_rate(path)?;
        // Stored frame indices were computed with whole frames per second
        let fps = measured.trunc();
        info!(path = %path.display(), measured, fps, "Video frame rate probed");

        FrameRate::new(fps)
            .map_err(|_| DomainError::Probe(format!("Unusable frame rate {} in {}", measured, path.display())))
    }
}

/// Probe that always answers with a frame rate given up front
pub struct FixedRateProbe {
    rate: FrameRate,
}

impl FixedRateProbe {
    pub fn new(rate: FrameRate) -> Self {
        Self { rate }
    }
}

impl VideoProbePort for FixedRateProbe {
    fn probe_frame_rate(&self, _path: &Path) -> Result<FrameRate, DomainError> {
        Ok(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rate_probe_ignores_path() {
        let probe = FixedRateProbe::new(FrameRate::new(25.0).unwrap());
        let rate = probe.probe_frame_rate(Path::new("missing.ts")).unwrap();
        assert_eq!(rate.fps(), 25.0);
    }

    #[test]
    fn test_missing_file_is_a_probe_error() {
        let probe = ProbeLibavAdapter::new().unwrap();
        let err = probe
            .probe_frame_rate(Path::new("/nonexistent/full_video.ts"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Probe(_)));
    }
}
