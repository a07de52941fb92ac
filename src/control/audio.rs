//! Audio peak extraction and peak-to-colour mapping.
//!
//! The peak of a frame is the maximum absolute sample amplitude.  Colour
//! selection walks an ordered band table from the loudest band down and
//! takes the first band whose threshold the peak reaches; anything below
//! the quietest band maps to black (LED dark).
//!
//! Band tables are per board revision — Rev2's microphone sits closer to
//! the case opening and picks up more energy at the same sound level, so
//! its lower bands start earlier.

use super::Rgb;

/// One row of the peak-to-colour table.
#[derive(Debug, Clone, Copy)]
pub struct AudioBand {
    /// Minimum peak amplitude for this band.
    pub threshold: u16,
    /// Colour shown while the peak is in this band.
    pub color: Rgb,
}

pub const BLACK: Rgb = (0, 0, 0);
pub const RED: Rgb = (255, 0, 0);
pub const MAGENTA: Rgb = (255, 0, 255);
pub const ORANGE: Rgb = (255, 96, 0);
pub const YELLOW: Rgb = (255, 220, 0);
pub const GREEN: Rgb = (0, 255, 0);
pub const BLUE: Rgb = (0, 64, 255);

/// Rev1 bands, thresholds strictly descending.
pub const REV1_AUDIO_BANDS: &[AudioBand] = &[
    AudioBand { threshold: 600, color: RED },
    AudioBand { threshold: 440, color: MAGENTA },
    AudioBand { threshold: 300, color: ORANGE },
    AudioBand { threshold: 180, color: YELLOW },
    AudioBand { threshold: 90, color: GREEN },
    AudioBand { threshold: 40, color: BLUE },
];

/// Rev2 bands — same ladder, lower entry points.
pub const REV2_AUDIO_BANDS: &[AudioBand] = &[
    AudioBand { threshold: 600, color: RED },
    AudioBand { threshold: 400, color: MAGENTA },
    AudioBand { threshold: 260, color: ORANGE },
    AudioBand { threshold: 150, color: YELLOW },
    AudioBand { threshold: 70, color: GREEN },
    AudioBand { threshold: 30, color: BLUE },
];

/// Max absolute amplitude over a frame.  An empty frame peaks at zero.
pub fn peak_amplitude(samples: &[i16]) -> u16 {
    samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
}

/// First band (loudest-first) whose threshold the peak reaches; black
/// below the quietest band.
pub fn color_for_peak(bands: &[AudioBand], peak: u16) -> Rgb {
    bands
        .iter()
        .find(|band| peak >= band.threshold)
        .map_or(BLACK, |band| band.color)
}

/// The quietest threshold in a band table — peaks below it count as
/// silence for the heartbeat idle check.
pub fn floor_threshold(bands: &[AudioBand]) -> u16 {
    bands.last().map_or(0, |band| band.threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_peaks_at_zero() {
        assert_eq!(peak_amplitude(&[]), 0);
    }

    #[test]
    fn peak_is_max_absolute() {
        assert_eq!(peak_amplitude(&[3, -7, 5]), 7);
        assert_eq!(peak_amplitude(&[0, 0, 0]), 0);
    }

    #[test]
    fn peak_handles_i16_min() {
        assert_eq!(peak_amplitude(&[i16::MIN]), 32_768);
    }

    #[test]
    fn zero_peak_maps_to_black() {
        assert_eq!(color_for_peak(REV1_AUDIO_BANDS, 0), BLACK);
        assert_eq!(color_for_peak(REV2_AUDIO_BANDS, 0), BLACK);
    }

    #[test]
    fn loud_peak_maps_to_red() {
        // 650 reaches the 600 band before any lower one.
        assert_eq!(color_for_peak(REV1_AUDIO_BANDS, 650), RED);
        assert_eq!(color_for_peak(REV2_AUDIO_BANDS, 650), RED);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert_eq!(color_for_peak(REV1_AUDIO_BANDS, 600), RED);
        assert_eq!(color_for_peak(REV1_AUDIO_BANDS, 599), MAGENTA);
        assert_eq!(color_for_peak(REV1_AUDIO_BANDS, 40), BLUE);
        assert_eq!(color_for_peak(REV1_AUDIO_BANDS, 39), BLACK);
    }

    #[test]
    fn floor_is_last_band() {
        assert_eq!(floor_threshold(REV1_AUDIO_BANDS), 40);
        assert_eq!(floor_threshold(REV2_AUDIO_BANDS), 30);
        assert_eq!(floor_threshold(&[]), 0);
    }
}
