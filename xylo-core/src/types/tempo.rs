//! Allowed tempo table and quantization
//!
//! Tracks and the tempo knob only ever use values from [`TEMPO_LIST`]. A raw
//! file tempo is snapped down to the closest allowed value; tempos outside
//! the table are clamped to its bounds.

/// Allowed tempos, in beats per minute, ascending
pub const TEMPO_LIST: [u32; 43] = [
    30, 32, 34, 36, 38, 40, 42, 44, 46, 48, 50, 52, 54, 56, 58, 60, 63, 66, 69, 72, 76, 80, 84,
    88, 92, 96, 100, 104, 108, 112, 116, 120, 126, 132, 138, 144, 152, 160, 168, 176, 184, 192,
    200,
];

/// MIDI default tempo when a file never sets one (120 BPM)
pub const DEFAULT_MICROS_PER_BEAT: u32 = 500_000;

/// Whole beats per minute for a `set_tempo` value, truncated
pub fn bpm_from_micros_per_beat(micros_per_beat: u32) -> u32 {
    if micros_per_beat == 0 {
        return 0;
    }
    60_000_000 / micros_per_beat
}

/// Snap a raw BPM onto the allowed tempo table.
///
/// Returns 0 for a raw tempo of 0 (no usable tempo). Values below the table
/// clamp to its first entry, values above clamp to its last.
pub fn quantize_bpm(raw_bpm: u32) -> u32 {
    if raw_bpm == 0 {
        return 0;
    }
    let first = TEMPO_LIST[0];
    let last = TEMPO_LIST[TEMPO_LIST.len() - 1];
    if raw_bpm <= first {
        return first;
    }
    if raw_bpm >= last {
        return last;
    }
    TEMPO_LIST
        .iter()
        .copied()
        .take_while(|&allowed| allowed <= raw_bpm)
        .last()
        .unwrap_or(first)
}

/// Ratio applied to rest durations: native tempo over selected tempo.
///
/// A selected tempo of 0 is treated as "no change" (ratio 1.0).
pub fn tempo_ratio(track_bpm: u32, play_bpm: u32) -> f64 {
    if play_bpm == 0 || track_bpm == 0 {
        return 1.0;
    }
    track_bpm as f64 / play_bpm as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_ascending() {
        assert!(TEMPO_LIST.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bpm_conversion() {
        assert_eq!(bpm_from_micros_per_beat(500_000), 120);
        assert_eq!(bpm_from_micros_per_beat(1_000_000), 60);
        // 60_000_000 / 652_174 = 91.99...
        assert_eq!(bpm_from_micros_per_beat(652_174), 91);
        assert_eq!(bpm_from_micros_per_beat(0), 0);
    }

    #[test]
    fn test_quantize_exact_and_between() {
        assert_eq!(quantize_bpm(120), 120);
        assert_eq!(quantize_bpm(90), 88);
        assert_eq!(quantize_bpm(91), 88);
        assert_eq!(quantize_bpm(62), 60);
        assert_eq!(quantize_bpm(199), 192);
    }

    #[test]
    fn test_quantize_clamps_out_of_table() {
        assert_eq!(quantize_bpm(0), 0);
        assert_eq!(quantize_bpm(12), 30);
        assert_eq!(quantize_bpm(300), 200);
    }

    #[test]
    fn test_tempo_ratio() {
        assert_eq!(tempo_ratio(120, 60), 2.0);
        assert_eq!(tempo_ratio(60, 120), 0.5);
        assert_eq!(tempo_ratio(96, 96), 1.0);
        assert_eq!(tempo_ratio(96, 0), 1.0);
    }
}
