//! Note naming and time formatting helpers shared by the console and display

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name of a MIDI note number (60 = C4)
pub fn note_name(midi_number: u8) -> String {
    let octave = (midi_number / 12) as i8 - 1;
    format!("{}{}", NOTE_NAMES[(midi_number % 12) as usize], octave)
}

/// Format a whole number of seconds as `m:ss`
pub fn format_minutes_seconds(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(127), "G9");
    }

    #[test]
    fn test_minutes_seconds() {
        assert_eq!(format_minutes_seconds(0), "0:00");
        assert_eq!(format_minutes_seconds(59), "0:59");
        assert_eq!(format_minutes_seconds(151), "2:31");
    }
}
