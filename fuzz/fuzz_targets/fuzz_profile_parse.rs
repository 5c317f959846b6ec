//! Fuzz target: JSON profile parsing
//!
//! Feeds arbitrary bytes to `parse_profile` in both display scales and
//! checks that anything accepted is a usable profile:
//! - No panics under any input
//! - Accepted profiles have strictly increasing, finite offsets
//! - `target_at` does not panic anywhere on the profile's span
//!
//! cargo fuzz run fuzz_profile_parse

#![no_main]

use kilnctl::adapters::profile_file::parse_profile;
use kilnctl::config::TempScale;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for scale in [TempScale::Celsius, TempScale::Fahrenheit] {
        let Ok(profile) = parse_profile(text, scale) else {
            continue;
        };
        let points = profile.points();
        assert!(!points.is_empty());
        for pair in points.windows(2) {
            assert!(pair[0].offset_secs < pair[1].offset_secs);
        }
        let end = profile.duration_secs();
        for i in 0..=16 {
            let t = end * i as f32 / 16.0;
            let _ = profile.target_at(t);
        }
    }
});
