#![forbid(unsafe_code)]

//! Property-based checks for mock EPG generation.
//!
//! # Invariants
//!
//! 1. **Deterministic**: one config always yields the same source.
//! 2. **Back-to-back**: each channel starts at midnight and has no gaps.
//! 3. **Within the day**: every program ends before the next midnight.
//! 4. **Duration range**: every program lasts `[min, max]` minutes.
//! 5. **Identity**: program ids are `channel * 100 + index`, titles `Program {index}`.

use epg_core::time::MILLIS_PER_DAY;
use epg_harness::MockEpgConfig;
use proptest::prelude::*;

fn config() -> impl Strategy<Value = MockEpgConfig> {
    (1u32..6, any::<u64>(), 5i64..60, 0i64..120).prop_map(|(channels, seed, lo, span)| {
        MockEpgConfig::default()
            .with_channels(channels)
            .with_seed(seed)
            .with_durations(lo, lo + span)
    })
}

proptest! {
    #[test]
    fn generation_is_deterministic(config in config()) {
        prop_assert_eq!(config.generate(), config.generate());
    }

    #[test]
    fn channels_are_filled_back_to_back(config in config()) {
        let source = config.generate();
        let day = source.day(config.date).unwrap();
        let start = config.date.day_start();
        let next_day = start.saturating_add_millis(MILLIS_PER_DAY);
        prop_assert_eq!(day.channels.len(), config.channel_count as usize);

        for channel in &day.channels {
            prop_assert!(!channel.items.is_empty());
            prop_assert_eq!(channel.items[0].start, start);
            for pair in channel.items.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            for (i, p) in channel.items.iter().enumerate() {
                let minutes = p.duration_minutes();
                prop_assert!(p.end < next_day);
                prop_assert!(minutes >= config.min_minutes as f64);
                prop_assert!(minutes <= config.max_minutes as f64);
                prop_assert_eq!(p.channel_id, channel.channel_id);
                prop_assert_eq!(p.id, u64::from(channel.channel_id) * 100 + i as u64 + 1);
                prop_assert_eq!(&p.title, &format!("Program {}", i + 1));
            }
        }
    }
}
