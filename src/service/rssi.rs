//! RSSI smoothing and indicator hysteresis.
//!
//! The running average is a fixed-point exponential moving average with
//! weight 0.4 on the new sample:
//!
//! ```text
//! avg' = (raw * 4 + avg * 6) / 10
//! ```
//!
//! Division truncates toward zero. Keep it that way: the recurrence is
//! compared step by step against recorded sequences.

use crate::config::{
    INDICATOR_OFF, INDICATOR_ON, RSSI_AVERAGE_SEED, RSSI_HIGH_THRESHOLD, RSSI_LOW_THRESHOLD,
};

/// Output driven from the smoothed RSSI (e.g. a PWM channel).
pub trait Actuator {
    /// Current output level.
    fn level(&self) -> u8;
    fn set_level(&mut self, level: u8);
}

/// One step of the fixed-point moving average.
pub const fn smooth(average: i8, raw: i8) -> i8 {
    // Convex combination of two i8 values, always within i8 range.
    ((raw as i16 * 4 + average as i16 * 6) / 10) as i8
}

/// Indicator decision for a smoothed value and the current output.
///
/// Returns the new level, or `None` to hold. Between the thresholds the
/// output never changes.
pub const fn indicator_step(average: i8, current: u8) -> Option<u8> {
    if average > RSSI_HIGH_THRESHOLD && current < 1 {
        Some(INDICATOR_ON)
    } else if average < RSSI_LOW_THRESHOLD && current > 0 {
        Some(INDICATOR_OFF)
    } else {
        None
    }
}

/// Smoothed RSSI state. Lives as long as the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiFilter {
    average: i8,
}

impl RssiFilter {
    pub const fn new() -> Self {
        Self::seeded(RSSI_AVERAGE_SEED)
    }

    pub const fn seeded(average: i8) -> Self {
        Self { average }
    }

    /// Fold a raw sample into the average and return the new average.
    pub fn update(&mut self, raw: i8) -> i8 {
        self.average = smooth(self.average, raw);
        self.average
    }

    pub fn average(&self) -> i8 {
        self.average
    }

    /// Apply the hysteresis policy to `actuator`. Returns `true` if the
    /// output changed.
    pub fn drive(&self, actuator: &mut dyn Actuator) -> bool {
        match indicator_step(self.average, actuator.level()) {
            Some(level) => {
                info!("indicator {} (avg {})", level, self.average);
                actuator.set_level(level);
                true
            }
            None => false,
        }
    }
}

impl Default for RssiFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::RecordingActuator;

    /// Reference recurrence, written out independently.
    fn reference(avg: i32, raw: i32) -> i32 {
        (raw * 4 + avg * 6) / 10
    }

    #[test]
    fn smoothing_matches_recurrence_and_converges() {
        let mut filter = RssiFilter::new();
        let mut expected = -90i32;
        let mut previous = filter.average();

        let samples = [-90i8, -60, -60, -60, -60, -60, -60, -60, -60, -60, -60, -60];
        for raw in samples {
            expected = reference(expected, raw as i32);
            let avg = filter.update(raw);
            assert_eq!(avg as i32, expected);
            assert!(avg >= previous);
            assert!(avg <= -60);
            previous = avg;
        }
        // Truncation toward zero lets the average settle on -60 exactly.
        assert_eq!(filter.average(), -60);
    }

    #[test]
    fn truncation_is_toward_zero() {
        // (-61*4 + -60*6) / 10 = -604 / 10 = -60.4 -> -60
        assert_eq!(smooth(-60, -61), -60);
        // (-1*4 + 0*6) / 10 = -0.4 -> 0
        assert_eq!(smooth(0, -1), 0);
        // (1*4 + 0*6) / 10 = 0.4 -> 0
        assert_eq!(smooth(0, 1), 0);
        // (-1*4 + -1*6) / 10 = -1
        assert_eq!(smooth(-1, -1), -1);
    }

    #[test]
    fn extremes_stay_in_range() {
        assert_eq!(smooth(i8::MIN, i8::MIN), i8::MIN);
        assert_eq!(smooth(i8::MAX, i8::MAX), i8::MAX);
        assert_eq!(smooth(i8::MIN, i8::MAX), -26);
    }

    #[test]
    fn indicator_step_thresholds() {
        assert_eq!(indicator_step(-69, 0), Some(INDICATOR_ON));
        assert_eq!(indicator_step(-70, 0), None);
        assert_eq!(indicator_step(-69, 255), None);
        assert_eq!(indicator_step(-81, 255), Some(INDICATOR_OFF));
        assert_eq!(indicator_step(-80, 255), None);
        assert_eq!(indicator_step(-81, 0), None);
    }

    #[test]
    fn hysteresis_toggles_once_each_way() {
        let mut filter = RssiFilter::seeded(-90);
        let mut out = RecordingActuator::default();

        // Raise the average to -69.
        let mut guard = 0;
        while filter.average() < -69 {
            filter.update(-69);
            filter.drive(&mut out);
            guard += 1;
            assert!(guard < 100);
        }
        assert_eq!(filter.average(), -69);
        filter.drive(&mut out);
        assert_eq!(out.level, INDICATOR_ON);
        assert_eq!(out.changes, 1);

        // Drop the average to -81: -69 -> -77 -> -81.
        for raw in [-90, -88] {
            filter.update(raw);
            filter.drive(&mut out);
        }
        assert_eq!(filter.average(), -81);
        filter.drive(&mut out);
        assert_eq!(out.level, INDICATOR_OFF);
        assert_eq!(out.changes, 2);
    }

    #[test]
    fn hold_band_never_toggles() {
        for start in [INDICATOR_OFF, INDICATOR_ON] {
            let mut filter = RssiFilter::seeded(-76);
            let mut out = RecordingActuator {
                level: start,
                ..Default::default()
            };
            for i in 0..200 {
                let raw = if i % 2 == 0 { -75 } else { -78 };
                filter.update(raw);
                assert!((-78..=-75).contains(&filter.average()));
                filter.drive(&mut out);
            }
            assert_eq!(out.changes, 0);
            assert_eq!(out.level, start);
        }
    }
}
