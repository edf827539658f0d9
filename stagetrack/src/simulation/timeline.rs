//! Fixed-offset timelines.

use crate::config::TrackerConfig;
use crate::errors::ConfigError;
use std::time::Duration;

/// The delay of every step relative to the trigger, in step order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    offsets: Vec<Duration>,
}

impl Timeline {
    /// Creates a timeline from explicit offsets.
    ///
    /// # Errors
    ///
    /// Returns an error if the offsets are not in non-decreasing order.
    pub fn new(offsets: Vec<Duration>) -> Result<Self, ConfigError> {
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(ConfigError::invalid(
                "timeline",
                "step offsets must be in non-decreasing order",
            ));
        }
        Ok(Self { offsets })
    }

    /// Creates `steps` offsets spaced `interval` apart, starting at `initial`.
    #[must_use]
    pub fn fixed_interval(steps: usize, initial: Duration, interval: Duration) -> Self {
        let offsets = (0..steps)
            .map(|i| initial + interval * u32::try_from(i).unwrap_or(u32::MAX))
            .collect();
        Self { offsets }
    }

    /// Creates a timeline for `steps` steps from configuration.
    #[must_use]
    pub fn from_config(config: &TrackerConfig, steps: usize) -> Self {
        Self::fixed_interval(steps, config.initial_delay(), config.step_interval())
    }

    /// The four-step timeline of the reference pipeline: +0, +1s, +2s, +3s.
    #[must_use]
    pub fn reference() -> Self {
        Self::fixed_interval(4, Duration::ZERO, Duration::from_millis(1000))
    }

    /// Returns the offsets.
    #[must_use]
    pub fn offsets(&self) -> &[Duration] {
        &self.offsets
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if the timeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the offset of the final step.
    #[must_use]
    pub fn last_offset(&self) -> Option<Duration> {
        self.offsets.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_offsets() {
        let timeline = Timeline::reference();
        let ms: Vec<u128> = timeline.offsets().iter().map(Duration::as_millis).collect();
        assert_eq!(ms, vec![0, 1000, 2000, 3000]);
        assert_eq!(timeline.last_offset(), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_from_config_with_initial_delay() {
        let config = TrackerConfig::new()
            .with_initial_delay_ms(500)
            .with_step_interval_ms(250);
        let timeline = Timeline::from_config(&config, 3);
        let ms: Vec<u128> = timeline.offsets().iter().map(Duration::as_millis).collect();
        assert_eq!(ms, vec![500, 750, 1000]);
    }

    #[test]
    fn test_new_rejects_decreasing_offsets() {
        let result = Timeline::new(vec![Duration::from_millis(10), Duration::from_millis(5)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_accepts_equal_offsets() {
        let timeline = Timeline::new(vec![Duration::ZERO, Duration::ZERO]).unwrap();
        assert_eq!(timeline.len(), 2);
    }
}
