//! Automatable Parameters
//!
//! An `AudioParam` holds an intrinsic value plus a timeline of scheduled
//! changes. Only instantaneous sets and linear ramps are supported, which is
//! all the ambient player needs for click-free fades.

/// One scheduled change on a parameter timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`
    SetValue { time: f64, value: f32 },
    /// Arrive at `value` at `time`, interpolating linearly from the previous event
    LinearRamp { time: f64, value: f32 },
}

impl AutomationEvent {
    /// Time at which the event completes
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } | AutomationEvent::LinearRamp { time, .. } => {
                time
            }
        }
    }

    /// Value the parameter holds once the event has completed
    pub fn value(&self) -> f32 {
        match *self {
            AutomationEvent::SetValue { value, .. } | AutomationEvent::LinearRamp { value, .. } => {
                value
            }
        }
    }
}

/// A control value with a sorted automation timeline
///
/// # Example
/// ```
/// use aura::engine::AudioParam;
///
/// let mut gain = AudioParam::new(0.0);
/// gain.set_value_at_time(0.0, 1.0);
/// gain.linear_ramp_to_value_at_time(0.3, 3.0);
/// assert!((gain.value_at(2.0) - 0.15).abs() < 1e-6);
/// assert_eq!(gain.value_at(10.0), 0.3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    value: f32,
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    /// Create a parameter with an intrinsic value and an empty timeline
    pub fn new(value: f32) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }

    /// Set the intrinsic value immediately, dropping all scheduled events
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.events.clear();
    }

    /// Schedule an instantaneous change at `time`
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::SetValue { time, value });
    }

    /// Schedule a linear ramp that reaches `value` at `end_time`
    ///
    /// The ramp starts at the time and value of the preceding event, or at
    /// the intrinsic value when the timeline is empty.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.insert(AutomationEvent::LinearRamp {
            time: end_time,
            value,
        });
    }

    /// Remove every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Scheduled events, sorted by time
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// True when a ramp or set is still pending after `time`
    pub fn has_pending_events(&self, time: f64) -> bool {
        self.events.iter().any(|e| e.time() > time)
    }

    /// Compute the parameter value at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_time = 0.0;
        let mut prev_value = self.value;

        for event in &self.events {
            if event.time() <= time {
                prev_time = event.time();
                prev_value = event.value();
                continue;
            }

            return match *event {
                AutomationEvent::SetValue { .. } => prev_value,
                AutomationEvent::LinearRamp {
                    time: end_time,
                    value: end_value,
                } => {
                    let span = end_time - prev_time;
                    if span <= 0.0 {
                        end_value
                    } else {
                        let progress = ((time - prev_time) / span).clamp(0.0, 1.0) as f32;
                        prev_value + (end_value - prev_value) * progress
                    }
                }
            };
        }

        prev_value
    }

    /// Fold events that finished at or before `time` into the intrinsic value
    ///
    /// The last past event is kept while a later event still depends on it
    /// as the start point of a ramp.
    pub fn collapse_before(&mut self, time: f64) {
        while self.events.len() >= 2 && self.events[1].time() <= time {
            self.events.remove(0);
        }
        if self.events.len() == 1 && self.events[0].time() <= time {
            self.value = self.events[0].value();
            self.events.clear();
        }
    }

    fn insert(&mut self, event: AutomationEvent) {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }
}

impl Default for AudioParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intrinsic_value_without_events() {
        let param = AudioParam::new(0.42);
        assert_eq!(param.value_at(0.0), 0.42);
        assert_eq!(param.value_at(100.0), 0.42);
    }

    #[test]
    fn test_set_value_at_time_holds_previous_until_time() {
        let mut param = AudioParam::new(1.0);
        param.set_value_at_time(0.5, 2.0);
        assert_eq!(param.value_at(1.999), 1.0);
        assert_eq!(param.value_at(2.0), 0.5);
    }

    #[test]
    fn test_fade_in_ramp() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 10.0);
        param.linear_ramp_to_value_at_time(0.3, 12.0);

        assert_relative_eq!(param.value_at(10.0), 0.0);
        assert_relative_eq!(param.value_at(11.0), 0.15, epsilon = 1e-6);
        assert_relative_eq!(param.value_at(12.0), 0.3);
        assert_relative_eq!(param.value_at(20.0), 0.3);
    }

    #[test]
    fn test_cancel_mid_ramp_then_fade_out() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(0.3, 2.0);

        // Pin the current value, then ramp down from it
        let now = 1.0;
        let current = param.value_at(now);
        param.cancel_scheduled_values(now);
        param.set_value_at_time(current, now);
        param.linear_ramp_to_value_at_time(0.0, now + 1.5);

        assert_relative_eq!(param.value_at(1.0), 0.15, epsilon = 1e-6);
        assert_relative_eq!(param.value_at(1.75), 0.075, epsilon = 1e-6);
        assert_relative_eq!(param.value_at(2.5), 0.0);
        assert_eq!(param.events().len(), 3);
    }

    #[test]
    fn test_ramp_without_prior_event_starts_from_intrinsic_value() {
        let mut param = AudioParam::new(1.0);
        param.linear_ramp_to_value_at_time(0.0, 4.0);
        assert_relative_eq!(param.value_at(1.0), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_collapse_before_keeps_ramp_start() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.2, 1.0);
        param.linear_ramp_to_value_at_time(0.4, 3.0);

        param.collapse_before(2.0);
        assert_eq!(param.events().len(), 2);
        assert_relative_eq!(param.value_at(2.0), 0.3, epsilon = 1e-6);

        param.collapse_before(3.0);
        assert!(param.events().is_empty());
        assert_relative_eq!(param.value_at(5.0), 0.4);
    }

    #[test]
    fn test_set_value_clears_timeline() {
        let mut param = AudioParam::new(0.0);
        param.linear_ramp_to_value_at_time(1.0, 5.0);
        assert!(param.has_pending_events(0.0));
        param.set_value(0.7);
        assert!(!param.has_pending_events(0.0));
        assert_eq!(param.value_at(3.0), 0.7);
    }
}
