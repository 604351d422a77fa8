//! Stats counters
//!
//! The hero statistics count up from zero the first time they scroll into
//! view. Each animated counter runs its own interval timer and stops it on
//! reaching the target.

use log::debug;

use crate::config::{StatSpec, StatsConfig};
use crate::engine::{Scheduler, TimerHandle};

/// Compact label for a statistic
///
/// Millions get one decimal and `M+`, thousands are rounded to a whole
/// number of `K+`, anything smaller is printed as is. The quotient is taken
/// in `f64` and rounded half up on its exact binary value, so 1 150 000 reads
/// `1.1M+` (the quotient is slightly below 1.15).
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{}M+", to_fixed(n as f64 / 1_000_000.0, 1))
    } else if n >= 1000 {
        format!("{}K+", to_fixed(n as f64 / 1000.0, 0))
    } else {
        n.to_string()
    }
}

/// Non-negative `x` with `decimals` fraction digits, ties rounded up
fn to_fixed(x: f64, decimals: usize) -> String {
    // 60 digits hold the full expansion of any double in range
    let exact = format!("{:.60}", x);
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let digits: Vec<u64> = fraction.bytes().map(|b| u64::from(b - b'0')).collect();

    let mut scaled = whole.parse::<u64>().unwrap_or(0);
    for &d in digits.iter().take(decimals) {
        scaled = scaled * 10 + d;
    }
    if digits.get(decimals).is_some_and(|&d| d >= 5) {
        scaled += 1;
    }

    if decimals == 0 {
        return scaled.to_string();
    }
    let unit = 10u64.pow(decimals as u32);
    format!(
        "{}.{:0width$}",
        scaled / unit,
        scaled % unit,
        width = decimals
    )
}

#[derive(Debug, Clone, PartialEq)]
enum CounterKind {
    Animated { target: u64, increment: f64 },
    Fixed,
}

/// One statistic slot
#[derive(Debug, Clone)]
pub struct StatsCounter {
    kind: CounterKind,
    current: f64,
    tick_ms: u64,
    timer: Option<TimerHandle>,
    /// `None` until the first update
    label: Option<String>,
    fixed_label: Option<String>,
}

impl StatsCounter {
    /// Counter that climbs to `target` over `duration_ms`
    pub fn animated(target: u64, duration_ms: u64, tick_ms: u64) -> Self {
        let tick_ms = tick_ms.max(1);
        let steps = (duration_ms as f64 / tick_ms as f64).max(1.0);
        Self {
            kind: CounterKind::Animated {
                target,
                increment: target as f64 / steps,
            },
            current: 0.0,
            tick_ms,
            timer: None,
            label: None,
            fixed_label: None,
        }
    }

    /// Counter that shows `label` as soon as it starts
    pub fn fixed(label: impl Into<String>) -> Self {
        Self {
            kind: CounterKind::Fixed,
            current: 0.0,
            tick_ms: 1,
            timer: None,
            label: None,
            fixed_label: Some(label.into()),
        }
    }

    fn from_spec(spec: &StatSpec, config: &StatsConfig) -> Self {
        match spec {
            StatSpec::Animated { target } => {
                Self::animated(*target, config.duration_ms, config.tick_ms)
            }
            StatSpec::Fixed { label } => Self::fixed(label.clone()),
        }
    }

    /// Target value, for animated counters
    pub fn target(&self) -> Option<u64> {
        match self.kind {
            CounterKind::Animated { target, .. } => Some(target),
            CounterKind::Fixed => None,
        }
    }

    /// Accumulated (unfloored) value
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Current label, once there is one
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the counter still has a live timer
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Begin the animation, or show the fixed label
    pub fn start(&mut self, scheduler: &mut Scheduler) {
        match self.kind {
            CounterKind::Fixed => self.label = self.fixed_label.clone(),
            CounterKind::Animated { .. } => {
                if self.timer.is_none() {
                    self.timer = Some(scheduler.set_interval(self.tick_ms));
                }
            }
        }
    }

    /// Handle a fired timer; returns false if it belongs to someone else
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut Scheduler) -> bool {
        if self.timer != Some(handle) {
            return false;
        }
        let CounterKind::Animated { target, increment } = self.kind else {
            return false;
        };

        self.current += increment;
        if self.current >= target as f64 {
            self.label = Some(format_number(target));
            scheduler.clear(handle);
            self.timer = None;
            debug!("[STATS] counter reached {}", target);
        } else {
            self.label = Some(format_number(self.current.floor() as u64));
        }
        true
    }
}

/// The block of hero statistics
#[derive(Debug, Clone)]
pub struct StatsPanel {
    counters: Vec<StatsCounter>,
    revealed: bool,
}

impl StatsPanel {
    pub fn new(config: &StatsConfig) -> Self {
        Self {
            counters: config
                .counters
                .iter()
                .map(|spec| StatsCounter::from_spec(spec, config))
                .collect(),
            revealed: false,
        }
    }

    pub fn counters(&self) -> &[StatsCounter] {
        &self.counters
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// The panel became visible; only the first call starts the counters
    pub fn reveal(&mut self, scheduler: &mut Scheduler) -> bool {
        if self.revealed {
            return false;
        }
        self.revealed = true;
        for counter in &mut self.counters {
            counter.start(scheduler);
        }
        debug!("[STATS] revealed {} counters", self.counters.len());
        true
    }

    /// Route a fired timer to its counter
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut Scheduler) -> bool {
        self.counters
            .iter_mut()
            .any(|c| c.on_timer(handle, scheduler))
    }

    /// Whether any counter is still animating
    pub fn is_animating(&self) -> bool {
        self.counters.iter().any(StatsCounter::is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0, "0" ; "zero")]
    #[test_case(999, "999" ; "below thousand")]
    #[test_case(1000, "1K+" ; "one thousand")]
    #[test_case(1500, "2K+" ; "half rounds up")]
    #[test_case(62_500, "63K+" ; "mid animation")]
    #[test_case(500_000, "500K+" ; "half million")]
    #[test_case(999_999, "1000K+" ; "just below a million")]
    #[test_case(1_000_000, "1.0M+" ; "one million")]
    #[test_case(1_250_000, "1.3M+" ; "exact tie rounds up")]
    #[test_case(1_150_000, "1.1M+" ; "quotient just below the tie")]
    #[test_case(1_450_000, "1.4M+" ; "another quotient below the tie")]
    #[test_case(2500, "3K+" ; "thousands tie rounds up")]
    #[test_case(10_000_000, "10.0M+" ; "ten million")]
    fn test_format_number(n: u64, expected: &str) {
        assert_eq!(format_number(n), expected);
    }

    fn drain(scheduler: &mut Scheduler, panel: &mut StatsPanel, until_ms: u64) {
        while let Some(fired) = scheduler.pop_due(until_ms) {
            panel.on_timer(fired.handle, scheduler);
        }
        scheduler.advance_to(until_ms);
    }

    #[test]
    fn test_counter_finishes_on_target() {
        let mut scheduler = Scheduler::new();
        let mut panel = StatsPanel::new(&StatsConfig::default());
        assert!(panel.reveal(&mut scheduler));

        // Fixed label is immediate, animated ones wait for the first tick
        let labels: Vec<Option<&str>> = panel.counters().iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec![None, Some("4.9"), None]);

        drain(&mut scheduler, &mut panel, 16);
        assert_eq!(panel.counters()[0].label(), Some("4K+"));
        assert_eq!(panel.counters()[2].label(), Some("80K+"));

        drain(&mut scheduler, &mut panel, 1984);
        assert!(panel.is_animating());

        drain(&mut scheduler, &mut panel, 2000);
        let labels: Vec<Option<&str>> = panel.counters().iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec![Some("500K+"), Some("4.9"), Some("10.0M+")]);
        assert!(!panel.is_animating());
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_label_never_exceeds_target() {
        let mut scheduler = Scheduler::new();
        let mut counter = StatsCounter::animated(1234, 100, 16);
        counter.start(&mut scheduler);
        while let Some(fired) = scheduler.pop_due(1000) {
            counter.on_timer(fired.handle, &mut scheduler);
            if counter.is_running() {
                assert!(counter.current() < 1234.0);
            }
        }
        assert_eq!(counter.label(), Some("1K+"));
        assert!(!counter.is_running());
    }

    #[test]
    fn test_reveal_only_once() {
        let mut scheduler = Scheduler::new();
        let mut panel = StatsPanel::new(&StatsConfig::default());
        assert!(panel.reveal(&mut scheduler));
        assert!(!panel.reveal(&mut scheduler));
        assert_eq!(scheduler.active_count(), 2);
    }
}
