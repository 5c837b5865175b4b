use std::time::{Duration, Instant};

/// Holds the latest value until input pauses for `delay`. The caller
/// supplies the clock, so the event loop's tick drives it.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending value and restart the delay.
    pub fn push(&mut self, value: String, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Returns the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.push("mil".into(), start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(999)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("mil".to_string()));
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn each_keystroke_restarts_the_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.push("m".into(), start);
        debouncer.push("mi".into(), start + Duration::from_millis(600));
        debouncer.push("mil".into(), start + Duration::from_millis(1200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(1600)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(2200)),
            Some("mil".to_string())
        );
    }
}
