//! Single-slot one-shot timers driven by the caller's clock. Arming a timer
//! replaces whatever was pending and bumps its generation, so a handle taken
//! before the replacement can no longer fire.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    generation: u64,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    due: Duration,
    generation: u64,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct OneShot<T> {
    name: &'static str,
    generation: u64,
    pending: Option<Pending<T>>,
}

impl<T> OneShot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: 0,
            pending: None,
        }
    }

    /// Schedules `payload` for `due`, returning the payload it superseded.
    pub fn arm(&mut self, due: Duration, payload: T) -> (TimerHandle, Option<T>) {
        self.generation = self.generation.wrapping_add(1);
        let superseded = self.pending.take().map(|pending| pending.payload);
        if superseded.is_some() {
            log::debug!("{} timer superseded", self.name);
        }
        self.pending = Some(Pending {
            due,
            generation: self.generation,
            payload,
        });
        (
            TimerHandle {
                generation: self.generation,
            },
            superseded,
        )
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.payload)
    }

    /// Takes the payload once `now` has reached its due time.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == self.generation && now >= pending.due);
        if !due {
            return None;
        }
        self.pending.take().map(|pending| pending.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True while `handle` is the armed, not yet fired instance.
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.generation == handle.generation)
    }

    pub fn due(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn fires_once_when_due() {
        let mut timer = OneShot::new("test");
        timer.arm(ms(100), "show");
        assert_eq!(timer.poll(ms(99)), None);
        assert_eq!(timer.poll(ms(100)), Some("show"));
        assert_eq!(timer.poll(ms(200)), None);
    }

    #[test]
    fn rearming_replaces_pending_instance() {
        let mut timer = OneShot::new("test");
        let (first, _) = timer.arm(ms(100), 1);
        let (second, superseded) = timer.arm(ms(150), 2);
        assert_eq!(superseded, Some(1));
        assert!(!timer.is_current(first));
        assert!(timer.is_current(second));
        assert_eq!(timer.poll(ms(120)), None);
        assert_eq!(timer.poll(ms(150)), Some(2));
        assert!(!timer.is_current(second));
    }

    #[test]
    fn cancel_drops_pending() {
        let mut timer = OneShot::new("test");
        timer.arm(ms(10), ());
        assert_eq!(timer.cancel(), Some(()));
        assert!(!timer.is_pending());
        assert_eq!(timer.poll(ms(50)), None);
    }
}
