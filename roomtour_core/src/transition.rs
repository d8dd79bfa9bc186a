//! Eased camera flights toward a selected hotspot, plus the click pulse on
//! the hotspot marker itself.

use std::time::Duration;

use glam::Vec3;

use crate::timers::OneShot;

pub const TRANSITION_DURATION: Duration = Duration::from_millis(800);
/// Pause between reaching the stand-off point and running the completion.
pub const COMPLETION_DELAY: Duration = Duration::from_millis(100);
pub const STAND_OFF_DISTANCE: f32 = 5.0;
pub const PULSE_SCALE: f32 = 1.3;
pub const PULSE_DURATION: Duration = Duration::from_millis(150);

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Linear progress of a flight, clamped to `[0, 1]`.
pub fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// Point `distance` away from `focus`, on the side the camera is on.
pub fn stand_off_position(camera: Vec3, focus: Vec3, distance: f32) -> Vec3 {
    let mut direction = (camera - focus).normalize_or_zero();
    if direction == Vec3::ZERO {
        direction = Vec3::Z;
    }
    focus + direction * distance
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraStep {
    pub position: Vec3,
    pub target: Vec3,
    pub progress: f32,
}

#[derive(Debug, Clone)]
struct Flight<T> {
    start_position: Vec3,
    start_target: Vec3,
    end_position: Vec3,
    end_target: Vec3,
    started_at: Duration,
    completion: T,
}

impl<T> Flight<T> {
    fn sample(&self, now: Duration) -> CameraStep {
        let linear = progress(now.saturating_sub(self.started_at), TRANSITION_DURATION);
        let eased = ease_out_cubic(linear);
        CameraStep {
            position: self.start_position.lerp(self.end_position, eased),
            target: self.start_target.lerp(self.end_target, eased),
            progress: linear,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance<T> {
    Idle,
    Moved(CameraStep),
    Completed(T),
}

/// Runs at most one eased flight. Starting another supersedes the current
/// one from wherever the camera is now; the completion of a superseded
/// flight never runs.
#[derive(Debug, Clone)]
pub struct CameraTransitionEngine<T> {
    flight: Option<Flight<T>>,
    settle: OneShot<T>,
}

impl<T> Default for CameraTransitionEngine<T> {
    fn default() -> Self {
        Self {
            flight: None,
            settle: OneShot::new("transition-complete"),
        }
    }
}

impl<T> CameraTransitionEngine<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a flight from the camera's current pose toward `focus`.
    /// Returns true when an earlier flight was superseded.
    pub fn begin(
        &mut self,
        position: Vec3,
        target: Vec3,
        focus: Vec3,
        now: Duration,
        completion: T,
    ) -> bool {
        let superseded = self.cancel();
        self.flight = Some(Flight {
            start_position: position,
            start_target: target,
            end_position: stand_off_position(position, focus, STAND_OFF_DISTANCE),
            end_target: focus,
            started_at: now,
            completion,
        });
        superseded
    }

    /// Drops any flight or pending completion. Returns true if one existed.
    pub fn cancel(&mut self) -> bool {
        let had_flight = self.flight.take().is_some();
        let had_completion = self.settle.cancel().is_some();
        had_flight || had_completion
    }

    pub fn is_active(&self) -> bool {
        self.flight.is_some() || self.settle.is_pending()
    }

    pub fn advance(&mut self, now: Duration) -> Advance<T> {
        if let Some(completion) = self.settle.poll(now) {
            return Advance::Completed(completion);
        }
        let Some(flight) = self.flight.as_ref() else {
            return Advance::Idle;
        };
        let step = flight.sample(now);
        if step.progress >= 1.0 {
            if let Some(flight) = self.flight.take() {
                self.settle.arm(now + COMPLETION_DELAY, flight.completion);
            }
        }
        Advance::Moved(step)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleChange<K> {
    pub entity: K,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy)]
struct PulseRevert<K> {
    entity: K,
    original: f32,
}

/// Click feedback: bump a marker to [`PULSE_SCALE`] and put it back after
/// [`PULSE_DURATION`]. A new pulse reverts the previous marker first.
#[derive(Debug, Clone)]
pub struct PulseEffect<K> {
    revert: OneShot<PulseRevert<K>>,
}

impl<K: Copy + PartialEq> Default for PulseEffect<K> {
    fn default() -> Self {
        Self {
            revert: OneShot::new("pulse-revert"),
        }
    }
}

impl<K: Copy + PartialEq> PulseEffect<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scale changes to apply now, in order.
    pub fn trigger(&mut self, entity: K, current_scale: f32, now: Duration) -> Vec<ScaleChange<K>> {
        let mut changes = Vec::with_capacity(2);
        let mut original = current_scale;
        if let Some(previous) = self.revert.cancel() {
            if previous.entity == entity {
                original = previous.original;
            }
            changes.push(ScaleChange {
                entity: previous.entity,
                scale: previous.original,
            });
        }
        self.revert
            .arm(now + PULSE_DURATION, PulseRevert { entity, original });
        changes.push(ScaleChange {
            entity,
            scale: PULSE_SCALE,
        });
        changes
    }

    pub fn poll(&mut self, now: Duration) -> Option<ScaleChange<K>> {
        self.revert.poll(now).map(|revert| ScaleChange {
            entity: revert.entity,
            scale: revert.original,
        })
    }
}
