use crate::camera::CameraProfile;

/// Immutable capture of the camera and control state taken when a panorama
/// session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    profile: CameraProfile,
}

impl Snapshot {
    pub fn profile(&self) -> &CameraProfile {
        &self.profile
    }
}

/// Depth-one save/restore slot around a panorama session.
#[derive(Debug, Clone, Default)]
pub struct ViewConfigStack {
    slot: Option<Snapshot>,
}

impl ViewConfigStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures `profile` unless a snapshot is already held, in which case the
    /// held one is kept untouched and returned.
    pub fn save(&mut self, profile: &CameraProfile) -> &Snapshot {
        if self.slot.is_some() {
            log::debug!("view snapshot already held; keeping the original");
        }
        self.slot.get_or_insert_with(|| Snapshot { profile: *profile })
    }

    /// Writes the held snapshot back over `camera` in one assignment and
    /// empties the slot. Returns false when nothing was held.
    pub fn restore(&mut self, camera: &mut CameraProfile) -> bool {
        match self.slot.take() {
            Some(snapshot) => {
                *camera = snapshot.profile;
                true
            }
            None => false,
        }
    }

    pub fn peek(&self) -> Option<&Snapshot> {
        self.slot.as_ref()
    }

    pub fn is_holding(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floors::FloorView;

    #[test]
    fn second_save_keeps_first_snapshot() {
        let mut stack = ViewConfigStack::new();
        let first = CameraProfile::dollhouse();
        stack.save(&first);
        let kept = stack.save(&CameraProfile::panorama()).clone();
        assert_eq!(kept.profile(), &first);
    }

    #[test]
    fn restore_round_trips_every_field() {
        let mut stack = ViewConfigStack::new();
        let mut original = CameraProfile::floor_plan(FloorView::Floor1);
        original.limits.min_distance = 2.5;
        original.limits.zoom_speed = 0.4;
        stack.save(&original);

        let mut camera = CameraProfile::panorama();
        assert!(stack.restore(&mut camera));
        assert_eq!(camera, original);
        assert!(!stack.is_holding());
        assert!(!stack.restore(&mut camera));
    }
}
