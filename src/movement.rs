use crate::constants::*;
use crate::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stance {
    Jumping,
    Crouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Motion {
    Walking,
    Running,
    Moving,
}

/// Instantaneous movement descriptor of a player. Rendered through
/// [`fmt::Display`] into the label stored on grenade records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovementState {
    pub stance: Option<Stance>,
    pub motion: Option<Motion>,
}

impl fmt::Display for MovementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.stance, self.motion) {
            (None, None) => write!(f, "Standing"),
            (Some(stance), None) => write!(f, "{:?}", stance),
            (None, Some(motion)) => write!(f, "{:?}", motion),
            (Some(stance), Some(motion)) => write!(f, "{:?} {:?}", stance, motion),
        }
    }
}

/// Derives [`MovementState`] from live entity flags. When the decoder does not
/// provide a velocity, speed is estimated from the last observed position of
/// the same player; that history is cleared at every round start.
#[derive(Debug, Default)]
pub struct MovementClassifier {
    position_history: HashMap<PlayerId, (Tick, Vector3)>,
}

impl MovementClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.position_history.clear();
    }

    pub fn observe(&mut self, handle: &PlayerHandle, tick: Tick) {
        self.position_history
            .insert(handle.id, (tick, handle.position));
    }

    fn estimated_speed(&self, handle: &PlayerHandle, tick: Tick, tick_rate: f64) -> Option<f32> {
        if let Some(velocity) = handle.movement.velocity {
            let horizontal = glam::Vec2::new(velocity.x, velocity.y);
            return Some(horizontal.length());
        }
        let (last_tick, last_position) = self.position_history.get(&handle.id)?;
        let elapsed = ticks_to_seconds(tick - last_tick, tick_rate);
        if elapsed <= 0.0 {
            return None;
        }
        let delta = vec_to_glam(&handle.position) - vec_to_glam(last_position);
        Some(glam::Vec2::new(delta.x, delta.y).length() / elapsed as f32)
    }

    pub fn classify(&self, handle: &PlayerHandle, tick: Tick, tick_rate: f64) -> MovementState {
        let flags = &handle.movement;
        let stance = if !flags.on_ground {
            Some(Stance::Jumping)
        } else if flags.ducking {
            Some(Stance::Crouched)
        } else {
            None
        };

        let speed = self.estimated_speed(handle, tick, tick_rate);
        let moving = flags.has_movement_intent()
            || speed.map_or(false, |s| s > MOVING_SPEED_THRESHOLD);
        let motion = if !moving {
            None
        } else if flags.walking {
            Some(Motion::Walking)
        } else if speed.map_or(false, |s| s >= RUN_SPEED_THRESHOLD) {
            Some(Motion::Running)
        } else {
            Some(Motion::Moving)
        };

        MovementState { stance, motion }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_handle() -> PlayerHandle {
        PlayerHandle {
            id: 1,
            movement: MovementFlags {
                on_ground: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn standing_when_no_signals() {
        let classifier = MovementClassifier::new();
        let state = classifier.classify(&grounded_handle(), 100, 64.0);
        assert_eq!(state.to_string(), "Standing");
    }

    #[test]
    fn airborne_runner_is_jumping_running() {
        let classifier = MovementClassifier::new();
        let mut handle = grounded_handle();
        handle.movement.on_ground = false;
        handle.movement.velocity = Some(Vector3::new(250.0, 0.0, 120.0));
        assert_eq!(
            classifier.classify(&handle, 100, 64.0).to_string(),
            "Jumping Running"
        );
    }

    #[test]
    fn crouch_walk_with_intent() {
        let classifier = MovementClassifier::new();
        let mut handle = grounded_handle();
        handle.movement.ducking = true;
        handle.movement.walking = true;
        handle.movement.forward = true;
        assert_eq!(
            classifier.classify(&handle, 100, 64.0).to_string(),
            "Crouched Walking"
        );
    }

    #[test]
    fn speed_is_estimated_from_history() {
        let mut classifier = MovementClassifier::new();
        let mut handle = grounded_handle();
        classifier.observe(&handle, 0);
        handle.position = Vector3::new(64.0, 0.0, 0.0);
        // 64 units in 16 ticks at 64 tick is 256 u/s.
        assert_eq!(
            classifier.classify(&handle, 16, 64.0),
            MovementState {
                stance: None,
                motion: Some(Motion::Running)
            }
        );

        classifier.clear();
        assert_eq!(classifier.classify(&handle, 16, 64.0).to_string(), "Standing");
    }
}
