use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type PlayerId = u64;
pub type EntityId = i64;
pub type Tick = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vector3) -> f32 {
        vec_to_glam(self).distance(vec_to_glam(other))
    }
}

/// Pitch and yaw in degrees, as reported by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ViewAngles {
    pub pitch: f32,
    pub yaw: f32,
}

impl ViewAngles {
    pub fn forward(&self) -> Vector3 {
        let (pitch, yaw) = (self.pitch.to_radians(), self.yaw.to_radians());
        let direction = glam::Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.cos() * yaw.sin(),
            -pitch.sin(),
        );
        glam_to_vec(&direction.normalize_or_zero())
    }
}

pub fn vec_to_glam(v: &Vector3) -> glam::f32::Vec3 {
    glam::f32::Vec3::new(v.x, v.y, v.z)
}

pub fn glam_to_vec(v: &glam::f32::Vec3) -> Vector3 {
    Vector3 {
        x: v.x,
        y: v.y,
        z: v.z,
    }
}

pub fn ticks_to_seconds(ticks: Tick, tick_rate: f64) -> f64 {
    if tick_rate <= 0.0 {
        0.0
    } else {
        ticks as f64 / tick_rate
    }
}

pub fn seconds_to_ticks(seconds: f64, tick_rate: f64) -> Tick {
    (seconds * tick_rate).round() as Tick
}

pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn percentage(part: f64, whole: f64) -> f64 {
    safe_div(part, whole) * 100.0
}

pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Scales `value` so that `reference` maps to 100, clamped to [0, 100].
pub fn normalize_to_percent(value: f64, reference: f64) -> f64 {
    clamp_percent(percentage(value, reference))
}

/// Mean of `(value, weight)` pairs. Zero total weight yields zero.
pub fn weighted_mean(items: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = items.iter().map(|(_, weight)| weight).sum();
    let weighted_sum: f64 = items.iter().map(|(value, weight)| value * weight).sum();
    safe_div(weighted_sum, total_weight)
}

pub fn mean(values: &[f64]) -> f64 {
    safe_div(values.iter().sum(), values.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SearchDirection {
    Forward,
    Backward,
}

pub fn find_in_direction<T, F, R>(
    items: &[T],
    current_index: usize,
    direction: SearchDirection,
    predicate: F,
) -> Option<(usize, R)>
where
    F: Fn(&T) -> Option<R>,
{
    let mut iter: Box<dyn Iterator<Item = (usize, &T)>> = match direction {
        SearchDirection::Forward => Box::new(
            items[current_index + 1..]
                .iter()
                .enumerate()
                .map(move |(i, item)| (i + current_index + 1, item)),
        ),
        SearchDirection::Backward => Box::new(items[..current_index].iter().enumerate().rev()),
    };

    iter.find_map(|(i, item)| predicate(item).map(|res| (i, res)))
}

/// Returns the item whose tick is closest to `tick`, preferring the earlier
/// item on ties.
pub fn nearest_by_tick<T, F>(items: impl Iterator<Item = T>, tick: Tick, tick_of: F) -> Option<T>
where
    F: Fn(&T) -> Tick,
{
    items.min_by_key(|item| {
        let item_tick = tick_of(item);
        ((item_tick - tick).abs(), item_tick)
    })
}
