/// A range of ray parameters or in-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Ray parameters in front of the origin; zero itself is excluded.
    pub const POSITIVE: Interval = Interval {
        min: 0.0,
        max: f32::INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `center ± half`.
    pub fn centered(center: f32, half: f32) -> Self {
        Self::new(center - half, center + half)
    }

    /// Same lower bound, upper bound pulled in to `max`.
    pub fn with_max(self, max: f32) -> Self {
        Self::new(self.min, max)
    }

    pub fn length(&self) -> f32 {
        self.max - self.min
    }

    /// Open-interval test; a value on either bound is outside.
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }
}
