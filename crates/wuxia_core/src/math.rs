//! 2D vector math for the combat field.
//!
//! The combat field is a continuous square plane, so positions and
//! directions use `f64`. Cone and beam tests need trigonometry, which
//! rules out fixed-point here.

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};

/// A full cone angle, in degrees, that covers every direction.
pub const FULL_CIRCLE_DEGREES: f64 = 360.0;

/// 2D vector used for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vector {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_from(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::ZeroLengthVector`] for a zero-length vector.
    pub fn normalized(self) -> Result<Self> {
        let len = self.length();
        if len == 0.0 {
            return Err(CombatError::ZeroLengthVector);
        }
        Ok(Self::new(self.x / len, self.y / len))
    }

    /// Whether this point lies inside a cone.
    ///
    /// The cone starts at `origin`, faces `direction`, reaches `max_range`
    /// and spans `angle` degrees in total (half on each side of the facing).
    /// A point on the apex is inside.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::ZeroLengthVector`] if `direction` is zero and
    /// the point is in range but off the apex.
    pub fn in_cone(
        self,
        origin: Self,
        direction: Self,
        max_range: f64,
        angle: f64,
    ) -> Result<bool> {
        let offset = self - origin;
        if offset.length() > max_range {
            return Ok(false);
        }
        if offset.is_zero() || angle >= FULL_CIRCLE_DEGREES {
            return Ok(true);
        }

        let facing = direction.normalized()?;
        let towards_point = offset.normalized()?;
        let half_angle = (angle / 2.0).to_radians();
        Ok(towards_point.dot(facing) > half_angle.cos())
    }

    /// Distance from this point to the ray `origin + t * direction`.
    ///
    /// `direction` must be a unit vector. Returns `(distance, projection)`
    /// where `projection` is the signed distance along the ray to the
    /// closest point.
    #[must_use]
    pub fn point_line_distance(self, origin: Self, direction: Self) -> (f64, f64) {
        let projection = (self - origin).dot(direction);
        let closest = origin + direction * projection;
        (self.distance_from(closest), projection)
    }
}

impl std::ops::Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl std::ops::Div<f64> for Vector {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
