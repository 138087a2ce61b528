//! Fixed-point math utilities for deterministic decisions.
//!
//! Every distance comparison, centroid and ring position the controller
//! computes goes through fixed-point arithmetic, so two runs fed the same
//! snapshot and seed issue identical orders on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all decision math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Build a [`Fixed`] from a whole number of world units.
#[must_use]
pub fn fx(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Build a [`Fixed`] fraction from a percentage (`40` becomes `0.4`).
#[must_use]
pub fn percent(p: u32) -> Fixed {
    Fixed::from_num(p) / Fixed::from_num(100)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// True when `other` lies strictly closer than `radius`.
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) < radius * radius
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Point `distance` units from `self` along the line to `target`.
    ///
    /// Negative distances step away from the target. Coincident points
    /// return `self` unchanged.
    #[must_use]
    pub fn towards(self, target: Self, distance: Fixed) -> Self {
        let dir = (target - self).normalize();
        if dir == Self::ZERO {
            return self;
        }
        self + dir * distance
    }

    /// Offset by whole and fractional world units.
    #[must_use]
    pub fn offset(self, dx: Fixed, dy: Fixed) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Round both coordinates to the nearest whole unit.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }
}

/// Mean position of a set of points. `None` for an empty set.
#[must_use]
pub fn centroid<I>(points: I) -> Option<Vec2Fixed>
where
    I: IntoIterator<Item = Vec2Fixed>,
{
    let mut sum = Vec2Fixed::ZERO;
    let mut count: i32 = 0;
    for p in points {
        sum = sum + p;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = Fixed::from_num(count);
    Some(Vec2Fixed::new(sum.x / n, sum.y / n))
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Unit vectors at fixed angular increments, starting at 0° and turning
/// counter-clockwise.
///
/// Trig runs once per call in `f64` and is converted immediately; nothing
/// downstream sees a float.
#[must_use]
pub fn ring_directions(step_degrees: u32) -> Vec<Vec2Fixed> {
    let step = step_degrees.max(1);
    (0..360u32)
        .step_by(step as usize)
        .map(|deg| {
            let rad = f64::from(deg).to_radians();
            Vec2Fixed::new(Fixed::from_num(rad.cos()), Fixed::from_num(rad.sin()))
        })
        .collect()
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<Fixed> for Vec2Fixed {
    type Output = Self;

    fn mul(self, rhs: Fixed) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}
