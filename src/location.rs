use serde::*;

/// A tile coordinate, packed into 16 bits. Maps are at most 256x256 tiles so
/// both axes fit a `u8`; packing keeps point sets and hash keys cheap.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Location {
    packed: u16,
}

impl Location {
    /// Both coordinates must fit in eight bits; larger values would alias
    /// another tile through the packing.
    pub fn from_coords(x: u32, y: u32) -> Self {
        debug_assert!(x < 256 && y < 256, "coordinates ({}, {}) exceed the 256x256 map bound", x, y);
        Location {
            packed: ((x << 8) | y) as u16,
        }
    }

    /// Rounds a fractional map position to the tile containing it. Negative
    /// coordinates clamp to 0; the caller is expected to bounds-check against
    /// the grid before indexing.
    pub fn from_fractional(x: f32, y: f32) -> Self {
        Location::from_coords(x.max(0.0) as u32, y.max(0.0) as u32)
    }

    #[inline]
    pub fn x(self) -> u8 {
        ((self.packed >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn y(self) -> u8 {
        (self.packed & 0xFF) as u8
    }

    #[inline]
    pub fn packed_repr(self) -> u16 {
        self.packed
    }

    #[inline]
    pub fn from_packed(packed: u16) -> Self {
        Location { packed }
    }

    /// Chebyshev distance (8-directional move count).
    pub fn distance_to(self, other: Self) -> u8 {
        let dx = (self.x() as i16) - (other.x() as i16);
        let dy = (self.y() as i16) - (other.y() as i16);

        dx.abs().max(dy.abs()) as u8
    }

    /// Euclidean distance.
    pub fn euclidean_distance_to(self, other: Self) -> f32 {
        self.euclidean_distance_squared(other).sqrt()
    }

    /// Euclidean distance squared. Cheaper than `euclidean_distance_to` when
    /// only ordering matters.
    pub fn euclidean_distance_squared(self, other: Self) -> f32 {
        let dx = (self.x() as f32) - (other.x() as f32);
        let dy = (self.y() as f32) - (other.y() as f32);
        dx * dx + dy * dy
    }

    /// Distance to an arbitrary (possibly fractional) point.
    pub fn distance_to_point(self, x: f32, y: f32) -> f32 {
        let dx = self.x() as f32 - x;
        let dy = self.y() as f32 - y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.packed_repr().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u16::deserialize(deserializer).map(Location::from_packed)
    }
}

/// Index of the point in `points` closest to `target`, or `None` for an
/// empty slice.
pub fn closest_point_index(points: &[Location], target: (f32, f32)) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance_to_point(target.0, target.1)
                .total_cmp(&b.distance_to_point(target.0, target.1))
        })
        .map(|(i, _)| i)
}

/// The member of `points` closest to `target`. Useful for snapping a
/// fractional centroid back onto an area's own tiles.
pub fn closest_towards_point(points: &[Location], target: (f32, f32)) -> Option<Location> {
    closest_point_index(points, target).map(|i| points[i])
}
