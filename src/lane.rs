//! The fixed placement lanes.

use std::num::NonZeroU8;

use strict_num_extended::FinF64;
use thiserror::Error;

/// Number of lanes on the editor.
pub const LANE_COUNT: usize = 4;

/// Default horizontal offsets of lanes 1 to 4.
pub const DEFAULT_LANE_OFFSETS: [FinF64; LANE_COUNT] = [
    FinF64::new_const(-75.0),
    FinF64::new_const(-25.0),
    FinF64::new_const(25.0),
    FinF64::new_const(75.0),
];

/// One of the four lanes, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Lane(NonZeroU8);

/// Error for a lane number outside `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("lane must be in 1..={LANE_COUNT}, got {0}")]
pub struct InvalidLane(pub u8);

impl Lane {
    /// Every lane in ascending order.
    pub const ALL: [Self; LANE_COUNT] = [
        Self(NonZeroU8::MIN),
        Self(NonZeroU8::MIN.saturating_add(1)),
        Self(NonZeroU8::MIN.saturating_add(2)),
        Self(NonZeroU8::MIN.saturating_add(3)),
    ];

    /// Create a lane from its number.
    #[must_use]
    pub fn new(number: u8) -> Option<Self> {
        NonZeroU8::new(number)
            .filter(|n| usize::from(n.get()) <= LANE_COUNT)
            .map(Self)
    }

    /// The lane number, `1..=4`.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0.get()
    }

    const fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl TryFrom<u8> for Lane {
    type Error = InvalidLane;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidLane(value))
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        lane.number()
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// The table binding each [`Lane`] to its horizontal offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSet {
    offsets: [f64; LANE_COUNT],
}

impl Default for LaneSet {
    fn default() -> Self {
        Self::new(DEFAULT_LANE_OFFSETS)
    }
}

impl LaneSet {
    /// Create a lane table from offsets of lanes 1 to 4.
    #[must_use]
    pub fn new(offsets: [FinF64; LANE_COUNT]) -> Self {
        Self {
            offsets: offsets.map(|x| x.as_f64()),
        }
    }

    /// Horizontal offset of `lane`.
    #[must_use]
    pub const fn x_of(&self, lane: Lane) -> f64 {
        self.offsets[lane.index()]
    }

    /// Lanes with their offsets, in ascending lane order.
    pub fn iter(&self) -> impl Iterator<Item = (Lane, f64)> + '_ {
        Lane::ALL.into_iter().map(|lane| (lane, self.x_of(lane)))
    }

    /// The lane closest to `space_x`.
    ///
    /// Ties go to the lowest lane number, so `x = 0` between lanes 2 and 3
    /// resolves to lane 2.
    #[must_use]
    pub fn nearest_lane(&self, space_x: f64) -> Lane {
        let mut best = Lane::ALL[0];
        let mut best_distance = f64::INFINITY;
        for (lane, x) in self.iter() {
            let distance = (space_x - x).abs();
            if distance < best_distance {
                best = lane;
                best_distance = distance;
            }
        }
        best
    }

    /// Horizontal extent from the leftmost to the rightmost lane.
    #[must_use]
    pub fn span(&self) -> (f64, f64) {
        self.offsets
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            })
    }

    /// Whether `space_x` lies within `margin` of the lane span.
    #[must_use]
    pub fn contains(&self, space_x: f64, margin: f64) -> bool {
        let (lo, hi) = self.span();
        (lo - margin..=hi + margin).contains(&space_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_numbers_are_bounded() {
        assert!(Lane::new(0).is_none());
        assert_eq!(Lane::new(1).map(Lane::number), Some(1));
        assert_eq!(Lane::new(4).map(Lane::number), Some(4));
        assert!(Lane::new(5).is_none());
        assert_eq!(Lane::try_from(9), Err(InvalidLane(9)));
    }

    #[test]
    fn custom_offsets() {
        let lanes = LaneSet::new([-3.0, -1.0, 1.0, 3.0].map(|x| FinF64::new(x).unwrap()));
        assert_eq!(lanes.x_of(Lane::ALL[3]), 3.0);
        assert_eq!(lanes.nearest_lane(-1.4).number(), 2);
        assert_eq!(lanes.span(), (-3.0, 3.0));
    }

    #[test]
    fn all_lanes_are_ascending() {
        let numbers: Vec<u8> = Lane::ALL.iter().map(|l| l.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn nearest_lane_picks_closest() {
        let lanes = LaneSet::default();
        assert_eq!(lanes.nearest_lane(10.0).number(), 3);
        assert_eq!(lanes.nearest_lane(-80.0).number(), 1);
        assert_eq!(lanes.nearest_lane(500.0).number(), 4);
    }

    #[test]
    fn nearest_lane_tie_goes_to_lowest_number() {
        let lanes = LaneSet::default();
        assert_eq!(lanes.nearest_lane(0.0).number(), 2);
        assert_eq!(lanes.nearest_lane(-50.0).number(), 1);
        assert_eq!(lanes.nearest_lane(50.0).number(), 3);
    }

    #[test]
    fn span_and_margin() {
        let lanes = LaneSet::default();
        assert_eq!(lanes.span(), (-75.0, 75.0));
        assert!(lanes.contains(100.0, 25.0));
        assert!(!lanes.contains(100.5, 25.0));
        assert!(lanes.contains(-100.0, 25.0));
        assert!(!lanes.contains(-130.0, 25.0));
    }
}
