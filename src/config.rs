//! Tunable constants of the editor.

use strict_num_extended::{FinF64, NonNegativeF64, PositiveF64};
use thiserror::Error;

use crate::{
    chart::{ChartCodec, DEFAULT_LONG_NOTE_THRESHOLD},
    grid::SubdivisionMode,
    lane::{DEFAULT_LANE_OFFSETS, LANE_COUNT, LaneSet},
    timeline::{DEFAULT_SPACE_PER_MS, TimeSpaceMapper},
};

/// An error occurred when loading or checking an [`EditorConfig`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON text did not match the config shape.
    #[cfg(feature = "json")]
    #[error("config: {0}")]
    Json(#[from] serde_path_to_error::Error<serde_json::Error>),
    /// A value is out of its allowed range.
    #[error("config field `{field}` {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
}

/// Every constant the editor works with, in editor-space units unless noted.
///
/// Range constraints live in the field types; [`Self::validate`] checks what
/// the types cannot express.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditorConfig {
    /// Space units per millisecond.
    pub space_per_ms: PositiveF64,
    /// Horizontal offsets of lanes 1 to 4, strictly ascending.
    pub lane_offsets: [FinF64; LANE_COUNT],
    /// How far beyond the outer lanes a commit is still accepted.
    pub lane_margin: NonNegativeF64,
    /// Distance under which two notes on a lane are the same position.
    pub overlap_epsilon: PositiveF64,
    /// Hit radius of a delete around the snapped pointer.
    pub delete_tolerance: PositiveF64,
    /// Drawn length at or below which a note is written as short.
    pub long_note_threshold: NonNegativeF64,
    /// Milliseconds scrubbed per unit of scroll while paused.
    pub scroll_speed_ms: PositiveF64,
    /// Subdivision mode active when the editor starts.
    pub subdivision_mode: SubdivisionMode,
    /// File extension of chart files, without the dot.
    pub chart_extension: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            space_per_ms: DEFAULT_SPACE_PER_MS,
            lane_offsets: DEFAULT_LANE_OFFSETS,
            lane_margin: NonNegativeF64::new_const(25.0),
            overlap_epsilon: PositiveF64::new_const(1.0),
            delete_tolerance: PositiveF64::new_const(5.0),
            long_note_threshold: DEFAULT_LONG_NOTE_THRESHOLD,
            scroll_speed_ms: PositiveF64::new_const(100.0),
            subdivision_mode: SubdivisionMode::default(),
            chart_extension: "txt".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON. Missing fields take their default value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] naming the path of a mistyped or out of
    /// range field, or [`ConfigError::Invalid`] if a value fails
    /// [`Self::validate`].
    #[cfg(feature = "json")]
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let deserializer = &mut serde_json::Deserializer::from_str(source);
        let config: Self = serde_path_to_error::deserialize(deserializer)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints spanning more than one value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the lane offsets are not strictly
    /// ascending.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self
            .lane_offsets
            .is_sorted_by(|a, b| a.as_f64() < b.as_f64())
        {
            return Err(ConfigError::Invalid {
                field: "lane_offsets",
                reason: "must be strictly ascending",
            });
        }
        Ok(())
    }

    /// The time-to-space mapping.
    #[must_use]
    pub const fn mapper(&self) -> TimeSpaceMapper {
        TimeSpaceMapper::new(self.space_per_ms)
    }

    /// The lane table.
    #[must_use]
    pub fn lanes(&self) -> LaneSet {
        LaneSet::new(self.lane_offsets)
    }

    /// A codec using this config's scale and long-note threshold.
    #[must_use]
    pub const fn codec(&self) -> ChartCodec {
        ChartCodec::new(self.mapper(), self.long_note_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unsorted_lanes() {
        for offsets in [[-25.0, -75.0, 25.0, 75.0], [-75.0, -25.0, -25.0, 75.0]] {
            let config = EditorConfig {
                lane_offsets: offsets.map(|x| FinF64::new(x).unwrap()),
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Invalid {
                    field: "lane_offsets",
                    ..
                })
            ));
        }
    }

    #[test]
    fn derived_parts_follow_config() {
        let config = EditorConfig {
            space_per_ms: PositiveF64::new(2.0).unwrap(),
            long_note_threshold: NonNegativeF64::ZERO,
            ..Default::default()
        };
        assert_eq!(config.mapper().to_space(10.0), 20.0);
        assert_eq!(config.codec().mapper(), &config.mapper());
        assert_eq!(config.lanes().x_of(crate::lane::Lane::ALL[0]), -75.0);
    }

    #[cfg(feature = "json")]
    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(
            r#"{ "scroll_speed_ms": 40.0, "subdivision_mode": "Sixteen" }"#,
        )
        .unwrap();
        assert_eq!(config.scroll_speed_ms.as_f64(), 40.0);
        assert_eq!(config.subdivision_mode, SubdivisionMode::Sixteen);
        assert_eq!(config.lane_offsets, DEFAULT_LANE_OFFSETS);
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_error_names_field_path() {
        let err = EditorConfig::from_json(r#"{ "lane_margin": "wide" }"#).unwrap_err();
        match err {
            ConfigError::Json(err) => assert_eq!(err.path().to_string(), "lane_margin"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_values_out_of_range_are_rejected() {
        for (source, field) in [
            (r#"{ "space_per_ms": -1.0 }"#, "space_per_ms"),
            (r#"{ "overlap_epsilon": 0.0 }"#, "overlap_epsilon"),
            (r#"{ "lane_margin": -0.5 }"#, "lane_margin"),
        ] {
            match EditorConfig::from_json(source) {
                Err(ConfigError::Json(err)) => assert_eq!(err.path().to_string(), field),
                other => panic!("unexpected result for {source}: {other:?}"),
            }
        }
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_lanes_are_validated() {
        let err = EditorConfig::from_json(r#"{ "lane_offsets": [0.0, 0.0, 1.0, 2.0] }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "lane_offsets",
                ..
            }
        ));
    }
}
