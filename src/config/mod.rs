//! Configuration management for Flowboard
//!
//! Handles layout spacing, default node measures and editor defaults.
//! Every field can be overridden through a `FLOWBOARD_*` environment variable.

use crate::editor::SidebarPosition;
use crate::graph::{Direction, Size};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Layout engine configuration
    pub layout: LayoutConfig,
    /// Editor state defaults
    pub editor: EditorConfig,
}

/// Spacing and sizing used by the layered layout and the auxiliary placer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Default flow direction when the caller does not pass one
    pub direction: Direction,
    /// Gap between neighbouring nodes of the same rank
    pub node_sep: f64,
    /// Gap between consecutive ranks
    pub rank_sep: f64,
    /// Extra rank gap added for left-to-right layouts (edge labels need the room)
    pub horizontal_rank_bonus: f64,
    /// Measure used for primary nodes that were never measured
    pub default_node_size: Size,
    /// Fixed size of MCP, memory and storage nodes
    pub auxiliary_node_size: Size,
    /// Cross-axis gap between a parent and its auxiliary children
    pub auxiliary_offset: f64,
    /// Flow-axis distance between the centers of sibling auxiliary nodes
    pub auxiliary_spacing: f64,
    /// Barycenter ordering sweeps
    pub ordering_iterations: usize,
}

/// Editor defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Side of the canvas the workflow form is docked on
    pub sidebar_position: SidebarPosition,
}

impl LayoutConfig {
    /// Rank separation for the given direction
    pub fn rank_sep_for(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Down => self.rank_sep,
            Direction::Right => self.rank_sep + self.horizontal_rank_bonus,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: env_or("FLOWBOARD_DIRECTION", Direction::Down),
            node_sep: env_or("FLOWBOARD_NODE_SEP", 100.0),
            rank_sep: env_or("FLOWBOARD_RANK_SEP", 60.0),
            horizontal_rank_bonus: 50.0,
            default_node_size: Size {
                width: env_or("FLOWBOARD_NODE_WIDTH", 180.0),
                height: env_or("FLOWBOARD_NODE_HEIGHT", 80.0),
            },
            auxiliary_node_size: Size { width: 120.0, height: 60.0 },
            auxiliary_offset: env_or("FLOWBOARD_AUX_OFFSET", 80.0),
            auxiliary_spacing: env_or("FLOWBOARD_AUX_SPACING", 80.0),
            ordering_iterations: 4,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            sidebar_position: env_or("FLOWBOARD_SIDEBAR", SidebarPosition::Right),
        }
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

/// Read and parse an environment variable, falling back on absence or parse failure
fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("⚠️ Ignoring unparseable {}={:?}", key, raw);
            fallback
        }),
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sep_grows_for_horizontal_layouts() {
        let config = LayoutConfig {
            rank_sep: 60.0,
            horizontal_rank_bonus: 50.0,
            ..LayoutConfig::default()
        };
        assert_eq!(config.rank_sep_for(Direction::Down), 60.0);
        assert_eq!(config.rank_sep_for(Direction::Right), 110.0);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("FLOWBOARD_TEST_GARBAGE", "not-a-number");
        let value: f64 = env_or("FLOWBOARD_TEST_GARBAGE", 42.0);
        assert_eq!(value, 42.0);
        std::env::remove_var("FLOWBOARD_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_parses_direction() {
        std::env::set_var("FLOWBOARD_TEST_DIRECTION", "right");
        let value: Direction = env_or("FLOWBOARD_TEST_DIRECTION", Direction::Down);
        assert_eq!(value, Direction::Right);
        std::env::remove_var("FLOWBOARD_TEST_DIRECTION");
    }
}
