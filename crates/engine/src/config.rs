//! Game and replay configuration.

use std::path::Path;

use num_bigint::BigInt;
use num_traits::Signed;
use protocol::{EntityId, GameConfigRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::math::{wad, Wad};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Load configuration from `path`, writing a default file there if absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config: Config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.game.validate()?;
        Ok(config)
    }
}

/// Per-match constants. WAD values are written as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GameConfig {
    /// Mass multiplier applied when a player jumps lines.
    #[serde(with = "protocol::serde_big", default = "default_line_jump_decay_factor")]
    pub line_jump_decay_factor: Wad,
    #[serde(with = "protocol::serde_big", default = "default_velocity_coefficient")]
    pub velocity_coefficient: Wad,
    #[serde(with = "protocol::serde_big", default = "default_min_food_mass")]
    pub min_food_mass: Wad,
    #[serde(with = "protocol::serde_big", default = "default_max_food_mass")]
    pub max_food_mass: Wad,
    #[serde(with = "protocol::serde_big", default = "default_wall_mass")]
    pub wall_mass: Wad,
    #[serde(with = "protocol::serde_big", default = "default_player_starting_mass")]
    pub player_starting_mass: Wad,
    #[serde(with = "protocol::serde_big", default = "default_line_width")]
    pub line_width: Wad,
    /// Minimum edge-to-edge gap before a consumable spawns between neighbors.
    #[serde(with = "protocol::serde_big", default = "default_consumable_spawn_gap")]
    pub consumable_spawn_gap: Wad,
    /// How long a power pellet keeps its consumer powered up.
    #[serde(with = "protocol::serde_big", default = "default_power_pellet_effect_time")]
    pub power_pellet_effect_time: Wad,
    /// One in this many spawned consumables is a power pellet.
    #[serde(default = "default_power_pellet_spawn_odds")]
    pub power_pellet_spawn_odds: u32,
    /// How many lifetime scores each player keeps.
    #[serde(default = "default_high_score_top_k")]
    pub high_score_top_k: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            line_jump_decay_factor: default_line_jump_decay_factor(),
            velocity_coefficient: default_velocity_coefficient(),
            min_food_mass: default_min_food_mass(),
            max_food_mass: default_max_food_mass(),
            wall_mass: default_wall_mass(),
            player_starting_mass: default_player_starting_mass(),
            line_width: default_line_width(),
            consumable_spawn_gap: default_consumable_spawn_gap(),
            power_pellet_effect_time: default_power_pellet_effect_time(),
            power_pellet_spawn_odds: default_power_pellet_spawn_odds(),
            high_score_top_k: default_high_score_top_k(),
        }
    }
}

impl GameConfig {
    /// Check the invariants the contract enforces at deploy time.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.velocity_coefficient.is_positive() {
            return Err(EngineError::InvalidConfig("velocity_coefficient must be positive"));
        }
        if !self.max_food_mass.is_positive() {
            return Err(EngineError::InvalidConfig("max_food_mass must be positive"));
        }
        if self.min_food_mass.is_negative() {
            return Err(EngineError::InvalidConfig("min_food_mass must not be negative"));
        }
        // A power pellet weighs 2 * max_food_mass and has to fit in the gap.
        if self.consumable_spawn_gap <= BigInt::from(4) * &self.max_food_mass {
            return Err(EngineError::InvalidConfig(
                "consumable_spawn_gap must exceed 4 * max_food_mass",
            ));
        }
        if self.power_pellet_spawn_odds == 0 {
            return Err(EngineError::InvalidConfig("power_pellet_spawn_odds must be positive"));
        }
        if self.high_score_top_k == 0 {
            return Err(EngineError::InvalidConfig("high_score_top_k must be positive"));
        }
        Ok(())
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        usize::from(self.high_score_top_k)
    }
}

impl TryFrom<GameConfigRecord> for GameConfig {
    type Error = EngineError;

    fn try_from(record: GameConfigRecord) -> Result<Self, Self::Error> {
        let config = Self {
            line_jump_decay_factor: record.line_jump_decay_factor,
            velocity_coefficient: record.velocity_coefficient,
            min_food_mass: record.min_food_mass,
            max_food_mass: record.max_food_mass,
            wall_mass: record.wall_mass,
            player_starting_mass: record.player_starting_mass,
            line_width: record.line_width,
            consumable_spawn_gap: record.consumable_spawn_gap,
            power_pellet_effect_time: record.power_pellet_effect_time,
            power_pellet_spawn_odds: record.power_pellet_spawn_odds,
            high_score_top_k: record.high_score_top_k,
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_line_jump_decay_factor() -> Wad {
    BigInt::from(900_000_000_000_000_000u64)
}
fn default_velocity_coefficient() -> Wad {
    wad(20)
}
fn default_min_food_mass() -> Wad {
    wad(1)
}
fn default_max_food_mass() -> Wad {
    wad(3)
}
fn default_wall_mass() -> Wad {
    wad(30)
}
fn default_player_starting_mass() -> Wad {
    wad(10)
}
fn default_line_width() -> Wad {
    wad(1000)
}
fn default_consumable_spawn_gap() -> Wad {
    wad(50)
}
fn default_power_pellet_effect_time() -> Wad {
    wad(10)
}
fn default_power_pellet_spawn_odds() -> u32 {
    20
}
fn default_high_score_top_k() -> u8 {
    3
}

/// Replay and diagnostic switches, passed explicitly into each forward pass.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DebugConfig {
    /// Stop each line after this many iterations.
    #[serde(default)]
    pub stop_at_iteration: Option<u64>,
    /// Only forward this line.
    #[serde(default)]
    pub only_line: Option<u32>,
    /// Collect resolution events.
    #[serde(default)]
    pub notify: bool,
    /// Restrict events to those involving this player.
    #[serde(default)]
    pub focus_player: Option<EntityId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_spawn_gap_must_fit_a_power_pellet() {
        let config = GameConfig {
            consumable_spawn_gap: wad(12),
            max_food_mass: wad(3),
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_odds_rejected() {
        let config = GameConfig {
            power_pellet_spawn_odds: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("velocity_coefficient = \"20000000000000000000\""));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.game, config.game);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = "[game]\nhigh_score_top_k = 5\nmax_food_mass = \"2000000000000000000\"\n";
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.game.high_score_top_k, 5);
        assert_eq!(config.game.max_food_mass, wad(2));
        assert_eq!(config.game.wall_mass, wad(30));
        assert!(config.debug.stop_at_iteration.is_none());
    }

    #[test]
    fn test_load_writes_default_when_missing() {
        let dir = std::env::temp_dir().join(format!("lines-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.game, GameConfig::default());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.game, config.game);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
