//! Battle configuration.
//!
//! Stored as TOML. Every field has a default, so a partial file only overrides
//! what it names.

use brawl_common::{ConfigError, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::fighter::HURT_DELAY_FRAMES;
use crate::stage::{Arena, STAGE_FLOOR};

/// Battle configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === Simulation ===
    /// Seed for hit effect jitter and random decisions (None = random)
    pub seed: Option<u64>,
    /// Capacity of the event bus
    pub event_capacity: usize,

    // === Stage ===
    /// Left edge of the play area
    pub viewport_x: f32,
    /// Top edge of the play area
    pub viewport_y: f32,
    /// Width of the play area
    pub viewport_width: f32,
    /// Height of the play area
    pub viewport_height: f32,
    /// Floor height
    pub stage_floor: f32,

    // === Round ===
    /// Health of each fighter at round start
    pub max_hit_points: i32,
    /// Clock counts per round
    pub round_time: u32,
    /// Milliseconds per clock count
    pub clock_delay_ms: f64,
    /// Frame-times both fighters freeze for after a hit
    pub hit_stop_frames: u32,
    /// Milliseconds the winner is shown before the round ends
    pub victory_hold_ms: f64,

    // === Fighters ===
    /// Built-in fighter names or paths to RON fighter assets
    pub fighters: [String; 2],
    /// Spawn x of player one (faces right)
    pub spawn_one_x: f32,
    /// Spawn x of player two (faces left)
    pub spawn_two_x: f32,
    /// Milliseconds between decisions of computer-controlled fighters
    pub decision_interval_ms: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: None,
            event_capacity: 1024,

            viewport_x: 448.0,
            viewport_y: 16.0,
            viewport_width: 384.0,
            viewport_height: 224.0,
            stage_floor: STAGE_FLOOR,

            max_hit_points: 144,
            round_time: 99,
            clock_delay_ms: 664.0,
            hit_stop_frames: HURT_DELAY_FRAMES,
            victory_hold_ms: 5000.0,

            fighters: ["ryu".to_string(), "ken".to_string()],
            spawn_one_x: 580.0,
            spawn_two_x: 720.0,
            decision_interval_ms: 100.0,
        }
    }
}

impl BattleConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}");
                Self::default()
            },
        }
    }

    /// Parse a configuration, clamping out-of-range values.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = self
            .to_toml_string()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.event_capacity = self.event_capacity.clamp(16, 65_536);

        // Stage must fit at least one push box on each side
        self.viewport_width = self.viewport_width.clamp(128.0, 4096.0);
        self.viewport_height = self.viewport_height.clamp(64.0, 4096.0);

        // Round
        self.max_hit_points = self.max_hit_points.clamp(1, 10_000);
        self.round_time = self.round_time.clamp(1, 999);
        self.clock_delay_ms = self.clock_delay_ms.clamp(16.0, 10_000.0);
        self.hit_stop_frames = self.hit_stop_frames.min(120);
        self.victory_hold_ms = self.victory_hold_ms.clamp(0.0, 60_000.0);

        // Fighters
        let viewport = self.viewport();
        self.spawn_one_x = self.spawn_one_x.clamp(viewport.x, viewport.right());
        self.spawn_two_x = self.spawn_two_x.clamp(viewport.x, viewport.right());
        self.decision_interval_ms = self.decision_interval_ms.clamp(0.0, 10_000.0);
    }

    /// Play area rectangle.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        Rect::new(
            self.viewport_x,
            self.viewport_y,
            self.viewport_width,
            self.viewport_height,
        )
    }

    /// Stage bounds.
    #[must_use]
    pub fn arena(&self) -> Arena {
        Arena::new(self.viewport(), self.stage_floor)
    }

    /// Spawn positions of both players.
    #[must_use]
    pub fn spawns(&self) -> [Vec2; 2] {
        [
            Vec2::new(self.spawn_one_x, self.stage_floor),
            Vec2::new(self.spawn_two_x, self.stage_floor),
        ]
    }
}
