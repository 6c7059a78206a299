use wasteland_core::{GameConfig, Position, RenderPosition};

/// Level session configuration shared by the session and its orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub game: GameConfig,
    /// Per-frame update period (queue waits, hostiles in sight, combat end).
    pub frame_interval_ms: u64,
    /// World clock period (time of day, quest timers).
    pub clock_interval_ms: u64,
    /// Pixel size of one tile, used for render placement.
    pub tile_width: i32,
    pub tile_height: i32,
}

impl SessionConfig {
    pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 50;
    pub const DEFAULT_CLOCK_INTERVAL_MS: u64 = 1_000;
    pub const DEFAULT_TILE_WIDTH: i32 = 72;
    pub const DEFAULT_TILE_HEIGHT: i32 = 36;

    pub fn with_game_config(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    pub fn with_frame_interval_ms(mut self, interval: u64) -> Self {
        self.frame_interval_ms = interval.max(1);
        self
    }

    pub fn with_clock_interval_ms(mut self, interval: u64) -> Self {
        self.clock_interval_ms = interval.max(1);
        self
    }

    pub fn with_tile_size(mut self, width: i32, height: i32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    /// Pixel placement of a tile's origin.
    pub fn render_position(&self, tile: Position) -> RenderPosition {
        RenderPosition::new(tile.x * self.tile_width, tile.y * self.tile_height)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            frame_interval_ms: Self::DEFAULT_FRAME_INTERVAL_MS,
            clock_interval_ms: Self::DEFAULT_CLOCK_INTERVAL_MS,
            tile_width: Self::DEFAULT_TILE_WIDTH,
            tile_height: Self::DEFAULT_TILE_HEIGHT,
        }
    }
}
