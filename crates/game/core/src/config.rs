/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Maximum action points for characters created without an explicit value.
    pub default_action_points: u32,
    /// Action points deducted for every tile walked while in combat.
    pub movement_ap_cost: u32,
    /// Action points deducted for talking to, using, or looking at an object.
    pub interaction_ap_cost: u32,
    /// Action points deducted for using a skill on a target.
    pub skill_ap_cost: u32,
    /// Radius (in tiles, diagonals count as one) within which idle characters
    /// notice living enemies and pull themselves into combat.
    pub detection_radius: u32,
}

impl GameConfig {
    // ===== compile-time constants =====
    /// Number of diplomacy flag bits. Factions and personal flags share them.
    pub const MAX_FACTIONS: u32 = u64::BITS;
    /// Distinct interaction kinds an object may offer at once.
    pub const MAX_INTERACTIONS: usize = 5;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ACTION_POINTS: u32 = 8;
    pub const DEFAULT_MOVEMENT_AP_COST: u32 = 1;
    pub const DEFAULT_INTERACTION_AP_COST: u32 = 2;
    pub const DEFAULT_SKILL_AP_COST: u32 = 2;
    pub const DEFAULT_DETECTION_RADIUS: u32 = 6;

    pub fn new() -> Self {
        Self {
            default_action_points: Self::DEFAULT_ACTION_POINTS,
            movement_ap_cost: Self::DEFAULT_MOVEMENT_AP_COST,
            interaction_ap_cost: Self::DEFAULT_INTERACTION_AP_COST,
            skill_ap_cost: Self::DEFAULT_SKILL_AP_COST,
            detection_radius: Self::DEFAULT_DETECTION_RADIUS,
        }
    }

    pub fn with_movement_ap_cost(mut self, cost: u32) -> Self {
        self.movement_ap_cost = cost;
        self
    }

    pub fn with_detection_radius(mut self, radius: u32) -> Self {
        self.detection_radius = radius;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
