/// Chart related types.
pub mod chart;

/// Timing point related types.
pub mod control_point;

/// Hit object related types.
pub mod hit_object;

/// Gamemods related types.
pub mod mods;

/// Playfield positions.
pub mod pos;
