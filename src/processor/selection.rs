//! Map selection applied before assembly.
//!
//! A map belongs to a game-mode dataset only when its primary flag matches
//! the mode and it is not smaller than the minimum extent.

use crate::error::{MapSpaceError, Result};
use crate::model::{GameMode, PointElement, Team, VectorMap};

/// First red flag, otherwise the first neutral flag. Blue flags are only
/// ever the second half of a pair and never primary.
pub fn primary_flag(flags: &[PointElement]) -> Option<&PointElement> {
    flags
        .iter()
        .find(|f| f.team == Team::Red)
        .or_else(|| flags.iter().find(|f| f.team == Team::None))
}

pub fn check(map: &VectorMap, mode: GameMode, min_extent: f64) -> Result<()> {
    let extents = map.extents;
    if extents.width < min_extent || extents.height < min_extent {
        return Err(MapSpaceError::SelectionMismatch(format!(
            "{}×{} is below the minimum extent {}",
            extents.width, extents.height, min_extent
        )));
    }

    let flag = primary_flag(&map.flags)
        .ok_or_else(|| MapSpaceError::SelectionMismatch("no primary flag".into()))?;

    match (mode, flag.team) {
        (GameMode::Ctf, Team::Red) | (GameMode::Nf, Team::None) => Ok(()),
        (mode, team) => Err(MapSpaceError::SelectionMismatch(format!(
            "primary flag is {} but mode {} needs {}",
            String::from(team),
            mode.name(),
            match mode {
                GameMode::Ctf => "red",
                GameMode::Nf => "none",
            }
        ))),
    }
}
