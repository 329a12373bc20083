use serde::{Deserialize, Serialize};

/// Normalized offensive play outcome. Rows that normalize to `Other`
/// (kneels, punts, penalties, timeouts...) never reach the feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayType {
    Run,
    Pass,
    Other,
}

impl PlayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayType::Run => "Run",
            PlayType::Pass => "Pass",
            PlayType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formation {
    Standard,
    Shotgun,
    Pistol,
    Trips,
    Empty,
    Bunch,
    Wildcat,
}

impl Formation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formation::Standard => "Standard",
            Formation::Shotgun => "Shotgun",
            Formation::Pistol => "Pistol",
            Formation::Trips => "Trips",
            Formation::Empty => "Empty",
            Formation::Bunch => "Bunch",
            Formation::Wildcat => "Wildcat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Middle,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::Middle => "Middle",
            Direction::Unknown => "Unknown",
        }
    }
}

/// Maps a free-text play-type label onto `{Run, Pass, Other}`.
///
/// Case-insensitive substring rules; "rush" is checked before the pass
/// family so a hypothetical overlap resolves to Run. Total: malformed or
/// unrecognized input maps to `Other`, never an error.
pub fn normalize_play_type(raw: &str) -> PlayType {
    let text = raw.to_lowercase();
    if text.contains("rush") {
        return PlayType::Run;
    }
    if text.contains("pass") || text.contains("sack") || text.contains("interception") {
        return PlayType::Pass;
    }
    PlayType::Other
}

/// Infers the offensive formation from a play description.
///
/// Fixed priority order, first keyword wins, default `Standard`. Callers
/// with a missing description pass the empty string.
pub fn parse_formation(raw: &str) -> Formation {
    let text = raw.to_lowercase();
    if text.contains("shotgun") {
        return Formation::Shotgun;
    }
    if text.contains("pistol") {
        return Formation::Pistol;
    }
    if text.contains("empty") {
        return Formation::Empty;
    }
    if text.contains("trips") {
        return Formation::Trips;
    }
    if text.contains("bunch") {
        return Formation::Bunch;
    }
    if text.contains("wildcat") {
        return Formation::Wildcat;
    }
    Formation::Standard
}

/// Infers the lateral play direction from a play description.
///
/// "middle" and "center" collapse onto `Middle`; anything without a
/// direction keyword is `Unknown`.
pub fn parse_direction(raw: &str) -> Direction {
    let text = raw.to_lowercase();
    if text.contains("left") {
        return Direction::Left;
    }
    if text.contains("right") {
        return Direction::Right;
    }
    if text.contains("middle") || text.contains("center") {
        return Direction::Middle;
    }
    Direction::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_type_keywords_normalize() {
        assert_eq!(normalize_play_type("Rush Right"), PlayType::Run);
        assert_eq!(normalize_play_type("Pass Incomplete"), PlayType::Pass);
        assert_eq!(normalize_play_type("SACKED for -7 yards"), PlayType::Pass);
        assert_eq!(normalize_play_type("Interception Return"), PlayType::Pass);
        assert_eq!(normalize_play_type("Kneel"), PlayType::Other);
        assert_eq!(normalize_play_type(""), PlayType::Other);
    }

    #[test]
    fn formation_defaults_to_standard() {
        assert_eq!(parse_formation("A 4 yard gain up the gut"), Formation::Standard);
        assert_eq!(parse_formation(""), Formation::Standard);
    }

    #[test]
    fn formation_keywords_match_case_insensitively() {
        assert_eq!(parse_formation("SHOTGUN snap, pass deep"), Formation::Shotgun);
        assert_eq!(parse_formation("from the pistol look"), Formation::Pistol);
        assert_eq!(parse_formation("empty backfield"), Formation::Empty);
        assert_eq!(parse_formation("Trips right"), Formation::Trips);
        assert_eq!(parse_formation("bunch formation left"), Formation::Bunch);
        assert_eq!(parse_formation("Wildcat direct snap"), Formation::Wildcat);
    }

    #[test]
    fn direction_center_collapses_to_middle() {
        assert_eq!(parse_direction("run up the middle"), Direction::Middle);
        assert_eq!(parse_direction("QB sneak center"), Direction::Middle);
        assert_eq!(parse_direction("toss left"), Direction::Left);
        assert_eq!(parse_direction("screen RIGHT"), Direction::Right);
        assert_eq!(parse_direction("12 yard completion"), Direction::Unknown);
    }
}
