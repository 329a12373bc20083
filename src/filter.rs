use crate::features::FeatureRecord;
use crate::play_text::Direction;

/// A team needs strictly more than this many feature rows before a
/// specialized bundle is trained for it. The same floor gates the
/// direction task on labeled rows.
pub const MIN_SPECIALIZED_ROWS: usize = 50;
pub const MIN_DIRECTION_ROWS: usize = 50;

/// Which dataset a training run ended up using, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    Generic,
    Specialized { team: String, rows: usize },
    FallbackTooFewRows { team: String, rows: usize },
    FallbackUnknownTeam { team: String },
}

impl TargetSelection {
    pub fn is_specialized(&self) -> bool {
        matches!(self, TargetSelection::Specialized { .. })
    }

    /// The team a specialized bundle is scoped to, if any.
    pub fn specialized_team(&self) -> Option<&str> {
        match self {
            TargetSelection::Specialized { team, .. } => Some(team),
            _ => None,
        }
    }

    pub fn summary_line(&self) -> String {
        match self {
            TargetSelection::Generic => "full dataset (generic scope)".to_string(),
            TargetSelection::Specialized { team, rows } => {
                format!("specialized subset for {team} ({rows} plays)")
            }
            TargetSelection::FallbackTooFewRows { team, rows } => format!(
                "only {rows} plays for {team} (need more than {MIN_SPECIALIZED_ROWS}), fell back to the full dataset"
            ),
            TargetSelection::FallbackUnknownTeam { team } => {
                format!("no plays found for {team}, fell back to the full dataset")
            }
        }
    }
}

/// Picks the training rows for an optional target team. A team qualifies
/// for specialization only when its subset is strictly larger than
/// MIN_SPECIALIZED_ROWS; otherwise the full table is returned and the
/// outcome records why.
pub fn select_for_target(
    rows: &[FeatureRecord],
    target_team: Option<&str>,
) -> (Vec<FeatureRecord>, TargetSelection) {
    let Some(team) = target_team else {
        return (rows.to_vec(), TargetSelection::Generic);
    };

    let subset: Vec<FeatureRecord> = rows
        .iter()
        .filter(|r| r.offense_team == team)
        .cloned()
        .collect();
    if subset.len() > MIN_SPECIALIZED_ROWS {
        let outcome = TargetSelection::Specialized {
            team: team.to_string(),
            rows: subset.len(),
        };
        return (subset, outcome);
    }
    let outcome = if subset.is_empty() {
        TargetSelection::FallbackUnknownTeam {
            team: team.to_string(),
        }
    } else {
        TargetSelection::FallbackTooFewRows {
            team: team.to_string(),
            rows: subset.len(),
        }
    };
    (rows.to_vec(), outcome)
}

/// Rows usable by the direction task: those whose play text yielded a
/// concrete direction.
pub fn select_direction_subset(rows: &[FeatureRecord]) -> Vec<FeatureRecord> {
    rows.iter()
        .filter(|r| r.play_direction != Direction::Unknown)
        .cloned()
        .collect()
}
