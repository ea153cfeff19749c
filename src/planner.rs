use crate::error::{CpError, Result};
use serde::{Deserialize, Serialize};

/// How many isochrone rings to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepMode {
    /// One ring at the full distance budget.
    Single,
    /// Concentric rings every half hour of walking, below the budget.
    Incremental,
}

/// Travel-distance budget derived from the time a person has been missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBudget {
    pub elapsed_hours: f64,
    pub walking_speed_kmh: f64,
    pub distance_budget_m: u32,
    pub range_steps: Vec<u32>,
}

impl SearchBudget {
    /// Range steps the isochrone service can draw, the zero ring excluded.
    pub fn positive_steps(&self) -> Vec<u32> {
        self.range_steps.iter().copied().filter(|&s| s > 0).collect()
    }
}

/// Half the distance walked in `hours` at `speed_kmh`, in whole meters.
///
/// Halving keeps the isochrone request under the service's distance limit and
/// accounts for people not walking in a straight line. `None` when the result
/// does not fit in a `u32`.
pub fn calculate_half_distance(hours: f64, speed_kmh: f64) -> Option<u32> {
    meters(speed_kmh * hours / 2.0 * 1000.0)
}

fn meters(value: f64) -> Option<u32> {
    let rounded = value.round();
    (rounded >= 0.0 && rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

pub fn plan(elapsed_hours: f64, walking_speed_kmh: f64, step_mode: StepMode) -> Result<SearchBudget> {
    if !walking_speed_kmh.is_finite() || walking_speed_kmh <= 0.0 {
        return Err(CpError::InvalidBudget(format!(
            "walking speed must be a positive number of km/h, got {}",
            walking_speed_kmh
        )));
    }
    if !elapsed_hours.is_finite() || elapsed_hours <= 0.0 {
        return Err(CpError::InvalidBudget(format!(
            "elapsed time must be a positive number of hours, got {}",
            elapsed_hours
        )));
    }

    let distance_budget_m = calculate_half_distance(elapsed_hours, walking_speed_kmh)
        .ok_or_else(|| {
            CpError::InvalidBudget(format!(
                "{} h at {} km/h exceeds the largest distance budget",
                elapsed_hours, walking_speed_kmh
            ))
        })?;
    if distance_budget_m == 0 {
        return Err(CpError::InvalidBudget(format!(
            "{} h at {} km/h is less than one meter",
            elapsed_hours, walking_speed_kmh
        )));
    }

    let range_steps = match step_mode {
        StepMode::Single => vec![distance_budget_m],
        StepMode::Incremental => {
            let step = meters(walking_speed_kmh * 0.5 * 1000.0).unwrap_or(0);
            if step == 0 {
                return Err(CpError::InvalidBudget(format!(
                    "walking speed {} km/h gives no usable ring spacing",
                    walking_speed_kmh
                )));
            }
            (0..distance_budget_m).step_by(step as usize).collect()
        }
    };

    tracing::debug!(
        "Planned budget of {} m with rings {:?}",
        distance_budget_m,
        range_steps
    );

    Ok(SearchBudget {
        elapsed_hours,
        walking_speed_kmh,
        distance_budget_m,
        range_steps,
    })
}
