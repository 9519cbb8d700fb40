use std::fmt::Display;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::conversation::ConversationMessage;

/// Placeholder rendered for any metric the device did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Recent heart-rate range in beats per minute. Either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeartRateRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl HeartRateRange {
    fn render(&self) -> String {
        if self.min.is_none() && self.max.is_none() {
            return NOT_AVAILABLE.to_string();
        }
        format!(
            "{}-{} bpm",
            with_unit(self.min, ""),
            with_unit(self.max, "")
        )
    }
}

/// Behavioral and physiological metrics reported by the client device.
/// Every field is optional; absent values render as `N/A`. Counts are `f64`
/// because devices report them as quantities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
    #[serde(default)]
    pub heart_rate: Option<HeartRateRange>,
    #[serde(default)]
    pub step_count: Option<f64>,
    #[serde(default)]
    pub active_energy_kcal: Option<f64>,
    #[serde(default)]
    pub flights_climbed: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
}

impl HealthData {
    /// Render the fixed context template, one metric per line.
    pub fn render(&self) -> String {
        let heart_rate = self
            .heart_rate
            .map_or_else(|| NOT_AVAILABLE.to_string(), |range| range.render());

        let lines = [
            "The user shared the following recent health data from their device. \
             Only bring it up when it helps the conversation."
                .to_string(),
            format!(
                "Body fat percentage: {}",
                with_unit(self.body_fat_percentage, "%")
            ),
            format!("Heart rate range: {heart_rate}"),
            format!("Step count: {}", with_unit(self.step_count, " steps")),
            format!(
                "Active energy burned: {}",
                with_unit(self.active_energy_kcal, " kcal")
            ),
            format!("Flights climbed: {}", with_unit(self.flights_climbed, "")),
            format!("Sleep: {}", with_unit(self.sleep_hours, " hours")),
        ];
        lines.join("\n")
    }

    pub fn to_system_message(&self) -> ConversationMessage {
        ConversationMessage::system(self.render())
    }
}

fn with_unit<T: Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => NOT_AVAILABLE.to_string(),
    }
}
