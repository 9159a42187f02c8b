//! The numeric report a reform computation hands to the presentation
//! layer. Percentages and rounding follow the dashboard's display
//! conventions (changes to 0.1%, Gini to 0.001, dollar amounts whole);
//! chart and text layout stay with the caller.

use crate::{
    engine::ReformOutcome,
    selection::{ReformLevel, ReformSelection},
    stats::Stats,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Poverty-rate breakdown entry, percentages.
#[derive(Debug, Clone, Serialize)]
pub struct GroupChange {
    /// Stable group key (e.g. "child", "white_non_hispanic").
    pub demog: &'static str,
    /// Display label (e.g. "People with disabilities").
    pub label: &'static str,
    pub baseline_pov_rate_pct: f64,
    pub pov_rate_pct: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReformReport {
    pub run_id: String,
    pub computed_at: DateTime<Utc>,
    pub state: String,
    pub level: ReformLevel,

    // Headline numbers.
    /// Budget-neutral UBI per eligible person, dollars per month.
    pub monthly_ubi: f64,
    pub annual_ubi: f64,
    pub revenue: f64,
    /// Weighted count of UBI-eligible people.
    pub ubi_population: f64,
    pub percent_better_off: f64,
    pub avg_resource_change_per_person: f64,

    // Economic overview.
    pub baseline_poverty_rate_pct: f64,
    pub poverty_rate_pct: f64,
    pub poverty_rate_change_pct: f64,
    pub baseline_poverty_gap: f64,
    pub poverty_gap: f64,
    pub poverty_gap_change_pct: f64,
    pub baseline_gini: f64,
    pub gini: f64,
    pub gini_change_pct: f64,

    // Poverty-rate breakdown by demographic group.
    pub breakdown: Vec<GroupChange>,
}

impl ReformReport {
    pub fn assemble(
        selection: &ReformSelection,
        outcome: &ReformOutcome,
        stats: &Stats,
    ) -> Self {
        let breakdown = stats
            .breakdown
            .iter()
            .map(|g| GroupChange {
                demog: g.demog.key(),
                label: g.demog.label(),
                baseline_pov_rate_pct: round1(g.baseline_pov_rate * 100.0),
                pov_rate_pct: round1(g.pov_rate * 100.0),
                change_pct: round1(g.change * 100.0),
            })
            .collect();

        Self {
            run_id: Uuid::new_v4().to_string(),
            computed_at: Utc::now(),
            state: selection.state.clone(),
            level: selection.level,
            monthly_ubi: (outcome.ubi_annual / 12.0).round(),
            annual_ubi: outcome.ubi_annual,
            revenue: outcome.revenue,
            ubi_population: outcome.ubi_population,
            percent_better_off: round1(stats.winners_share * 100.0),
            avg_resource_change_per_person: stats.avg_resource_change_per_person.trunc(),
            baseline_poverty_rate_pct: round1(stats.baseline_poverty_rate * 100.0),
            poverty_rate_pct: round1(stats.poverty_rate * 100.0),
            poverty_rate_change_pct: round1(stats.poverty_rate_change * 100.0),
            baseline_poverty_gap: stats.baseline_poverty_gap,
            poverty_gap: stats.poverty_gap,
            poverty_gap_change_pct: round1(stats.poverty_gap_change * 100.0),
            baseline_gini: round3(stats.baseline_gini),
            gini: round3(stats.gini),
            gini_change_pct: round1(stats.gini_change * 100.0),
            breakdown,
        }
    }

    /// The "Economic overview" chart series: (label, percent change).
    pub fn overview_series(&self) -> [(&'static str, f64); 3] {
        [
            ("Poverty rate", self.poverty_rate_change_pct),
            ("Poverty gap", self.poverty_gap_change_pct),
            ("Gini index", self.gini_change_pct),
        ]
    }

    /// The "Poverty rate breakdown" chart series: (label, percent change).
    pub fn breakdown_series(&self) -> Vec<(&'static str, f64)> {
        self.breakdown
            .iter()
            .map(|g| (g.label, g.change_pct))
            .collect()
    }
}

impl std::fmt::Display for ReformReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Monthly UBI: ${}", group_thousands(self.monthly_ubi))?;
        writeln!(f, "Percent better off: {}%", self.percent_better_off)?;
        write!(
            f,
            "Average change in resources per person: ${}",
            group_thousands(self.avg_resource_change_per_person)
        )
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round3(x: f64) -> f64 {
    (x * 1_000.0).round() / 1_000.0
}

/// Whole-dollar display with thousands separators ("1,234"); NaN renders
/// as "undefined" so degenerate reforms stay readable.
fn group_thousands(x: f64) -> String {
    if !x.is_finite() {
        return "undefined".to_string();
    }
    let negative = x < 0.0;
    let digits = format!("{:.0}", x.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_234.0), "1,234");
        assert_eq!(group_thousands(-1_234_567.0), "-1,234,567");
        assert_eq!(group_thousands(f64::NAN), "undefined");
    }

    #[test]
    fn rounding_precision() {
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(12.36), 12.4);
        assert_eq!(round3(0.48251), 0.483);
    }
}
