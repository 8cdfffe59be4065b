use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Demo usage record for one client within the quota window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoUsage {
    pub count: u32,
    pub scenarios_viewed: BTreeSet<String>,
    pub first_used_at: DateTime<Utc>,
}

impl DemoUsage {
    /// Fresh record for a client's first demo run.
    pub fn first(scenario_id: &str) -> Self {
        Self {
            count: 1,
            scenarios_viewed: BTreeSet::from([scenario_id.to_string()]),
            first_used_at: Utc::now(),
        }
    }

    /// Count another run. Repeat scenarios count toward the quota but are
    /// only listed once.
    pub fn record(&mut self, scenario_id: &str) {
        self.count = self.count.saturating_add(1);
        if !self.scenarios_viewed.contains(scenario_id) {
            self.scenarios_viewed.insert(scenario_id.to_string());
        }
    }
}

/// Demo quota status as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    pub reset_in_seconds: u64,
    pub usage: Option<DemoUsage>,
}

impl DemoLimitResult {
    pub fn from_usage(limit: u32, usage: Option<DemoUsage>, reset_in_seconds: u64) -> Self {
        let count = usage.as_ref().map(|u| u.count).unwrap_or(0);
        let remaining = limit.saturating_sub(count);

        Self {
            allowed: remaining > 0,
            remaining,
            limit,
            reset_in_seconds: if usage.is_some() { reset_in_seconds } else { 0 },
            usage,
        }
    }
}

/// Render a countdown in the coarsest sensible unit.
///
/// `45` → `"45 sec"`, `150` → `"3 min"`, `7200` → `"2 h"`,
/// `19800` → `"5 h 30 min"`. Zero and negative values render as `"now"`.
pub fn format_reset_time(seconds: i64) -> String {
    if seconds <= 0 {
        return "now".to_string();
    }

    if seconds < 60 {
        return format!("{seconds} sec");
    }

    if seconds < 3600 {
        let minutes = (seconds + 59) / 60;
        return format!("{minutes} min");
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if minutes == 0 {
        format!("{hours} h")
    } else {
        format!("{hours} h {minutes} min")
    }
}
