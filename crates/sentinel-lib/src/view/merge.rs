//! Reconciliation of the full and summary snapshots into one view

use crate::models::{CostView, FullSnapshot, MergedView, PodCounts, SummarySnapshot};

/// Combine the latest snapshots into one metrics view.
///
/// Returns `None` until a full snapshot exists: a summary alone carries no
/// cost, savings or pod-health breakdown. cpu, memory and total pods prefer
/// the summary field by field; everything else comes from the full snapshot.
pub fn merge(full: Option<&FullSnapshot>, summary: Option<&SummarySnapshot>) -> Option<MergedView> {
    let full = full?;

    let cpu = summary
        .and_then(|s| s.cpu)
        .unwrap_or(full.metrics.cpu_usage);
    let memory = summary
        .and_then(|s| s.memory)
        .unwrap_or(full.metrics.memory_usage);
    let total_pods = summary
        .and_then(|s| s.pods)
        .unwrap_or(full.cluster.total_pods);

    Some(MergedView {
        cpu,
        memory,
        pods: PodCounts {
            total: total_pods,
            healthy: full.cluster.healthy_pods,
            unhealthy: full.cluster.unhealthy_pods,
        },
        cost: CostView {
            daily: full.cost.daily,
            saved_today: full.savings.total_saved,
            monthly_projection: full.cost.monthly,
            monthly_savings: full.savings.projected_monthly,
            savings_percent: savings_percent(full),
        },
    })
}

/// Savings percent of a full snapshot.
///
/// An explicit efficiency score wins; otherwise projected monthly savings
/// over monthly cost. A zero monthly cost yields zero.
pub fn savings_percent(full: &FullSnapshot) -> f64 {
    if let Some(explicit) = full.savings.efficiency_score {
        return explicit;
    }

    let monthly = full.cost.monthly;
    if monthly == 0.0 || !monthly.is_finite() {
        return 0.0;
    }

    let percent = full.savings.projected_monthly / monthly * 100.0;
    if percent.is_finite() {
        percent
    } else {
        0.0
    }
}
