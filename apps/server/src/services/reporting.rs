//! Aggregations over run case outcomes.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{RunCaseStatus, RunSummary, UserCount, UNASSIGNED_LABEL};

/// Count cases per status. Statuses that never occur stay at zero.
pub fn summarize<I>(statuses: I) -> RunSummary
where
    I: IntoIterator<Item = RunCaseStatus>,
{
    let mut summary = RunSummary::default();
    for status in statuses {
        match status {
            RunCaseStatus::Ok => summary.ok += 1,
            RunCaseStatus::Nok => summary.nok += 1,
            RunCaseStatus::Blocked => summary.blocked += 1,
            RunCaseStatus::Untested => summary.untested += 1,
        }
        summary.total += 1;
    }
    summary
}

/// Share of executed cases as a whole percentage, rounded half up.
///
/// An empty run reports 0.
pub fn completion_percentage(summary: &RunSummary) -> u32 {
    if summary.total == 0 {
        return 0;
    }
    let executed = summary.executed();
    ((200 * executed + summary.total) / (2 * summary.total)) as u32
}

/// Count cases per assignee, largest first; ties sort by label.
///
/// `names` resolves assignee ids to display names. Unassigned cases are
/// counted under [`UNASSIGNED_LABEL`].
pub fn count_by_assignee<I>(assignees: I, names: &HashMap<Uuid, String>) -> Vec<UserCount>
where
    I: IntoIterator<Item = Option<Uuid>>,
{
    let mut counts: HashMap<Option<Uuid>, u64> = HashMap::new();
    for assignee in assignees {
        *counts.entry(assignee).or_insert(0) += 1;
    }

    let mut rows: Vec<UserCount> = counts
        .into_iter()
        .map(|(user_id, count)| UserCount {
            user: assignee_label(user_id, names),
            user_id,
            count,
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user.cmp(&b.user)));
    rows
}

/// Display label for an assignee.
pub fn assignee_label(user_id: Option<Uuid>, names: &HashMap<Uuid, String>) -> String {
    match user_id {
        None => UNASSIGNED_LABEL.to_string(),
        Some(id) => names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string()),
    }
}
