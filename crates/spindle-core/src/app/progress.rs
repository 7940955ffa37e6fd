//! Progress telemetry helpers.

use crate::domain::Progress;

/// Character budget of the remaining-input preview.
pub const PREVIEW_LIMIT: usize = 60;
const ELLIPSIS: &str = "...";

/// Join `texts` with `", "` and cap the result at [`PREVIEW_LIMIT`] characters,
/// marking truncation with `...`.
pub fn preview<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let joined = texts.into_iter().collect::<Vec<_>>().join(", ");
    if joined.chars().count() <= PREVIEW_LIMIT {
        return joined;
    }
    let mut cut: String = joined.chars().take(PREVIEW_LIMIT).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Whole percent of `done` over `total`, clamped to 0..=100.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    // u128 なので done * 100 は桁あふれしない
    let done = done.min(total) as u128;
    ((done * 100) / total as u128) as u8
}

pub fn running(activity: &str, done: usize, total: usize, remaining_preview: &str) -> Progress {
    Progress {
        activity: activity.to_string(),
        percent: percent(done, total),
        status: format!("{done} of {total} complete, remaining: {remaining_preview}"),
        completed: false,
    }
}

pub fn stopping(stopped: usize, total: usize) -> Progress {
    Progress {
        activity: "Stopping".to_string(),
        percent: percent(stopped, total),
        status: format!("stopping {stopped} of {total}"),
        completed: false,
    }
}

pub fn finished(activity: &str, done: usize, total: usize) -> Progress {
    Progress {
        activity: activity.to_string(),
        percent: percent(done, total),
        status: format!("{done} of {total} harvested"),
        completed: true,
    }
}
