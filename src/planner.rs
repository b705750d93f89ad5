use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of sessions in every revision plan.
pub const SESSION_COUNT: usize = 7;
/// The first session is scheduled this many days before the exam.
pub const WINDOW_DAYS: i64 = 14;
pub const SESSION_SPACING_DAYS: i64 = 2;

/// One scheduled study block of a revision plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSession {
    /// Position in the plan; also the identifier used for completion updates.
    pub index: u32,
    pub date: DateTime<Utc>,
    pub topics: Vec<String>,
    pub completed: bool,
}

/// Spreads `topics` over seven sessions, two days apart, starting two weeks
/// before `exam_date`.
///
/// Sessions are filled front to back with `ceil(N / 7)` topics each, so
/// trailing sessions may be empty but no topic is ever dropped.
pub fn plan_revision(topics: &[String], exam_date: DateTime<Utc>) -> Vec<RevisionSession> {
    let start = exam_date - Duration::days(WINDOW_DAYS);
    let per_session = topics.len().div_ceil(SESSION_COUNT);

    (0..SESSION_COUNT)
        .map(|i| {
            let from = (i * per_session).min(topics.len());
            let to = ((i + 1) * per_session).min(topics.len());

            RevisionSession {
                index: i as u32,
                date: start + Duration::days(SESSION_SPACING_DAYS * i as i64),
                topics: topics[from..to].to_vec(),
                completed: false,
            }
        })
        .collect()
}

/// Whether the whole revision window of `exam_date` is representable.
pub fn window_fits(exam_date: DateTime<Utc>) -> bool {
    exam_date.checked_sub_signed(Duration::days(WINDOW_DAYS)).is_some()
}
