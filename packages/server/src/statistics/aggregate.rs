//! Pure aggregation over loaded question samples.
//!
//! Every function here is deterministic in its inputs so recomputation is
//! idempotent; the caller decides which questions to load and where results go.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use common::{QuestionStatus, StatisticMetric};

use super::time::{day_number, normalized_hour, previous_day};
use crate::entity::question;

/// The fields of a question the statistics need.
#[derive(Clone, Debug)]
pub struct QuestionSample {
    pub asked_by: i32,
    pub answered_by: Option<i32>,
    pub asked: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub answered: Option<DateTime<Utc>>,
    pub status: QuestionStatus,
}

impl From<&question::Model> for QuestionSample {
    fn from(q: &question::Model) -> Self {
        Self {
            asked_by: q.asked_by_id,
            answered_by: q.answered_by_id,
            asked: q.time_asked,
            started: q.time_started,
            answered: q.time_answered,
            status: q.status(),
        }
    }
}

/// One computed statistic, keyed by either a week start or a (day, hour) cell.
#[derive(Clone, Debug, PartialEq)]
pub struct StatRow {
    pub metric: StatisticMetric,
    pub date: Option<NaiveDate>,
    pub day: Option<i16>,
    pub hour: Option<i16>,
    pub value: f64,
}

impl StatRow {
    fn weekly(metric: StatisticMetric, week_start: NaiveDate, value: f64) -> Self {
        Self {
            metric,
            date: Some(week_start),
            day: None,
            hour: None,
            value,
        }
    }

    fn cell(metric: StatisticMetric, day: i16, hour: i16, value: f64) -> Self {
        Self {
            metric,
            date: None,
            day: Some(day),
            hour: Some(hour),
            value,
        }
    }
}

fn local_date(t: DateTime<Utc>, tz: Tz) -> NaiveDate {
    t.with_timezone(&tz).date_naive()
}

fn in_range(date: NaiveDate, first: NaiveDate, last: NaiveDate) -> bool {
    first <= date && date <= last
}

/// Mean duration truncated to whole seconds, 0 when empty.
fn mean_whole_seconds(durations: impl Iterator<Item = Duration>) -> f64 {
    let (total, count) = durations.fold((Duration::zero(), 0i32), |(sum, n), d| (sum + d, n + 1));
    if count == 0 {
        return 0.0;
    }
    (total / count).num_seconds() as f64
}

/// Mean wait of started questions asked between the week start and the
/// following Sunday (inclusive).
pub fn avg_wait(samples: &[QuestionSample], tz: Tz, week_start: NaiveDate) -> f64 {
    let last = week_start + Duration::days(7);
    mean_whole_seconds(samples.iter().filter_map(|q| {
        let started = q.started?;
        in_range(local_date(q.asked, tz), week_start, last).then(|| started - q.asked)
    }))
}

/// Mean help time of answered questions started between the week start and
/// the following Sunday (inclusive).
pub fn avg_time_helping(samples: &[QuestionSample], tz: Tz, week_start: NaiveDate) -> f64 {
    let last = week_start + Duration::days(7);
    mean_whole_seconds(samples.iter().filter_map(|q| {
        if q.status != QuestionStatus::Answered {
            return None;
        }
        let (started, answered) = (q.started?, q.answered?);
        in_range(local_date(started, tz), week_start, last).then(|| answered - started)
    }))
}

fn answered_in_week<'a>(
    samples: &'a [QuestionSample],
    tz: Tz,
    week_start: NaiveDate,
) -> impl Iterator<Item = &'a QuestionSample> {
    let last = week_start + Duration::days(6);
    samples.iter().filter(move |q| {
        q.status == QuestionStatus::Answered
            && q
                .answered
                .is_some_and(|t| in_range(local_date(t, tz), week_start, last))
    })
}

/// Answered questions resolved between the week start and Saturday.
pub fn num_answered(samples: &[QuestionSample], tz: Tz, week_start: NaiveDate) -> f64 {
    answered_in_week(samples, tz, week_start).count() as f64
}

/// Distinct askers across the same set as [`num_answered`].
pub fn students_helped(samples: &[QuestionSample], tz: Tz, week_start: NaiveDate) -> f64 {
    answered_in_week(samples, tz, week_start)
        .map(|q| q.asked_by)
        .collect::<HashSet<_>>()
        .len() as f64
}

/// Average wait for one heatmap cell.
///
/// Candidates are started questions asked on `day` in local hours
/// `hour - 1` and `hour`, plus the previous day's 23:00 hour when `hour` is 0.
/// Only candidates whose DST-normalized hour equals `hour` are averaged.
pub fn heatmap_wait(
    samples: &[QuestionSample],
    tz: Tz,
    now: DateTime<Utc>,
    day: i16,
    hour: u32,
) -> f64 {
    let is_candidate = |local: &DateTime<Tz>| {
        let (d, h) = (day_number(local), local.hour());
        (d == day && (h == hour || h + 1 == hour)) || (hour == 0 && d == previous_day(day) && h == 23)
    };

    let (total_ms, count) = samples
        .iter()
        .filter_map(|q| {
            let started = q.started?;
            let local = q.asked.with_timezone(&tz);
            (is_candidate(&local) && normalized_hour(q.asked, tz, now) == hour)
                .then(|| (started - q.asked).num_milliseconds())
        })
        .fold((0i64, 0u32), |(sum, n), ms| (sum + ms, n + 1));

    let total = total_ms as f64 / 1000.0;
    if count == 0 { total } else { total / count as f64 }
}

/// Average questions handled per TA for one heatmap cell.
///
/// Questions asked on `day` at local `hour` are grouped by local date. Each
/// date contributes questions / distinct answerers, or the raw question count
/// when nobody answered any of them.
pub fn heatmap_questions_per_ta(samples: &[QuestionSample], tz: Tz, day: i16, hour: u32) -> f64 {
    let mut per_date: BTreeMap<NaiveDate, (u32, HashSet<i32>)> = BTreeMap::new();
    for q in samples {
        let local = q.asked.with_timezone(&tz);
        if day_number(&local) != day || local.hour() != hour {
            continue;
        }
        let entry = per_date.entry(local.date_naive()).or_default();
        entry.0 += 1;
        if let Some(ta) = q.answered_by {
            entry.1.insert(ta);
        }
    }

    if per_date.is_empty() {
        return 0.0;
    }
    let ratios: f64 = per_date
        .values()
        .map(|(questions, tas)| {
            if tas.is_empty() {
                *questions as f64
            } else {
                *questions as f64 / tas.len() as f64
            }
        })
        .sum();
    ratios / per_date.len() as f64
}

/// The four weekly metrics for the week starting at `week_start`.
pub fn weekly_rows(samples: &[QuestionSample], tz: Tz, week_start: NaiveDate) -> Vec<StatRow> {
    vec![
        StatRow::weekly(
            StatisticMetric::AvgWait,
            week_start,
            avg_wait(samples, tz, week_start),
        ),
        StatRow::weekly(
            StatisticMetric::AvgTimeHelping,
            week_start,
            avg_time_helping(samples, tz, week_start),
        ),
        StatRow::weekly(
            StatisticMetric::NumAnswered,
            week_start,
            num_answered(samples, tz, week_start),
        ),
        StatRow::weekly(
            StatisticMetric::StudentsHelped,
            week_start,
            students_helped(samples, tz, week_start),
        ),
    ]
}

/// Both heatmaps over every (day, hour) cell.
pub fn heatmap_rows(samples: &[QuestionSample], tz: Tz, now: DateTime<Utc>) -> Vec<StatRow> {
    let mut rows = Vec::with_capacity(2 * 7 * 24);
    for day in 1..=7i16 {
        for hour in 0..24u32 {
            rows.push(StatRow::cell(
                StatisticMetric::HeatmapWait,
                day,
                hour as i16,
                heatmap_wait(samples, tz, now, day, hour),
            ));
            rows.push(StatRow::cell(
                StatisticMetric::HeatmapQuestionsPerTa,
                day,
                hour as i16,
                heatmap_questions_per_ta(samples, tz, day, hour),
            ));
        }
    }
    rows
}
