//! Fabricated enrollment analytics
//!
//! Nothing here is computed from real data. Every report carries
//! `illustrative: true` and consumers must treat the numbers as a demo.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Widest period a single report may span
pub const MAX_PERIOD_YEARS: i32 = 50;

const DEFAULT_PERIOD_YEARS: i32 = 5;

/// Body of `POST /analytics/students`; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsRequest {
    pub university_id: Option<i64>,
    pub course_id: Option<i64>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyEnrollment {
    pub year: i32,
    pub enrollments: u32,
}

/// Summary rates in percent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRates {
    pub retention_rate: f64,
    pub graduation_rate: f64,
    pub employment_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAnalytics {
    pub success: bool,
    pub illustrative: bool,
    pub university_id: Option<i64>,
    pub course_id: Option<i64>,
    pub start_year: i32,
    pub end_year: i32,
    pub enrollment_by_year: Vec<YearlyEnrollment>,
    pub total_enrollments: u64,
    pub rates: OutcomeRates,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

/// Resolve the requested period against the current year
///
/// Span arithmetic runs in `i64` so extreme client years cannot overflow.
fn period(request: &AnalyticsRequest, current_year: i32) -> Result<(i32, i32)> {
    let end_year = request.end_year.unwrap_or(current_year);
    let start_year = match request.start_year {
        Some(year) => year,
        None => end_year
            .checked_sub(DEFAULT_PERIOD_YEARS - 1)
            .ok_or_else(|| Error::validation(format!("end_year ({end_year}) is out of range")))?,
    };

    if start_year > end_year {
        return Err(Error::validation(format!(
            "start_year ({start_year}) is after end_year ({end_year})"
        )));
    }
    if i64::from(end_year) - i64::from(start_year) >= i64::from(MAX_PERIOD_YEARS) {
        return Err(Error::validation(format!(
            "Period may span at most {MAX_PERIOD_YEARS} years"
        )));
    }

    Ok((start_year, end_year))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Build a random report for the requested period
pub fn generate(request: &AnalyticsRequest, node_id: &str) -> Result<StudentAnalytics> {
    let (start_year, end_year) = period(request, Utc::now().year())?;
    let mut rng = rand::thread_rng();

    let enrollment_by_year: Vec<YearlyEnrollment> = (start_year..=end_year)
        .map(|year| YearlyEnrollment {
            year,
            enrollments: rng.gen_range(80..=650),
        })
        .collect();
    let total_enrollments = enrollment_by_year
        .iter()
        .map(|y| u64::from(y.enrollments))
        .sum();

    let rates = OutcomeRates {
        retention_rate: round1(rng.gen_range(70.0..97.0)),
        graduation_rate: round1(rng.gen_range(45.0..90.0)),
        employment_rate: round1(rng.gen_range(55.0..95.0)),
    };

    Ok(StudentAnalytics {
        success: true,
        illustrative: true,
        university_id: request.university_id,
        course_id: request.course_id,
        start_year,
        end_year,
        enrollment_by_year,
        total_enrollments,
        rates,
        generated_by: node_id.to_string(),
        generated_at: Utc::now(),
    })
}
