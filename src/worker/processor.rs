//! Simulated student processing
//!
//! [`StudentProcessor::process_payload`] never fails: a body that does not
//! decode, or a student that does not validate, becomes
//! [`ProcessOutcome::Failure`]. The HTTP layer always answers 200 and the
//! caller inspects the `success` flag.

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::metrics;
use crate::models::StudentCreate;
use crate::utils::short_hex_id;

/// Records returned by `GET /processed_requests`
pub const RECENT_RECORDS: usize = 10;

/// Nominal programme length used for the graduation estimate
const PROGRAM_YEARS: i32 = 4;

const EARLIEST_ENROLLMENT_YEAR: i32 = 1900;

// ============================================================================
// Enrichment Types
// ============================================================================

/// Year of study derived from the enrollment year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcademicLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl AcademicLevel {
    /// Level after `years` of study; anything past the third year is senior
    pub fn from_years_enrolled(years: i32) -> Self {
        match years {
            i32::MIN..=0 => Self::Freshman,
            1 => Self::Sophomore,
            2 => Self::Junior,
            _ => Self::Senior,
        }
    }
}

/// Outcome of each validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationFlags {
    pub name_valid: bool,
    pub email_valid: bool,
    pub year_valid: bool,
    pub ids_valid: bool,
    /// Informational only, never fails a request
    pub institutional_email: bool,
}

impl ValidationFlags {
    fn check(student: &StudentCreate, current_year: i32) -> Self {
        Self {
            name_valid: !student.name.trim().is_empty(),
            email_valid: is_valid_email(&student.email),
            year_valid: (EARLIEST_ENROLLMENT_YEAR..=current_year + 1)
                .contains(&student.enrollment_year),
            ids_valid: student.university_id > 0 && student.course_id > 0,
            institutional_email: is_institutional_email(&student.email),
        }
    }

    /// First failed check, as a message for the caller
    fn first_error(&self, current_year: i32) -> Option<String> {
        if !self.name_valid {
            Some("Name must not be empty".to_string())
        } else if !self.email_valid {
            Some("Invalid email address".to_string())
        } else if !self.year_valid {
            Some(format!(
                "Enrollment year must be between {EARLIEST_ENROLLMENT_YEAR} and {}",
                current_year + 1
            ))
        } else if !self.ids_valid {
            Some("University and course ids must be positive".to_string())
        } else {
            None
        }
    }
}

/// `local@domain.tld`: non-empty local part, non-empty domain labels, a TLD of two or more
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)*\.[^@\s.]{2,}$").expect("valid email pattern")
});

fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Domain with an `edu` label, e.g. `ufrj.edu.br` or `mit.edu`
fn is_institutional_email(email: &str) -> bool {
    email
        .split_once('@')
        .map(|(_, domain)| domain.split('.').any(|label| label.eq_ignore_ascii_case("edu")))
        .unwrap_or(false)
}

/// A student after simulated validation and enrichment
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedStudent {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub university_id: i64,
    pub course_id: i64,
    pub enrollment_year: i32,
    pub status: String,
    pub academic_level: AcademicLevel,
    pub estimated_graduation: i32,
    pub validation: ValidationFlags,
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of processing one request
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Success(ProcessedStudent),
    Failure { error: String },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Wire form of a [`ProcessOutcome`]
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub student: Option<ProcessedStudent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processed_by: String,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}

/// Entry of the in-memory processing log
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedRecord {
    pub request_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}

/// Counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessorStats {
    pub students_processed: u64,
    pub failed_requests: u64,
    pub analytics_generated: u64,
}

impl ProcessorStats {
    pub fn total_requests(&self) -> u64 {
        self.students_processed + self.failed_requests
    }

    /// Percentage of successful student requests, 0 when none were seen
    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (self.students_processed as f64 / total as f64) * 100.0
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Validates and enriches students, keeping a bounded log
pub struct StudentProcessor {
    node_id: String,
    delay_ms: (u64, u64),
    max_history: usize,
    history: RwLock<VecDeque<ProcessedRecord>>,
    stats: RwLock<ProcessorStats>,
}

impl StudentProcessor {
    /// `delay_ms` bounds the simulated work; an inverted range collapses to its start
    pub fn new(node_id: impl Into<String>, delay_ms: RangeInclusive<u64>, max_history: usize) -> Self {
        let (min, max) = delay_ms.into_inner();
        Self {
            node_id: node_id.into(),
            delay_ms: (min, max.max(min)),
            max_history: max_history.max(1),
            history: RwLock::new(VecDeque::new()),
            stats: RwLock::new(ProcessorStats::default()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Decode a raw request body and process it
    pub async fn process_payload(&self, body: &[u8]) -> ProcessResponse {
        match serde_json::from_slice::<StudentCreate>(body) {
            Ok(student) => self.process(student).await,
            Err(e) => {
                let started = Instant::now();
                let outcome = ProcessOutcome::Failure {
                    error: format!("Invalid request body: {e}"),
                };
                self.finish(outcome, started).await
            }
        }
    }

    /// Validate and enrich one student after a simulated delay
    pub async fn process(&self, student: StudentCreate) -> ProcessResponse {
        let started = Instant::now();

        tokio::time::sleep(self.simulated_delay()).await;

        let outcome = Self::evaluate(student, Utc::now().year());
        self.finish(outcome, started).await
    }

    fn evaluate(student: StudentCreate, current_year: i32) -> ProcessOutcome {
        let validation = ValidationFlags::check(&student, current_year);
        if let Some(error) = validation.first_error(current_year) {
            return ProcessOutcome::Failure { error };
        }

        let enrollment_year = student.enrollment_year;
        ProcessOutcome::Success(ProcessedStudent {
            student_id: format!("STU-{enrollment_year}-{}", short_hex_id(8).to_uppercase()),
            name: student.name,
            email: student.email,
            university_id: student.university_id,
            course_id: student.course_id,
            enrollment_year,
            status: student.status,
            academic_level: AcademicLevel::from_years_enrolled(current_year - enrollment_year),
            estimated_graduation: enrollment_year + PROGRAM_YEARS,
            validation,
        })
    }

    async fn finish(&self, outcome: ProcessOutcome, started: Instant) -> ProcessResponse {
        let elapsed = started.elapsed();
        let processing_time_ms = elapsed.as_millis() as u64;
        let processed_at = Utc::now();
        let success = outcome.is_success();

        metrics::record_student_processing(success, elapsed.as_secs_f64());

        let record = match &outcome {
            ProcessOutcome::Success(student) => ProcessedRecord {
                request_id: uuid::Uuid::new_v4().to_string(),
                success,
                student_id: Some(student.student_id.clone()),
                email: Some(student.email.clone()),
                error: None,
                processing_time_ms,
                processed_at,
            },
            ProcessOutcome::Failure { error } => ProcessedRecord {
                request_id: uuid::Uuid::new_v4().to_string(),
                success,
                student_id: None,
                email: None,
                error: Some(error.clone()),
                processing_time_ms,
                processed_at,
            },
        };

        {
            let mut stats = self.stats.write().await;
            if success {
                stats.students_processed += 1;
            } else {
                stats.failed_requests += 1;
            }
        }
        self.push_record(record).await;

        match outcome {
            ProcessOutcome::Success(student) => {
                tracing::info!(
                    student_id = %student.student_id,
                    email = %student.email,
                    processing_time_ms,
                    "Student processed"
                );
                ProcessResponse {
                    success: true,
                    message: "Student processed successfully".to_string(),
                    student: Some(student),
                    error: None,
                    processed_by: self.node_id.clone(),
                    processing_time_ms,
                    processed_at,
                }
            }
            ProcessOutcome::Failure { error } => {
                tracing::warn!(error = %error, "Student processing failed");
                ProcessResponse {
                    success: false,
                    message: "Student processing failed".to_string(),
                    student: None,
                    error: Some(error),
                    processed_by: self.node_id.clone(),
                    processing_time_ms,
                    processed_at,
                }
            }
        }
    }

    async fn push_record(&self, record: ProcessedRecord) {
        let mut history = self.history.write().await;
        history.push_back(record);
        while history.len() > self.max_history {
            history.pop_front();
        }
    }

    fn simulated_delay(&self) -> Duration {
        let (min, max) = self.delay_ms;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    pub async fn record_analytics(&self) {
        self.stats.write().await.analytics_generated += 1;
        metrics::record_analytics_generated();
    }

    pub async fn stats(&self) -> ProcessorStats {
        *self.stats.read().await
    }

    /// Latest `limit` records, newest last
    pub async fn recent(&self, limit: usize) -> Vec<ProcessedRecord> {
        let history = self.history.read().await;
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }
}
