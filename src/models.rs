//! Core data structures shared by the store and both HTTP services

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default student status
pub const ACTIVE_STATUS: &str = "active";

/// Default course length in years
pub const DEFAULT_DURATION_YEARS: i64 = 4;

// ============================================================================
// University
// ============================================================================

/// Funding model of a university
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniversityType {
    Public,
    Private,
}

impl UniversityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for UniversityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UniversityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(Error::validation(format!(
                "Invalid university type: '{other}'. Expected 'public' or 'private'"
            ))),
        }
    }
}

/// Stored university row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct University {
    pub id: i64,
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: UniversityType,
    pub founded_year: Option<i32>,
    /// Incremented on every student inserted by the coordinator
    pub student_count: i64,
}

/// University row as listed, with its live enrollment
#[derive(Debug, Clone, Serialize)]
pub struct UniversitySummary {
    #[serde(flatten)]
    pub university: University,
    pub active_students: i64,
}

/// Course offered by a university, with assignment terms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferedCourse {
    pub id: i64,
    pub name: String,
    pub duration_years: i64,
    pub area: Option<String>,
    pub annual_spots: Option<i64>,
    pub tuition_fee: Option<f64>,
    pub active_students: i64,
}

/// University with its assigned courses
#[derive(Debug, Clone, Serialize)]
pub struct UniversityDetail {
    #[serde(flatten)]
    pub university: University,
    pub courses: Vec<OfferedCourse>,
}

/// Body of `POST /universities`
///
/// `type` stays a string so an unknown literal is a 400 from
/// [`UniversityType::from_str`] rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversityCreate {
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
}

/// Body of `PUT /universities/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversityUpdate {
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
}

// ============================================================================
// Course assignment
// ============================================================================

/// One element of a course assignment list: a bare id or an id with terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssignmentEntry {
    Id(i64),
    Detailed {
        course_id: i64,
        #[serde(default)]
        annual_spots: Option<i64>,
        #[serde(default)]
        tuition_fee: Option<f64>,
    },
}

impl AssignmentEntry {
    pub fn course_id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Detailed { course_id, .. } => *course_id,
        }
    }

    pub fn annual_spots(&self) -> Option<i64> {
        match self {
            Self::Id(_) => None,
            Self::Detailed { annual_spots, .. } => *annual_spots,
        }
    }

    pub fn tuition_fee(&self) -> Option<f64> {
        match self {
            Self::Id(_) => None,
            Self::Detailed { tuition_fee, .. } => *tuition_fee,
        }
    }
}

/// Body of `PUT /universities/{id}/courses`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseAssignment {
    pub courses: Vec<AssignmentEntry>,
}

// ============================================================================
// Course
// ============================================================================

/// Stored course row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub duration_years: i64,
    pub area: Option<String>,
}

/// Course as listed, with aggregate counts
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub universities_count: i64,
    pub students_count: i64,
}

fn default_duration_years() -> i64 {
    DEFAULT_DURATION_YEARS
}

/// Body of `POST /courses`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCreate {
    pub name: String,
    #[serde(default = "default_duration_years")]
    pub duration_years: i64,
    #[serde(default)]
    pub area: Option<String>,
}

// ============================================================================
// Student
// ============================================================================

/// Stored student row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub university_id: i64,
    pub course_id: i64,
    pub enrollment_year: i32,
    pub status: String,
    pub created_at: String,
}

/// Student as listed, with display names joined in
#[derive(Debug, Clone, Serialize)]
pub struct StudentListing {
    #[serde(flatten)]
    pub student: Student,
    pub university_name: Option<String>,
    pub course_name: Option<String>,
}

fn default_status() -> String {
    ACTIVE_STATUS.to_string()
}

/// Body of `POST /students`, forwarded unchanged to a worker on delegation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentCreate {
    pub name: String,
    pub email: String,
    pub university_id: i64,
    pub course_id: i64,
    pub enrollment_year: i32,
    #[serde(default = "default_status")]
    pub status: String,
}
