//! Course queries

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Course, CourseCreate, CourseSummary, ACTIVE_STATUS};

/// All courses with offering-university and enrolled-student counts
pub fn list(conn: &Connection) -> Result<Vec<CourseSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.duration_years, c.area,
                (SELECT COUNT(*) FROM university_course uc WHERE uc.course_id = c.id),
                (SELECT COUNT(*) FROM student s WHERE s.course_id = c.id AND s.status = ?1)
         FROM course c
         ORDER BY c.name",
    )?;

    let rows = stmt.query_map([ACTIVE_STATUS], |row| {
        Ok(CourseSummary {
            course: Course {
                id: row.get(0)?,
                name: row.get(1)?,
                duration_years: row.get(2)?,
                area: row.get(3)?,
            },
            universities_count: row.get(4)?,
            students_count: row.get(5)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
pub fn get(conn: &Connection, id: i64) -> Result<Option<Course>> {
    Ok(conn
        .query_row(
            "SELECT id, name, duration_years, area FROM course WHERE id = ?1",
            [id],
            |row| {
                Ok(Course {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    duration_years: row.get(2)?,
                    area: row.get(3)?,
                })
            },
        )
        .optional()?)
}

pub fn exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM course WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Insert a course and return its generated id
///
/// A duplicate name violates the unique constraint and surfaces as a
/// database error.
pub fn insert(conn: &Connection, course: &CourseCreate) -> Result<i64> {
    conn.execute(
        "INSERT INTO course (name, duration_years, area) VALUES (?1, ?2, ?3)",
        params![course.name, course.duration_years, course.area],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Number of distinct course rows matching `ids`, in one query
///
/// Duplicated ids count once, so a list with repeats never matches its
/// own length.
pub fn count_existing(conn: &Connection, ids: &[i64]) -> Result<i64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT COUNT(*) FROM course WHERE id IN ({placeholders})");

    Ok(conn.query_row(&sql, params_from_iter(ids.iter()), |row| row.get(0))?)
}
