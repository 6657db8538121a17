//! Student queries

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::Result;
use crate::models::{Student, StudentCreate, StudentListing};

use super::universities;

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        university_id: row.get(3)?,
        course_id: row.get(4)?,
        enrollment_year: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// All students with university and course names joined in
///
/// Left joins: a student whose university was deleted is still listed,
/// with `university_name` null.
pub fn list(conn: &Connection) -> Result<Vec<StudentListing>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.email, s.university_id, s.course_id,
                s.enrollment_year, s.status, s.created_at,
                u.name, c.name
         FROM student s
         LEFT JOIN university u ON u.id = s.university_id
         LEFT JOIN course c ON c.id = s.course_id
         ORDER BY s.id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(StudentListing {
            student: student_from_row(row)?,
            university_name: row.get(8)?,
            course_name: row.get(9)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
pub fn get(conn: &Connection, id: i64) -> Result<Option<Student>> {
    use rusqlite::OptionalExtension;

    Ok(conn
        .query_row(
            "SELECT id, name, email, university_id, course_id, enrollment_year, status, created_at
             FROM student WHERE id = ?1",
            [id],
            student_from_row,
        )
        .optional()?)
}

/// Insert a student and bump its university's denormalized counter
///
/// References are not checked here; callers verify them first.
pub fn insert(conn: &Connection, student: &StudentCreate) -> Result<i64> {
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    conn.execute(
        "INSERT INTO student (name, email, university_id, course_id, enrollment_year, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            student.name,
            student.email,
            student.university_id,
            student.course_id,
            student.enrollment_year,
            student.status,
            created_at
        ],
    )?;
    let id = conn.last_insert_rowid();

    universities::increment_student_count(conn, student.university_id)?;

    Ok(id)
}
