//! University and university_course queries

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{
    AssignmentEntry, OfferedCourse, University, UniversitySummary, UniversityType, ACTIVE_STATUS,
};

impl ToSql for UniversityType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for UniversityType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: crate::error::Error| FromSqlError::Other(Box::new(e)))
    }
}

const UNIVERSITY_COLUMNS: &str = "u.id, u.name, u.state, u.type, u.founded_year, u.student_count";

fn university_from_row(row: &Row<'_>) -> rusqlite::Result<University> {
    Ok(University {
        id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
        kind: row.get(3)?,
        founded_year: row.get(4)?,
        student_count: row.get(5)?,
    })
}

/// All universities with their active-student count, ordered by name
pub fn list(conn: &Connection) -> Result<Vec<UniversitySummary>> {
    let sql = format!(
        "SELECT {UNIVERSITY_COLUMNS}, COUNT(s.id)
         FROM university u
         LEFT JOIN student s ON s.university_id = u.id AND s.status = ?1
         GROUP BY u.id
         ORDER BY u.name"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([ACTIVE_STATUS], |row| {
        Ok(UniversitySummary {
            university: university_from_row(row)?,
            active_students: row.get(6)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<University>> {
    let sql = format!("SELECT {UNIVERSITY_COLUMNS} FROM university u WHERE u.id = ?1");
    Ok(conn
        .query_row(&sql, [id], university_from_row)
        .optional()?)
}

pub fn exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM university WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Insert a university and return its generated id
pub fn insert(
    conn: &Connection,
    name: &str,
    state: &str,
    kind: UniversityType,
    founded_year: Option<i32>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO university (name, state, type, founded_year) VALUES (?1, ?2, ?3, ?4)",
        params![name, state, kind, founded_year],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace the three mutable fields; returns the number of rows touched
pub fn update(
    conn: &Connection,
    id: i64,
    name: &str,
    state: &str,
    kind: UniversityType,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE university SET name = ?2, state = ?3, type = ?4 WHERE id = ?1",
        params![id, name, state, kind],
    )?)
}

/// Delete a university after removing its join rows
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM university_course WHERE university_id = ?1", [id])?;
    conn.execute("DELETE FROM university WHERE id = ?1", [id])?;
    Ok(())
}

/// Courses assigned to a university, each with its active-student tally
pub fn courses_for(conn: &Connection, id: i64) -> Result<Vec<OfferedCourse>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.duration_years, c.area, uc.annual_spots, uc.tuition_fee,
                (SELECT COUNT(*) FROM student s
                 WHERE s.university_id = uc.university_id
                   AND s.course_id = c.id
                   AND s.status = ?2)
         FROM university_course uc
         JOIN course c ON c.id = uc.course_id
         WHERE uc.university_id = ?1
         ORDER BY c.name",
    )?;

    let rows = stmt.query_map(params![id, ACTIVE_STATUS], |row| {
        Ok(OfferedCourse {
            id: row.get(0)?,
            name: row.get(1)?,
            duration_years: row.get(2)?,
            area: row.get(3)?,
            annual_spots: row.get(4)?,
            tuition_fee: row.get(5)?,
            active_students: row.get(6)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Replace the whole assignment set of a university
pub fn replace_courses(conn: &Connection, id: i64, entries: &[AssignmentEntry]) -> Result<()> {
    conn.execute("DELETE FROM university_course WHERE university_id = ?1", [id])?;

    let mut stmt = conn.prepare(
        "INSERT INTO university_course (university_id, course_id, annual_spots, tuition_fee)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for entry in entries {
        stmt.execute(params![
            id,
            entry.course_id(),
            entry.annual_spots(),
            entry.tuition_fee()
        ])?;
    }

    Ok(())
}

pub fn increment_student_count(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE university SET student_count = student_count + 1 WHERE id = ?1",
        [id],
    )?;
    Ok(())
}
