//! Read-only aggregates for the coordinator's `/` and `/stats` routes

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub universities: i64,
    pub courses: i64,
    pub students: i64,
    pub course_assignments: i64,
}

/// Enrollment tally for one course or university
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub id: i64,
    pub name: String,
    pub students: i64,
}

/// Group-by summaries over the whole store
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub totals: EntityCounts,
    pub universities_by_type: BTreeMap<String, i64>,
    pub universities_by_state: BTreeMap<String, i64>,
    pub students_by_status: BTreeMap<String, i64>,
    pub students_by_course: Vec<Enrollment>,
    pub students_by_university: Vec<Enrollment>,
}

fn count(conn: &Connection, table: &str) -> Result<i64> {
    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?)
}

fn grouped(conn: &Connection, sql: &str) -> Result<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
}

fn enrollments(conn: &Connection, sql: &str) -> Result<Vec<Enrollment>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(Enrollment {
            id: row.get(0)?,
            name: row.get(1)?,
            students: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn counts(conn: &Connection) -> Result<EntityCounts> {
    Ok(EntityCounts {
        universities: count(conn, "university")?,
        courses: count(conn, "course")?,
        students: count(conn, "student")?,
        course_assignments: count(conn, "university_course")?,
    })
}

pub fn summary(conn: &Connection) -> Result<StoreStats> {
    Ok(StoreStats {
        totals: counts(conn)?,
        universities_by_type: grouped(
            conn,
            "SELECT type, COUNT(*) FROM university GROUP BY type",
        )?,
        universities_by_state: grouped(
            conn,
            "SELECT state, COUNT(*) FROM university GROUP BY state",
        )?,
        students_by_status: grouped(
            conn,
            "SELECT status, COUNT(*) FROM student GROUP BY status",
        )?,
        students_by_course: enrollments(
            conn,
            "SELECT c.id, c.name, COUNT(s.id)
             FROM course c
             LEFT JOIN student s ON s.course_id = c.id
             GROUP BY c.id
             ORDER BY COUNT(s.id) DESC, c.name",
        )?,
        students_by_university: enrollments(
            conn,
            "SELECT u.id, u.name, COUNT(s.id)
             FROM university u
             LEFT JOIN student s ON s.university_id = u.id
             GROUP BY u.id
             ORDER BY COUNT(s.id) DESC, u.name",
        )?,
    })
}
