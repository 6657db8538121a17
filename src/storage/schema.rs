//! Table definitions and reference data

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::UniversityType;

/// Schema for all coordinator tables
///
/// No `ON DELETE CASCADE`: university deletion removes its join rows by hand.
pub const CREATE_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS university (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        state TEXT NOT NULL,
        type TEXT NOT NULL CHECK (type IN ('public', 'private')),
        founded_year INTEGER,
        student_count INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS course (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        duration_years INTEGER NOT NULL DEFAULT 4,
        area TEXT
    );

    CREATE TABLE IF NOT EXISTS university_course (
        university_id INTEGER NOT NULL REFERENCES university (id),
        course_id INTEGER NOT NULL REFERENCES course (id),
        annual_spots INTEGER,
        tuition_fee REAL,
        PRIMARY KEY (university_id, course_id)
    );

    CREATE TABLE IF NOT EXISTS student (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        university_id INTEGER NOT NULL REFERENCES university (id),
        course_id INTEGER NOT NULL REFERENCES course (id),
        enrollment_year INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_student_university ON student (university_id);
    CREATE INDEX IF NOT EXISTS idx_student_course ON student (course_id);
"#;

/// Seed university: name, state, type, founded year
pub type SeedUniversity = (&'static str, &'static str, UniversityType, i32);

/// Seed course: name, duration in years, area
pub type SeedCourse = (&'static str, i64, &'static str);

pub const SEED_UNIVERSITIES: &[SeedUniversity] = &[
    ("UFRJ", "RJ", UniversityType::Public, 1920),
    ("PUC-Rio", "RJ", UniversityType::Private, 1940),
    ("USP", "SP", UniversityType::Public, 1934),
    ("Unicamp", "SP", UniversityType::Public, 1966),
];

pub const SEED_COURSES: &[SeedCourse] = &[
    ("Ciência da Computação", 4, "Exatas"),
    ("Biologia", 4, "Biológicas"),
    ("História", 4, "Humanas"),
    ("Direito", 5, "Humanas"),
    ("Medicina", 6, "Saúde"),
    ("Engenharia Civil", 5, "Engenharia"),
    ("Administração", 4, "Negócios"),
];

/// Insert reference rows, skipping any already present
///
/// University names carry no unique constraint, so the guard is an explicit
/// `NOT EXISTS`; courses rely on their unique name.
pub fn seed(conn: &Connection) -> Result<()> {
    let mut inserted = 0;

    for (name, state, kind, founded) in SEED_UNIVERSITIES {
        inserted += conn.execute(
            "INSERT INTO university (name, state, type, founded_year)
             SELECT ?1, ?2, ?3, ?4
             WHERE NOT EXISTS (SELECT 1 FROM university WHERE name = ?1)",
            params![name, state, kind.as_str(), founded],
        )?;
    }

    for (name, duration, area) in SEED_COURSES {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO course (name, duration_years, area) VALUES (?1, ?2, ?3)",
            params![name, duration, area],
        )?;
    }

    if inserted > 0 {
        tracing::debug!(rows = inserted, "Seeded reference data");
    }

    Ok(())
}
