//! `SQLite` schema definitions for gradebook.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the students table.
///
/// `seq` preserves insertion order for listing; `id` is the public identifier.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    math_score REAL NOT NULL,
    science_score REAL NOT NULL,
    english_score REAL NOT NULL,
    math_letter TEXT NOT NULL CHECK (math_letter IN ('A', 'B', 'C', 'D', 'F')),
    science_letter TEXT NOT NULL CHECK (science_letter IN ('A', 'B', 'C', 'D', 'F')),
    english_letter TEXT NOT NULL CHECK (english_letter IN ('A', 'B', 'C', 'D', 'F')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Index backing the "last updated" status query.
pub const CREATE_UPDATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_students_updated_at ON students(updated_at DESC)";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_STUDENTS_TABLE,
    CREATE_UPDATED_AT_INDEX,
    CREATE_METADATA_TABLE,
];

/// Column list shared by every student query, in `row_to_record` order.
pub const STUDENT_COLUMNS: &str = "id, name, math_score, science_score, english_score, \
     math_letter, science_letter, english_letter";
