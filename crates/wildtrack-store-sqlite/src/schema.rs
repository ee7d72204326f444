//! SQL schema for the wildtrack SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `user_version` pragma.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS points (
    point_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude   REAL,            -- [-90, 90] or NULL
    longitude  REAL             -- [-180, 180] or NULL
);

CREATE TABLE IF NOT EXISTS animals (
    animal_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    weight        REAL NOT NULL,
    length        REAL NOT NULL,
    height        REAL NOT NULL,
    gender        TEXT NOT NULL,   -- 'MALE' | 'FEMALE' | 'OTHER'
    life_status   TEXT NOT NULL DEFAULT 'ALIVE',
    chipped_at    TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    chip_point_id INTEGER NOT NULL REFERENCES points(point_id),
    death_at      TEXT             -- set on the ALIVE -> DEAD transition
);

-- The movement log. Visit order is defined solely by visited_at; the store
-- guarantees strictly increasing timestamps per animal on insert.
CREATE TABLE IF NOT EXISTS visits (
    visit_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    animal_id  INTEGER NOT NULL REFERENCES animals(animal_id),
    point_id   INTEGER NOT NULL REFERENCES points(point_id),
    visited_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS visits_animal_idx ON visits(animal_id, visited_at);
CREATE INDEX IF NOT EXISTS visits_point_idx  ON visits(point_id);
CREATE INDEX IF NOT EXISTS animals_chip_idx  ON animals(chip_point_id);

PRAGMA user_version = 1;
";
