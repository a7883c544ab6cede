//! SQL schema for the Casefile SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Identity tables hold one row per entity; `case_*` tables link entities to
/// cases. Deleting an entity or a case removes its links by cascade.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    id        INTEGER PRIMARY KEY,
    full_name TEXT,
    username  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS cases (
    id           INTEGER PRIMARY KEY,
    case_name    TEXT NOT NULL,
    subject_name TEXT,
    username     TEXT REFERENCES persons(username),
    description  TEXT,
    created_at   TEXT,            -- 'YYYY-MM-DD HH:MM:SS' UTC
    last_updated TEXT
);

CREATE TABLE IF NOT EXISTS ips (
    id         INTEGER PRIMARY KEY,
    ip_address TEXT NOT NULL,
    location   TEXT,
    isp        TEXT,
    last_seen  TEXT
);

CREATE TABLE IF NOT EXISTS domains (
    id        INTEGER PRIMARY KEY,
    domain    TEXT NOT NULL,
    last_seen TEXT
);

CREATE TABLE IF NOT EXISTS social_profiles (
    id          INTEGER PRIMARY KEY,
    platform    TEXT,
    profile_url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS metadata (
    id         INTEGER PRIMARY KEY,
    info       TEXT NOT NULL,
    source     TEXT,
    date_found TEXT
);

CREATE TABLE IF NOT EXISTS notes (
    id         INTEGER PRIMARY KEY,
    case_id    INTEGER REFERENCES cases(id) ON DELETE CASCADE,
    note       TEXT NOT NULL,
    created_at TEXT
);

CREATE TABLE IF NOT EXISTS case_ips (
    id      INTEGER PRIMARY KEY,
    case_id INTEGER NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    ip_id   INTEGER NOT NULL REFERENCES ips(id)   ON DELETE CASCADE,
    UNIQUE (case_id, ip_id)
);

CREATE TABLE IF NOT EXISTS case_domains (
    id        INTEGER PRIMARY KEY,
    case_id   INTEGER NOT NULL REFERENCES cases(id)   ON DELETE CASCADE,
    domain_id INTEGER NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
    UNIQUE (case_id, domain_id)
);

CREATE TABLE IF NOT EXISTS case_social_profiles (
    id                INTEGER PRIMARY KEY,
    case_id           INTEGER NOT NULL REFERENCES cases(id)           ON DELETE CASCADE,
    social_profile_id INTEGER NOT NULL REFERENCES social_profiles(id) ON DELETE CASCADE,
    UNIQUE (case_id, social_profile_id)
);

CREATE TABLE IF NOT EXISTS case_metadata (
    id          INTEGER PRIMARY KEY,
    case_id     INTEGER NOT NULL REFERENCES cases(id)    ON DELETE CASCADE,
    metadata_id INTEGER NOT NULL REFERENCES metadata(id) ON DELETE CASCADE,
    UNIQUE (case_id, metadata_id)
);

CREATE TABLE IF NOT EXISTS case_notes (
    id      INTEGER PRIMARY KEY,
    case_id INTEGER NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    note_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
    UNIQUE (case_id, note_id)
);

CREATE INDEX IF NOT EXISTS ips_address_idx      ON ips(ip_address);
CREATE INDEX IF NOT EXISTS domains_domain_idx   ON domains(domain);
CREATE INDEX IF NOT EXISTS social_url_idx       ON social_profiles(profile_url);
CREATE INDEX IF NOT EXISTS cases_name_idx       ON cases(case_name);

PRAGMA user_version = 1;
";
