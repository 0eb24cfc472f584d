//! SQL schema for the Afisha SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.
//!
//! Every natural key lives here as a UNIQUE constraint — the resolver
//! relies on the store, not on application checks, to prevent duplicate
//! reference rows under concurrent batches.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Shared reference data. Append-only: rows are created lazily on first
-- reference and never updated or deleted by the reconciliation path.
CREATE TABLE IF NOT EXISTS organizers (
    organizer_id INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    rating       REAL NOT NULL DEFAULT 0.0,
    social_links TEXT              -- JSON map or NULL
);

CREATE TABLE IF NOT EXISTS venues (
    venue_id INTEGER PRIMARY KEY,
    name     TEXT NOT NULL,
    address  TEXT NOT NULL,
    city     TEXT NOT NULL,
    lat      REAL,
    lon      REAL,
    UNIQUE (name, city)
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    slug   TEXT NOT NULL UNIQUE
);

-- Root entity. All mutation for a slug targets exactly this one row.
CREATE TABLE IF NOT EXISTS events (
    event_id        INTEGER PRIMARY KEY,
    title           TEXT NOT NULL,
    slug            TEXT NOT NULL UNIQUE,
    description     TEXT,
    full_text       TEXT,
    language        TEXT NOT NULL DEFAULT 'ru',
    age_restriction INTEGER NOT NULL DEFAULT 0,
    status          TEXT NOT NULL DEFAULT 'draft',
    created_at      TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    updated_at      TEXT,
    organizer_id    INTEGER REFERENCES organizers(organizer_id),
    venue_id        INTEGER REFERENCES venues(venue_id)
);

CREATE TABLE IF NOT EXISTS event_tags (
    event_id INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    tag_id   INTEGER NOT NULL REFERENCES tags(tag_id)     ON DELETE CASCADE,
    PRIMARY KEY (event_id, tag_id)
);

CREATE TABLE IF NOT EXISTS occurrences (
    occurrence_id INTEGER PRIMARY KEY,
    event_id      INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    start_time    TEXT NOT NULL,
    end_time      TEXT,
    tz            TEXT NOT NULL DEFAULT 'Europe/Moscow',
    status        TEXT NOT NULL DEFAULT 'scheduled',
    venue_id      INTEGER REFERENCES venues(venue_id),
    location_name TEXT,
    UNIQUE (event_id, start_time)
);

CREATE TABLE IF NOT EXISTS ticket_types (
    ticket_type_id INTEGER PRIMARY KEY,
    event_id       INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    price          INTEGER NOT NULL DEFAULT 0,
    currency       TEXT NOT NULL DEFAULT 'RUB',
    capacity       INTEGER,
    sold           INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS event_images (
    image_id   INTEGER PRIMARY KEY,
    event_id   INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    url        TEXT NOT NULL,
    alt        TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS event_sources (
    source_id   INTEGER PRIMARY KEY,
    event_id    INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    source_url  TEXT NOT NULL,
    source_name TEXT NOT NULL,
    scraped_at  TEXT NOT NULL,
    confidence  REAL NOT NULL DEFAULT 1.0,
    fingerprint TEXT NOT NULL,
    raw_payload TEXT,
    UNIQUE (event_id, fingerprint)
);

CREATE INDEX IF NOT EXISTS events_status_idx      ON events(status);
CREATE INDEX IF NOT EXISTS occurrences_event_idx  ON occurrences(event_id);
CREATE INDEX IF NOT EXISTS occurrences_start_idx  ON occurrences(start_time);
CREATE INDEX IF NOT EXISTS sources_event_idx      ON event_sources(event_id);

PRAGMA user_version = 1;
";
