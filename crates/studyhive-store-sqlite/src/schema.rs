//! SQL schema for the StudyHive SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id   TEXT PRIMARY KEY,
    username  TEXT NOT NULL UNIQUE,
    email     TEXT NOT NULL,
    bio       TEXT NOT NULL DEFAULT '',
    avatar    TEXT,
    joined_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id TEXT PRIMARY KEY,
    name   TEXT NOT NULL UNIQUE    -- normalised: trimmed, lowercase
);

CREATE TABLE IF NOT EXISTS resources (
    resource_id     TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    description     TEXT,
    resource_type   TEXT NOT NULL,   -- 'Document' | 'Video'
    file_type       TEXT NOT NULL,   -- 'PDF' | 'PPT' | 'DOC' | 'DOCX' | 'YouTube'
    file            TEXT,
    video_url       TEXT,
    uploader_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject_id      TEXT REFERENCES subjects(subject_id) ON DELETE SET NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    views_count     INTEGER NOT NULL DEFAULT 0,
    downloads_count INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL    -- fixed-width RFC 3339, sorts as text
);

CREATE TABLE IF NOT EXISTS resource_tags (
    resource_id TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    tag_id      TEXT NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
    PRIMARY KEY (resource_id, tag_id)
);

CREATE TABLE IF NOT EXISTS views (
    view_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    resource_id TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    viewed_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS downloads (
    download_id   TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    resource_id   TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    downloaded_at TEXT NOT NULL
);

-- One rating per user and resource; re-rating overwrites.
CREATE TABLE IF NOT EXISTS ratings (
    rating_id   TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    resource_id TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    score       INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
    rated_at    TEXT NOT NULL,
    UNIQUE (user_id, resource_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id   TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    resource_id  TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    text         TEXT NOT NULL,
    parent_id    TEXT REFERENCES comments(comment_id) ON DELETE CASCADE,
    commented_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bookmarks (
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    resource_id   TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    bookmarked_at TEXT NOT NULL,
    PRIMARY KEY (user_id, resource_id)
);

CREATE INDEX IF NOT EXISTS resources_views_idx     ON resources(views_count);
CREATE INDEX IF NOT EXISTS resources_downloads_idx ON resources(downloads_count);
CREATE INDEX IF NOT EXISTS resources_created_idx   ON resources(created_at);
CREATE INDEX IF NOT EXISTS resources_subject_idx   ON resources(subject_id);
CREATE INDEX IF NOT EXISTS resource_tags_tag_idx   ON resource_tags(tag_id);
CREATE INDEX IF NOT EXISTS views_user_idx          ON views(user_id);
CREATE INDEX IF NOT EXISTS downloads_user_idx      ON downloads(user_id);
CREATE INDEX IF NOT EXISTS ratings_resource_idx    ON ratings(resource_id);
CREATE INDEX IF NOT EXISTS comments_resource_idx   ON comments(resource_id);

PRAGMA user_version = 1;
";
