use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            username      TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL,
            password      TEXT NOT NULL,
            elevated      INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS activities (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'open',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS participants (
            activity_id  TEXT NOT NULL REFERENCES activities(id),
            user_id      TEXT NOT NULL REFERENCES users(id),
            status       TEXT NOT NULL DEFAULT 'pending',
            joined_at    TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (activity_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_status
            ON participants(activity_id, status);

        CREATE TABLE IF NOT EXISTS role_assignments (
            activity_id     TEXT NOT NULL REFERENCES activities(id),
            participant_id  TEXT NOT NULL REFERENCES users(id),
            role_name       TEXT NOT NULL,
            color_tag       TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(activity_id, participant_id)
        );

        CREATE TABLE IF NOT EXISTS votes (
            id            TEXT PRIMARY KEY,
            rater_id      TEXT NOT NULL REFERENCES users(id),
            recipient_id  TEXT NOT NULL REFERENCES users(id),
            kind          TEXT NOT NULL,
            activity_id   TEXT REFERENCES activities(id),
            active        INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL
        );

        -- One vote per (rater, recipient, kind) inside an activity ...
        CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_activity_unique
            ON votes(rater_id, recipient_id, kind, activity_id)
            WHERE activity_id IS NOT NULL;

        -- ... and one toggled row per (rater, recipient, kind) outside of one.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_free_unique
            ON votes(rater_id, recipient_id, kind)
            WHERE activity_id IS NULL;

        CREATE INDEX IF NOT EXISTS idx_votes_recipient
            ON votes(recipient_id, active);

        CREATE TABLE IF NOT EXISTS vote_daily_limits (
            rater_id      TEXT NOT NULL,
            recipient_id  TEXT NOT NULL,
            day           TEXT NOT NULL,
            PRIMARY KEY (rater_id, recipient_id, day)
        );

        CREATE TABLE IF NOT EXISTS reputation_scores (
            subject_id      TEXT PRIMARY KEY,
            total_score     INTEGER NOT NULL,
            keyword_counts  TEXT NOT NULL,
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            kind        TEXT NOT NULL,
            payload     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
