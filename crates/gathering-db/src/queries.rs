use chrono::NaiveDate;
use rusqlite::{Connection, Row, params};

use anyhow::Result;
use gathering_types::models::{ActivityStatus, ParticipantStatus, ReputationScore, RoleAssignment, Vote};

use crate::Database;
use crate::models::{
    ActivityRow, AssignmentRow, NotificationRow, ParticipantRow, UserRow, VoteRow,
    activity_status_str, participant_status_str,
};

const USER_COLUMNS: &str = "id, username, display_name, password, elevated, created_at";
const VOTE_COLUMNS: &str = "id, rater_id, recipient_id, kind, activity_id, active, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        display_name: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, display_name, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, display_name, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
            conn.query_row(&sql, [username], user_from_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            conn.query_row(&sql, [id], user_from_row).optional()
        })
    }

    pub fn set_user_elevated(&self, id: &str, elevated: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET elevated = ?2 WHERE id = ?1",
                params![id, elevated],
            )?;
            Ok(())
        })
    }

    // -- Activities --

    /// Creates the activity and confirms its owner as the first participant.
    pub fn create_activity(&self, id: &str, owner_id: &str, title: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO activities (id, owner_id, title) VALUES (?1, ?2, ?3)",
                (id, owner_id, title),
            )?;
            tx.execute(
                "INSERT INTO participants (activity_id, user_id, status) VALUES (?1, ?2, 'confirmed')",
                (id, owner_id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_activity(&self, id: &str) -> Result<Option<ActivityRow>> {
        self.with_conn(|conn| query_activity(conn, id))
    }

    pub fn set_activity_status(&self, id: &str, status: ActivityStatus) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE activities SET status = ?2 WHERE id = ?1",
                (id, activity_status_str(status)),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Participants --

    /// Adds a pending participant. Re-joining keeps the existing status.
    pub fn join_activity(&self, activity_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO participants (activity_id, user_id) VALUES (?1, ?2)",
                (activity_id, user_id),
            )?;
            Ok(())
        })
    }

    pub fn set_participant_status(
        &self,
        activity_id: &str,
        user_id: &str,
        status: ParticipantStatus,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE participants SET status = ?3 WHERE activity_id = ?1 AND user_id = ?2",
                (activity_id, user_id, participant_status_str(status)),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_participants(&self, activity_id: &str) -> Result<Vec<ParticipantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT activity_id, user_id, status FROM participants
                 WHERE activity_id = ?1
                 ORDER BY joined_at, user_id",
            )?;
            let rows = stmt
                .query_map([activity_id], |row| {
                    Ok(ParticipantRow {
                        activity_id: row.get(0)?,
                        user_id: row.get(1)?,
                        status: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub(crate) fn get_confirmed_user_ids(&self, activity_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM participants
                 WHERE activity_id = ?1 AND status = 'confirmed'
                 ORDER BY joined_at, user_id",
            )?;
            let rows = stmt
                .query_map([activity_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })
    }

    // -- Role assignments --

    pub(crate) fn get_assignments(&self, activity_id: &str) -> Result<Vec<AssignmentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT activity_id, participant_id, role_name, color_tag FROM role_assignments
                 WHERE activity_id = ?1
                 ORDER BY role_name, participant_id",
            )?;
            let rows = stmt
                .query_map([activity_id], |row| {
                    Ok(AssignmentRow {
                        activity_id: row.get(0)?,
                        participant_id: row.get(1)?,
                        role_name: row.get(2)?,
                        color_tag: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub(crate) fn delete_assignments_for(&self, activity_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM role_assignments WHERE activity_id = ?1",
                [activity_id],
            )?)
        })
    }

    /// All-or-nothing insert of a drawing.
    pub(crate) fn insert_assignment_rows(&self, rows: &[RoleAssignment]) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO role_assignments (activity_id, participant_id, role_name, color_tag)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for row in rows {
                    stmt.execute(params![
                        row.activity_id.to_string(),
                        row.participant_id.to_string(),
                        row.role_name,
                        row.color_tag,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    // -- Votes --

    pub(crate) fn find_vote_row(
        &self,
        rater_id: &str,
        recipient_id: &str,
        kind: &str,
        activity_id: Option<&str>,
    ) -> Result<Option<VoteRow>> {
        self.with_conn(|conn| {
            // `IS` matches NULL against NULL, so one statement covers both scopes.
            let sql = format!(
                "SELECT {VOTE_COLUMNS} FROM votes
                 WHERE rater_id = ?1 AND recipient_id = ?2 AND kind = ?3 AND activity_id IS ?4"
            );
            conn.query_row(
                &sql,
                params![rater_id, recipient_id, kind, activity_id],
                vote_from_row,
            )
            .optional()
        })
    }

    pub(crate) fn insert_vote_row(&self, vote: &Vote) -> Result<()> {
        self.with_conn(|conn| {
            insert_vote(conn, vote)?;
            Ok(())
        })
    }

    /// Takes the (rater, recipient, day) limiter slot and writes the vote in one
    /// transaction. `Ok(false)` means the slot was already taken and nothing changed.
    pub(crate) fn insert_free_vote_row(&self, vote: &Vote, day: NaiveDate) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let claimed = tx.execute(
                "INSERT INTO vote_daily_limits (rater_id, recipient_id, day) VALUES (?1, ?2, ?3)",
                (
                    vote.rater_id.to_string(),
                    vote.recipient_id.to_string(),
                    day.to_string(),
                ),
            );
            match claimed {
                Ok(_) => {}
                Err(e) if is_constraint_violation(&e) => return Ok(false),
                Err(e) => return Err(e.into()),
            }
            insert_vote(&tx, vote)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// `None` if the rater already has a vote in the activity. Otherwise one result per
    /// vote; a failed row does not roll back the others.
    pub(crate) fn insert_evaluation_rows(
        &self,
        rater_id: &str,
        activity_id: &str,
        votes: &[Vote],
    ) -> Result<Option<Vec<Result<()>>>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let evaluated: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM votes WHERE rater_id = ?1 AND activity_id = ?2)",
                (rater_id, activity_id),
                |row| row.get(0),
            )?;
            if evaluated {
                return Ok(None);
            }
            let results: Vec<Result<()>> = votes
                .iter()
                .map(|vote| insert_vote(&tx, vote).map(|_| ()).map_err(anyhow::Error::from))
                .collect();
            tx.commit()?;
            Ok(Some(results))
        })
    }

    pub(crate) fn update_vote_active(&self, vote_id: &str, active: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE votes SET active = ?2 WHERE id = ?1",
                params![vote_id, active],
            )?;
            Ok(changed > 0)
        })
    }

    pub(crate) fn get_active_votes_for(&self, recipient_id: &str) -> Result<Vec<VoteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {VOTE_COLUMNS} FROM votes WHERE recipient_id = ?1 AND active = 1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([recipient_id], vote_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reputation scores --

    pub(crate) fn upsert_score_row(&self, score: &ReputationScore) -> Result<()> {
        let keyword_counts = serde_json::to_string(&score.keyword_counts)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reputation_scores (subject_id, total_score, keyword_counts)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(subject_id) DO UPDATE SET
                    total_score = excluded.total_score,
                    keyword_counts = excluded.keyword_counts,
                    updated_at = datetime('now')",
                params![score.subject_id.to_string(), score.total_score, keyword_counts],
            )?;
            Ok(())
        })
    }

    pub(crate) fn get_score_row(&self, subject_id: &str) -> Result<Option<(i64, String)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT total_score, keyword_counts FROM reputation_scores WHERE subject_id = ?1",
                [subject_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        kind: &str,
        payload: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, kind, payload) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, kind, payload),
            )?;
            Ok(())
        })
    }

    pub fn get_notifications(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, kind, payload, created_at FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        payload: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_activity(conn: &Connection, id: &str) -> Result<Option<ActivityRow>> {
    let mut stmt = conn
        .prepare("SELECT id, owner_id, title, status, created_at FROM activities WHERE id = ?1")?;

    stmt.query_row([id], |row| {
        Ok(ActivityRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        password: row.get(3)?,
        elevated: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn insert_vote(conn: &Connection, vote: &Vote) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO votes (id, rater_id, recipient_id, kind, activity_id, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            vote.id.to_string(),
            vote.rater_id.to_string(),
            vote.recipient_id.to_string(),
            vote.kind.to_string(),
            vote.activity_id.map(|id| id.to_string()),
            vote.active,
            vote.created_at.to_rfc3339(),
        ],
    )
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<VoteRow> {
    Ok(VoteRow {
        id: row.get(0)?,
        rater_id: row.get(1)?,
        recipient_id: row.get(2)?,
        kind: row.get(3)?,
        activity_id: row.get(4)?,
        active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
