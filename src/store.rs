//! SQLite-backed persistence for admins and students.
//!
//! Every query the service issues lives here. Timestamps are written by
//! SQLite's `datetime('now')` and are UTC.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::models::{Admin, Student, StudentStats};

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS admins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_identity TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        name TEXT,
        college_name TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS students_created_at ON students (created_at)",
];

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url `{}`", url))?
            .create_if_missing(true);

        // an in-memory database lives and dies with its connection
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("could not open database `{}`", url))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to apply schema")?;
        }
        Ok(())
    }

    /// Rows without the admin flag are invisible here.
    pub async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, sqlx::Error> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = ? AND is_admin = 1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_admin_by_id(&self, id: i64) -> Result<Option<Admin>, sqlx::Error> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ? AND is_admin = 1 LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn admin_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM admins WHERE email = ? LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn insert_admin(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        is_admin: bool,
    ) -> Result<i64, sqlx::Error> {
        let res = sqlx::query(
            "INSERT INTO admins (email, password_hash, name, is_admin, created_at, updated_at) \
             VALUES (?, ?, ?, ?, datetime('now'), datetime('now'))",
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(is_admin)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn update_admin_password(&self, id: i64, password_hash: &str) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            "UPDATE admins SET password_hash = ?, updated_at = datetime('now') WHERE id = ? AND is_admin = 1",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn find_student_by_identity(
        &self,
        external_identity: &str,
    ) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE external_identity = ? LIMIT 1")
            .bind(external_identity)
            .fetch_optional(&self.pool)
            .await
    }

    /// Fails with a unique violation when the identity is already stored.
    pub async fn insert_student(
        &self,
        external_identity: &str,
        email: &str,
        name: Option<&str>,
        college_name: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let res = sqlx::query(
            "INSERT INTO students (external_identity, email, name, college_name, created_at, updated_at) \
             VALUES (?, ?, ?, ?, datetime('now'), datetime('now'))",
        )
        .bind(external_identity)
        .bind(email)
        .bind(name)
        .bind(college_name)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn set_college_name(
        &self,
        external_identity: &str,
        college_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            "UPDATE students SET college_name = ?, updated_at = datetime('now') WHERE external_identity = ?",
        )
        .bind(college_name)
        .bind(external_identity)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
    }

    /// `None` leaves the column untouched.
    pub async fn update_student(
        &self,
        id: i64,
        name: Option<&str>,
        college_name: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            "UPDATE students SET name = COALESCE(?, name), college_name = COALESCE(?, college_name), \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(name)
        .bind(college_name)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_student(&self, id: i64) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn student_stats(&self) -> Result<StudentStats, sqlx::Error> {
        sqlx::query_as::<_, StudentStats>(
            "SELECT \
                (SELECT COUNT(*) FROM students) AS total_students, \
                (SELECT COUNT(*) FROM students WHERE created_at >= datetime('now', '-7 days')) \
                    AS new_students_this_week",
        )
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> Store {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    store
}
