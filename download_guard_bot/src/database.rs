use std::{
    str::FromStr,
    sync::{atomic::AtomicBool, Arc},
};

use chrono::Utc;
use serde::de::DeserializeOwned;
pub use sqlx::Error;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite,
};
use teloxide::types::UserId;

use crate::{guard::ReportKind, settings::UserSettings};

type Pool = sqlx::Pool<Sqlite>;
const DB_PATH: &str = "sqlite:download_guard.sqlite";
static WAS_CONSTRUCTED: AtomicBool = AtomicBool::new(false);

pub struct Database {
    pool: Pool,
}

impl Database {
    pub async fn new() -> Result<Arc<Database>, Error> {
        assert!(
            !WAS_CONSTRUCTED.swap(true, std::sync::atomic::Ordering::SeqCst),
            "Second database was constructed. This is not allowed."
        );

        if !Sqlite::database_exists(DB_PATH).await.unwrap_or(false) {
            Sqlite::create_database(DB_PATH).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(32)
            .connect_with(
                SqliteConnectOptions::from_str(DB_PATH)?
                    .pragma("cache_size", "-32768")
                    .busy_timeout(std::time::Duration::from_secs(600)),
            )
            .await?;

        // USER_SETTINGS:
        // userid (unique primary key, integer)
        // nsfw_filter (JSON of the content filter policy)
        // auto_download (JSON of the auto-download policy)
        // updated_at (date+time in UTC)
        pool.execute(sqlx::query(
            "
                CREATE TABLE IF NOT EXISTS user_settings (
                    userid INTEGER PRIMARY KEY NOT NULL,
                    nsfw_filter TEXT NOT NULL,
                    auto_download TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                ) STRICT;",
        ))
        .await?;

        // REPORTS:
        // userid (integer)
        // url (string)
        // kind ("false_positive" or "missed")
        // reported_at (date+time in UTC)
        pool.execute(sqlx::query(
            "
                CREATE TABLE IF NOT EXISTS reports (
                    userid INTEGER NOT NULL,
                    url TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    reported_at TEXT NOT NULL
                ) STRICT;",
        ))
        .await?;

        Ok(Arc::new(Database { pool }))
    }

    /// Get the settings of a user. Users who never changed anything get defaults.
    pub async fn get_settings(&self, user: UserId) -> Result<UserSettings, Error> {
        let columns = sqlx::query(
            "SELECT nsfw_filter, auto_download FROM user_settings WHERE userid=?;",
        )
        .bind(user.0 as i64)
        .map(|row: SqliteRow| {
            (
                row.get::<String, _>("nsfw_filter"),
                row.get::<String, _>("auto_download"),
            )
        })
        .fetch_optional(&self.pool)
        .await?;

        let Some((nsfw_filter, auto_download)) = columns else {
            return Ok(UserSettings::default());
        };

        Ok(UserSettings {
            nsfw_filter: parse_column(user, "nsfw_filter", &nsfw_filter),
            auto_download: parse_column(user, "auto_download", &auto_download),
        })
    }

    /// Does this user have any stored settings?
    pub async fn has_settings(&self, user: UserId) -> Result<bool, Error> {
        sqlx::query("SELECT 1 FROM user_settings WHERE userid=?;")
            .bind(user.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map(|x| x.is_some())
    }

    /// Store the settings of a user, overwriting what was there.
    pub async fn save_settings(&self, user: UserId, settings: &UserSettings) -> Result<(), Error> {
        let nsfw_filter = serde_json::to_string(&settings.nsfw_filter)
            .map_err(|e| Error::Encode(Box::new(e)))?;
        let auto_download = serde_json::to_string(&settings.auto_download)
            .map_err(|e| Error::Encode(Box::new(e)))?;

        sqlx::query(
            "INSERT INTO user_settings(userid, nsfw_filter, auto_download, updated_at)
            VALUES (?, ?, ?, ?)
        ON CONFLICT DO
            UPDATE SET nsfw_filter=?, auto_download=?, updated_at=?;",
        )
        .bind(user.0 as i64)
        .bind(&nsfw_filter)
        .bind(&auto_download)
        .bind(Utc::now())
        .bind(&nsfw_filter)
        .bind(&auto_download)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remember a user's report about the content filter.
    pub async fn add_report(&self, user: UserId, url: &str, kind: ReportKind) -> Result<(), Error> {
        sqlx::query("INSERT INTO reports(userid, url, kind, reported_at) VALUES (?, ?, ?, ?);")
            .bind(user.0 as i64)
            .bind(url)
            .bind(kind.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// How many reports of this kind were made in total.
    pub async fn count_reports(&self, kind: ReportKind) -> Result<u64, Error> {
        sqlx::query("SELECT COUNT(*) FROM reports WHERE kind=?;")
            .bind(kind.as_str())
            .map(|row: SqliteRow| row.get::<i64, _>(0))
            .fetch_one(&self.pool)
            .await
            .map(|x| x.max(0) as u64)
    }
}

/// Deserialize a stored JSON column. Broken data gets replaced with defaults.
fn parse_column<T: DeserializeOwned + Default>(user: UserId, name: &str, json: &str) -> T {
    serde_json::from_str(json).unwrap_or_else(|e| {
        log::warn!("Stored {name} of user {user} is broken, using defaults: {e}");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{content_filter::NsfwPolicy, url_detector::AutoDownloadPolicy};

    #[test]
    fn broken_columns_fall_back() {
        let user = UserId(1);

        let policy: NsfwPolicy = parse_column(user, "nsfw_filter", "{not json");
        assert_eq!(policy, NsfwPolicy::default());

        let policy: AutoDownloadPolicy =
            parse_column(user, "auto_download", r#"{"enabled":true,"leech":true}"#);
        assert!(policy.enabled && policy.leech);
    }
}
