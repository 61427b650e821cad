//! SQLite implementation of the CredentialStore trait.
//!
//! This is the primary storage backend for Brigade invites. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! Several `SqliteStore` handles (in one process or many) may point at the
//! same database file. The use counter stays bounded across all of them
//! because every increment is a single guarded `UPDATE` executed inside a
//! `BEGIN IMMEDIATE` transaction, which SQLite serializes across connections.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use brigade_invite_core::{
    evaluate, CoreError, Credential, CredentialId, CredentialKind, CredentialSecret, KitchenId,
    Membership, Role, UserId, Validity,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ConsumeResult, CredentialStore, InsertResult, MembershipWrite, RevokeResult};

/// Connection settings for [`SqliteStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a connection waits on another writer before reporting busy.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path with default settings.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreConfig::default())
    }

    /// Open a SQLite database at the given path.
    pub fn open_with(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened sqlite credential store");
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

const CREDENTIAL_COLUMNS: &str = "credential_id, kitchen_id, kind, human_code, token, \
     short_code, issued_by, created_at, expires_at, max_uses, current_uses, revoked";

const MEMBERSHIP_COLUMNS: &str = "kitchen_id, user_id, role, can_invite, created_at";

fn conversion_error(idx: usize, e: CoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

// Helper to convert a row to Credential
fn row_to_credential(row: &rusqlite::Row<'_>) -> rusqlite::Result<Credential> {
    let id_hex: String = row.get("credential_id")?;
    let kitchen_id: String = row.get("kitchen_id")?;
    let kind: u8 = row.get("kind")?;
    let issued_by: Option<String> = row.get("issued_by")?;

    let kind = CredentialKind::from_u8(kind)
        .ok_or_else(|| conversion_error(2, CoreError::InvalidKind(kind.to_string())))?;

    let secret = match kind {
        CredentialKind::Code => CredentialSecret::Code {
            human_code: row.get("human_code")?,
        },
        CredentialKind::Link => CredentialSecret::Link {
            token: row.get("token")?,
            short_code: row
                .get::<_, Option<String>>("short_code")?
                .unwrap_or_default(),
        },
    };

    Ok(Credential {
        id: CredentialId::from_hex(&id_hex).map_err(|e| conversion_error(0, e))?,
        kitchen_id: KitchenId::new(kitchen_id).map_err(|e| conversion_error(1, e))?,
        secret,
        issued_by: issued_by
            .map(UserId::new)
            .transpose()
            .map_err(|e| conversion_error(6, e))?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
        max_uses: row.get("max_uses")?,
        current_uses: row.get("current_uses")?,
        revoked: row.get("revoked")?,
    })
}

// Helper to convert a row to Membership
fn row_to_membership(row: &rusqlite::Row<'_>) -> rusqlite::Result<Membership> {
    let kitchen_id: String = row.get("kitchen_id")?;
    let user_id: String = row.get("user_id")?;
    let role: u8 = row.get("role")?;

    Ok(Membership {
        kitchen_id: KitchenId::new(kitchen_id).map_err(|e| conversion_error(0, e))?,
        user_id: UserId::new(user_id).map_err(|e| conversion_error(1, e))?,
        role: Role::from_u8(role)
            .ok_or_else(|| conversion_error(2, CoreError::InvalidRole(role.to_string())))?,
        can_invite: row.get("can_invite")?,
        created_at: row.get("created_at")?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn select_credential(conn: &Connection, id_hex: &str) -> Result<Option<Credential>> {
    conn.query_row(
        &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE credential_id = ?1"),
        params![id_hex],
        row_to_credential,
    )
    .optional()
    .map_err(StoreError::from)
}

fn select_membership(
    conn: &Connection,
    kitchen_id: &str,
    user_id: &str,
) -> Result<Option<Membership>> {
    conn.query_row(
        &format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE kitchen_id = ?1 AND user_id = ?2"
        ),
        params![kitchen_id, user_id],
        row_to_membership,
    )
    .optional()
    .map_err(StoreError::from)
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn insert_credential(&self, credential: &Credential) -> Result<InsertResult> {
        let credential = credential.clone();

        self.run(move |conn| {
            let (human_code, token, short_code) = match &credential.secret {
                CredentialSecret::Code { human_code } => (Some(human_code.as_str()), None, None),
                CredentialSecret::Link { token, short_code } => {
                    (None, Some(token.as_str()), Some(short_code.as_str()))
                }
            };

            let inserted = conn.execute(
                "INSERT INTO credentials (
                    credential_id, kitchen_id, kind, human_code, token, short_code,
                    issued_by, created_at, expires_at, max_uses, current_uses, revoked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    credential.id.to_hex(),
                    credential.kitchen_id.as_str(),
                    credential.kind().to_u8(),
                    human_code,
                    token,
                    short_code,
                    credential.issued_by.as_ref().map(|u| u.as_str()),
                    credential.created_at,
                    credential.expires_at,
                    credential.max_uses,
                    credential.current_uses,
                    credential.revoked,
                ],
            );

            match inserted {
                Ok(_) => Ok(InsertResult::Inserted),
                Err(e) if is_unique_violation(&e) => Ok(InsertResult::Conflict),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>> {
        let id_hex = id.to_hex();
        self.run(move |conn| select_credential(conn, &id_hex)).await
    }

    async fn get_credential_by_token(&self, token: &str) -> Result<Option<Credential>> {
        let token = token.to_string();

        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE token = ?1"),
                params![token],
                row_to_credential,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_credential_by_code(
        &self,
        kitchen_id: &KitchenId,
        human_code: &str,
    ) -> Result<Option<Credential>> {
        let kitchen_id = kitchen_id.clone();
        let human_code = human_code.to_string();

        self.run(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CREDENTIAL_COLUMNS} FROM credentials
                     WHERE kitchen_id = ?1 AND human_code = ?2"
                ),
                params![kitchen_id.as_str(), human_code],
                row_to_credential,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn find_credentials_by_code(&self, human_code: &str) -> Result<Vec<Credential>> {
        let human_code = human_code.to_string();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM credentials
                 WHERE human_code = ?1
                 ORDER BY created_at DESC, credential_id"
            ))?;

            let credentials = stmt
                .query_map(params![human_code], row_to_credential)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(credentials)
        })
        .await
    }

    async fn list_credentials(&self, kitchen_id: &KitchenId) -> Result<Vec<Credential>> {
        let kitchen_id = kitchen_id.clone();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM credentials
                 WHERE kitchen_id = ?1
                 ORDER BY created_at DESC, credential_id"
            ))?;

            let credentials = stmt
                .query_map(params![kitchen_id.as_str()], row_to_credential)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(credentials)
        })
        .await
    }

    async fn consume_use(&self, id: &CredentialId, now: i64) -> Result<ConsumeResult> {
        let id_hex = id.to_hex();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // The predicate mirrors `evaluate`; the row is only touched if it
            // is still valid at write time.
            let updated = tx.execute(
                "UPDATE credentials SET current_uses = current_uses + 1
                 WHERE credential_id = ?1
                   AND revoked = 0
                   AND expires_at > ?2
                   AND current_uses < max_uses",
                params![id_hex, now],
            )?;

            let credential = select_credential(&tx, &id_hex)?;
            tx.commit()?;

            match (updated, credential) {
                (1, Some(credential)) => Ok(ConsumeResult::Consumed(credential)),
                (_, credential) => {
                    let validity = match evaluate(credential.as_ref(), now) {
                        // Lost the race between the read and the guarded write.
                        Validity::Valid => Validity::UseLimitReached,
                        other => other,
                    };
                    Ok(ConsumeResult::Rejected(validity))
                }
            }
        })
        .await
    }

    async fn release_use(&self, id: &CredentialId) -> Result<bool> {
        let id_hex = id.to_hex();

        self.run(move |conn| {
            let released = conn.execute(
                "UPDATE credentials SET current_uses = current_uses - 1
                 WHERE credential_id = ?1 AND current_uses > 0",
                params![id_hex],
            )?;
            Ok(released == 1)
        })
        .await
    }

    async fn revoke_credential(&self, id: &CredentialId) -> Result<RevokeResult> {
        let id_hex = id.to_hex();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let revoked: Option<bool> = tx
                .query_row(
                    "SELECT revoked FROM credentials WHERE credential_id = ?1",
                    params![id_hex],
                    |row| row.get(0),
                )
                .optional()?;

            let result = match revoked {
                None => RevokeResult::NotFound,
                Some(true) => RevokeResult::AlreadyRevoked,
                Some(false) => {
                    tx.execute(
                        "UPDATE credentials SET revoked = 1 WHERE credential_id = ?1",
                        params![id_hex],
                    )?;
                    RevokeResult::Revoked
                }
            };

            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn get_membership(
        &self,
        kitchen_id: &KitchenId,
        user_id: &UserId,
    ) -> Result<Option<Membership>> {
        let kitchen_id = kitchen_id.clone();
        let user_id = user_id.clone();

        self.run(move |conn| select_membership(conn, kitchen_id.as_str(), user_id.as_str()))
            .await
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<MembershipWrite> {
        let membership = membership.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let inserted = tx.execute(
                "INSERT INTO memberships (kitchen_id, user_id, role, can_invite, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (kitchen_id, user_id) DO NOTHING",
                params![
                    membership.kitchen_id.as_str(),
                    membership.user_id.as_str(),
                    membership.role.to_u8(),
                    membership.can_invite,
                    membership.created_at,
                ],
            )?;

            let write = if inserted == 1 {
                MembershipWrite::Created(membership)
            } else {
                let existing = select_membership(
                    &tx,
                    membership.kitchen_id.as_str(),
                    membership.user_id.as_str(),
                )?
                .ok_or_else(|| {
                    StoreError::InvalidData("membership conflict without existing row".into())
                })?;
                MembershipWrite::Existing(existing)
            };

            tx.commit()?;
            Ok(write)
        })
        .await
    }

    async fn list_memberships(&self, kitchen_id: &KitchenId) -> Result<Vec<Membership>> {
        let kitchen_id = kitchen_id.clone();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMBERSHIP_COLUMNS} FROM memberships
                 WHERE kitchen_id = ?1
                 ORDER BY created_at, user_id"
            ))?;

            let members = stmt
                .query_map(params![kitchen_id.as_str()], row_to_membership)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(members)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen() -> KitchenId {
        KitchenId::new("bistro").unwrap()
    }

    fn make_code(code: &str, max_uses: u32) -> Credential {
        Credential {
            id: CredentialId::generate(),
            kitchen_id: kitchen(),
            secret: CredentialSecret::Code {
                human_code: code.to_string(),
            },
            issued_by: Some(UserId::new("sous").unwrap()),
            created_at: 1_000,
            expires_at: 10_000,
            max_uses,
            current_uses: 0,
            revoked: false,
        }
    }

    fn make_link(token: &str, max_uses: u32) -> Credential {
        Credential {
            id: CredentialId::generate(),
            kitchen_id: kitchen(),
            secret: CredentialSecret::Link {
                token: token.to_string(),
                short_code: token.to_ascii_uppercase(),
            },
            issued_by: None,
            created_at: 2_000,
            expires_at: 10_000,
            max_uses,
            current_uses: 0,
            revoked: false,
        }
    }

    #[tokio::test]
    async fn test_same_instant_lists_by_id() {
        let store = SqliteStore::open_memory().unwrap();
        let mut ids = Vec::new();
        for kitchen_name in ["a", "b", "c", "d", "e"] {
            let mut credential = make_code("XY7K2M", 1);
            credential.kitchen_id = KitchenId::new(kitchen_name).unwrap();
            ids.push(credential.id);
            store.insert_credential(&credential).await.unwrap();
        }

        ids.sort_by_key(|id| id.to_hex());
        let found: Vec<_> = store
            .find_credentials_by_code("XY7K2M")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(found, ids);
    }

    #[tokio::test]
    async fn test_insert_and_get_credential() {
        let store = SqliteStore::open_memory().unwrap();
        let code = make_code("XY7K2M", 2);
        let link = make_link("f00dcafe", 1);

        assert_eq!(store.insert_credential(&code).await.unwrap(), InsertResult::Inserted);
        assert_eq!(store.insert_credential(&link).await.unwrap(), InsertResult::Inserted);

        let by_id = store.get_credential(&code.id).await.unwrap().unwrap();
        assert_eq!(by_id, code);

        let by_token = store.get_credential_by_token("f00dcafe").await.unwrap().unwrap();
        assert_eq!(by_token, link);

        let listed = store.list_credentials(&kitchen()).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![link.id, code.id]);
    }

    #[tokio::test]
    async fn test_uniqueness_conflicts() {
        let store = SqliteStore::open_memory().unwrap();
        store.insert_credential(&make_code("XY7K2M", 2)).await.unwrap();
        store.insert_credential(&make_link("f00dcafe", 1)).await.unwrap();

        assert_eq!(
            store.insert_credential(&make_code("XY7K2M", 2)).await.unwrap(),
            InsertResult::Conflict
        );
        assert_eq!(
            store.insert_credential(&make_link("f00dcafe", 1)).await.unwrap(),
            InsertResult::Conflict
        );

        // Same code in another kitchen is fine.
        let mut elsewhere = make_code("XY7K2M", 2);
        elsewhere.kitchen_id = KitchenId::new("diner").unwrap();
        assert_eq!(
            store.insert_credential(&elsewhere).await.unwrap(),
            InsertResult::Inserted
        );
        assert_eq!(store.find_credentials_by_code("XY7K2M").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_consume_classifies_rejections() {
        let store = SqliteStore::open_memory().unwrap();
        let code = make_code("XY7K2M", 1);
        store.insert_credential(&code).await.unwrap();

        assert_eq!(
            store.consume_use(&code.id, 20_000).await.unwrap(),
            ConsumeResult::Rejected(Validity::Expired)
        );
        assert!(matches!(
            store.consume_use(&code.id, 5_000).await.unwrap(),
            ConsumeResult::Consumed(c) if c.current_uses == 1
        ));
        assert_eq!(
            store.consume_use(&code.id, 5_000).await.unwrap(),
            ConsumeResult::Rejected(Validity::UseLimitReached)
        );
        assert_eq!(
            store
                .consume_use(&CredentialId::from_bytes([9; 16]), 5_000)
                .await
                .unwrap(),
            ConsumeResult::Rejected(Validity::NotFound)
        );
    }

    #[tokio::test]
    async fn test_release_and_revoke() {
        let store = SqliteStore::open_memory().unwrap();
        let link = make_link("f00dcafe", 1);
        store.insert_credential(&link).await.unwrap();

        store.consume_use(&link.id, 5_000).await.unwrap();
        assert!(store.release_use(&link.id).await.unwrap());
        assert!(!store.release_use(&link.id).await.unwrap());

        assert_eq!(store.revoke_credential(&link.id).await.unwrap(), RevokeResult::Revoked);
        assert_eq!(
            store.revoke_credential(&link.id).await.unwrap(),
            RevokeResult::AlreadyRevoked
        );
        assert_eq!(
            store
                .revoke_credential(&CredentialId::from_bytes([3; 16]))
                .await
                .unwrap(),
            RevokeResult::NotFound
        );
        assert_eq!(
            store.consume_use(&link.id, 5_000).await.unwrap(),
            ConsumeResult::Rejected(Validity::Revoked)
        );
    }

    #[tokio::test]
    async fn test_membership_insert_if_absent() {
        let store = SqliteStore::open_memory().unwrap();
        let user = UserId::new("line-cook").unwrap();
        let first = Membership::new(kitchen(), user.clone(), Role::Member, 10);

        assert_eq!(
            store.insert_membership(&first).await.unwrap(),
            MembershipWrite::Created(first.clone())
        );

        let again = Membership::new(kitchen(), user.clone(), Role::Admin, 20);
        assert_eq!(
            store.insert_membership(&again).await.unwrap(),
            MembershipWrite::Existing(first.clone())
        );

        let fetched = store.get_membership(&kitchen(), &user).await.unwrap();
        assert_eq!(fetched, Some(first.clone()));
        assert_eq!(store.list_memberships(&kitchen()).await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invites.db");
        let code = make_code("XY7K2M", 3);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_credential(&code).await.unwrap();
            store.consume_use(&code.id, 5_000).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let stored = store.get_credential(&code.id).await.unwrap().unwrap();
        assert_eq!(stored.current_uses, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_handles_stay_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invites.db");
        let code = make_code("XY7K2M", 2);

        let handles: Vec<Arc<SqliteStore>> = (0..4)
            .map(|_| Arc::new(SqliteStore::open(&path).unwrap()))
            .collect();
        handles[0].insert_credential(&code).await.unwrap();

        let tasks: Vec<_> = (0..12)
            .map(|i| {
                let store = Arc::clone(&handles[i % handles.len()]);
                let id = code.id;
                tokio::spawn(async move { store.consume_use(&id, 5_000).await.unwrap() })
            })
            .collect();

        let mut consumed = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), ConsumeResult::Consumed(_)) {
                consumed += 1;
            }
        }

        assert_eq!(consumed, 2);
        let stored = handles[0].get_credential(&code.id).await.unwrap().unwrap();
        assert_eq!(stored.current_uses, 2);
    }
}
