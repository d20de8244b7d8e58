use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{abort, ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AboutDraft, AboutMe, AboutRecord, Education, Experience, User};

/// Key in the `meta` tree holding the id of the one admin account.
const ADMIN_KEY: &[u8] = b"admin";
/// Fixed key of the AboutMe singleton in the `about` tree.
const ABOUT_KEY: &[u8] = b"about_me";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("record encoding error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("an admin account already exists")]
    AdminExists,
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

impl From<TransactionError<StorageError>> for StorageError {
    fn from(err: TransactionError<StorageError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StorageError::Sled(e),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A JSON document kept in its own Sled tree, keyed by id.
pub trait Record: Serialize + DeserializeOwned {
    const TREE: &'static str;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

/// Sled-backed store for every portfolio record.
///
/// Trees:
/// - `users` (id -> User) with the `usernames` index (username -> id)
/// - `meta` for singleton markers (the admin id)
/// - `about`, `education`, `experience` for the biography and its children
/// - one tree per [`Record`] type (projects, certificates, gallery, ratings)
///
/// Handles are cheap to clone and share one underlying database.
#[derive(Clone)]
pub struct Storage {
    db: Db,
    users: Tree,
    usernames: Tree,
    meta: Tree,
    about: Tree,
    education: Tree,
    experience: Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory database removed on drop, for tests and throwaway runs.
    pub fn temporary() -> StorageResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> StorageResult<Self> {
        Ok(Self {
            users: db.open_tree("users")?,
            usernames: db.open_tree("usernames")?,
            meta: db.open_tree("meta")?,
            about: db.open_tree("about")?,
            education: db.open_tree(Education::TREE)?,
            experience: db.open_tree(Experience::TREE)?,
            db,
        })
    }

    pub async fn flush(&self) -> StorageResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    // --- Credential store ---

    /// Insert a new user. The username must be free and, for an admin, no
    /// other admin may exist; both checks happen inside the write transaction.
    pub fn create_user(&self, user: &User) -> StorageResult<()> {
        let bytes = encode(user)?;
        (&self.users, &self.usernames, &self.meta).transaction(|(users, usernames, meta)| {
            if usernames.get(user.username.as_bytes())?.is_some() {
                return abort(StorageError::UsernameTaken(user.username.clone()));
            }
            if user.is_admin {
                if meta.get(ADMIN_KEY)?.is_some() {
                    return abort(StorageError::AdminExists);
                }
                meta.insert(ADMIN_KEY, user.id.as_bytes())?;
            }
            users.insert(user.id.as_bytes(), bytes.as_slice())?;
            usernames.insert(user.username.as_bytes(), user.id.as_bytes())?;
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        self.users
            .get(id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        match self.usernames.get(username.as_bytes())? {
            Some(id) => self.get_user(&String::from_utf8_lossy(&id)),
            None => Ok(None),
        }
    }

    pub fn admin_exists(&self) -> StorageResult<bool> {
        Ok(self.meta.contains_key(ADMIN_KEY)?)
    }

    /// Change username and/or password hash of an existing user, keeping the
    /// username index in step.
    pub fn update_credentials(
        &self,
        id: &str,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> StorageResult<User> {
        let now = Utc::now();
        let updated = (&self.users, &self.usernames).transaction(|(users, usernames)| {
            let Some(bytes) = users.get(id.as_bytes())? else {
                return abort(StorageError::NotFound(format!("user {id}")));
            };
            let mut user: User = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;

            if let Some(new_name) = username.filter(|name| *name != user.username) {
                if usernames.get(new_name.as_bytes())?.is_some() {
                    return abort(StorageError::UsernameTaken(new_name.to_owned()));
                }
                usernames.remove(user.username.as_bytes())?;
                usernames.insert(new_name.as_bytes(), id.as_bytes())?;
                user.username = new_name.to_owned();
            }
            if let Some(hash) = password_hash {
                user.password_hash = hash.to_owned();
            }
            user.updated_at = Some(now);

            let bytes = encode(&user).map_err(ConflictableTransactionError::Abort)?;
            users.insert(id.as_bytes(), bytes)?;
            Ok(user)
        })?;
        Ok(updated)
    }

    // --- Plain records (projects, certificates, gallery, ratings) ---

    fn records<R: Record>(&self) -> StorageResult<Tree> {
        Ok(self.db.open_tree(R::TREE)?)
    }

    /// All records of a kind, newest first.
    pub fn list<R: Record>(&self) -> StorageResult<Vec<R>> {
        let mut records = Vec::new();
        for item in self.records::<R>()?.iter() {
            let (_, value) = item?;
            records.push(decode::<R>(&value)?);
        }
        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(records)
    }

    pub fn get<R: Record>(&self, id: &str) -> StorageResult<Option<R>> {
        self.records::<R>()?
            .get(id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Insert or overwrite a record under its id.
    pub fn put<R: Record>(&self, record: &R) -> StorageResult<()> {
        self.records::<R>()?
            .insert(record.id().as_bytes(), encode(record)?)?;
        Ok(())
    }

    /// Remove a record, returning it if it existed.
    pub fn remove<R: Record>(&self, id: &str) -> StorageResult<Option<R>> {
        self.records::<R>()?
            .remove(id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    // --- AboutMe singleton ---

    /// Read the biography with its relations from one consistent snapshot.
    pub fn get_about(&self) -> StorageResult<Option<AboutMe>> {
        let about = (&self.about, &self.education, &self.experience).transaction(
            |(about, education, experience)| {
                let Some(bytes) = about.get(ABOUT_KEY)? else {
                    return Ok(None);
                };
                let record: AboutRecord = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;

                let mut edu = Vec::with_capacity(record.education_ids.len());
                for id in &record.education_ids {
                    if let Some(bytes) = education.get(id.as_bytes())? {
                        edu.push(decode::<Education>(&bytes).map_err(ConflictableTransactionError::Abort)?);
                    }
                }
                let mut exp = Vec::with_capacity(record.experience_ids.len());
                for id in &record.experience_ids {
                    if let Some(bytes) = experience.get(id.as_bytes())? {
                        exp.push(decode::<Experience>(&bytes).map_err(ConflictableTransactionError::Abort)?);
                    }
                }
                Ok(Some(AboutMe::assemble(record, edu, exp)))
            },
        )?;
        Ok(about)
    }

    /// Create the singleton or replace it: drop every stored child, insert
    /// the children from `draft`, then merge the scalar fields. All of it
    /// commits as one transaction.
    pub fn replace_about(&self, draft: &AboutDraft) -> StorageResult<AboutMe> {
        let now = Utc::now();
        let about = (&self.about, &self.education, &self.experience).transaction(
            |(about, education, experience)| {
                let existing = match about.get(ABOUT_KEY)? {
                    Some(bytes) => Some(
                        decode::<AboutRecord>(&bytes).map_err(ConflictableTransactionError::Abort)?,
                    ),
                    None => None,
                };
                let about_id = existing
                    .as_ref()
                    .map_or_else(|| Uuid::new_v4().to_string(), |record| record.id.clone());

                if let Some(record) = &existing {
                    for id in &record.education_ids {
                        education.remove(id.as_bytes())?;
                    }
                    for id in &record.experience_ids {
                        experience.remove(id.as_bytes())?;
                    }
                }

                let mut new_education = Vec::new();
                for entry in draft.education.iter().flatten() {
                    let edu = entry
                        .into_education(&about_id, now)
                        .map_err(|msg| ConflictableTransactionError::Abort(StorageError::Invalid(msg)))?;
                    let bytes = encode(&edu).map_err(ConflictableTransactionError::Abort)?;
                    education.insert(edu.id.as_bytes(), bytes)?;
                    new_education.push(edu);
                }

                let mut new_experience = Vec::new();
                for entry in draft.experience.iter().flatten() {
                    let exp = entry
                        .into_experience(&about_id, now)
                        .map_err(|msg| ConflictableTransactionError::Abort(StorageError::Invalid(msg)))?;
                    let bytes = encode(&exp).map_err(ConflictableTransactionError::Abort)?;
                    experience.insert(exp.id.as_bytes(), bytes)?;
                    new_experience.push(exp);
                }

                let record = draft
                    .into_record(
                        existing,
                        about_id,
                        new_education.iter().map(|e| e.id.clone()).collect(),
                        new_experience.iter().map(|e| e.id.clone()).collect(),
                        now,
                    )
                    .map_err(|msg| ConflictableTransactionError::Abort(StorageError::Invalid(msg)))?;
                let bytes = encode(&record).map_err(ConflictableTransactionError::Abort)?;
                about.insert(ABOUT_KEY, bytes)?;

                Ok(AboutMe::assemble(record, new_education, new_experience))
            },
        )?;
        Ok(about)
    }
}

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}
