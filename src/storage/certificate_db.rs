// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Embedded certificate database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `certificates`: certificate_id → serialized CertificateRecord
//! - `token_index`: `lower(contract)|decimal(token_id)` → certificate_id (multimap)
//! - `mint_records`: idempotency key → serialized MintRecord
//! - `notifications`: notification id → serialized Notification
//! - `audit_events`: `timestamp|event_id` → serialized AuditEvent

use std::path::Path;

use chrono::{Duration, Utc};
use redb::{
    Database, MultimapTable, MultimapTableDefinition, ReadableDatabase, ReadableMultimapTable,
    ReadableTable, Table, TableDefinition,
};

use super::audit::AuditEvent;
use crate::blockchain::parse_token_id;
use super::records::{
    CertificateRecord, MintOutcome, MintRecord, MintState, NewCertificate, Notification,
};

// =============================================================================
// Table Definitions
// =============================================================================

const CERTIFICATES: TableDefinition<&str, &[u8]> = TableDefinition::new("certificates");

/// Index: `lower(contract)|token_id` → certificate_id.
/// A row is indexed under its primary token and its destination-chain token.
const TOKEN_INDEX: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("token_index");

const MINT_RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("mint_records");

const NOTIFICATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("notifications");

const AUDIT_EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("audit_events");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CertificateDbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type CertDbResult<T> = Result<T, CertificateDbError>;

/// Result of claiming a mint idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintBegin {
    /// A fresh pending record was written; the caller owns the mint.
    Started,
    /// A confirmed mint exists; replay its outcome.
    Completed(MintRecord),
    /// Another request holds the key, or a broadcast was never confirmed.
    InFlight(MintRecord),
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build the token index key: `lowercase_contract | token_id`.
///
/// Token ids are keyed in decimal, so `0x07`, `007` and `7` share a key.
/// Ids that do not parse as a uint256 are keyed verbatim.
fn token_key(contract_address: &str, token_id: &str) -> String {
    let token = match parse_token_id(token_id) {
        Some(id) => id.to_string(),
        None => token_id.trim().to_string(),
    };
    format!("{}|{}", contract_address.trim().to_lowercase(), token)
}

fn token_keys(record: &CertificateRecord) -> Vec<String> {
    record
        .token_refs()
        .into_iter()
        .map(|(contract, token)| token_key(contract, token))
        .collect()
}

type CertTable<'txn> = Table<'txn, &'static str, &'static [u8]>;
type IndexTable<'txn> = MultimapTable<'txn, &'static str, &'static str>;

/// Load, mutate and (only if something changed) rewrite one certificate.
///
/// `updated_at` moves only when the mutation changed a field, so applying
/// the same mutation twice leaves the row byte-identical.
fn apply_update<F>(
    table: &mut CertTable<'_>,
    index: &mut IndexTable<'_>,
    certificate_id: &str,
    apply: &mut F,
) -> CertDbResult<Option<CertificateRecord>>
where
    F: FnMut(&mut CertificateRecord),
{
    let existing_bytes = table.get(certificate_id)?.map(|v| v.value().to_vec());
    let Some(bytes) = existing_bytes else {
        return Ok(None);
    };

    let existing: CertificateRecord = serde_json::from_slice(&bytes)?;
    let mut updated = existing.clone();
    apply(&mut updated);
    // Identity fields are not mutable through updates
    updated.id = existing.id.clone();
    updated.certificate_id = existing.certificate_id.clone();
    updated.created_at = existing.created_at;

    if updated == existing {
        return Ok(Some(existing));
    }
    updated.updated_at = Utc::now();

    for key in token_keys(&existing) {
        index.remove(key.as_str(), certificate_id)?;
    }
    for key in token_keys(&updated) {
        index.insert(key.as_str(), certificate_id)?;
    }

    let json = serde_json::to_vec(&updated)?;
    table.insert(certificate_id, json.as_slice())?;
    Ok(Some(updated))
}

// =============================================================================
// CertificateDatabase
// =============================================================================

/// Embedded ACID certificate database.
pub struct CertificateDatabase {
    db: Database,
}

impl CertificateDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> CertDbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CERTIFICATES)?;
            let _ = write_txn.open_multimap_table(TOKEN_INDEX)?;
            let _ = write_txn.open_table(MINT_RECORDS)?;
            let _ = write_txn.open_table(NOTIFICATIONS)?;
            let _ = write_txn.open_table(AUDIT_EVENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Confirm the database answers a read transaction.
    pub fn check(&self) -> CertDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(CERTIFICATES)?;
        Ok(())
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    /// Register a new certificate row.
    pub fn insert_certificate(&self, input: NewCertificate) -> CertDbResult<CertificateRecord> {
        let record = CertificateRecord::new(input);
        let json = serde_json::to_vec(&record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CERTIFICATES)?;
            if table.get(record.certificate_id.as_str())?.is_some() {
                return Err(CertificateDbError::Conflict(format!(
                    "Certificate {}",
                    record.certificate_id
                )));
            }
            table.insert(record.certificate_id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_multimap_table(TOKEN_INDEX)?;
            for key in token_keys(&record) {
                index.insert(key.as_str(), record.certificate_id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Look up a certificate by its source-of-truth id.
    pub fn get_certificate(&self, certificate_id: &str) -> CertDbResult<Option<CertificateRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CERTIFICATES)?;
        match table.get(certificate_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Certificates indexed under `(contract_address, token_id)`.
    pub fn find_by_token(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> CertDbResult<Vec<CertificateRecord>> {
        let key = token_key(contract_address, token_id);
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_multimap_table(TOKEN_INDEX)?;
        let table = read_txn.open_table(CERTIFICATES)?;

        let mut records = Vec::new();
        for id in index.get(key.as_str())? {
            let id = id?;
            if let Some(value) = table.get(id.value())? {
                records.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(records)
    }

    /// Apply `apply` to the certificate with `certificate_id`.
    ///
    /// Returns `None` when no row matched. The write is skipped entirely
    /// when the mutation changes nothing.
    pub fn update_certificate<F>(
        &self,
        certificate_id: &str,
        mut apply: F,
    ) -> CertDbResult<Option<CertificateRecord>>
    where
        F: FnMut(&mut CertificateRecord),
    {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(CERTIFICATES)?;
            let mut index = write_txn.open_multimap_table(TOKEN_INDEX)?;
            apply_update(&mut table, &mut index, certificate_id, &mut apply)?
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Apply `apply` to every certificate indexed under the token.
    pub fn update_by_token<F>(
        &self,
        contract_address: &str,
        token_id: &str,
        mut apply: F,
    ) -> CertDbResult<Vec<CertificateRecord>>
    where
        F: FnMut(&mut CertificateRecord),
    {
        let key = token_key(contract_address, token_id);
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(CERTIFICATES)?;
            let mut index = write_txn.open_multimap_table(TOKEN_INDEX)?;

            let ids = index
                .get(key.as_str())?
                .map(|id| id.map(|guard| guard.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;

            let mut updated = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(record) = apply_update(&mut table, &mut index, &id, &mut apply)? {
                    updated.push(record);
                }
            }
            updated
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // =========================================================================
    // Mint idempotency records
    // =========================================================================

    /// Atomically claim `key` for a new mint, or report what holds it.
    ///
    /// A `Pending` claim older than `claim_ttl` belongs to a request that
    /// died without releasing it and is taken over. `Unconfirmed` records
    /// never expire.
    pub fn begin_mint(
        &self,
        key: &str,
        certificate_id: &str,
        network: &str,
        claim_ttl: Duration,
    ) -> CertDbResult<MintBegin> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(MINT_RECORDS)?;
            let existing = table.get(key)?.map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => {
                    let record: MintRecord = serde_json::from_slice(&bytes)?;
                    match record.state {
                        MintState::Confirmed => MintBegin::Completed(record),
                        MintState::Pending if Utc::now() - record.updated_at >= claim_ttl => {
                            tracing::warn!(
                                certificate_id,
                                claimed_at = %record.updated_at,
                                "Taking over stale mint claim"
                            );
                            let record = MintRecord::pending(key, certificate_id, network);
                            let json = serde_json::to_vec(&record)?;
                            table.insert(key, json.as_slice())?;
                            MintBegin::Started
                        }
                        MintState::Pending | MintState::Unconfirmed => MintBegin::InFlight(record),
                    }
                }
                None => {
                    let record = MintRecord::pending(key, certificate_id, network);
                    let json = serde_json::to_vec(&record)?;
                    table.insert(key, json.as_slice())?;
                    MintBegin::Started
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    pub fn get_mint(&self, key: &str) -> CertDbResult<Option<MintRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MINT_RECORDS)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Mark a mint confirmed and store the outcome for replay.
    pub fn complete_mint(&self, key: &str, outcome: MintOutcome) -> CertDbResult<MintRecord> {
        self.update_mint(key, |record| {
            record.state = MintState::Confirmed;
            record.tx_hash = Some(outcome.tx_hash.clone());
            record.outcome = Some(outcome);
            record.error = None;
        })
    }

    /// Keep a broadcast-but-unconfirmed mint so retries cannot double-mint.
    pub fn mark_mint_unconfirmed(
        &self,
        key: &str,
        tx_hash: &str,
        error: &str,
    ) -> CertDbResult<MintRecord> {
        self.update_mint(key, |record| {
            record.state = MintState::Unconfirmed;
            record.tx_hash = Some(tx_hash.to_string());
            record.error = Some(error.to_string());
        })
    }

    /// Release a pending claim whose transaction never left the process.
    pub fn abandon_mint(&self, key: &str) -> CertDbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MINT_RECORDS)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn update_mint<F>(&self, key: &str, apply: F) -> CertDbResult<MintRecord>
    where
        F: FnOnce(&mut MintRecord),
    {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(MINT_RECORDS)?;
            let existing_bytes = table
                .get(key)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| CertificateDbError::NotFound(format!("Mint record {key}")))?;

            let mut record: MintRecord = serde_json::from_slice(&existing_bytes)?;
            apply(&mut record);
            record.updated_at = Utc::now();

            let json = serde_json::to_vec(&record)?;
            table.insert(key, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn insert_notification(&self, notification: &Notification) -> CertDbResult<()> {
        let json = serde_json::to_vec(notification)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(NOTIFICATIONS)?;
            table.insert(notification.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Notifications for a user, oldest first.
    pub fn notifications_for(&self, user_id: &str) -> CertDbResult<Vec<Notification>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTIFICATIONS)?;

        let mut results = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let notification: Notification = serde_json::from_slice(value.value())?;
            if notification.user_id == user_id {
                results.push(notification);
            }
        }
        results.sort_by_key(|n| n.created_at);
        Ok(results)
    }

    // =========================================================================
    // Audit events
    // =========================================================================

    pub fn append_audit(&self, event: &AuditEvent) -> CertDbResult<()> {
        let key = event.storage_key();
        let json = serde_json::to_vec(event)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_EVENTS)?;
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All audit events, oldest first.
    pub fn audit_events(&self) -> CertDbResult<Vec<AuditEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_EVENTS)?;

        let mut events = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
impl CertificateDatabase {
    /// Overwrite a certificate row with arbitrary bytes.
    pub(crate) fn put_raw_certificate(
        &self,
        certificate_id: &str,
        bytes: &[u8],
    ) -> CertDbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CERTIFICATES)?;
            table.insert(certificate_id, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
