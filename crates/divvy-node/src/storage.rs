//! RocksDB-backed persistent ledger storage.
//!
//! Implements [`LedgerStore`] with two column families: `accounts` holds
//! one bincode [`AccountState`] per 20-byte account id, and `metadata`
//! holds the [`GlobalState`] and [`TokenInfo`]. Every commit is a single
//! [`WriteBatch`], so the accumulator and the account checkpoints it
//! settled always land together.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use divvy_core::constants::ACCOUNT_ID_LEN;
use divvy_core::traits::LedgerStore;
use divvy_core::types::{Changeset, LedgerSnapshot};
use divvy_core::{AccountId, AccountState, DivvyError, GlobalState, TokenInfo};

// --- Column family names ---

const CF_ACCOUNTS: &str = "accounts";
const CF_METADATA: &str = "metadata";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_ACCOUNTS, CF_METADATA];

// --- Metadata keys ---

const META_GLOBAL: &[u8] = b"global";
const META_TOKEN: &[u8] = b"token";

/// RocksDB-backed persistent ledger storage.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path.
    ///
    /// Creates the column families if they don't exist. An empty database
    /// loads as `None` until [`LedgerStore::initialize`] is called.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DivvyError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| DivvyError::Storage(e.to_string()))?;

        info!(path = %path.as_ref().display(), "opened ledger store");
        Ok(Self { db })
    }

    /// Whether genesis has been written.
    pub fn is_initialized(&self) -> Result<bool, DivvyError> {
        Ok(self.global()?.is_some())
    }

    /// Persisted global state, `None` before genesis.
    pub fn global(&self) -> Result<Option<GlobalState>, DivvyError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self
            .db
            .get_cf(&cf, META_GLOBAL)
            .map_err(|e| DivvyError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode_global(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persisted state of one account. Never-seen accounts are `None`.
    pub fn account(&self, id: &AccountId) -> Result<Option<AccountState>, DivvyError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self
            .db
            .get_cf(&cf, id.as_bytes())
            .map_err(|e| DivvyError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode_account(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), DivvyError> {
        self.db
            .flush()
            .map_err(|e| DivvyError::Storage(e.to_string()))
    }

    /// Trigger manual compaction across all column families.
    pub fn compact(&self) -> Result<(), DivvyError> {
        for cf_name in ALL_CFS {
            let cf = self.cf_handle(cf_name)?;
            self.db.compact_range_cf(&cf, None::<&[u8]>, None::<&[u8]>);
        }
        Ok(())
    }

    // --- Internal helpers ---

    /// Get a column family handle.
    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, DivvyError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| DivvyError::Storage(format!("missing column family: {name}")))
    }

    fn token(&self) -> Result<Option<TokenInfo>, DivvyError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self
            .db
            .get_cf(&cf, META_TOKEN)
            .map_err(|e| DivvyError::Storage(e.to_string()))?
        {
            Some(bytes) => {
                let (token, _): (TokenInfo, usize) =
                    bincode::decode_from_slice(&bytes, bincode::config::standard())
                        .map_err(|e| DivvyError::Corrupt(format!("token info: {e}")))?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    fn iter_accounts(&self) -> Result<Vec<(AccountId, AccountState)>, DivvyError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| DivvyError::Storage(e.to_string()))?;
            let bytes: [u8; ACCOUNT_ID_LEN] = key[..].try_into().map_err(|_| {
                DivvyError::Corrupt(format!("account key of {} bytes", key.len()))
            })?;
            accounts.push((AccountId::from_bytes(bytes), decode_account(&value)?));
        }
        Ok(accounts)
    }

    /// Stage an account write. All-zero states are deleted to keep the
    /// column family sparse.
    fn stage_account(
        &self,
        batch: &mut WriteBatch,
        id: &AccountId,
        state: &AccountState,
    ) -> Result<(), DivvyError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        if state.is_empty() {
            batch.delete_cf(&cf, id.as_bytes());
        } else {
            batch.put_cf(&cf, id.as_bytes(), encode(state)?);
        }
        Ok(())
    }

    fn stage_global(&self, batch: &mut WriteBatch, global: &GlobalState) -> Result<(), DivvyError> {
        let cf = self.cf_handle(CF_METADATA)?;
        batch.put_cf(&cf, META_GLOBAL, encode(global)?);
        Ok(())
    }
}

impl LedgerStore for RocksStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, DivvyError> {
        let Some(global) = self.global()? else {
            return Ok(None);
        };
        let token = self
            .token()?
            .ok_or_else(|| DivvyError::Corrupt("missing token info".into()))?;
        let accounts = self.iter_accounts()?;
        debug!(accounts = accounts.len(), "loaded ledger image");
        Ok(Some(LedgerSnapshot {
            token,
            global,
            accounts,
        }))
    }

    fn initialize(&self, snapshot: &LedgerSnapshot) -> Result<(), DivvyError> {
        if self.is_initialized()? {
            return Err(DivvyError::Storage("store already initialized".into()));
        }
        let mut batch = WriteBatch::default();
        self.stage_global(&mut batch, &snapshot.global)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;
        batch.put_cf(&cf_meta, META_TOKEN, encode(&snapshot.token)?);
        for (id, state) in &snapshot.accounts {
            self.stage_account(&mut batch, id, state)?;
        }
        self.db
            .write(batch)
            .map_err(|e| DivvyError::Storage(e.to_string()))?;
        info!(accounts = snapshot.accounts.len(), "wrote genesis");
        Ok(())
    }

    fn commit(&self, changes: &Changeset) -> Result<(), DivvyError> {
        let mut batch = WriteBatch::default();
        self.stage_global(&mut batch, &changes.global)?;
        for (id, state) in &changes.accounts {
            self.stage_account(&mut batch, id, state)?;
        }
        self.db
            .write(batch)
            .map_err(|e| DivvyError::Storage(e.to_string()))?;
        debug!(accounts = changes.accounts.len(), "committed changeset");
        Ok(())
    }
}

fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, DivvyError> {
    bincode::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| DivvyError::Storage(e.to_string()))
}

fn decode_account(bytes: &[u8]) -> Result<AccountState, DivvyError> {
    let (state, _): (AccountState, usize) =
        bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| DivvyError::Corrupt(format!("account state: {e}")))?;
    Ok(state)
}

fn decode_global(bytes: &[u8]) -> Result<GlobalState, DivvyError> {
    let (global, _): (GlobalState, usize) =
        bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| DivvyError::Corrupt(format!("global state: {e}")))?;
    Ok(global)
}
