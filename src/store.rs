use crate::{
    block::{store::BlockStore, AttachedBlock, BlockHash},
    canonicity::{store::CanonicityStore, Canonicity, ChainHead},
    event::{
        db::{DbBlockEvent, DbCanonicityEvent, DbEvent},
        store::EventStore,
    },
};
use rocksdb::{ColumnFamilyDescriptor, WriteBatch, DB};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::trace;

#[derive(Debug)]
pub struct ChainStore {
    pub db_path: PathBuf,
    pub database: DB,
    // event appends are read-modify-write on the sequence counter
    event_seq_lock: Mutex<()>,
}

impl ChainStore {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let mut cf_opts = rocksdb::Options::default();
        cf_opts.set_max_write_buffer_number(16);
        let blocks = ColumnFamilyDescriptor::new("blocks", cf_opts.clone());
        let canonicity = ColumnFamilyDescriptor::new("canonicity", cf_opts.clone());
        let events = ColumnFamilyDescriptor::new("events", cf_opts);

        let mut database_opts = rocksdb::Options::default();
        database_opts.create_missing_column_families(true);
        database_opts.create_if_missing(true);
        let database =
            DB::open_cf_descriptors(&database_opts, path, vec![blocks, canonicity, events])?;
        Ok(Self {
            db_path: PathBuf::from(path),
            database,
            event_seq_lock: Mutex::new(()),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn blocks_cf(&self) -> &rocksdb::ColumnFamily {
        self.database
            .cf_handle("blocks")
            .expect("blocks column family exists")
    }

    fn canonicity_cf(&self) -> &rocksdb::ColumnFamily {
        self.database
            .cf_handle("canonicity")
            .expect("canonicity column family exists")
    }

    fn events_cf(&self) -> &rocksdb::ColumnFamily {
        self.database
            .cf_handle("events")
            .expect("events column family exists")
    }

    /// Stage the events at the next sequence numbers and write the whole batch
    /// in one step, so a staged record never lands without its event
    fn append_events(&self, mut batch: WriteBatch, events: &[DbEvent]) -> anyhow::Result<u32> {
        let _guard = self.event_seq_lock.lock().expect("event lock not poisoned");
        let mut seq_num = self.get_next_seq_num()?;

        let events_cf = self.events_cf();
        for event in events {
            trace!("Adding event {seq_num}: {:?}", event);
            batch.put_cf(events_cf, seq_num.to_be_bytes(), serde_json::to_vec(event)?);
            seq_num += 1;
        }
        batch.put_cf(
            events_cf,
            Self::NEXT_EVENT_SEQ_NUM_KEY,
            serde_json::to_vec(&seq_num)?,
        );
        self.database.write(batch)?;

        Ok(seq_num)
    }
}

impl BlockStore for ChainStore {
    /// Add the given block at its hash and its NewBlock event in one write
    /// batch
    fn add_block(&self, block: &AttachedBlock) -> anyhow::Result<DbEvent> {
        trace!(
            "Adding block with height {} and hash {}",
            block.number(),
            block.hash
        );

        let key = block.hash.0;
        let blocks_cf = self.blocks_cf();
        if self.database.get_pinned_cf(blocks_cf, key)?.is_some() {
            return Ok(DbEvent::Block(DbBlockEvent::AlreadySeenBlock {
                hash: block.hash,
                number: block.number(),
            }));
        }

        let db_event = DbEvent::Block(DbBlockEvent::NewBlock {
            hash: block.hash,
            number: block.number(),
        });
        let mut batch = WriteBatch::default();
        batch.put_cf(blocks_cf, key, serde_json::to_vec(&block)?);
        self.append_events(batch, std::slice::from_ref(&db_event))?;

        Ok(db_event)
    }

    /// Get the block with the specified hash
    fn get_block(&self, hash: &BlockHash) -> anyhow::Result<Option<AttachedBlock>> {
        trace!("Getting block with hash {hash}");

        let blocks_cf = self.blocks_cf();
        match self.database.get_pinned_cf(blocks_cf, hash.0)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }

    fn has_block(&self, hash: &BlockHash) -> anyhow::Result<bool> {
        Ok(self
            .database
            .get_pinned_cf(self.blocks_cf(), hash.0)?
            .is_some())
    }
}

impl CanonicityStore for ChainStore {
    /// Add a canonical hash at the specified number and its event in one
    /// write batch
    fn add_canonical_block(&self, number: u64, hash: &BlockHash) -> anyhow::Result<()> {
        trace!("Adding canonical block at height {number} with hash {hash}");

        let mut batch = WriteBatch::default();
        batch.put_cf(self.canonicity_cf(), number.to_be_bytes(), hash.0);
        self.append_events(
            batch,
            &[DbEvent::Canonicity(DbCanonicityEvent::NewCanonicalBlock {
                number,
                hash: *hash,
            })],
        )?;

        Ok(())
    }

    /// Get the hash of the canonical block with the specified number
    fn get_canonical_hash_at_number(&self, number: u64) -> anyhow::Result<Option<BlockHash>> {
        trace!("Getting canonical hash at height {number}");

        let key = number.to_be_bytes();
        let canonicity_cf = self.canonicity_cf();
        match self.database.get_pinned_cf(canonicity_cf, key)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(BlockHash(bytes.as_ref().try_into()?))),
        }
    }

    fn get_chain_head(&self) -> anyhow::Result<Option<ChainHead>> {
        trace!("Getting chain head");

        let canonicity_cf = self.canonicity_cf();
        match self
            .database
            .get_pinned_cf(canonicity_cf, Self::CHAIN_HEAD_KEY)?
        {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }

    fn set_chain_head(&self, head: &ChainHead) -> anyhow::Result<()> {
        trace!("Setting chain head to {} at height {}", head.hash, head.number);

        let canonicity_cf = self.canonicity_cf();
        let value = serde_json::to_vec(head)?;
        self.database
            .put_cf(canonicity_cf, Self::CHAIN_HEAD_KEY, value)?;
        Ok(())
    }

    /// Swap the canonical branch, head record and canonicity events in a
    /// single write batch so a torn number index is never observable
    fn apply_reorg(
        &self,
        adopted: &[(u64, BlockHash)],
        retired: &[u64],
        head: &ChainHead,
    ) -> anyhow::Result<()> {
        trace!(
            "Applying reorg: {} adopted, {} retired, new head {} at height {}",
            adopted.len(),
            retired.len(),
            head.hash,
            head.number
        );

        let canonicity_cf = self.canonicity_cf();
        let mut batch = WriteBatch::default();
        for (number, hash) in adopted {
            batch.put_cf(canonicity_cf, number.to_be_bytes(), hash.0);
        }
        for number in retired {
            batch.delete_cf(canonicity_cf, number.to_be_bytes());
        }
        batch.put_cf(canonicity_cf, Self::CHAIN_HEAD_KEY, serde_json::to_vec(head)?);

        let events: Vec<DbEvent> = adopted
            .iter()
            .map(|(number, hash)| {
                DbEvent::Canonicity(DbCanonicityEvent::NewCanonicalBlock {
                    number: *number,
                    hash: *hash,
                })
            })
            .collect();
        self.append_events(batch, &events)?;

        Ok(())
    }

    /// Get the specified block's canonicity
    fn get_block_canonicity(&self, hash: &BlockHash) -> anyhow::Result<Option<Canonicity>> {
        trace!("Getting canonicity of block with hash {hash}");

        if let Some(block) = self.get_block(hash)? {
            if self.get_canonical_hash_at_number(block.number())? == Some(block.hash) {
                return Ok(Some(Canonicity::Canonical));
            }
            return Ok(Some(Canonicity::Orphaned));
        }
        Ok(None)
    }
}

impl EventStore for ChainStore {
    fn add_event(&self, event: &DbEvent) -> anyhow::Result<u32> {
        self.append_events(WriteBatch::default(), std::slice::from_ref(event))
    }

    fn get_event(&self, seq_num: u32) -> anyhow::Result<Option<DbEvent>> {
        trace!("Getting event {seq_num}");

        let key = seq_num.to_be_bytes();
        let events_cf = self.events_cf();
        match self.database.get_pinned_cf(events_cf, key)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }

    fn get_next_seq_num(&self) -> anyhow::Result<u32> {
        if let Some(bytes) = self
            .database
            .get_pinned_cf(self.events_cf(), Self::NEXT_EVENT_SEQ_NUM_KEY)?
        {
            serde_json::from_slice(&bytes).map_err(anyhow::Error::from)
        } else {
            Ok(0)
        }
    }

    fn get_event_log(&self) -> anyhow::Result<Vec<DbEvent>> {
        trace!("Getting event log");

        let mut events = vec![];
        for n in 0..self.get_next_seq_num()? {
            if let Some(event) = self.get_event(n)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

impl ChainStore {
    const CHAIN_HEAD_KEY: &'static [u8] = "chain_head".as_bytes();
    const NEXT_EVENT_SEQ_NUM_KEY: &'static [u8] = "next_event_seq_num".as_bytes();
}
