//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `rides` - Ride records (key: big-endian RideId, value: bincode Ride)
//! - `meta`  - Registry metadata (next-id counter)
//!
//! Big-endian keys keep the ride iterator in id order, which is also
//! insertion order.

use crate::{
    error::{Error, Result},
    types::{Ride, RideId},
    Config,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options,
    WriteBatch, DB,
};
use std::sync::Arc;

/// Column family names
const CF_RIDES: &str = "rides";
const CF_META: &str = "meta";

/// Metadata key for the next-id counter
const META_NEXT_ID: &[u8] = b"next_id";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for write-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        // Column family descriptors
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RIDES, Self::cf_options_rides()),
            ColumnFamilyDescriptor::new(CF_META, Self::cf_options_meta()),
        ];

        // Open database
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_rides() -> Options {
        let mut opts = Options::default();
        // Rides are frequently read back, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_meta() -> Options {
        // A single tiny counter key, no compression worth it
        Options::default()
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Ride operations

    /// Insert a freshly created ride and advance the persisted counter
    /// in one atomic batch
    pub fn insert_ride(&self, ride: &Ride, next_id: u64) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_rides = self.cf_handle(CF_RIDES)?;
        let value = bincode::serialize(ride)?;
        batch.put_cf(&cf_rides, ride.id.to_be_bytes(), &value);

        let cf_meta = self.cf_handle(CF_META)?;
        batch.put_cf(&cf_meta, META_NEXT_ID, next_id.to_be_bytes());

        self.db.write(batch)?;

        tracing::debug!(ride_id = %ride.id, "Ride persisted");

        Ok(())
    }

    /// Overwrite a ride record after a transition
    pub fn put_ride(&self, ride: &Ride) -> Result<()> {
        let cf = self.cf_handle(CF_RIDES)?;
        let value = bincode::serialize(ride)?;

        self.db.put_cf(&cf, ride.id.to_be_bytes(), &value)?;

        Ok(())
    }

    /// Get ride by id
    pub fn get_ride(&self, id: RideId) -> Result<Ride> {
        let cf = self.cf_handle(CF_RIDES)?;

        let value = self
            .db
            .get_cf(&cf, id.to_be_bytes())?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let ride: Ride = bincode::deserialize(&value)?;
        Ok(ride)
    }

    /// Load every persisted ride, in id order
    pub fn load_rides(&self) -> Result<Vec<Ride>> {
        let cf = self.cf_handle(CF_RIDES)?;

        let mut rides = Vec::new();
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            let (_, value) = item?;
            let ride: Ride = bincode::deserialize(&value)?;
            rides.push(ride);
        }

        Ok(rides)
    }

    /// Persisted next-id counter, if any
    pub fn next_id(&self) -> Result<Option<u64>> {
        let cf = self.cf_handle(CF_META)?;

        let value = match self.db.get_cf(&cf, META_NEXT_ID)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let bytes: [u8; 8] = value
            .as_slice()
            .try_into()
            .map_err(|_| Error::Storage("Corrupt next_id counter".to_string()))?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    // Statistics

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats> {
        let cf = self.cf_handle(CF_RIDES)?;

        // RocksDB property for approximate count
        let total_rides = self
            .db
            .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(StorageStats { total_rides })
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate number of persisted rides
    pub total_rides: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallerId, Location, RideStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_config() -> (Config, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (config, temp_dir)
    }

    fn test_ride(id: u64) -> Ride {
        let now = Utc::now();
        Ride {
            id: RideId::new(id),
            passenger: CallerId::new("0xPASSENGER"),
            driver: None,
            pickup: Location::new(6.5, 3.3).unwrap(),
            dropoff: Location::new(5.0, 7.5).unwrap(),
            status: RideStatus::Pending,
            price: Decimal::new(125, 1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_storage_open() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        assert!(storage.db.cf_handle(CF_RIDES).is_some());
        assert!(storage.db.cf_handle(CF_META).is_some());
    }

    #[test]
    fn test_insert_and_get_ride() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let ride = test_ride(1);
        storage.insert_ride(&ride, 2).unwrap();

        let retrieved = storage.get_ride(ride.id).unwrap();
        assert_eq!(retrieved, ride);
        assert_eq!(storage.next_id().unwrap(), Some(2));
    }

    #[test]
    fn test_get_ride_missing() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let result = storage.get_ride(RideId::new(42));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_put_ride_overwrites() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let mut ride = test_ride(1);
        storage.insert_ride(&ride, 2).unwrap();

        ride.status = RideStatus::Accepted;
        ride.driver = Some(CallerId::new("0xDRIVER"));
        storage.put_ride(&ride).unwrap();

        let retrieved = storage.get_ride(ride.id).unwrap();
        assert_eq!(retrieved.status, RideStatus::Accepted);
        assert_eq!(retrieved.driver, Some(CallerId::new("0xDRIVER")));
    }

    #[test]
    fn test_load_rides_in_id_order() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        // Insert out of order; big-endian keys restore id order
        for id in [3u64, 1, 2] {
            storage.insert_ride(&test_ride(id), id + 1).unwrap();
        }

        let rides = storage.load_rides().unwrap();
        let ids: Vec<u64> = rides.iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_next_id_absent_on_fresh_db() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        assert_eq!(storage.next_id().unwrap(), None);
    }

    #[test]
    fn test_reopen_preserves_state() {
        let (config, _temp) = test_config();

        {
            let storage = Storage::open(&config).unwrap();
            storage.insert_ride(&test_ride(1), 2).unwrap();
            storage.close().unwrap();
        }

        let storage = Storage::open(&config).unwrap();
        let rides = storage.load_rides().unwrap();
        assert_eq!(rides.len(), 1);
        assert_eq!(storage.next_id().unwrap(), Some(2));
    }
}
