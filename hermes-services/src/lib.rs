//! Hermes services
//!
//! Durable-ish collaborators the runtime composes: the trade store
//! interface and its in-memory reference implementation, the trade sync
//! service that reconciles local storage with venue history, and the
//! key/value persistence facade.

pub mod persistence;
pub mod sync;
pub mod trade_store;

pub use persistence::{
    FilePersistenceConfig, JsonFileService, KeyValueStore, KeyValueStoreExt, MemoryService,
    PersistenceConfig, PersistenceError, PersistenceServiceFacade, RemotePersistenceConfig,
};
pub use sync::{SyncError, TradeSyncService};
pub use trade_store::{MemoryTradeStore, StoreError, TradeStore};
