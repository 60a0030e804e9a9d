pub mod config_service;
pub mod document_store;
pub mod identity;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::document_store::MemoryDocumentStore;
pub use crate::identity::MemoryIdentityProvider;
pub use crate::paths::AuraPaths;
