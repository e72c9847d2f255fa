pub mod inventory_file;
pub mod repositories;

pub use inventory_file::InventoryDocument;
pub use repositories::{
    ExtractionResultRepository, InMemoryExtractionResultRepository, InMemoryInventoryRepository,
    InventoryRepository, JsonExtractionResultRepository, JsonInventoryRepository,
    RepositoryError,
};
