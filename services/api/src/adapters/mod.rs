pub mod catalog_file;
pub mod db;
pub mod memory;
pub mod usda;

pub use catalog_file::FileCatalogLoader;
pub use db::DbAdapter;
pub use memory::InMemoryStore;
pub use usda::UsdaFoodAdapter;
