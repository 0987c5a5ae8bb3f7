pub mod catalog;
pub mod error;
pub mod factory;
pub mod traits;
pub mod userdata;

pub use catalog::{CatalogClient, DiscoverQuery, SearchScope, TimeWindow, TrendingScope};
pub use error::{CatalogError, UserDataError};
pub use factory::{create_catalog_client, create_user_data_backend};
pub use traits::{CatalogApi, UserDataBackend};
pub use userdata::{MemoryBackend, RestBackend, Table, UserSession};
