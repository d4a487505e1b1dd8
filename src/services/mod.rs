// Catalog reads and writes
pub mod catalog;

// Cascading active/inactive transitions
pub mod consistency;

// Role/action dependent query construction
pub mod visibility;

// Field rules shared by request payloads and the catalog service
pub mod validation;

// External ecoscore lookup
pub mod ecoscore;

pub use catalog::CatalogService;
pub use consistency::{ConsistencyService, EnableCascade, StateTransition};
pub use ecoscore::{DisabledEcoscore, EcoscoreProvider, OpenFoodFactsClient};
pub use visibility::{Action, Role, Visibility};
