pub mod group;
pub mod group_registry;
pub mod router;
pub mod strategy;

pub use group::{ModelGroup, GroupSpec, GroupPatch};
pub use group_registry::{ModelGroupRegistry, NamedConfiguration};
pub use router::ModelRouter;
pub use strategy::RoutingStrategy;
