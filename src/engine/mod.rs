pub mod audit;
pub mod config;
pub mod execute;
pub mod geo;
pub mod identity;
pub mod model;
pub mod paths;
pub mod plan;
pub mod reconcile;
pub mod safety;
pub mod transform;
pub mod warn;
