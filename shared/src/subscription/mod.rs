#[allow(clippy::module_inception)]
pub mod subscription;
pub mod subscription_registry;
