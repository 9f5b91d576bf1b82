pub mod extension_registry;

pub use extension_registry::{
    Extension, ExtensionError, ExtensionFactory, ExtensionRegistry, Router,
};
