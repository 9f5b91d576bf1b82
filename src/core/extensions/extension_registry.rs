// Named extensions and their load state.
//
// The set of extensions is fixed at compile time: each one is a factory that
// builds an `Extension`, which registers its commands on a `Router`. Loading
// and unloading only flips which of those commands are live; the command
// type `C` is whatever the chat layer uses (poise commands for Discord).

use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// A loadable bundle of related commands.
pub trait Extension<C>: Send + Sync {
    fn name(&self) -> &'static str;

    fn register(&self, router: &mut Router<C>);

    fn on_load(&self) {
        tracing::info!("{} is ready.", self.name());
    }

    fn on_unload(&self) {
        tracing::info!("{} unloaded.", self.name());
    }
}

pub type ExtensionFactory<C> = fn() -> Box<dyn Extension<C>>;

/// Collects the commands an extension exposes, keyed by root command name.
pub struct Router<C> {
    commands: Vec<(String, C)>,
}

impl<C> Router<C> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn add(&mut self, name: impl Into<String>, command: C) -> &mut Self {
        self.commands.push((name.into(), command));
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn into_commands(self) -> Vec<C> {
        self.commands.into_iter().map(|(_, command)| command).collect()
    }
}

impl<C> Default for Router<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    #[error("Extension `{0}` does not exist")]
    UnknownExtension(String),
    #[error("Extension `{0}` is already loaded")]
    AlreadyLoaded(String),
    #[error("Extension `{0}` has not been loaded")]
    NotLoaded(String),
    #[error("Command `{command}` is already registered by `{owner}`")]
    CommandConflict { command: String, owner: String },
}

struct LoadedExtension<C> {
    extension: Box<dyn Extension<C>>,
    commands: Vec<String>,
}

pub struct ExtensionRegistry<C> {
    factories: Vec<(&'static str, ExtensionFactory<C>)>,
    /// Root command name => extension that declares it.
    owners: HashMap<String, &'static str>,
    loaded: RwLock<BTreeMap<&'static str, LoadedExtension<C>>>,
}

impl<C> ExtensionRegistry<C> {
    pub fn new(factories: &[ExtensionFactory<C>]) -> Self {
        let mut named = Vec::with_capacity(factories.len());
        let mut owners = HashMap::new();

        for factory in factories {
            let extension = factory();
            let mut router = Router::new();
            extension.register(&mut router);
            for command in router.names() {
                owners.insert(command, extension.name());
            }
            named.push((extension.name(), *factory));
        }

        Self {
            factories: named,
            owners,
            loaded: RwLock::new(BTreeMap::new()),
        }
    }

    /// Extension names in registration order.
    pub fn known(&self) -> Vec<&'static str> {
        self.factories.iter().map(|(name, _)| *name).collect()
    }

    pub async fn loaded(&self) -> Vec<&'static str> {
        self.loaded.read().await.keys().copied().collect()
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        self.loaded.read().await.contains_key(name)
    }

    /// Every command of every known extension, loaded or not.
    pub fn catalog(&self) -> Vec<C> {
        self.factories
            .iter()
            .flat_map(|(_, factory)| {
                let mut router = Router::new();
                factory().register(&mut router);
                router.into_commands()
            })
            .collect()
    }

    /// Commands outside every extension are host commands and always live.
    pub async fn is_command_active(&self, root_command: &str) -> bool {
        match self.owners.get(root_command) {
            Some(owner) => self.is_loaded(owner).await,
            None => true,
        }
    }

    pub async fn load(&self, name: &str) -> Result<(), ExtensionError> {
        let factory = self.factory(name)?;
        let mut loaded = self.loaded.write().await;
        if loaded.contains_key(name) {
            return Err(ExtensionError::AlreadyLoaded(name.to_string()));
        }

        let entry = Self::build(&loaded, factory)?;
        entry.extension.on_load();
        loaded.insert(entry.extension.name(), entry);
        Ok(())
    }

    pub async fn unload(&self, name: &str) -> Result<(), ExtensionError> {
        self.factory(name)?;
        let mut loaded = self.loaded.write().await;
        let entry = loaded
            .remove(name)
            .ok_or_else(|| ExtensionError::NotLoaded(name.to_string()))?;

        entry.extension.on_unload();
        Ok(())
    }

    /// Swaps the live registration for a freshly built one under a single lock,
    /// so the extension is registered exactly once afterwards.
    pub async fn reload(&self, name: &str) -> Result<(), ExtensionError> {
        let factory = self.factory(name)?;
        let mut loaded = self.loaded.write().await;
        let (key, previous) = loaded
            .remove_entry(name)
            .ok_or_else(|| ExtensionError::NotLoaded(name.to_string()))?;

        match Self::build(&loaded, factory) {
            Ok(entry) => {
                previous.extension.on_unload();
                entry.extension.on_load();
                loaded.insert(entry.extension.name(), entry);
                Ok(())
            }
            Err(err) => {
                loaded.insert(key, previous);
                Err(err)
            }
        }
    }

    fn factory(&self, name: &str) -> Result<ExtensionFactory<C>, ExtensionError> {
        self.factories
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| ExtensionError::UnknownExtension(name.to_string()))
    }

    fn build(
        loaded: &BTreeMap<&'static str, LoadedExtension<C>>,
        factory: ExtensionFactory<C>,
    ) -> Result<LoadedExtension<C>, ExtensionError> {
        let extension = factory();
        let mut router = Router::new();
        extension.register(&mut router);
        let commands = router.names();

        for command in &commands {
            if let Some((owner, _)) = loaded
                .iter()
                .find(|(_, other)| other.commands.contains(command))
            {
                return Err(ExtensionError::CommandConflict {
                    command: command.clone(),
                    owner: owner.to_string(),
                });
            }
        }

        Ok(LoadedExtension {
            extension,
            commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static PI_BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Pi;
    impl Extension<&'static str> for Pi {
        fn name(&self) -> &'static str {
            "pi"
        }
        fn register(&self, router: &mut Router<&'static str>) {
            router.add("temperature", "temperature");
        }
    }

    struct Gpt;
    impl Extension<&'static str> for Gpt {
        fn name(&self) -> &'static str {
            "gpt"
        }
        fn register(&self, router: &mut Router<&'static str>) {
            router.add("chatgpt", "chatgpt");
        }
    }

    // Claims the same command as `Pi`
    struct Thermal;
    impl Extension<&'static str> for Thermal {
        fn name(&self) -> &'static str {
            "thermal"
        }
        fn register(&self, router: &mut Router<&'static str>) {
            router.add("temperature", "temperature");
        }
    }

    fn pi() -> Box<dyn Extension<&'static str>> {
        PI_BUILDS.fetch_add(1, Ordering::SeqCst);
        Box::new(Pi)
    }

    fn gpt() -> Box<dyn Extension<&'static str>> {
        Box::new(Gpt)
    }

    fn thermal() -> Box<dyn Extension<&'static str>> {
        Box::new(Thermal)
    }

    fn registry() -> ExtensionRegistry<&'static str> {
        ExtensionRegistry::new(&[pi, gpt])
    }

    #[tokio::test]
    async fn test_known_keeps_registration_order() {
        let registry = registry();
        assert_eq!(registry.known(), vec!["pi", "gpt"]);
        assert!(registry.loaded().await.is_empty());
        assert_eq!(registry.catalog(), vec!["temperature", "chatgpt"]);
    }

    #[tokio::test]
    async fn test_load_and_unload() {
        let registry = registry();

        registry.load("pi").await.unwrap();
        assert!(registry.is_loaded("pi").await);
        assert!(registry.is_command_active("temperature").await);
        assert!(!registry.is_command_active("chatgpt").await);

        registry.unload("pi").await.unwrap();
        assert!(!registry.is_loaded("pi").await);
        assert!(!registry.is_command_active("temperature").await);
    }

    #[tokio::test]
    async fn test_host_commands_always_active() {
        let registry = registry();
        assert!(registry.is_command_active("load").await);
        assert!(registry.is_command_active("reload").await);
    }

    #[tokio::test]
    async fn test_unknown_extension() {
        let registry = registry();
        assert_eq!(
            registry.load("kasa").await,
            Err(ExtensionError::UnknownExtension("kasa".to_string()))
        );
        assert_eq!(
            registry.unload("kasa").await,
            Err(ExtensionError::UnknownExtension("kasa".to_string()))
        );
    }

    #[tokio::test]
    async fn test_double_load_is_rejected() {
        let registry = registry();
        registry.load("gpt").await.unwrap();
        assert_eq!(
            registry.load("gpt").await,
            Err(ExtensionError::AlreadyLoaded("gpt".to_string()))
        );
        assert_eq!(registry.loaded().await, vec!["gpt"]);
    }

    #[tokio::test]
    async fn test_unload_requires_loaded() {
        let registry = registry();
        assert_eq!(
            registry.unload("gpt").await,
            Err(ExtensionError::NotLoaded("gpt".to_string()))
        );
        assert_eq!(
            registry.reload("gpt").await,
            Err(ExtensionError::NotLoaded("gpt".to_string()))
        );
    }

    #[tokio::test]
    async fn test_reload_keeps_single_registration() {
        let registry = registry();
        registry.load("pi").await.unwrap();

        let before = PI_BUILDS.load(Ordering::SeqCst);
        registry.reload("pi").await.unwrap();
        registry.reload("pi").await.unwrap();

        // Each reload builds a fresh extension...
        assert!(PI_BUILDS.load(Ordering::SeqCst) >= before + 2);
        // ...but only one registration is ever live
        assert_eq!(registry.loaded().await, vec!["pi"]);
        assert!(registry.is_command_active("temperature").await);
    }

    #[tokio::test]
    async fn test_conflicting_commands() {
        let registry = ExtensionRegistry::new(&[pi, thermal]);
        registry.load("pi").await.unwrap();

        assert_eq!(
            registry.load("thermal").await,
            Err(ExtensionError::CommandConflict {
                command: "temperature".to_string(),
                owner: "pi".to_string(),
            })
        );
        assert_eq!(registry.loaded().await, vec!["pi"]);
    }
}
