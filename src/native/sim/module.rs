use std::collections::BTreeSet;

/// Search path every simulated module lives under
pub const SEARCH_PATH: &str = "/usr/local/lib/SoapySDR/modules0.8";

/// A loadable driver module in the simulated registry
#[derive(Debug, Clone)]
pub struct SimModule {
    pub path: String,
    pub version: String,
    /// Factory names the module registers when it loads
    pub registrations: Vec<String>,
    /// When set, loading fails with this message
    pub load_error: Option<String>,
}

impl SimModule {
    /// A module file `name` under [`SEARCH_PATH`] registering one factory
    pub fn new(name: &str, version: &str) -> Self {
        let registration = name
            .trim_start_matches("lib")
            .trim_end_matches(".so")
            .trim_end_matches("Support")
            .to_lowercase();
        Self {
            path: format!("{}/{}", SEARCH_PATH, name),
            version: version.to_string(),
            registrations: vec![registration],
            load_error: None,
        }
    }

    pub fn broken(mut self, message: &str) -> Self {
        self.load_error = Some(message.to_string());
        self
    }

    pub fn is_under(&self, dir: &str) -> bool {
        self.path
            .strip_prefix(dir.trim_end_matches('/'))
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Modules available to the library and the subset currently loaded
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub modules: Vec<SimModule>,
    pub loaded: BTreeSet<String>,
}

impl Registry {
    pub fn find(&self, path: &str) -> Option<&SimModule> {
        self.modules.iter().find(|module| module.path == path)
    }

    /// Returns the load error message, empty on success
    pub fn load(&mut self, path: &str) -> String {
        let Some(module) = self.find(path) else {
            return format!("no module at {}", path);
        };
        if let Some(message) = &module.load_error {
            return message.clone();
        }
        if !self.loaded.insert(path.to_string()) {
            return format!("{} is already loaded", path);
        }
        String::new()
    }

    pub fn unload(&mut self, path: &str) -> String {
        if self.loaded.remove(path) {
            String::new()
        } else {
            format!("{} is not loaded", path)
        }
    }

    pub fn load_all(&mut self) -> Vec<(String, String)> {
        let paths: Vec<String> = self
            .modules
            .iter()
            .filter(|module| !self.loaded.contains(&module.path))
            .map(|module| module.path.clone())
            .collect();
        paths
            .into_iter()
            .filter_map(|path| {
                let message = self.load(&path);
                (!message.is_empty()).then_some((path, message))
            })
            .collect()
    }
}
