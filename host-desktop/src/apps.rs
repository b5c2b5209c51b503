//! In-memory installed-app registry.

use async_trait::async_trait;
use host_traits::apps::{AppRegistry, InstalledApp};
use host_traits::error::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Registry over a fixed set of apps, mutable through [`insert`](Self::insert)
/// and [`remove`](Self::remove) to simulate installs and uninstalls.
#[derive(Default)]
pub struct StaticAppRegistry {
    apps: RwLock<HashMap<String, InstalledApp>>,
}

impl StaticAppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, app: InstalledApp) {
        self.apps.write().await.insert(app.package_name.clone(), app);
    }

    pub async fn remove(&self, package_name: &str) {
        self.apps.write().await.remove(package_name);
    }
}

#[async_trait]
impl AppRegistry for StaticAppRegistry {
    async fn get(&self, package_name: &str) -> Result<Option<InstalledApp>> {
        Ok(self.apps.read().await.get(package_name).cloned())
    }

    async fn filter_installed(&self, package_names: &[String]) -> Result<Vec<String>> {
        let apps = self.apps.read().await;
        Ok(package_names
            .iter()
            .filter(|name| apps.contains_key(*name))
            .cloned()
            .collect())
    }
}
