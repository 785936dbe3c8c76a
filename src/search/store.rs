//! Property store / 房源存储
//!
//! Owned by the application state and shared by `Arc`. The snapshot is
//! published once and never mutated afterwards, so readers take no lock
//! beyond cloning the `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;

use super::joiner::{join_rows, JoinReport, RawTables};
use super::loader::{load_table, TableKind};
use crate::config::DataConfig;
use crate::error::Result;
use crate::models::Property;

/// Immutable merged record set / 不可变的合并结果
#[derive(Debug, Default)]
pub struct PropertySnapshot {
    properties: Vec<Property>,
    report: JoinReport,
}

impl PropertySnapshot {
    pub fn new(properties: Vec<Property>, report: JoinReport) -> Self {
        Self { properties, report }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn report(&self) -> &JoinReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

pub struct PropertyStore {
    sources: DataConfig,
    snapshot: RwLock<Option<Arc<PropertySnapshot>>>,
    /// Serializes first loads / 保证首次加载只执行一次
    load_gate: tokio::sync::Mutex<()>,
}

impl PropertyStore {
    pub fn new(sources: DataConfig) -> Self {
        Self {
            sources,
            snapshot: RwLock::new(None),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Already-populated store / 直接用现成数据构建
    pub fn from_properties(properties: Vec<Property>) -> Self {
        let report = JoinReport {
            variants_seen: properties.len(),
            properties: properties.len(),
            ..Default::default()
        };
        let store = Self::new(DataConfig::default());
        *store.snapshot.write() = Some(Arc::new(PropertySnapshot::new(properties, report)));
        store
    }

    /// Populate on first call, return the cached snapshot afterwards / 加载（幂等）
    ///
    /// A failed load leaves the store empty; call again to retry.
    pub async fn load(&self) -> Result<Arc<PropertySnapshot>> {
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }

        let _gate = self.load_gate.lock().await;
        // 双重检查
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }

        self.populate().await
    }

    /// Like [`load`](Self::load), but never waits on another caller's load / 非阻塞加载
    ///
    /// Returns `None` while a load is already running.
    pub async fn try_load(&self) -> Option<Result<Arc<PropertySnapshot>>> {
        if let Some(snapshot) = self.cached() {
            return Some(Ok(snapshot));
        }

        let _gate = self.load_gate.try_lock().ok()?;
        if let Some(snapshot) = self.cached() {
            return Some(Ok(snapshot));
        }

        Some(self.populate().await)
    }

    /// Current snapshot, empty before the first successful load / 获取当前快照
    pub fn get_all(&self) -> Arc<PropertySnapshot> {
        self.cached().unwrap_or_default()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.read().is_some()
    }

    pub fn report(&self) -> JoinReport {
        self.get_all().report().clone()
    }

    fn cached(&self) -> Option<Arc<PropertySnapshot>> {
        self.snapshot.read().clone()
    }

    /// Caller holds `load_gate`
    async fn populate(&self) -> Result<Arc<PropertySnapshot>> {
        let snapshot = Arc::new(load_snapshot(&self.sources).await?);
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(snapshot)
    }
}

async fn load_snapshot(sources: &DataConfig) -> Result<PropertySnapshot> {
    tracing::info!("Loading and merging property tables from {:?}", sources.get_data_dir());

    let [projects, addresses, configurations, variants] =
        TableKind::ALL.map(|kind| load_table(kind, sources.table_path(kind)));
    let (projects, addresses, configurations, variants) =
        tokio::try_join!(projects, addresses, configurations, variants)?;

    let outcome = join_rows(&RawTables {
        projects,
        addresses,
        configurations,
        variants,
    });

    Ok(PropertySnapshot::new(outcome.properties, outcome.report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_tables(dir: &Path) {
        std::fs::write(
            dir.join("project.csv"),
            "id,projectName,projectType,projectCategory,status,possessionDate,cityId\n\
             p1,Skyline,Residential,Apartment,Ready,2024-01-01,1\n\
             p2,Harbour View,Residential,Apartment,Under Construction,2027-06-01,2\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("ProjectAddress.csv"),
            "id,projectId,fullAddress,pincode,landmark\n\
             a1,p1,\"Baner Road, Pune\",411045,Near park\n\
             a2,p2,\"Andheri West, Mumbai\",400053,\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("ProjectConfiguration.csv"),
            "id,projectId,type,customBHK\n\
             c1,p1,3BHK,\n\
             c2,p2,2BHK,\n\
             c3,p3,1BHK,\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("ProjectConfigurationVariant.csv"),
            "id,configurationId,bathrooms,floorPlanImage,carpetArea,price,propertyImages,\
             aboutProperty\n\
             v1,c1,3,plan1.png,1450,11000000,\"[\"\"a.jpg\"\",\"\"b.jpg\"\"]\",Corner unit\n\
             v2,c2,2,plan2.png,900,5000000,,Sea facing\n\
             v3,c3,1,plan3.png,500,abc,,Orphan\n",
        )
        .unwrap();
    }

    fn sources(dir: &Path) -> DataConfig {
        DataConfig {
            data_dir: dir.to_string_lossy().to_string(),
            ..DataConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_before_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = PropertyStore::new(sources(dir.path()));
        assert!(!store.is_ready());
        assert!(store.get_all().is_empty());
    }

    #[tokio::test]
    async fn test_load_merges_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let store = PropertyStore::new(sources(dir.path()));

        let snapshot = store.load().await.unwrap();
        assert!(store.is_ready());
        assert_eq!(snapshot.len(), 2);

        let first = &snapshot.properties()[0];
        assert_eq!(first.id, "v1");
        assert_eq!(first.full_address, "Baner Road, Pune");
        assert_eq!(first.price, 11_000_000);
        assert_eq!(first.property_images, vec!["a.jpg", "b.jpg"]);
        assert!(snapshot.properties()[1].property_images.is_empty());

        assert_eq!(snapshot.report().missing_project, 1);
        assert_eq!(store.report().skipped(), 1);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let store = PropertyStore::new(sources(dir.path()));

        let first = store.load().await.unwrap();
        // Later edits on disk are not picked up
        std::fs::remove_file(dir.path().join("project.csv")).unwrap();
        let second = store.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.properties(), second.properties());
        assert_eq!(store.get_all().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_loads_share_one_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let store = Arc::new(PropertyStore::new(sources(dir.path())));

        let a = tokio::spawn({
            let store = store.clone();
            async move { store.load().await.unwrap() }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.load().await.unwrap() }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.get_all().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_store_empty_and_can_retry() {
        let dir = tempfile::tempdir().unwrap();
        let store = PropertyStore::new(sources(dir.path()));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, crate::error::LoadError::SourceUnavailable { .. }));
        assert!(!store.is_ready());
        assert!(store.get_all().is_empty());

        write_tables(dir.path());
        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_one_malformed_table_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let configurations = dir.path().join("ProjectConfiguration.csv");
        std::fs::write(configurations, "id,projectId\nc1,p1\n").unwrap();
        let store = PropertyStore::new(sources(dir.path()));

        assert!(store.load().await.is_err());
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_try_load_does_not_wait_for_running_load() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let store = PropertyStore::new(sources(dir.path()));

        let gate = store.load_gate.lock().await;
        assert!(store.try_load().await.is_none());
        assert!(store.get_all().is_empty());
        drop(gate);

        let snapshot = store.try_load().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
        let again = store.try_load().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&snapshot, &again));
    }

    #[tokio::test]
    async fn test_try_load_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = PropertyStore::new(sources(dir.path()));

        assert!(matches!(store.try_load().await, Some(Err(_))));
        assert!(!store.is_ready());
    }

    #[test]
    fn test_from_properties_is_ready() {
        let store = PropertyStore::from_properties(Vec::new());
        assert!(store.is_ready());
        assert!(store.get_all().is_empty());
    }
}
