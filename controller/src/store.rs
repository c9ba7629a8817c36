use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use heatpump_common::{RuntimeConfig, SavedClimateState};

pub type UnitStates = BTreeMap<String, SavedClimateState>;

#[derive(Clone)]
pub struct AppStore {
    runtime_path: Arc<PathBuf>,
    units_path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl AppStore {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("HEATPUMP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.heatpump"));
        Self::new(data_dir)
    }

    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            runtime_path: Arc::new(data_dir.join("runtime.json")),
            units_path: Arc::new(data_dir.join("units.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn has_runtime_config(&self) -> bool {
        tokio::fs::try_exists(self.runtime_path.as_ref())
            .await
            .unwrap_or(false)
    }

    pub async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(self.runtime_path.as_ref()).await {
            Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw).with_context(|| {
                format!("failed to parse {}", self.runtime_path.display())
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save_runtime_config(&self, runtime: &RuntimeConfig) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let payload = serde_json::to_vec_pretty(runtime)?;
        write_file(self.runtime_path.as_ref(), payload).await
    }

    pub async fn load_unit_states(&self) -> anyhow::Result<UnitStates> {
        let _guard = self.lock.lock().await;
        let raw = match tokio::fs::read(self.units_path.as_ref()).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(UnitStates::new()),
            Err(err) => return Err(err.into()),
        };

        let entries = serde_json::from_slice::<BTreeMap<String, Value>>(&raw)
            .with_context(|| format!("failed to parse {}", self.units_path.display()))?;
        let mut states = UnitStates::new();
        for (id, value) in entries {
            let state = SavedClimateState::from_value(value)
                .with_context(|| format!("invalid saved state for unit '{id}'"))?;
            states.insert(id, state);
        }
        Ok(states)
    }

    pub async fn save_unit_states(&self, states: &UnitStates) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = Map::new();
        for (id, state) in states {
            entries.insert(id.clone(), state.to_value()?);
        }
        let payload = serde_json::to_vec_pretty(&Value::Object(entries))?;
        write_file(self.units_path.as_ref(), payload).await
    }
}

async fn write_file(path: &Path, payload: Vec<u8>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, payload)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use heatpump_common::StateError;
    use pretty_assertions::assert_eq;

    use super::*;

    fn scratch_store() -> (AppStore, PathBuf) {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let dir = std::env::temp_dir().join(format!(
            "heatpump-store-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        (AppStore::new(dir.clone()), dir)
    }

    #[tokio::test]
    async fn missing_files_load_defaults() {
        let (store, dir) = scratch_store();

        assert!(!store.has_runtime_config().await);
        let runtime = store.load_runtime_config().await.unwrap();
        assert_eq!(runtime.units.len(), RuntimeConfig::default().units.len());
        assert!(store.load_unit_states().await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn unit_states_round_trip() {
        let (store, dir) = scratch_store();
        let mut states = UnitStates::new();
        states.insert("a".to_string(), SavedClimateState { is_heating: true });
        states.insert("b".to_string(), SavedClimateState { is_heating: false });

        store.save_unit_states(&states).await.unwrap();

        assert_eq!(store.load_unit_states().await.unwrap(), states);
        let raw = std::fs::read_to_string(dir.join("units.json")).unwrap();
        assert!(raw.contains("\"isHeating\": true"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn runtime_config_is_written_once_saved() {
        let (store, dir) = scratch_store();

        store
            .save_runtime_config(&RuntimeConfig::default())
            .await
            .unwrap();

        assert!(store.has_runtime_config().await);
        assert_eq!(
            store.load_runtime_config().await.unwrap().climate,
            RuntimeConfig::default().climate
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn corrupt_unit_states_are_reported() {
        let (store, dir) = scratch_store();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("units.json"), b"{not json").unwrap();

        assert!(store.load_unit_states().await.is_err());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn malformed_unit_entry_is_a_state_error() {
        let (store, dir) = scratch_store();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("units.json"),
            br#"{"heat-pump-bedroom": {"isHeating": "yes"}}"#,
        )
        .unwrap();

        let err = store.load_unit_states().await.unwrap_err();

        assert!(err.downcast_ref::<StateError>().is_some(), "{err:#}");
        assert!(format!("{err:#}").contains("heat-pump-bedroom"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn unit_entry_without_fields_loads_as_cooling() {
        let (store, dir) = scratch_store();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("units.json"), br#"{"heat-pump-workshop": {}}"#).unwrap();

        let states = store.load_unit_states().await.unwrap();

        assert_eq!(
            states.get("heat-pump-workshop"),
            Some(&SavedClimateState { is_heating: false })
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
