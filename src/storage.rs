use crate::errors::StoreError;
use crate::models::StoreData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_data(path: &Path) -> StoreData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<StoreData>(&bytes) {
            Ok(data) => {
                info!(
                    habits = data.habits.len(),
                    completions = data.habit_completions.len(),
                    "loaded store from {}",
                    path.display()
                );
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                StoreData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            StoreData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let payload =
        serde_json::to_vec_pretty(data).map_err(|err| StoreError::Persist(err.to_string()))?;
    fs::write(path, payload)
        .await
        .map_err(|err| StoreError::Persist(err.to_string()))?;
    Ok(())
}
