use log::warn;
use tokio::task::{self, JoinHandle};

use super::DeviceHandle;
use crate::error::{Result, SdrError};
use crate::native::Api;
use crate::types::Args;

impl DeviceHandle {
    /// Construct one device per args map in parallel.
    ///
    /// Every construction is attempted. If any fails, the devices that were
    /// made are released before the first failure (by index) is returned.
    pub async fn make_list(api: &Api, list: Vec<Args>) -> Result<Vec<DeviceHandle>> {
        let tasks: Vec<JoinHandle<Result<DeviceHandle>>> = list
            .into_iter()
            .map(|args| {
                let api = api.clone();
                task::spawn_blocking(move || DeviceHandle::make(&api, &args))
            })
            .collect();

        let results = join_all(tasks).await;

        let mut made = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(device) => made.push(device),
                Err(e) if first_error.is_none() => first_error = Some((index, e)),
                Err(e) => warn!("make_list: device {} also failed: {}", index, e),
            }
        }

        let Some((index, source)) = first_error else {
            return Ok(made);
        };

        if let Err(e) = Self::unmake_list(made).await {
            warn!("make_list: cleanup after failure reported: {}", e);
        }
        Err(SdrError::Batch {
            index,
            source: Box::new(source),
        })
    }

    /// Release every device in parallel; the first failure (by index) is returned
    /// after all releases have been attempted.
    pub async fn unmake_list(devices: Vec<DeviceHandle>) -> Result<()> {
        let tasks: Vec<JoinHandle<Result<()>>> = devices
            .into_iter()
            .map(|device| task::spawn_blocking(move || device.unmake()))
            .collect();

        let mut first_error = None;
        for (index, result) in join_all(tasks).await.into_iter().enumerate() {
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(SdrError::Batch {
                        index,
                        source: Box::new(e),
                    });
                } else {
                    warn!("unmake_list: device {} also failed: {}", index, e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Await every task in order; a panicked task becomes an error in its slot
async fn join_all<T>(tasks: Vec<JoinHandle<Result<T>>>) -> Vec<Result<T>> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(match task.await {
            Ok(result) => result,
            Err(e) => Err(SdrError::Task(e.to_string())),
        });
    }
    results
}
