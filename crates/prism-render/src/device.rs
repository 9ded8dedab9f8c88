// SPDX-License-Identifier: CEPL-1.0
use tracing::{error, info};

use crate::caps::DeviceFeatures;
use crate::error::{PresentError, Result};
use crate::requirements::DeviceRequirements;
use crate::select::SelectedAccelerator;

pub const DEFAULT_QUEUE_PRIORITY: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct QueueRequest {
    pub family: u32,
    pub priority: f32,
}

/// Everything needed to create a logical device, decided before any API call.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceRequest {
    pub queues: Vec<QueueRequest>,
    pub extensions: Vec<String>,
    pub features: DeviceFeatures,
}

impl DeviceRequest {
    /// One queue per distinct family; exactly the extensions and features
    /// that selection validated.
    pub fn plan<A>(selected: &SelectedAccelerator<A>, requirements: &DeviceRequirements) -> Self {
        let queues = selected
            .families
            .distinct()
            .into_iter()
            .map(|family| QueueRequest {
                family,
                priority: DEFAULT_QUEUE_PRIORITY,
            })
            .collect();

        Self {
            queues,
            extensions: requirements.extensions().iter().cloned().collect(),
            features: selected.enabled_features,
        }
    }
}

/// Backend seam that turns a `DeviceRequest` into a live logical device.
pub trait DeviceFactory {
    type Accelerator: Copy;
    type Device;

    fn create_device(
        &self,
        accelerator: Self::Accelerator,
        request: &DeviceRequest,
    ) -> anyhow::Result<Self::Device>;
}

pub fn build_logical_device<F: DeviceFactory>(
    factory: &F,
    selected: &SelectedAccelerator<F::Accelerator>,
    requirements: &DeviceRequirements,
) -> Result<F::Device> {
    let request = DeviceRequest::plan(selected, requirements);
    info!(
        "creating logical device on `{}`: queues={:?} extensions={:?} features={:?}",
        selected.name,
        request.queues.iter().map(|q| q.family).collect::<Vec<_>>(),
        request.extensions,
        request.features
    );

    factory.create_device(selected.handle, &request).map_err(|e| {
        error!("logical device creation failed on `{}`: {e:#}", selected.name);
        PresentError::DeviceCreationFailed(format!("{e:#}"))
    })
}
