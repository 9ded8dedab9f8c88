// SPDX-License-Identifier: CEPL-1.0
use crate::caps::QueueCapabilities;
use crate::error::{PresentError, Result};
use crate::probe::CapabilityProbe;

/// A complete graphics + present assignment. The two may be the same family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub const fn new(graphics: u32, present: u32) -> Self {
        Self { graphics, present }
    }

    /// One family serves both roles.
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Family indices with duplicates removed, graphics first.
    pub fn distinct(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Result of scanning an accelerator's queue families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueFamilyAssignment {
    Incomplete {
        graphics: Option<u32>,
        present: Option<u32>,
    },
    Complete(QueueFamilies),
}

impl QueueFamilyAssignment {
    fn from_parts(graphics: Option<u32>, present: Option<u32>) -> Self {
        match (graphics, present) {
            (Some(graphics), Some(present)) => {
                QueueFamilyAssignment::Complete(QueueFamilies { graphics, present })
            }
            _ => QueueFamilyAssignment::Incomplete { graphics, present },
        }
    }

    pub fn complete(self) -> Option<QueueFamilies> {
        match self {
            QueueFamilyAssignment::Complete(families) => Some(families),
            QueueFamilyAssignment::Incomplete { .. } => None,
        }
    }
}

/// First family with graphics support, first family able to present; stops
/// as soon as both are known.
pub fn find_queue_families<P: CapabilityProbe>(
    probe: &P,
    accelerator: P::Accelerator,
) -> Result<QueueFamilyAssignment> {
    let families = probe
        .queue_families(accelerator)
        .map_err(PresentError::probe)?;

    let mut graphics = None;
    let mut present = None;

    for (index, props) in families.iter().enumerate() {
        let index = index as u32;

        if graphics.is_none() && props.capabilities.contains(QueueCapabilities::GRAPHICS) {
            graphics = Some(index);
        }
        if present.is_none()
            && probe
                .supports_present(accelerator, index)
                .map_err(PresentError::probe)?
        {
            present = Some(index);
        }
        if graphics.is_some() && present.is_some() {
            break;
        }
    }

    Ok(QueueFamilyAssignment::from_parts(graphics, present))
}
