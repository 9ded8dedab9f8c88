// SPDX-License-Identifier: CEPL-1.0
//! Accelerator selection.
//!
//! Candidates are checked in enumeration order and the first one that passes
//! every check wins. There is no scoring: a later, faster accelerator is never
//! preferred over an earlier one that qualifies.

use std::fmt;

use tracing::{info, warn};

use crate::caps::DeviceFeatures;
use crate::error::{PresentError, Result};
use crate::probe::CapabilityProbe;
use crate::queue::{find_queue_families, QueueFamilies, QueueFamilyAssignment};
use crate::requirements::{api_version_parts, DeviceRequirements, MIN_API_VERSION};

/// Why a candidate was passed over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    ApiVersionTooOld {
        found: u32,
        required: u32,
    },
    IncompleteQueueFamilies {
        graphics: Option<u32>,
        present: Option<u32>,
    },
    MissingExtensions(Vec<String>),
    NoSurfaceSupport,
    MissingRequiredFeatures(DeviceFeatures),
    /// Soft: the candidate is kept as a fallback.
    MissingPreferredFeatures(DeviceFeatures),
    ProbeFailed(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ApiVersionTooOld { found, required } => {
                let (fa, fb, fc) = api_version_parts(*found);
                let (ra, rb, _) = api_version_parts(*required);
                write!(f, "API {fa}.{fb}.{fc} is older than the required {ra}.{rb}")
            }
            Rejection::IncompleteQueueFamilies { graphics, present } => write!(
                f,
                "no complete queue family assignment (graphics={graphics:?}, present={present:?})"
            ),
            Rejection::MissingExtensions(names) => {
                write!(f, "missing device extensions: {}", names.join(", "))
            }
            Rejection::NoSurfaceSupport => write!(f, "no surface formats or present modes"),
            Rejection::MissingRequiredFeatures(flags) => {
                write!(f, "missing required features: {flags:?}")
            }
            Rejection::MissingPreferredFeatures(flags) => {
                write!(f, "missing preferred features: {flags:?}")
            }
            Rejection::ProbeFailed(msg) => write!(f, "probe failed: {msg}"),
        }
    }
}

/// The chosen accelerator and everything the device builder needs from selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedAccelerator<A> {
    pub handle: A,
    pub name: String,
    pub families: QueueFamilies,
    /// Required features plus whichever preferred ones the accelerator has.
    pub enabled_features: DeviceFeatures,
}

enum Verdict<A> {
    Accept(SelectedAccelerator<A>),
    Soft(SelectedAccelerator<A>, Rejection),
    Reject(Rejection),
}

fn evaluate<P: CapabilityProbe>(
    probe: &P,
    accelerator: P::Accelerator,
    requirements: &DeviceRequirements,
) -> Result<Verdict<P::Accelerator>> {
    // checked first: the feature query below assumes 1.2 structures exist
    let found = probe.api_version(accelerator).map_err(PresentError::probe)?;
    if found < MIN_API_VERSION {
        return Ok(Verdict::Reject(Rejection::ApiVersionTooOld {
            found,
            required: MIN_API_VERSION,
        }));
    }

    let families = match find_queue_families(probe, accelerator)? {
        QueueFamilyAssignment::Complete(families) => families,
        QueueFamilyAssignment::Incomplete { graphics, present } => {
            return Ok(Verdict::Reject(Rejection::IncompleteQueueFamilies {
                graphics,
                present,
            }))
        }
    };

    let supported = probe
        .device_extensions(accelerator)
        .map_err(PresentError::probe)?;
    let missing = requirements.missing_extensions(&supported);
    if !missing.is_empty() {
        return Ok(Verdict::Reject(Rejection::MissingExtensions(missing)));
    }

    probe.surface_formats(accelerator)?;
    probe.present_modes(accelerator)?;

    let features = probe.features(accelerator).map_err(PresentError::probe)?;
    let absent_required = requirements.required_features().difference(features);
    if !absent_required.is_empty() {
        return Ok(Verdict::Reject(Rejection::MissingRequiredFeatures(absent_required)));
    }

    let selected = SelectedAccelerator {
        handle: accelerator,
        name: probe.accelerator_name(accelerator),
        families,
        enabled_features: requirements.required_features()
            | (requirements.preferred_features() & features),
    };

    let absent_preferred = requirements.preferred_features().difference(features);
    if !absent_preferred.is_empty() {
        return Ok(Verdict::Soft(
            selected,
            Rejection::MissingPreferredFeatures(absent_preferred),
        ));
    }

    Ok(Verdict::Accept(selected))
}

/// Picks the first accelerator that satisfies `requirements`.
///
/// Candidates missing only preferred features are skipped, but the first of
/// them is returned if nothing better turns up.
pub fn select_accelerator<P: CapabilityProbe>(
    probe: &P,
    accelerators: &[P::Accelerator],
    requirements: &DeviceRequirements,
) -> Result<SelectedAccelerator<P::Accelerator>> {
    if accelerators.is_empty() {
        warn!("no accelerators enumerated");
        return Err(PresentError::NoSuitableDevice);
    }

    let mut fallback = None;

    for &accelerator in accelerators {
        let name = probe.accelerator_name(accelerator);
        let verdict = match evaluate(probe, accelerator, requirements) {
            Ok(v) => v,
            Err(PresentError::NoSurfaceSupport) => Verdict::Reject(Rejection::NoSurfaceSupport),
            Err(e) => Verdict::Reject(Rejection::ProbeFailed(e.to_string())),
        };

        match verdict {
            Verdict::Accept(selected) => {
                info!(
                    "selected accelerator `{}` (graphics={}, present={})",
                    selected.name, selected.families.graphics, selected.families.present
                );
                return Ok(selected);
            }
            Verdict::Soft(selected, why) => {
                warn!("skipping accelerator `{name}`: {why}");
                fallback.get_or_insert(selected);
            }
            Verdict::Reject(why) => {
                info!("skipping accelerator `{name}`: {why}");
            }
        }
    }

    match fallback {
        Some(selected) => {
            warn!(
                "no accelerator has every preferred feature; falling back to `{}` ({:?} enabled)",
                selected.name, selected.enabled_features
            );
            Ok(selected)
        }
        None => Err(PresentError::NoSuitableDevice),
    }
}
