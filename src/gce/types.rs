//! Wire types for the Compute Engine REST binding.

use serde::{Deserialize, Serialize};

use crate::gateway::{AttachMode, AttachedDisk, GatewayError, Instance, Volume};

/// Disk resource as returned by the disks service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DiskResource {
    pub(super) name: String,
    /// The API reports sizes as a stringified integer.
    pub(super) size_gb: String,
}

impl DiskResource {
    /// Converts the wire resource into a domain volume.
    pub(super) fn into_volume(self, zone: &str) -> Result<Volume, GatewayError> {
        let size_gb = self.size_gb.parse::<u32>().map_err(|_| GatewayError::Provider {
            status: 0,
            code: String::from("malformed_response"),
            message: format!("disk {} reported unparseable size '{}'", self.name, self.size_gb),
        })?;
        Ok(Volume {
            name: self.name,
            size_gb,
            zone: zone.to_owned(),
        })
    }
}

/// Payload for the disks insert call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InsertDiskRequest {
    pub(super) name: String,
    pub(super) size_gb: String,
}

/// Instance resource as returned by the instances service.
#[derive(Debug, Deserialize)]
pub(super) struct InstanceResource {
    pub(super) name: String,
    #[serde(default)]
    pub(super) disks: Vec<DiskAttachmentResource>,
}

impl InstanceResource {
    pub(super) fn into_instance(self, zone: &str) -> Instance {
        Instance {
            name: self.name,
            zone: zone.to_owned(),
            attached_disks: self
                .disks
                .into_iter()
                .map(|attachment| AttachedDisk {
                    device_name: attachment.device_name,
                    mode: attachment.mode,
                })
                .collect(),
        }
    }
}

/// One disk entry within an instance resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DiskAttachmentResource {
    pub(super) device_name: String,
    pub(super) mode: AttachMode,
}

/// Payload for the instances attachDisk call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AttachDiskRequest {
    pub(super) device_name: String,
    pub(super) mode: AttachMode,
    /// Partial URL of the disk being attached.
    pub(super) source: String,
}

/// Error envelope returned by the API.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorEnvelope {
    pub(super) error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ApiErrorBody {
    #[serde(default)]
    pub(super) message: String,
    #[serde(default)]
    pub(super) errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ApiErrorDetail {
    #[serde(default)]
    pub(super) reason: String,
    #[serde(default)]
    pub(super) message: String,
}
