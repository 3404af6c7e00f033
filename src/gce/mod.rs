//! Compute Engine implementation of the provider gateway.
//!
//! Every operation is a single REST round-trip. Mutating calls return a
//! provider operation that is never polled: the run reports what the API
//! accepted and leaves settling to the provider, so the binding stays a thin
//! shell around the reconciler's decisions.

mod error;
mod types;

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::config::{ConfigError, GceConfig};
use crate::gateway::{
    AttachMode, GatewayError, GatewayFuture, Instance, ProviderGateway, Volume, VolumeSpec,
};
use error::ErrorContext;
use types::{AttachDiskRequest, DiskResource, InsertDiskRequest, InstanceResource};

/// Gateway that manages persistent disks through the Compute Engine API.
#[derive(Clone, Debug)]
pub struct GceGateway {
    client: Client,
    config: GceConfig,
}

impl GceGateway {
    /// Constructs a new gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the provided configuration fails
    /// validation.
    pub fn new(config: GceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    fn disk_url(&self, zone: &str, name: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/disks/{}",
            self.config.api_base, self.config.project_id, zone, name
        )
    }

    fn disks_url(&self, zone: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/disks",
            self.config.api_base, self.config.project_id, zone
        )
    }

    fn instance_url(&self, zone: &str, name: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/instances/{}",
            self.config.api_base, self.config.project_id, zone, name
        )
    }

    fn disk_source(&self, zone: &str, name: &str) -> String {
        format!(
            "projects/{}/zones/{}/disks/{}",
            self.config.project_id, zone, name
        )
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<(u16, Vec<u8>), GatewayError> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|err| GatewayError::transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| GatewayError::transport(err.to_string()))?;
        Ok((status, body.to_vec()))
    }

    async fn get_disk(&self, name: &str, zone: &str) -> Result<Volume, GatewayError> {
        let url = self.disk_url(zone, name);
        debug!(%url, "reading disk");
        let (status, body) = self.dispatch(self.client.get(&url)).await?;
        if is_success(status) {
            let resource: DiskResource = serde_json::from_slice(&body).map_err(malformed)?;
            return resource.into_volume(zone);
        }
        Err(error::classify(status, &body, ErrorContext::disk(name, zone)))
    }

    async fn get_instance(&self, name: &str, zone: &str) -> Result<Instance, GatewayError> {
        let url = self.instance_url(zone, name);
        debug!(%url, "reading instance");
        let (status, body) = self.dispatch(self.client.get(&url)).await?;
        if is_success(status) {
            let resource: InstanceResource = serde_json::from_slice(&body).map_err(malformed)?;
            return Ok(resource.into_instance(zone));
        }
        Err(error::classify(
            status,
            &body,
            ErrorContext::instance(name, zone),
        ))
    }

    async fn insert_disk(&self, spec: &VolumeSpec) -> Result<Volume, GatewayError> {
        let url = self.disks_url(&spec.zone);
        let payload = InsertDiskRequest {
            name: spec.name.clone(),
            size_gb: spec.size_gb.to_string(),
        };
        debug!(%url, disk = %spec.name, size_gb = spec.size_gb, "creating disk");
        let (status, body) = self
            .dispatch(self.client.post(&url).json(&payload))
            .await?;
        if is_success(status) {
            // The insert returns an operation, not the disk; report the
            // accepted request rather than waiting for it to settle.
            return Ok(Volume {
                name: spec.name.clone(),
                size_gb: spec.size_gb,
                zone: spec.zone.clone(),
            });
        }
        Err(error::classify(
            status,
            &body,
            ErrorContext::disk(&spec.name, &spec.zone),
        ))
    }

    async fn attach_disk(
        &self,
        instance: &Instance,
        volume: &Volume,
        mode: AttachMode,
    ) -> Result<(), GatewayError> {
        let url = format!(
            "{}/attachDisk",
            self.instance_url(&instance.zone, &instance.name)
        );
        let payload = AttachDiskRequest {
            device_name: volume.name.clone(),
            mode,
            source: self.disk_source(&volume.zone, &volume.name),
        };
        debug!(%url, disk = %volume.name, %mode, "attaching disk");
        let (status, body) = self
            .dispatch(self.client.post(&url).json(&payload))
            .await?;
        if is_success(status) {
            return Ok(());
        }
        Err(error::classify(
            status,
            &body,
            ErrorContext::disk(&volume.name, &volume.zone),
        ))
    }

    async fn detach_disk(&self, volume: &Volume, instance: &Instance) -> Result<(), GatewayError> {
        let url = format!(
            "{}/detachDisk",
            self.instance_url(&instance.zone, &instance.name)
        );
        debug!(%url, disk = %volume.name, "detaching disk");
        let (status, body) = self
            .dispatch(
                self.client
                    .post(&url)
                    .query(&[("deviceName", volume.name.as_str())]),
            )
            .await?;
        if is_success(status) {
            return Ok(());
        }
        Err(error::classify(
            status,
            &body,
            ErrorContext::disk(&volume.name, &volume.zone),
        ))
    }

    async fn delete_disk(&self, volume: &Volume) -> Result<(), GatewayError> {
        let url = self.disk_url(&volume.zone, &volume.name);
        debug!(%url, "destroying disk");
        let (status, body) = self.dispatch(self.client.delete(&url)).await?;
        if is_success(status) {
            return Ok(());
        }
        Err(error::classify(
            status,
            &body,
            ErrorContext::disk(&volume.name, &volume.zone),
        ))
    }
}

const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

fn malformed(err: serde_json::Error) -> GatewayError {
    GatewayError::Provider {
        status: 0,
        code: String::from("malformed_response"),
        message: err.to_string(),
    }
}

impl ProviderGateway for GceGateway {
    fn find_volume<'a>(&'a self, name: &'a str, zone: &'a str) -> GatewayFuture<'a, Volume> {
        Box::pin(async move { self.get_disk(name, zone).await })
    }

    fn find_instance<'a>(&'a self, name: &'a str, zone: &'a str) -> GatewayFuture<'a, Instance> {
        Box::pin(async move { self.get_instance(name, zone).await })
    }

    fn create_volume<'a>(&'a self, spec: &'a VolumeSpec) -> GatewayFuture<'a, Volume> {
        Box::pin(async move { self.insert_disk(spec).await })
    }

    fn attach_volume<'a>(
        &'a self,
        instance: &'a Instance,
        volume: &'a Volume,
        mode: AttachMode,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move { self.attach_disk(instance, volume, mode).await })
    }

    fn detach_volume<'a>(
        &'a self,
        volume: &'a Volume,
        instance: &'a Instance,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move { self.detach_disk(volume, instance).await })
    }

    fn destroy_volume<'a>(&'a self, volume: &'a Volume) -> GatewayFuture<'a, ()> {
        Box::pin(async move { self.delete_disk(volume).await })
    }
}
