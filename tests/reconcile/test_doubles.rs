//! Test doubles for reconciliation scenarios.

use std::sync::{Arc, Mutex, MutexGuard};

use pdctl::{
    AttachMode, AttachedDisk, GatewayError, GatewayFuture, Instance, ProviderGateway,
    ResourceKind, Volume, VolumeSpec,
};

/// Provider calls recorded by the scripted gateway, in issue order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    FindVolume,
    FindInstance,
    CreateVolume { size_gb: u32 },
    AttachVolume { instance: String, mode: AttachMode },
    DetachVolume { instance: String },
    DestroyVolume,
}

/// Scripted gateway simulating one disk and at most one instance.
///
/// Mutating calls update the simulated provider state so a second run
/// observes what the first run left behind, which is what the idempotence
/// scenarios rely on.
#[derive(Clone, Debug, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    volume: Option<Volume>,
    instance: Option<Instance>,
    failures: Failures,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
struct Failures {
    find_volume: Option<GatewayError>,
    find_instance: Option<GatewayError>,
    create: Option<GatewayError>,
    attach: Option<GatewayError>,
    detach: Option<GatewayError>,
    destroy: Option<GatewayError>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|err| panic!("lock poisoned: {err}"))
    }

    /// Seeds an existing disk into the simulated provider.
    pub fn seed_volume(&self, name: &str, size_gb: u32, zone: &str) {
        self.lock().volume = Some(Volume {
            name: name.to_owned(),
            size_gb,
            zone: zone.to_owned(),
        });
    }

    /// Seeds an instance, optionally with disks already attached.
    pub fn seed_instance(&self, name: &str, zone: &str, attached: &[(&str, AttachMode)]) {
        self.lock().instance = Some(Instance {
            name: name.to_owned(),
            zone: zone.to_owned(),
            attached_disks: attached
                .iter()
                .map(|(device_name, mode)| AttachedDisk {
                    device_name: (*device_name).to_owned(),
                    mode: *mode,
                })
                .collect(),
        });
    }

    pub fn fail_find_volume(&self, err: GatewayError) {
        self.lock().failures.find_volume = Some(err);
    }

    pub fn fail_find_instance(&self, err: GatewayError) {
        self.lock().failures.find_instance = Some(err);
    }

    pub fn fail_create(&self, err: GatewayError) {
        self.lock().failures.create = Some(err);
    }

    pub fn fail_attach(&self, err: GatewayError) {
        self.lock().failures.attach = Some(err);
    }

    pub fn fail_detach(&self, err: GatewayError) {
        self.lock().failures.detach = Some(err);
    }

    pub fn fail_destroy(&self, err: GatewayError) {
        self.lock().failures.destroy = Some(err);
    }

    /// Returns every provider call issued so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Returns the disk currently present in the simulated provider.
    pub fn volume(&self) -> Option<Volume> {
        self.lock().volume.clone()
    }

    /// Returns the simulated instance snapshot.
    pub fn instance(&self) -> Option<Instance> {
        self.lock().instance.clone()
    }
}

impl ProviderGateway for ScriptedGateway {
    fn find_volume<'a>(&'a self, name: &'a str, zone: &'a str) -> GatewayFuture<'a, Volume> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(Call::FindVolume);
            if let Some(err) = &state.failures.find_volume {
                return Err(err.clone());
            }
            state.volume.clone().ok_or_else(|| GatewayError::NotFound {
                kind: ResourceKind::Disk,
                name: name.to_owned(),
                zone: zone.to_owned(),
            })
        })
    }

    fn find_instance<'a>(&'a self, name: &'a str, zone: &'a str) -> GatewayFuture<'a, Instance> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(Call::FindInstance);
            if let Some(err) = &state.failures.find_instance {
                return Err(err.clone());
            }
            state
                .instance
                .clone()
                .ok_or_else(|| GatewayError::NotFound {
                    kind: ResourceKind::Instance,
                    name: name.to_owned(),
                    zone: zone.to_owned(),
                })
        })
    }

    fn create_volume<'a>(&'a self, spec: &'a VolumeSpec) -> GatewayFuture<'a, Volume> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(Call::CreateVolume {
                size_gb: spec.size_gb,
            });
            if let Some(err) = &state.failures.create {
                return Err(err.clone());
            }
            let created = Volume {
                name: spec.name.clone(),
                size_gb: spec.size_gb,
                zone: spec.zone.clone(),
            };
            state.volume = Some(created.clone());
            Ok(created)
        })
    }

    fn attach_volume<'a>(
        &'a self,
        instance: &'a Instance,
        volume: &'a Volume,
        mode: AttachMode,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(Call::AttachVolume {
                instance: instance.name.clone(),
                mode,
            });
            if let Some(err) = &state.failures.attach {
                return Err(err.clone());
            }
            if let Some(snapshot) = state.instance.as_mut() {
                snapshot.attached_disks.push(AttachedDisk {
                    device_name: volume.name.clone(),
                    mode,
                });
            }
            Ok(())
        })
    }

    fn detach_volume<'a>(
        &'a self,
        volume: &'a Volume,
        instance: &'a Instance,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(Call::DetachVolume {
                instance: instance.name.clone(),
            });
            if let Some(err) = &state.failures.detach {
                return Err(err.clone());
            }
            if let Some(snapshot) = state.instance.as_mut() {
                snapshot
                    .attached_disks
                    .retain(|disk| disk.device_name != volume.name);
            }
            Ok(())
        })
    }

    fn destroy_volume<'a>(&'a self, _volume: &'a Volume) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(Call::DestroyVolume);
            if let Some(err) = &state.failures.destroy {
                return Err(err.clone());
            }
            state.volume = None;
            Ok(())
        })
    }
}
