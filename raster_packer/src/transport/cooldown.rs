use crate::config::DEFAULT_COOLDOWN_SECS;
use crate::error::{PackerError, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Identity of a job packer holding device sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

#[derive(Debug, Clone, Copy)]
enum Lease {
    Active { owner: OwnerId },
    CoolingDown { owner: OwnerId, until: Instant },
}

#[derive(Debug, Default)]
struct Leases {
    next_owner: u64,
    devices: HashMap<String, Lease>,
}

/// Per-device session leases shared by every packer talking to the same devices.
///
/// A session released by its owner stays reserved for that owner during the cooldown window;
/// any other owner is turned away until the window has passed.
#[derive(Debug, Clone)]
pub struct CooldownRegistry {
    cooldown: Duration,
    leases: Arc<Mutex<Leases>>,
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_COOLDOWN_SECS))
    }
}

impl CooldownRegistry {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            leases: Arc::new(Mutex::new(Leases::default())),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn lock(&self) -> Result<MutexGuard<'_, Leases>, PackerError> {
        self.leases
            .lock()
            .map_err(|_| PackerError::Internal("cooldown registry lock poisoned".to_string()))
    }

    pub fn register_owner(&self) -> Result<OwnerId, PackerError> {
        let mut leases = self.lock()?;
        leases.next_owner += 1;
        Ok(OwnerId(leases.next_owner))
    }

    /// Takes the session of `device` for `owner`.
    pub fn acquire(&self, device: &str, owner: OwnerId) -> Result<(), PackerError> {
        let mut leases = self.lock()?;
        let now = Instant::now();
        leases.devices.retain(|_, lease| match lease {
            Lease::CoolingDown { until, .. } => *until > now,
            Lease::Active { .. } => true,
        });
        match leases.devices.get(device) {
            Some(Lease::Active { owner: holder }) if *holder != owner => {
                return Err(TransportError::DeviceBusy(device.to_string()).into());
            }
            Some(Lease::CoolingDown { owner: holder, until }) if *holder != owner && now < *until => {
                return Err(TransportError::CoolingDown {
                    device: device.to_string(),
                    remaining: *until - now,
                }
                .into());
            }
            _ => {}
        }
        leases
            .devices
            .insert(device.to_string(), Lease::Active { owner });
        Ok(())
    }

    /// Releases the session of `device` and opens its cooldown window.
    pub fn start_cooldown(&self, device: &str, owner: OwnerId) -> Result<(), PackerError> {
        let mut leases = self.lock()?;
        if let Some(lease) = leases.devices.get_mut(device) {
            if matches!(lease, Lease::Active { owner: holder } if *holder == owner) {
                *lease = Lease::CoolingDown {
                    owner,
                    until: Instant::now() + self.cooldown,
                };
                log::info!("device {} cooling down for {:?}", device, self.cooldown);
            }
        }
        Ok(())
    }

    /// Drops the lease of `device` without a cooldown, after a failed connection attempt.
    pub fn release(&self, device: &str, owner: OwnerId) -> Result<(), PackerError> {
        let mut leases = self.lock()?;
        if matches!(leases.devices.get(device), Some(Lease::Active { owner: holder }) if *holder == owner)
        {
            leases.devices.remove(device);
        }
        Ok(())
    }

    /// Time left in the cooldown window of `device`, if one is running.
    pub fn remaining(&self, device: &str) -> Option<Duration> {
        let leases = self.leases.lock().ok()?;
        match leases.devices.get(device)? {
            Lease::CoolingDown { until, .. } => until.checked_duration_since(Instant::now()),
            Lease::Active { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultCode;

    #[test]
    fn test_other_owner_waits_for_cooldown() {
        let registry = CooldownRegistry::new(Duration::from_millis(50));
        let first = registry.register_owner().unwrap();
        let second = registry.register_owner().unwrap();
        assert_ne!(first, second);

        registry.acquire("printer", first).unwrap();
        let busy = registry.acquire("printer", second).unwrap_err();
        assert!(matches!(
            busy,
            PackerError::Transport(TransportError::DeviceBusy(_))
        ));
        assert_eq!(busy.result_code(), ResultCode::ErrorConnection);

        registry.start_cooldown("printer", first).unwrap();
        assert!(registry.remaining("printer").is_some());
        let cooling = registry.acquire("printer", second).unwrap_err();
        assert!(matches!(
            cooling,
            PackerError::Transport(TransportError::CoolingDown { .. })
        ));
        assert_eq!(cooling.result_code(), ResultCode::ErrorConnection);

        std::thread::sleep(Duration::from_millis(60));
        registry.acquire("printer", second).unwrap();
    }

    #[test]
    fn test_owner_may_reuse_its_device() {
        let registry = CooldownRegistry::default();
        let owner = registry.register_owner().unwrap();
        registry.acquire("10.0.0.7", owner).unwrap();
        registry.start_cooldown("10.0.0.7", owner).unwrap();
        registry.acquire("10.0.0.7", owner).unwrap();
        // other devices are independent
        let other = registry.register_owner().unwrap();
        registry.acquire("10.0.0.8", other).unwrap();
    }

    #[test]
    fn test_expired_cooldowns_are_dropped() {
        let registry = CooldownRegistry::new(Duration::from_millis(10));
        let owner = registry.register_owner().unwrap();
        for device in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            registry.acquire(device, owner).unwrap();
            registry.start_cooldown(device, owner).unwrap();
        }
        assert_eq!(registry.leases.lock().unwrap().devices.len(), 3);
        std::thread::sleep(Duration::from_millis(20));
        registry.acquire("10.0.0.4", owner).unwrap();
        let leases = registry.leases.lock().unwrap();
        assert_eq!(leases.devices.len(), 1);
        assert!(leases.devices.contains_key("10.0.0.4"));
    }

    #[test]
    fn test_release_without_cooldown() {
        let registry = CooldownRegistry::default();
        let first = registry.register_owner().unwrap();
        let second = registry.register_owner().unwrap();
        registry.acquire("printer", first).unwrap();
        registry.release("printer", first).unwrap();
        assert_eq!(registry.remaining("printer"), None);
        registry.acquire("printer", second).unwrap();
    }
}
