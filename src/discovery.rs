//! Service discovery seam.
//!
//! The server can announce itself on the local network through an optional
//! collaborator. No concrete mechanism ships with the crate; applications
//! plug in whatever they use (mDNS, a registry service, a file drop).

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::error::Result;

/// What gets announced when the server starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub name: String,
    pub address: IpAddr,
    pub port: u16,
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            IpAddr::V4(addr) => write!(f, "{} at {}:{}", self.name, addr, self.port),
            IpAddr::V6(addr) => write!(f, "{} at [{}]:{}", self.name, addr, self.port),
        }
    }
}

/// Opaque token returned by [`Discovery::advertise`], handed back on withdraw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdvertisementHandle(String);

impl AdvertisementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// A mechanism for announcing and withdrawing the server.
///
/// Both calls happen on the thread that calls `Server::start` or
/// `Server::stop`. Errors are logged by the server and never abort it.
pub trait Discovery: Send + Sync {
    fn advertise(&self, record: &ServiceRecord) -> Result<AdvertisementHandle>;

    fn withdraw(&self, handle: AdvertisementHandle) -> Result<()>;
}

impl<T: Discovery + ?Sized> Discovery for Arc<T> {
    fn advertise(&self, record: &ServiceRecord) -> Result<AdvertisementHandle> {
        (**self).advertise(record)
    }

    fn withdraw(&self, handle: AdvertisementHandle) -> Result<()> {
        (**self).withdraw(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        live: Mutex<Vec<String>>,
    }

    impl Discovery for Recorder {
        fn advertise(&self, record: &ServiceRecord) -> Result<AdvertisementHandle> {
            let id = record.to_string();
            self.live.lock().unwrap().push(id.clone());
            Ok(AdvertisementHandle::new(id))
        }

        fn withdraw(&self, handle: AdvertisementHandle) -> Result<()> {
            let mut live = self.live.lock().unwrap();
            let before = live.len();
            live.retain(|id| id != handle.id());
            if live.len() == before {
                return Err(ControlError::Discovery(format!("unknown handle {}", handle.id())));
            }
            Ok(())
        }
    }

    fn record(address: IpAddr) -> ServiceRecord {
        ServiceRecord {
            name: "rig".to_string(),
            address,
            port: 8080,
        }
    }

    #[test]
    fn test_record_display() {
        assert_eq!(
            record(IpAddr::V4(Ipv4Addr::LOCALHOST)).to_string(),
            "rig at 127.0.0.1:8080"
        );
        assert_eq!(
            record(IpAddr::V6(Ipv6Addr::LOCALHOST)).to_string(),
            "rig at [::1]:8080"
        );
    }

    #[test]
    fn test_shared_collaborator_through_arc() {
        let recorder = Arc::new(Recorder::default());
        let shared: Box<dyn Discovery> = Box::new(Arc::clone(&recorder));

        let handle = shared.advertise(&record(IpAddr::V4(Ipv4Addr::LOCALHOST))).unwrap();
        assert_eq!(recorder.live.lock().unwrap().len(), 1);

        shared.withdraw(handle.clone()).unwrap();
        assert!(recorder.live.lock().unwrap().is_empty());

        assert!(shared.withdraw(handle).is_err());
    }
}
