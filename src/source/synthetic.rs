//! Synthetic fetcher producing plausible interface and device records.
//!
//! Useful for demos and for running the engine without lab equipment. The
//! generated records use the same field names as the live transports
//! (RESTCONF for interfaces, DNA Center for devices), so they go through the
//! normal normalization path.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use super::{Fetcher, RawRecord};
use crate::error::FetchError;

#[derive(Debug)]
struct SimInterface {
    name: String,
    up: bool,
    speed_mbps: u64,
    in_octets: u64,
    out_octets: u64,
    in_errors: u64,
    out_errors: u64,
}

#[derive(Debug)]
struct SimDevice {
    id: String,
    hostname: String,
    management_ip: String,
    uptime_secs: u64,
}

#[derive(Debug)]
struct SimState {
    rng: StdRng,
    interfaces: Vec<SimInterface>,
    devices: Vec<SimDevice>,
}

/// Generates `GigabitEthernet0/{i}` interfaces and optional devices.
///
/// Interface status and speed are chosen once; bandwidth, octet and error
/// counters move on every fetch.
#[derive(Debug)]
pub struct SyntheticFetcher {
    state: Mutex<SimState>,
    failure_rate: f64,
    description: String,
}

impl SyntheticFetcher {
    pub fn builder() -> SyntheticFetcherBuilder {
        SyntheticFetcherBuilder::default()
    }

    /// Number of generated interfaces.
    pub fn interface_count(&self) -> usize {
        self.state.lock().interfaces.len()
    }

    fn generate(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut state = self.state.lock();
        let SimState {
            rng,
            interfaces,
            devices,
        } = &mut *state;

        if self.failure_rate > 0.0 && rng.gen::<f64>() < self.failure_rate {
            return Err(FetchError::Connection("simulated outage".to_string()));
        }

        let mut records = Vec::with_capacity(interfaces.len() + devices.len());

        for (i, iface) in interfaces.iter_mut().enumerate() {
            let bandwidth_pct: f64 = rng.gen_range(0.0..90.0);
            iface.in_octets += rng.gen_range(10_000u64..120_000);
            iface.out_octets += rng.gen_range(10_000u64..120_000);
            let new_errors: u64 = rng.gen_range(0..=10);
            let in_share = rng.gen_range(0..=new_errors);
            iface.in_errors += in_share;
            iface.out_errors += new_errors - in_share;

            records.push(RawRecord::interface(interface_record(i, iface, bandwidth_pct)));
        }

        for dev in devices.iter_mut() {
            // Roughly one poll in ten finds the device freshly rebooted
            if rng.gen_bool(0.1) {
                dev.uptime_secs = rng.gen_range(0..300);
            } else {
                dev.uptime_secs += rng.gen_range(30u64..120);
            }
            let reachable = rng.gen_bool(0.9);
            records.push(RawRecord::device(device_record(dev, reachable)));
        }

        Ok(records)
    }
}

fn interface_record(index: usize, iface: &SimInterface, bandwidth_pct: f64) -> Value {
    json!({
        "name": iface.name,
        "description": format!("Synthetic interface {}", index),
        "enabled": true,
        "oper-status": if iface.up { "up" } else { "down" },
        "speed": iface.speed_mbps,
        "bandwidth-pct": bandwidth_pct,
        "ietf-ip:ipv4": {"address": [{"ip": format!("192.0.2.{}", index + 1), "netmask": "255.255.255.0"}]},
        "ietf-ip:ipv6": {"address": [{"ip": format!("2001:db8::{}", index + 1), "prefix-length": 64}]},
        "statistics": {
            "in-octets": iface.in_octets,
            "out-octets": iface.out_octets,
            "in-errors": iface.in_errors,
            "out-errors": iface.out_errors,
        },
    })
}

fn device_record(dev: &SimDevice, reachable: bool) -> Value {
    let secs = dev.uptime_secs;
    json!({
        "instanceUuid": dev.id,
        "id": dev.id,
        "hostname": dev.hostname,
        "managementIpAddress": dev.management_ip,
        "reachabilityStatus": if reachable { "Reachable" } else { "Unreachable" },
        "upTime": format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60),
        "softwareVersion": "17.9.4a",
        "platformId": "C9300-24T",
        "interfaceCount": "28",
        "deviceSupportLevel": "Supported",
        "collectionStatus": "Managed",
        "role": "ACCESS",
        "vendor": "Cisco",
        "family": "Switches and Hubs",
    })
}

#[async_trait]
impl Fetcher for SyntheticFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.generate()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for SyntheticFetcher.
#[derive(Debug, Clone)]
pub struct SyntheticFetcherBuilder {
    interfaces: usize,
    devices: usize,
    seed: Option<u64>,
    failure_rate: f64,
}

impl Default for SyntheticFetcherBuilder {
    fn default() -> Self {
        Self {
            interfaces: 4,
            devices: 0,
            seed: None,
            failure_rate: 0.0,
        }
    }
}

impl SyntheticFetcherBuilder {
    /// Number of interfaces to generate (default: 4).
    pub fn interfaces(mut self, n: usize) -> Self {
        self.interfaces = n;
        self
    }

    /// Number of devices to generate (default: 0).
    pub fn devices(mut self, n: usize) -> Self {
        self.devices = n;
        self
    }

    /// Fix the random seed for reproducible output.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Probability that a fetch fails, clamped to 0.0..=1.0.
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    pub fn build(self) -> SyntheticFetcher {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let interfaces = (0..self.interfaces)
            .map(|i| SimInterface {
                name: format!("GigabitEthernet0/{}", i),
                up: rng.gen_bool(0.5),
                speed_mbps: if rng.gen_bool(0.5) { 100 } else { 1000 },
                in_octets: 0,
                out_octets: 0,
                in_errors: 0,
                out_errors: 0,
            })
            .collect();

        let devices = (0..self.devices)
            .map(|i| SimDevice {
                id: format!("00000000-0000-4000-8000-{:012x}", i + 1),
                hostname: format!("edge-sw{:02}", i + 1),
                management_ip: format!("198.51.100.{}", i % 250 + 1),
                uptime_secs: rng.gen_range(3_600..864_000),
            })
            .collect();

        SyntheticFetcher {
            description: format!(
                "synthetic: {} interfaces, {} devices",
                self.interfaces, self.devices
            ),
            state: Mutex::new(SimState {
                rng,
                interfaces,
                devices,
            }),
            failure_rate: self.failure_rate,
        }
    }
}
