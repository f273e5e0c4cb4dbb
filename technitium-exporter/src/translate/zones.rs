//! Zone inventory.

use tracing::debug;

use crate::api::{Zone, ZoneList};
use crate::config::ScrapeContext;
use crate::model::{MetricSample, ZONE_INFO, ZONES, ZONES_DISABLED, ZONES_INTERNAL};

pub fn translate(payload: &ZoneList, _ctx: &ScrapeContext) -> Vec<MetricSample> {
    let zones = &payload.zones;
    let mut samples = Vec::with_capacity(zones.len() + 3);

    samples.extend(zones.iter().map(info));

    // Listing is a single page; the server reports the full count separately.
    let total = payload.total_zones.unwrap_or(zones.len() as u64);
    if total as usize > zones.len() {
        debug!(
            listed = zones.len(),
            total, "Zone list truncated by page size"
        );
    }

    let disabled = zones.iter().filter(|zone| zone.disabled).count();
    let internal = zones.iter().filter(|zone| zone.internal).count();

    samples.push(ZONES.value(total as f64));
    samples.push(ZONES_DISABLED.value(disabled as f64));
    samples.push(ZONES_INTERNAL.value(internal as f64));

    samples
}

/// Info sample: the labels carry the data, the value is always 1.
fn info(zone: &Zone) -> MetricSample {
    ZONE_INFO.sample(
        [
            zone.name.clone().unwrap_or_else(|| "unknown".to_string()),
            zone.zone_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            zone.disabled.to_string(),
            zone.internal.to_string(),
            zone.soa_serial.unwrap_or(0).to_string(),
        ],
        1.0,
    )
}
