//! DHCP lease counts per scope and lease type.

use std::collections::BTreeMap;

use crate::api::DhcpLeaseList;
use crate::config::ScrapeContext;
use crate::model::{DHCP_LEASES, MetricSample};

pub fn translate(payload: &DhcpLeaseList, _ctx: &ScrapeContext) -> Vec<MetricSample> {
    let mut counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();

    for lease in &payload.leases {
        let scope = lease.scope.as_deref().unwrap_or("unknown");
        let lease_type = lease.lease_type.as_deref().unwrap_or("Unknown");
        *counts.entry((scope, lease_type)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((scope, lease_type), count)| DHCP_LEASES.sample([scope, lease_type], count as f64))
        .collect()
}
