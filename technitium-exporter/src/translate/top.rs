//! Ranked top lists: clients, domains and blocked domains.
//!
//! Cardinality is bounded at the source: every list is requested with
//! `limit = top_limit`. Entries past the limit only appear when upstream
//! ignores the parameter; they are dropped and logged.

use tracing::warn;

use crate::api::{TopClient, TopDomain};
use crate::config::ScrapeContext;
use crate::model::{
    MetricDefinition, MetricSample, TOP_BLOCKED_DOMAIN_HITS, TOP_CLIENT_HITS, TOP_DOMAIN_HITS,
};

/// The three lists of one scrape. `None` means the call failed.
#[derive(Debug, Clone, Default)]
pub struct TopLists {
    pub clients: Option<Vec<TopClient>>,
    pub domains: Option<Vec<TopDomain>>,
    pub blocked_domains: Option<Vec<TopDomain>>,
}

pub fn translate(lists: &TopLists, ctx: &ScrapeContext) -> Vec<MetricSample> {
    let mut samples = Vec::new();

    if let Some(clients) = &lists.clients {
        samples.extend(translate_clients(clients, ctx));
    }
    if let Some(domains) = &lists.domains {
        samples.extend(translate_domains(&TOP_DOMAIN_HITS, domains, ctx));
    }
    if let Some(domains) = &lists.blocked_domains {
        samples.extend(translate_domains(&TOP_BLOCKED_DOMAIN_HITS, domains, ctx));
    }

    samples
}

pub fn translate_clients(clients: &[TopClient], ctx: &ScrapeContext) -> Vec<MetricSample> {
    capped(&TOP_CLIENT_HITS, clients, ctx)
        .map(|client| {
            TOP_CLIENT_HITS.sample(
                [
                    client.name.as_str(),
                    client.domain.as_deref().unwrap_or_default(),
                ],
                client.hits,
            )
        })
        .collect()
}

pub fn translate_domains(
    def: &MetricDefinition,
    domains: &[TopDomain],
    ctx: &ScrapeContext,
) -> Vec<MetricSample> {
    capped(def, domains, ctx)
        .map(|domain| def.sample([domain.name.as_str()], domain.hits))
        .collect()
}

fn capped<'a, T>(
    def: &MetricDefinition,
    entries: &'a [T],
    ctx: &ScrapeContext,
) -> impl Iterator<Item = &'a T> {
    let limit = ctx.top_limit as usize;
    if entries.len() > limit {
        warn!(
            metric = def.name,
            returned = entries.len(),
            limit,
            "Upstream returned more entries than requested"
        );
    }
    entries.iter().take(limit)
}
