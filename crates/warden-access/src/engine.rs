//! Access-window facade
//!
//! The single entry point the query layer talks to. Each request computes
//! everything from scratch: no chain, credential or range set outlives the
//! call that produced it.

use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::Span;
use warden_core::{
    MetadataGroup, Permission, Principal, ResourceUri, StreamId, StreamScoped, TimeseriesRecord,
    ValidRangeSet, WardenError,
};

use crate::effects::{ChainDiscoveryEffects, CredentialRegistryEffects, StreamResourceEffects};
use crate::masker::sort_by_time;
use crate::resolver::{ChainResolver, ResolutionReport};
use crate::{AccessConfig, AccessError, AccessResult, ResultMasker, WindowBuilder};

/// Computes valid-range sets and masks query results with them.
pub struct AccessEngine {
    resolver: ChainResolver,
    windows: WindowBuilder,
    masker: ResultMasker,
    streams: Arc<dyn StreamResourceEffects>,
    config: AccessConfig,
    span: Span,
}

impl AccessEngine {
    /// Assemble an engine over its collaborators. Fails if `config` is invalid.
    pub fn new(
        discovery: Arc<dyn ChainDiscoveryEffects>,
        registry: Arc<dyn CredentialRegistryEffects>,
        streams: Arc<dyn StreamResourceEffects>,
        config: AccessConfig,
    ) -> AccessResult<Self> {
        config.validate()?;
        let span = tracing::info_span!("access_engine");
        Ok(Self {
            resolver: ChainResolver::new(discovery, registry, config.clone())?.with_span(span.clone()),
            windows: WindowBuilder::new().with_span(span.clone()),
            masker: ResultMasker::new().with_span(span.clone()),
            streams,
            config,
            span,
        })
    }

    /// Route every component's events through `span`.
    pub fn with_span(self, span: Span) -> Self {
        Self {
            resolver: self.resolver.with_span(span.clone()),
            windows: self.windows.with_span(span.clone()),
            masker: self.masker.with_span(span.clone()),
            streams: self.streams,
            config: self.config,
            span,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// When `principal` held a complete chain granting `permission` on `resource`.
    ///
    /// An empty set means no access. Errors only when discovery fails.
    pub async fn get_valid_ranges(
        &self,
        resource: &ResourceUri,
        principal: &Principal,
        permission: Permission,
    ) -> AccessResult<ValidRangeSet> {
        self.explain_valid_ranges(resource, principal, permission)
            .await
            .map(|(ranges, _)| ranges)
    }

    /// Like [`get_valid_ranges`](Self::get_valid_ranges), plus what resolution did.
    pub async fn explain_valid_ranges(
        &self,
        resource: &ResourceUri,
        principal: &Principal,
        permission: Permission,
    ) -> AccessResult<(ValidRangeSet, ResolutionReport)> {
        let resolution = self.resolver.resolve(resource, permission, principal).await?;
        let ranges = self.windows.build(&resolution.chains);
        tracing::debug!(
            parent: &self.span,
            %resource,
            %principal,
            %permission,
            ranges = %ranges,
            "Computed valid ranges"
        );
        Ok((ranges, resolution.report))
    }

    /// Drop every record `principal` was not authorized to read when it was
    /// recorded.
    ///
    /// Output is ascending by timestamp. Within one stream, records sharing a
    /// timestamp keep their input order.
    pub async fn mask_timeseries(
        &self,
        principal: &Principal,
        records: Vec<TimeseriesRecord>,
    ) -> AccessResult<Vec<TimeseriesRecord>> {
        let mut by_stream: BTreeMap<StreamId, Vec<TimeseriesRecord>> = BTreeMap::new();
        for record in records {
            by_stream.entry(record.stream()).or_default().push(record);
        }

        let ranges = self
            .ranges_for_streams(principal, by_stream.keys().copied())
            .await?;

        let mut kept = Vec::new();
        for (stream, group) in by_stream {
            if let Some(stream_ranges) = ranges.get(&stream) {
                kept.extend(self.masker.mask(stream_ranges, group));
            }
        }
        sort_by_time(&mut kept);
        Ok(kept)
    }

    /// Keep whole metadata groups whose stream `principal` could ever read.
    ///
    /// Input order is preserved.
    pub async fn mask_metadata_groups(
        &self,
        principal: &Principal,
        groups: Vec<MetadataGroup>,
    ) -> AccessResult<Vec<MetadataGroup>> {
        let ranges = self
            .ranges_for_streams(principal, groups.iter().map(StreamScoped::stream))
            .await?;

        Ok(groups
            .into_iter()
            .filter(|group| {
                ranges
                    .get(&group.stream)
                    .is_some_and(|r| self.masker.keep_metadata(r))
            })
            .collect())
    }

    /// Read ranges for each distinct stream. Streams sharing a resource
    /// share one range computation, and distinct resources are computed
    /// concurrently.
    async fn ranges_for_streams(
        &self,
        principal: &Principal,
        streams: impl Iterator<Item = StreamId>,
    ) -> AccessResult<HashMap<StreamId, ValidRangeSet>> {
        let mut distinct: Vec<StreamId> = streams.collect();
        distinct.sort_unstable();
        distinct.dedup();

        let resources = try_join_all(distinct.into_iter().map(|stream| async move {
            self.resource_for_stream(stream)
                .await
                .map(|resource| (stream, resource))
        }))
        .await?;

        let mut distinct_resources: Vec<&ResourceUri> =
            resources.iter().map(|(_, resource)| resource).collect();
        distinct_resources.sort_unstable();
        distinct_resources.dedup();

        let by_resource: BTreeMap<&ResourceUri, ValidRangeSet> =
            try_join_all(distinct_resources.into_iter().map(|resource| async move {
                self.get_valid_ranges(resource, principal, Permission::Read)
                    .await
                    .map(|ranges| (resource, ranges))
            }))
            .await?
            .into_iter()
            .collect();

        Ok(resources
            .iter()
            .filter_map(|(stream, resource)| {
                by_resource
                    .get(resource)
                    .map(|ranges| (*stream, ranges.clone()))
            })
            .collect())
    }

    async fn resource_for_stream(&self, stream: StreamId) -> AccessResult<ResourceUri> {
        match tokio::time::timeout(
            self.config.lookup_timeout(),
            self.streams.resource_for_stream(stream),
        )
        .await
        {
            Ok(Ok(resource)) => Ok(resource),
            Ok(Err(e)) => Err(AccessError::resource_lookup_failed(stream, e)),
            Err(_) => Err(AccessError::resource_lookup_failed(
                stream,
                WardenError::timeout("stream resource lookup", self.config.lookup_timeout_ms),
            )),
        }
    }
}
