//! Access window construction
//!
//! A chain is only as old as its credentials, so each chain contributes the
//! compressed union of its credential windows, and a request's answer is the
//! union over every resolved chain.

use tracing::Span;
use warden_core::{IntervalSet, ResolvedChain, ValidRangeSet};

/// Builds valid-range sets from resolved chains.
#[derive(Debug, Clone)]
pub struct WindowBuilder {
    span: Span,
}

impl Default for WindowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowBuilder {
    /// Create a builder with its own component span.
    pub fn new() -> Self {
        Self {
            span: tracing::debug_span!("window_builder"),
        }
    }

    /// Emit events under `span` instead of the default component span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Time covered by one chain.
    ///
    /// Credentials whose expiry precedes their creation cover nothing.
    pub fn chain_window(&self, chain: &ResolvedChain) -> ValidRangeSet {
        let mut windows = IntervalSet::new();
        for credential in chain.credentials() {
            match credential.validity_window() {
                Some(window) => windows.add(window),
                None => tracing::debug!(
                    parent: &self.span,
                    issuer = %credential.issuer,
                    receiver = %credential.receiver,
                    created_at = %credential.created_at,
                    expires_at = %credential.expires_at,
                    "Credential window is inverted; ignoring"
                ),
            }
        }
        windows.compress()
    }

    /// Union of every chain's window. Empty input means no access.
    pub fn build(&self, chains: &[ResolvedChain]) -> ValidRangeSet {
        let mut ranges = ValidRangeSet::empty();
        for chain in chains {
            ranges.merge_from(&self.chain_window(chain));
        }
        ranges
    }
}
