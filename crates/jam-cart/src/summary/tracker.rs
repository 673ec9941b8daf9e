//! Bookkeeping around asynchronous summary computations.

use crate::cart::CartStore;
use crate::error::CartError;
use crate::ids::{DiscountCode, ZoneId};
use crate::summary::{CartSummary, PricingBackend, SummaryRequest};
use chrono::{DateTime, Utc};
use jam_storage::KeyValueBackend;

/// A summary request in flight.
///
/// Carries the cart generation it was built from and a sequence number, so
/// that a late response can be recognised and dropped.
#[derive(Debug, Clone)]
pub struct SummaryTicket {
    seq: u64,
    generation: u64,
    request: SummaryRequest,
}

impl SummaryTicket {
    /// The snapshot to send to the pricing backend.
    pub fn request(&self) -> &SummaryRequest {
        &self.request
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Cart generation the snapshot was taken at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`SummaryTracker::resolve`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The summary is now the current one.
    Applied,
    /// The response was outdated and ignored.
    Discarded,
}

/// Holds the last good summary and whether it still matches the cart.
///
/// On failure the previous summary stays visible, flagged stale, and the
/// error goes back to the caller so it can offer a retry.
#[derive(Debug, Default)]
pub struct SummaryTracker {
    next_seq: u64,
    latest_seq: Option<u64>,
    current: Option<CartSummary>,
    stale: bool,
    computed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl SummaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the cart and issue a ticket for it.
    ///
    /// Any earlier ticket that has not been resolved is superseded.
    pub fn begin<B: KeyValueBackend>(
        &mut self,
        store: &CartStore<B>,
        zone_id: Option<&ZoneId>,
        discount_code: Option<&DiscountCode>,
    ) -> SummaryTicket {
        self.next_seq += 1;
        self.latest_seq = Some(self.next_seq);
        SummaryTicket {
            seq: self.next_seq,
            generation: store.generation(),
            request: store.summary_request(zone_id, discount_code),
        }
    }

    /// Record the backend's answer for `ticket`.
    ///
    /// Responses to superseded tickets, or computed from a cart that has
    /// changed since, are discarded. An error for the latest ticket is
    /// returned after the current summary is marked stale.
    pub fn resolve<B: KeyValueBackend>(
        &mut self,
        ticket: SummaryTicket,
        store: &CartStore<B>,
        result: Result<CartSummary, CartError>,
    ) -> Result<SummaryOutcome, CartError> {
        if self.latest_seq != Some(ticket.seq) {
            tracing::debug!(seq = ticket.seq, "dropping superseded summary response");
            return Ok(SummaryOutcome::Discarded);
        }
        self.latest_seq = None;

        if store.generation() != ticket.generation {
            tracing::debug!(
                ticket_generation = ticket.generation,
                cart_generation = store.generation(),
                "dropping summary for an outdated cart"
            );
            self.stale = true;
            return Ok(SummaryOutcome::Discarded);
        }

        match result {
            Ok(summary) => {
                self.current = Some(summary);
                self.stale = false;
                self.computed_at = Some(Utc::now());
                self.last_error = None;
                Ok(SummaryOutcome::Applied)
            }
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "cart summary failed");
                self.stale = true;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Begin, call the backend and resolve in one step.
    pub async fn refresh<B, P>(
        &mut self,
        store: &CartStore<B>,
        pricing: &P,
        zone_id: Option<&ZoneId>,
        discount_code: Option<&DiscountCode>,
    ) -> Result<SummaryOutcome, CartError>
    where
        B: KeyValueBackend,
        P: PricingBackend + ?Sized,
    {
        let ticket = self.begin(store, zone_id, discount_code);
        let result = pricing.compute_summary(ticket.request()).await;
        self.resolve(ticket, store, result)
    }

    /// Flag the current summary as no longer matching the cart.
    pub fn mark_stale(&mut self) {
        if self.current.is_some() {
            self.stale = true;
        }
    }

    /// Last applied summary, stale or not.
    pub fn summary(&self) -> Option<&CartSummary> {
        self.current.as_ref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether a ticket is outstanding.
    pub fn is_pending(&self) -> bool {
        self.latest_seq.is_some()
    }

    /// When the current summary was applied.
    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.computed_at
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
