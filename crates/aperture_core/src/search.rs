use crate::FetchFailure;

/// Sequence number stamped on a search request when it is issued.
pub type SearchSeq = u64;

/// Status value the backend reports for a usable payload.
pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub preview: String,
    pub relevance_score: f64,
    pub category: String,
    pub has_attachment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPayload {
    pub status: String,
    pub hits: Vec<SearchHit>,
}

impl SearchPayload {
    /// Only a successful payload with at least one hit is rendered as results.
    pub fn is_renderable(&self) -> bool {
        self.status == SUCCESS_STATUS && !self.hits.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchRequest {
    pub(crate) query: String,
    pub(crate) seq: SearchSeq,
    pub(crate) in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum SearchPhase {
    #[default]
    Idle,
    Searching {
        query: String,
    },
    Results(Vec<SearchHit>),
    NoResults,
    Failed(FetchFailure),
}

/// Debounce and supersession bookkeeping for the search box.
///
/// `latest_seq` only ever grows. A response is applied only when its sequence
/// equals `latest_seq`, so the newest *issued* request wins regardless of the
/// order in which responses arrive.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SearchState {
    pending_query: Option<String>,
    latest_seq: SearchSeq,
    current: Option<SearchRequest>,
    phase: SearchPhase,
}

impl SearchState {
    pub(crate) fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    #[cfg(test)]
    pub(crate) fn latest_seq(&self) -> SearchSeq {
        self.latest_seq
    }

    /// Drops the pending query and invalidates any in-flight request.
    ///
    /// Returns `true` when the visible phase changed.
    pub(crate) fn clear(&mut self) -> bool {
        self.pending_query = None;
        if self.current.as_ref().is_some_and(|request| request.in_flight) {
            self.latest_seq += 1;
        }
        self.current = None;
        let changed = self.phase != SearchPhase::Idle;
        self.phase = SearchPhase::Idle;
        changed
    }

    pub(crate) fn set_pending(&mut self, query: String) {
        self.pending_query = Some(query);
    }

    /// Turns the pending query into an in-flight request with a fresh sequence.
    pub(crate) fn issue(&mut self) -> Option<SearchRequest> {
        let query = self.pending_query.take()?;
        self.latest_seq += 1;
        let request = SearchRequest {
            query: query.clone(),
            seq: self.latest_seq,
            in_flight: true,
        };
        self.phase = SearchPhase::Searching { query };
        self.current = Some(request.clone());
        Some(request)
    }

    /// Applies a response. Returns `false` when the response was superseded.
    pub(crate) fn resolve(
        &mut self,
        seq: SearchSeq,
        result: Result<SearchPayload, FetchFailure>,
    ) -> bool {
        if seq != self.latest_seq {
            return false;
        }
        let Some(request) = self
            .current
            .as_mut()
            .filter(|request| request.seq == seq && request.in_flight)
        else {
            return false;
        };
        request.in_flight = false;

        self.phase = match result {
            Ok(payload) if payload.is_renderable() => SearchPhase::Results(payload.hits),
            Ok(_) => SearchPhase::NoResults,
            Err(failure) if failure.is_malformed() => SearchPhase::NoResults,
            Err(failure) => SearchPhase::Failed(failure),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(subject: &str) -> SearchPayload {
        SearchPayload {
            status: SUCCESS_STATUS.to_string(),
            hits: vec![SearchHit {
                id: "1".to_string(),
                sender: "a@b.c".to_string(),
                subject: subject.to_string(),
                preview: String::new(),
                relevance_score: 0.5,
                category: "General".to_string(),
                has_attachment: false,
            }],
        }
    }

    #[test]
    fn issue_without_pending_query_is_none() {
        let mut search = SearchState::default();
        assert!(search.issue().is_none());
        assert_eq!(search.latest_seq(), 0);
    }

    #[test]
    fn clear_invalidates_in_flight_request() {
        let mut search = SearchState::default();
        search.set_pending("invoice".to_string());
        let request = search.issue().unwrap();

        assert!(search.clear());
        assert!(!search.resolve(request.seq, Ok(payload("late"))));
        assert_eq!(search.phase(), &SearchPhase::Idle);
    }

    #[test]
    fn duplicate_response_is_applied_once() {
        let mut search = SearchState::default();
        search.set_pending("invoice".to_string());
        let request = search.issue().unwrap();

        assert!(search.resolve(request.seq, Ok(payload("first"))));
        assert!(!search.resolve(request.seq, Err(FetchFailure::Timeout)));
        assert!(matches!(search.phase(), SearchPhase::Results(hits) if hits[0].subject == "first"));
    }

    #[test]
    fn empty_success_and_error_status_render_no_results() {
        let mut search = SearchState::default();
        search.set_pending("invoice".to_string());
        let request = search.issue().unwrap();
        let empty = SearchPayload {
            status: SUCCESS_STATUS.to_string(),
            hits: Vec::new(),
        };
        assert!(search.resolve(request.seq, Ok(empty)));
        assert_eq!(search.phase(), &SearchPhase::NoResults);

        search.set_pending("invoices".to_string());
        let request = search.issue().unwrap();
        let errored = SearchPayload {
            status: "error".to_string(),
            ..payload("ignored")
        };
        assert!(search.resolve(request.seq, Ok(errored)));
        assert_eq!(search.phase(), &SearchPhase::NoResults);
    }
}
