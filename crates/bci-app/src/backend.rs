// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    Generation, GroupMode, LeadListState, LeadRow, ListCommand, ListEvent, PicklistEntry,
    PicklistKind,
};

/// The three operations the external query service provides.
pub trait LeadBackend {
    fn project_count(&mut self, filters_json: &str, group: GroupMode) -> Result<u64>;
    fn projects(&mut self, query: &PageQuery) -> Result<Vec<LeadRow>>;
    fn picklist_values(&mut self, kind: PicklistKind) -> Result<Vec<PicklistEntry>>;
}

impl<B: LeadBackend + ?Sized> LeadBackend for Box<B> {
    fn project_count(&mut self, filters_json: &str, group: GroupMode) -> Result<u64> {
        (**self).project_count(filters_json, group)
    }

    fn projects(&mut self, query: &PageQuery) -> Result<Vec<LeadRow>> {
        (**self).projects(query)
    }

    fn picklist_values(&mut self, kind: PicklistKind) -> Result<Vec<PicklistEntry>> {
        (**self).picklist_values(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub offset: usize,
    pub limit: usize,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub filters_json: String,
    pub group: GroupMode,
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl PartialEq for CancelToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CancelToken {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub generation: Generation,
    pub cancel: CancelToken,
}

impl RequestTicket {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            cancel: CancelToken::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    Count {
        ticket: RequestTicket,
        filters_json: String,
        group: GroupMode,
    },
    Page {
        ticket: RequestTicket,
        query: PageQuery,
    },
    Picklist {
        kind: PicklistKind,
    },
}

impl BackendRequest {
    pub fn ticket(&self) -> Option<&RequestTicket> {
        match self {
            Self::Count { ticket, .. } | Self::Page { ticket, .. } => Some(ticket),
            Self::Picklist { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.ticket()
            .is_some_and(|ticket| ticket.cancel.is_cancelled())
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Count { .. } => "count",
            Self::Page { .. } => "page",
            Self::Picklist { .. } => "picklist",
        }
    }
}

/// Backend error flattened to its message so replies stay cloneable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    message: String,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendFailure {}

impl From<anyhow::Error> for BackendFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(format!("{error:#}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    Count {
        ticket: RequestTicket,
        result: Result<u64, BackendFailure>,
    },
    Page {
        ticket: RequestTicket,
        result: Result<Vec<LeadRow>, BackendFailure>,
    },
    Picklist {
        kind: PicklistKind,
        result: Result<Vec<PicklistEntry>, BackendFailure>,
    },
}

/// Runs one request. Returns `None` when the request was cancelled before it
/// reached the backend.
pub fn execute<B: LeadBackend + ?Sized>(
    backend: &mut B,
    request: BackendRequest,
) -> Option<BackendReply> {
    if request.is_cancelled() {
        tracing::debug!(kind = request.label(), "skipping cancelled request");
        return None;
    }

    let reply = match request {
        BackendRequest::Count {
            ticket,
            filters_json,
            group,
        } => BackendReply::Count {
            result: backend
                .project_count(&filters_json, group)
                .map_err(BackendFailure::from),
            ticket,
        },
        BackendRequest::Page { ticket, query } => {
            tracing::debug!(
                offset = query.offset,
                limit = query.limit,
                generation = ticket.generation.get(),
                "fetching page"
            );
            BackendReply::Page {
                result: backend.projects(&query).map_err(BackendFailure::from),
                ticket,
            }
        }
        BackendRequest::Picklist { kind } => BackendReply::Picklist {
            kind,
            result: backend.picklist_values(kind).map_err(BackendFailure::from),
        },
    };
    Some(reply)
}

/// Dispatches `command` and serves every request it causes, in order, until
/// the controller stops asking. Returns all events, requests included.
pub fn drive<B: LeadBackend + ?Sized>(
    state: &mut LeadListState,
    backend: &mut B,
    command: ListCommand,
) -> Vec<ListEvent> {
    let mut emitted = Vec::new();
    let mut pending = VecDeque::new();
    collect_events(state.dispatch(command), &mut emitted, &mut pending);

    while let Some(request) = pending.pop_front() {
        if let Some(reply) = execute(backend, request) {
            collect_events(
                state.dispatch(ListCommand::Reply(reply)),
                &mut emitted,
                &mut pending,
            );
        }
    }
    emitted
}

fn collect_events(
    events: Vec<ListEvent>,
    emitted: &mut Vec<ListEvent>,
    pending: &mut VecDeque<BackendRequest>,
) {
    for event in events {
        if let ListEvent::Request(request) = &event {
            pending.push_back(request.clone());
        }
        emitted.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendFailure, BackendReply, BackendRequest, CancelToken, RequestTicket, execute};
    use crate::{Generation, GroupMode, LeadBackend, LeadRow, PageQuery, PicklistEntry, PicklistKind};
    use anyhow::{Result, anyhow};

    #[derive(Default)]
    struct CountingBackend {
        calls: usize,
    }

    impl LeadBackend for CountingBackend {
        fn project_count(&mut self, _filters_json: &str, _group: GroupMode) -> Result<u64> {
            self.calls += 1;
            Ok(7)
        }

        fn projects(&mut self, _query: &PageQuery) -> Result<Vec<LeadRow>> {
            self.calls += 1;
            Err(anyhow!("service unavailable").context("fetch page"))
        }

        fn picklist_values(&mut self, _kind: PicklistKind) -> Result<Vec<PicklistEntry>> {
            self.calls += 1;
            Ok(Vec::new())
        }
    }

    #[test]
    fn cancel_token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert_eq!(token, clone);
        assert_ne!(token, CancelToken::new());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancelled_requests_never_reach_the_backend() {
        let mut backend = CountingBackend::default();
        let ticket = RequestTicket::new(Generation::new(1));
        ticket.cancel.cancel();
        let reply = execute(
            &mut backend,
            BackendRequest::Count {
                ticket,
                filters_json: "{}".to_owned(),
                group: GroupMode::All,
            },
        );
        assert!(reply.is_none());
        assert_eq!(backend.calls, 0);
    }

    #[test]
    fn backend_errors_become_failures_with_context() {
        let mut backend = CountingBackend::default();
        let ticket = RequestTicket::new(Generation::new(3));
        let reply = execute(
            &mut backend,
            BackendRequest::Page {
                ticket: ticket.clone(),
                query: PageQuery {
                    offset: 0,
                    limit: 150,
                    sort_by: None,
                    sort_direction: None,
                    filters_json: "{}".to_owned(),
                    group: GroupMode::Followed,
                },
            },
        );
        assert_eq!(
            reply,
            Some(BackendReply::Page {
                ticket,
                result: Err(BackendFailure::new("fetch page: service unavailable")),
            })
        );
    }
}
