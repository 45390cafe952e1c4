//! Workflow-server operations.
//!
//! ## Paging semantics
//!
//! A reconciled record transitions to a status outside the candidate
//! query's filter, so [`WorkflowClient::query_all`] never advances an
//! offset cursor: it re-issues the identical query and expects the result
//! set to shrink as records are processed. An empty page ends the loop; a
//! result set that survives [`MAX_QUERY_PAGES`] re-queries means the
//! status-transition contract is broken and continuing would loop forever.

use serde_json::{json, Value};

use shapesync_core::types::{LayoutCandidate, LayoutId};

use crate::error::{comm_err, ClientError};
use crate::protocol::{RowSet, SearchParam};
use crate::transport::Transport;

/// Hard ceiling on re-issued query pages per run.
pub const MAX_QUERY_PAGES: u32 = 100;

/// Properties requested for every candidate query.
const CANDIDATE_PROPS: &[&str] = &["ID", "Version", "Name", "PublicationId"];

/// One decoded query page.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub candidates: Vec<LayoutCandidate>,
    /// Entry count the server reported for this page.
    pub listed: usize,
}

/// One workflow status a publication defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDef {
    pub id: String,
    pub name: String,
}

/// Authenticated workflow-server client.
pub struct WorkflowClient {
    transport: Box<dyn Transport>,
    ticket: String,
}

impl WorkflowClient {
    pub fn new(transport: Box<dyn Transport>, ticket: impl Into<String>) -> Self {
        Self {
            transport,
            ticket: ticket.into(),
        }
    }

    /// `LogOn` — authenticate and collect the advertised named queries.
    ///
    /// Static: this is the one call made without a ticket.
    pub fn log_on(
        transport: &dyn Transport,
        user: &str,
        password: &str,
    ) -> Result<(String, Vec<String>), ClientError> {
        let result = transport.call(
            "LogOn",
            json!({
                "User": user,
                "Password": password,
                "ClientAppName": "shapesync",
            }),
        )?;
        let ticket = result
            .get("Ticket")
            .and_then(Value::as_str)
            .ok_or_else(|| comm_err("LogOn: response has no Ticket"))?
            .to_owned();
        let named_queries = result
            .get("NamedQueries")
            .and_then(Value::as_array)
            .map(|queries| {
                queries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Ok((ticket, named_queries))
    }

    /// `LogOff` — invalidate the ticket server-side.
    pub fn log_off(&self) -> Result<(), ClientError> {
        self.transport
            .call("LogOff", json!({"Ticket": self.ticket}))?;
        Ok(())
    }

    /// `QueryObjects` — one page of the named candidate query.
    pub fn query_page(
        &self,
        query: &str,
        params: &[SearchParam],
        first_entry: u32,
        max_entries: u32,
    ) -> Result<QueryPage, ClientError> {
        let result = self.transport.call(
            "QueryObjects",
            json!({
                "Ticket": self.ticket,
                "Query": query,
                "Params": params,
                "FirstEntry": first_entry,
                "MaxEntries": max_entries,
                "RequestProps": CANDIDATE_PROPS,
            }),
        )?;

        let rows = RowSet::from_result(&result, "QueryObjects")?;
        let listed = result
            .get("ListedEntries")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or_else(|| rows.len());

        let mut candidates = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            candidates.push(candidate_from_row(&rows, i)?);
        }
        Ok(QueryPage { candidates, listed })
    }

    /// Re-issue the candidate query until it drains, handing each page to
    /// `on_page`. Returns the number of non-empty pages processed.
    ///
    /// See the module docs for why the cursor never advances, and
    /// [`ClientError::TooManyPages`] for the safety trip.
    pub fn query_all<E, F>(
        &self,
        query: &str,
        params: &[SearchParam],
        page_size: u32,
        mut on_page: F,
    ) -> Result<u32, E>
    where
        E: From<ClientError>,
        F: FnMut(Vec<LayoutCandidate>) -> Result<(), E>,
    {
        let mut pages = 0u32;
        loop {
            let page = self.query_page(query, params, 1, page_size)?;
            if page.candidates.is_empty() {
                return Ok(pages);
            }
            pages += 1;
            tracing::debug!("query page {pages}: {} candidate(s)", page.candidates.len());
            on_page(page.candidates)?;
            if pages >= MAX_QUERY_PAGES {
                return Err(ClientError::TooManyPages { pages }.into());
            }
        }
    }

    /// `SetObjectStatus` — transition a batch of ids to one status. A batch
    /// is posted whole or not at all; retry policy belongs to the caller's
    /// transport, not here.
    pub fn set_status(&self, ids: &[LayoutId], status_id: &str) -> Result<(), ClientError> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids: Vec<&str> = ids.iter().map(|id| id.0.as_str()).collect();
        self.transport.call(
            "SetObjectStatus",
            json!({
                "Ticket": self.ticket,
                "IDs": ids,
                "StatusId": status_id,
            }),
        )?;
        Ok(())
    }

    /// `GetStates` — the statuses one publication defines.
    pub fn publication_statuses(
        &self,
        publication_id: &str,
    ) -> Result<Vec<StatusDef>, ClientError> {
        let result = self.transport.call(
            "GetStates",
            json!({
                "Ticket": self.ticket,
                "PublicationId": publication_id,
            }),
        )?;
        let states = result
            .get("States")
            .and_then(Value::as_array)
            .ok_or_else(|| comm_err("GetStates: result has no States array"))?;

        let mut defs = Vec::with_capacity(states.len());
        for state in states {
            let id = match state.get("Id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(comm_err("GetStates: state has no Id")),
            };
            let name = state
                .get("Name")
                .and_then(Value::as_str)
                .ok_or_else(|| comm_err("GetStates: state has no Name"))?
                .to_owned();
            defs.push(StatusDef { id, name });
        }
        Ok(defs)
    }
}

fn candidate_from_row(rows: &RowSet, row: usize) -> Result<LayoutCandidate, ClientError> {
    let id = rows.scalar(row, "ID")?;
    let version = rows.scalar(row, "Version")?;
    let version = version
        .parse()
        .map_err(|e| comm_err(format!("candidate {id}: {e}")))?;
    let name = match rows.value(row, "Name") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    Ok(LayoutCandidate {
        id: LayoutId(id),
        version,
        name,
        publication_id: rows.scalar(row, "PublicationId")?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use shapesync_core::types::LayoutVersion;

    type CallLog = Rc<RefCell<Vec<(String, Value)>>>;

    /// Scripted transport: pops pre-recorded results per call, falling back
    /// to `repeat` once the script runs dry. Records every call it sees.
    struct Scripted {
        script: RefCell<VecDeque<Value>>,
        repeat: Option<Value>,
        calls: CallLog,
    }

    impl Scripted {
        fn new(script: Vec<Value>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                repeat: None,
                calls: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn repeating(value: Value) -> Self {
            Self {
                script: RefCell::new(VecDeque::new()),
                repeat: Some(value),
                calls: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Handle to the call log that survives moving `self` into a client.
        fn log(&self) -> CallLog {
            Rc::clone(&self.calls)
        }
    }

    impl Transport for Scripted {
        fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
            self.calls.borrow_mut().push((method.to_owned(), params));
            if let Some(next) = self.script.borrow_mut().pop_front() {
                return Ok(next);
            }
            match &self.repeat {
                Some(value) => Ok(value.clone()),
                None => Err(comm_err("scripted transport exhausted")),
            }
        }
    }

    fn page(rows: Vec<Value>) -> Value {
        let listed = rows.len();
        json!({
            "Columns": ["ID", "Version", "Name", "PublicationId"],
            "Rows": rows,
            "ListedEntries": listed,
        })
    }

    fn row(id: &str, version: &str) -> Value {
        json!([id, version, format!("Layout {id}"), "pub-1"])
    }

    #[test]
    fn log_on_returns_ticket_and_named_queries() {
        let transport = Scripted::new(vec![json!({
            "Ticket": "tkt-9",
            "NamedQueries": ["Article Shape Candidates", "Overnight Pages"],
        })]);
        let (ticket, queries) = WorkflowClient::log_on(&transport, "shapes", "pw").unwrap();
        assert_eq!(ticket, "tkt-9");
        assert_eq!(queries.len(), 2);
        // Password travels in params; ticket does not (there is none yet).
        let calls = transport.calls.borrow();
        assert_eq!(calls[0].0, "LogOn");
        assert_eq!(calls[0].1["Password"], json!("pw"));
    }

    #[test]
    fn log_on_without_ticket_is_communication_error() {
        let transport = Scripted::new(vec![json!({"NamedQueries": []})]);
        let err = WorkflowClient::log_on(&transport, "shapes", "pw").unwrap_err();
        assert!(matches!(err, ClientError::Communication { .. }));
    }

    #[test]
    fn query_page_decodes_candidates_from_permuted_columns() {
        let transport = Scripted::new(vec![json!({
            "Columns": ["Name", "PublicationId", "ID", "Version"],
            "Rows": [["Acme Lead", "pub-7", 4821, "3.2"]],
        })]);
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        let page = client
            .query_page("Article Shape Candidates", &[], 1, 50)
            .unwrap();
        assert_eq!(page.listed, 1);
        assert_eq!(
            page.candidates[0],
            LayoutCandidate {
                id: LayoutId::from("4821"),
                version: LayoutVersion::new(3, 2),
                name: "Acme Lead".to_owned(),
                publication_id: "pub-7".to_owned(),
            }
        );
    }

    #[test]
    fn query_page_defaults_missing_name_column() {
        let transport = Scripted::new(vec![json!({
            "Columns": ["ID", "Version", "PublicationId"],
            "Rows": [["100", "1.0", "pub-1"]],
        })]);
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        let page = client.query_page("Q", &[], 1, 50).unwrap();
        assert_eq!(page.candidates[0].name, "");
    }

    #[test]
    fn query_page_rejects_malformed_version() {
        let transport = Scripted::new(vec![page(vec![row("100", "not-a-version")])]);
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        let err = client.query_page("Q", &[], 1, 50).unwrap_err();
        assert!(matches!(err, ClientError::Communication { .. }));
    }

    #[test]
    fn query_all_terminates_when_result_set_drains() {
        let transport = Scripted::new(vec![
            page(vec![row("1", "1.0"), row("2", "1.0")]),
            page(vec![row("3", "1.0")]),
            page(vec![]),
        ]);
        let client = WorkflowClient::new(Box::new(transport), "tkt");

        let mut seen = Vec::new();
        let pages: u32 = client
            .query_all::<ClientError, _>("Q", &[], 50, |candidates| {
                seen.extend(candidates);
                Ok(())
            })
            .unwrap();
        assert_eq!(pages, 2);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn query_all_keeps_first_entry_pinned() {
        let transport = Scripted::new(vec![page(vec![row("1", "1.0")]), page(vec![])]);
        let log = transport.log();
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        client
            .query_all::<ClientError, _>("Q", &[], 50, |_| Ok(()))
            .unwrap();
        // Both QueryObjects calls must re-issue from entry 1: processed
        // records leave the filter, so there is no offset to advance.
        let calls = log.borrow();
        assert_eq!(calls.len(), 2);
        for (method, params) in calls.iter() {
            assert_eq!(method, "QueryObjects");
            assert_eq!(params["FirstEntry"], json!(1));
        }
    }

    #[test]
    fn query_all_trips_after_exactly_the_page_ceiling() {
        let transport = Scripted::repeating(page(vec![row("1", "1.0")]));
        let client = WorkflowClient::new(Box::new(transport), "tkt");

        let mut pages_seen = 0u32;
        let err = client
            .query_all::<ClientError, _>("Q", &[], 50, |_| {
                pages_seen += 1;
                Ok(())
            })
            .unwrap_err();
        match err {
            ClientError::TooManyPages { pages } => assert_eq!(pages, MAX_QUERY_PAGES),
            other => panic!("expected TooManyPages, got {other:?}"),
        }
        assert_eq!(pages_seen, MAX_QUERY_PAGES);
    }

    #[test]
    fn set_status_posts_one_batch() {
        let transport = Scripted::new(vec![json!({})]);
        let log = transport.log();
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        client
            .set_status(&[LayoutId::from("1"), LayoutId::from("2")], "status-9")
            .unwrap();
        let calls = log.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "SetObjectStatus");
        assert_eq!(calls[0].1["IDs"], json!(["1", "2"]));
        assert_eq!(calls[0].1["StatusId"], json!("status-9"));
        assert_eq!(calls[0].1["Ticket"], json!("tkt"));
    }

    #[test]
    fn set_status_with_no_ids_makes_no_call() {
        // An exhausted script errors on any call; empty input must not call.
        let transport = Scripted::new(vec![]);
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        client.set_status(&[], "status-9").unwrap();
    }

    #[test]
    fn publication_statuses_decodes_ids_and_names() {
        let transport = Scripted::new(vec![json!({
            "States": [
                {"Id": 10, "Name": "Shape Extracted"},
                {"Id": "11", "Name": "Shape Extraction Failed"},
            ],
        })]);
        let client = WorkflowClient::new(Box::new(transport), "tkt");
        let statuses = client.publication_statuses("pub-1").unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].id, "10");
        assert_eq!(statuses[1].name, "Shape Extraction Failed");
    }
}
