//! Drives a session against a record source

use super::{Applied, Credentials, FetchRequest, Session};
use crate::fetch::{FetchError, RecordSource, ResultSet};
use protocol::{Field, Operator, PingResult, TestType, ValidationError};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

type Outcome = (u64, Result<ResultSet, FetchError>);

/// Owns the session and runs every request it issues in the background
///
/// Mutations return as soon as the session has been updated. Each issued
/// request is fetched on its own task; [`QueryRunner::next_outcome`] hands
/// completions back to the session in the order they finish, where outcomes
/// of superseded generations are discarded.
pub struct QueryRunner<S> {
    session: Session,
    source: Arc<S>,
    pending: JoinSet<Outcome>,
}

impl<S: RecordSource> QueryRunner<S> {
    pub fn new(source: S) -> Self {
        Self {
            session: Session::new(),
            source: Arc::new(source),
            pending: JoinSet::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Replace both credentials, returning the pair now in effect
    pub fn set_credentials(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> &Credentials {
        let request = self.session.set_credentials(username, password);
        self.spawn(request);
        self.session.credentials()
    }

    /// Pending fetches keep running; their outcomes are discarded
    #[allow(dead_code)]
    pub fn logout(&mut self) {
        self.session.logout();
    }

    pub fn select_test_type(&mut self, test_type: TestType) -> bool {
        let request = self.session.select_test_type(test_type);
        self.spawn(request)
    }

    pub fn set_constraint(
        &mut self,
        field: Field,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<bool, ValidationError> {
        let request = self.session.set_constraint(field, operator, value)?;
        Ok(self.spawn(request))
    }

    pub fn set_ping_result(&mut self, result: PingResult) -> Result<bool, ValidationError> {
        let request = self.session.set_ping_result(result)?;
        Ok(self.spawn(request))
    }

    #[allow(dead_code)]
    pub fn clear_constraint(
        &mut self,
        field: Field,
        operator: Operator,
    ) -> Result<bool, ValidationError> {
        let request = self.session.clear_constraint(field, operator)?;
        Ok(self.spawn(request))
    }

    /// Fetches started and not yet handed back
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for the next fetch to finish and hand its outcome to the session
    ///
    /// Returns `None` once nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<Applied> {
        loop {
            match self.pending.join_next().await? {
                Ok((generation, outcome)) => return Some(self.apply(generation, outcome)),
                Err(err) => warn!("Fetch task failed: {}", err),
            }
        }
    }

    /// Hand back every pending outcome, in completion order
    pub async fn settle(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Some(result) = self.next_outcome().await {
            applied.push(result);
        }
        applied
    }

    fn spawn(&mut self, request: Option<FetchRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };

        debug!(
            generation = request.generation,
            test_type = %request.test_type,
            "Fetch started"
        );
        let source = Arc::clone(&self.source);
        self.pending.spawn(async move {
            let outcome = source.fetch(&request).await;
            (request.generation, outcome)
        });
        true
    }

    fn apply(&mut self, generation: u64, outcome: Result<ResultSet, FetchError>) -> Applied {
        if let Err(err) = &outcome {
            warn!(kind = err.kind(), generation, "Fetch failed: {}", err);
        }
        self.session.apply(generation, outcome)
    }
}
