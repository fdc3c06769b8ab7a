//! Session state: credentials, the login gate, and fetch generations
//!
//! All mutation happens synchronously on the caller's thread. A mutation that
//! changes the query while logged in issues a [`FetchRequest`] tagged with a
//! new generation; the outcome of that request is only applied if no newer
//! request has been issued since.

mod runner;

pub use runner::QueryRunner;

use crate::fetch::{FetchError, ResultSet};
use protocol::{
    ConstraintSet, Field, Filter, Operator, ParameterMap, PingResult, TestType, ValidationError,
};
use tracing::{debug, info};

/// Username/password pair, always replaced as a whole
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Any non-empty username counts; the service decides validity
    pub fn is_logged_in(&self) -> bool {
        !self.username.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Login gate derived from the stored credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    LoggedOut,
    LoggedIn,
}

/// A retrieval authorised by the gate, tagged with its generation
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub credentials: Credentials,
    pub test_type: TestType,
    pub params: ParameterMap,
}

/// What happened to a fetch outcome handed back to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Result set replaced
    Updated,
    /// Error recorded, previous result set kept
    Failed,
    /// Superseded by a newer request, or the session logged out meanwhile
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    credentials: Credentials,
    filter: Filter,
    issued: u64,
    in_flight: Option<u64>,
    results: ResultSet,
    last_error: Option<FetchError>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn gate(&self) -> GateState {
        if self.credentials.is_logged_in() {
            GateState::LoggedIn
        } else {
            GateState::LoggedOut
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.gate() == GateState::LoggedIn
    }

    /// Replace both credentials at once
    ///
    /// Opening the gate, or changing the pair while logged in, issues a fetch.
    /// An empty username logs out.
    pub fn set_credentials(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Option<FetchRequest> {
        let credentials = Credentials::new(username, password);
        if credentials == self.credentials {
            return None;
        }

        let was = self.gate();
        self.credentials = credentials;
        let now = self.gate();

        match (was, now) {
            (GateState::LoggedOut, GateState::LoggedOut) => None,
            (GateState::LoggedIn, GateState::LoggedOut) => {
                self.reset_results();
                info!("Logged out");
                None
            }
            (GateState::LoggedOut, GateState::LoggedIn) => {
                info!(
                    username = self.credentials.username(),
                    has_password = !self.credentials.password().is_empty(),
                    "Logged in"
                );
                self.issue()
            }
            (GateState::LoggedIn, GateState::LoggedIn) => {
                debug!(username = self.credentials.username(), "Credentials changed");
                self.issue()
            }
        }
    }

    /// Clear the credentials, drop any results and ignore in-flight fetches
    #[allow(dead_code)]
    pub fn logout(&mut self) {
        self.set_credentials("", "");
    }

    pub fn test_type(&self) -> TestType {
        self.filter.test_type()
    }

    pub fn constraints(&self) -> &ConstraintSet {
        self.filter.constraints()
    }

    /// Parameters the next fetch would carry
    pub fn query(&self) -> ParameterMap {
        self.filter.query()
    }

    /// Switch test type; the previous constraints are discarded
    pub fn select_test_type(&mut self, test_type: TestType) -> Option<FetchRequest> {
        if !self.filter.select(test_type) {
            return None;
        }
        debug!(%test_type, "Test type selected");
        self.issue()
    }

    pub fn set_constraint(
        &mut self,
        field: Field,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<Option<FetchRequest>, ValidationError> {
        let changed = self.filter.constraints_mut().set(field, operator, value)?;
        Ok(self.issue_if(changed))
    }

    /// Same as [`Session::set_constraint`], with the field given by name
    #[allow(dead_code)]
    pub fn set_constraint_named(
        &mut self,
        field: &str,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<Option<FetchRequest>, ValidationError> {
        let changed = self.filter.constraints_mut().set_named(field, operator, value)?;
        Ok(self.issue_if(changed))
    }

    pub fn set_ping_result(
        &mut self,
        result: PingResult,
    ) -> Result<Option<FetchRequest>, ValidationError> {
        let changed = self.filter.constraints_mut().set_ping_result(result)?;
        Ok(self.issue_if(changed))
    }

    #[allow(dead_code)]
    pub fn clear_constraint(
        &mut self,
        field: Field,
        operator: Operator,
    ) -> Result<Option<FetchRequest>, ValidationError> {
        let changed = self.filter.constraints_mut().clear_constraint(field, operator)?;
        Ok(self.issue_if(changed))
    }

    #[allow(dead_code)]
    pub fn clear_constraints(&mut self) -> Option<FetchRequest> {
        let changed = !self.filter.constraints().is_empty();
        self.filter.constraints_mut().clear();
        self.issue_if(changed)
    }

    /// Hand back the outcome of the request tagged `generation`
    pub fn apply(&mut self, generation: u64, outcome: Result<ResultSet, FetchError>) -> Applied {
        if self.in_flight != Some(generation) {
            debug!(
                generation,
                latest = self.issued,
                "Discarding stale fetch outcome"
            );
            return Applied::Stale;
        }
        self.in_flight = None;

        match outcome {
            Ok(records) => {
                debug!(generation, records = records.len(), "Result set replaced");
                self.results = records;
                self.last_error = None;
                Applied::Updated
            }
            Err(err) => {
                self.last_error = Some(err);
                Applied::Failed
            }
        }
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Latest generation issued, 0 before the first fetch
    #[allow(dead_code)]
    pub fn generation(&self) -> u64 {
        self.issued
    }

    #[allow(dead_code)]
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    fn issue_if(&mut self, changed: bool) -> Option<FetchRequest> {
        if changed { self.issue() } else { None }
    }

    fn issue(&mut self) -> Option<FetchRequest> {
        if !self.is_logged_in() {
            debug!("Logged out, no fetch issued");
            return None;
        }

        self.issued += 1;
        self.in_flight = Some(self.issued);

        Some(FetchRequest {
            generation: self.issued,
            credentials: self.credentials.clone(),
            test_type: self.test_type(),
            params: self.query(),
        })
    }

    fn reset_results(&mut self) {
        self.in_flight = None;
        self.results.clear();
        self.last_error = None;
    }
}
