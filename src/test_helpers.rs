//! Shared test helpers: an in-process scripted backend.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::client::StatusApi;
use crate::error::{Error, Result};
use crate::types::{Credentials, StatusQuery, StatusResult, UserProfile};

/// What the scripted backend does for one status request
pub(crate) enum Step {
    /// Answer with this result
    Respond(Result<StatusResult>),
    /// Never answer
    Hang,
}

/// One observed status request
#[derive(Clone, Debug)]
pub(crate) struct Call {
    pub(crate) query: StatusQuery,
    pub(crate) started: Instant,
    pub(crate) finished: Option<Instant>,
}

/// Backend fake that replays scripted answers in order and records timing
#[derive(Default)]
pub(crate) struct ScriptedApi {
    login: Mutex<Option<Result<UserProfile>>>,
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
    called: Notify,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_login(self, result: Result<UserProfile>) -> Self {
        *self.login.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn then(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub(crate) fn then_status(self, result: StatusResult) -> Self {
        self.then(Step::Respond(Ok(result)))
    }

    pub(crate) fn then_error(self, error: Error) -> Self {
        self.then(Step::Respond(Err(error)))
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until at least `n` status requests have been issued
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.calls.lock().unwrap().len() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl StatusApi for ScriptedApi {
    async fn login(&self, _credentials: &Credentials) -> Result<UserProfile> {
        self.login
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(Error::Protocol {
                endpoint: "/login".into(),
                status: 500,
            }))
    }

    async fn ipo_status(&self, query: &StatusQuery) -> Result<StatusResult> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                query: query.clone(),
                started: Instant::now(),
                finished: None,
            });
            calls.len() - 1
        };
        self.called.notify_waiters();

        let step = self.steps.lock().unwrap().pop_front();
        let result = match step {
            Some(Step::Respond(result)) => result,
            Some(Step::Hang) => std::future::pending().await,
            None => panic!("unscripted status request for {}", query.pan_number),
        };

        self.calls.lock().unwrap()[index].finished = Some(Instant::now());
        result
    }
}

pub(crate) fn profile(pans: &[&str]) -> UserProfile {
    UserProfile {
        email: "a@b.c".into(),
        id: "42".into(),
        name: "Asha".into(),
        phone_number: "9999999999".into(),
        pan_numbers: pans.iter().map(|p| p.to_string()).collect(),
    }
}

pub(crate) fn status(pan: &str, applied: bool, alloted: bool, quantity: &str) -> StatusResult {
    StatusResult {
        ipo_name: "X Ltd".into(),
        is_alloted: alloted,
        is_applied: applied,
        pan_number: pan.into(),
        securities_alloted: quantity.into(),
    }
}
