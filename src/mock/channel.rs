//! Mock Channel Implementation
//!
//! In-process channel that answers each sent request through a responder
//! closure. Replies are queued per calling thread, so a thread always receives
//! the reply to its own request even when many threads share one channel.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use serde_json::Value;
use xeth_protocol::{ErrorObject, Request, Response};

use crate::client::{Channel, ChannelError};

use super::failure::{ChannelFailure, Direction, FailureConfig, FailureInjector};

type Responder = dyn Fn(&Request) -> Response + Send + Sync;

/// Scriptable channel for tests
pub struct MockChannel {
    responder: Box<Responder>,
    /// Replies not yet received, per sending thread
    pending: Mutex<HashMap<ThreadId, VecDeque<Response>>>,
    /// Every request accepted by `send`, in order
    sent: Mutex<Vec<Request>>,
    receive_calls: AtomicUsize,
    failures: Mutex<FailureInjector>,
}

impl MockChannel {
    /// Answer each request with whatever `responder` builds for it
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            pending: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            receive_calls: AtomicUsize::new(0),
            failures: Mutex::new(FailureInjector::new()),
        }
    }

    /// Succeed with `result`, echoing the request id
    pub fn echo_result(result: Value) -> Self {
        Self::new(move |request| Response::success(request.id, result.clone()))
    }

    /// Fail with `error`, echoing the request id
    pub fn remote_error(error: ErrorObject) -> Self {
        Self::new(move |request| Response::error(Some(request.id), error.clone()))
    }

    /// Always reply with the same envelope, whatever was asked
    pub fn replying(response: Response) -> Self {
        Self::new(move |_| response.clone())
    }

    /// Inject a failure for a direction
    pub fn inject(&self, direction: Direction, config: FailureConfig) {
        self.failures.lock().unwrap().inject(direction, config);
    }

    pub fn fail_send(&self, failure: ChannelFailure) {
        self.failures.lock().unwrap().inject_error(Direction::Send, failure);
    }

    pub fn fail_receive(&self, failure: ChannelFailure) {
        self.failures.lock().unwrap().inject_error(Direction::Receive, failure);
    }

    /// Requests accepted so far
    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of times `receive` was called, failed calls included
    pub fn receive_count(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    fn injected(&self, direction: Direction) -> Result<(), ChannelError> {
        match self.failures.lock().unwrap().check(direction) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

impl Channel for MockChannel {
    fn send(&self, request: &Request) -> Result<(), ChannelError> {
        self.injected(Direction::Send)?;

        self.sent.lock().unwrap().push(request.clone());
        let reply = (self.responder)(request);
        self.pending
            .lock()
            .unwrap()
            .entry(thread::current().id())
            .or_default()
            .push_back(reply);
        Ok(())
    }

    fn receive(&self) -> Result<Response, ChannelError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        self.injected(Direction::Receive)?;

        self.pending
            .lock()
            .unwrap()
            .get_mut(&thread::current().id())
            .and_then(VecDeque::pop_front)
            .ok_or(ChannelError::Closed)
    }
}
