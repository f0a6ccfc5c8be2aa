use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use fdo_notify::{DbusMethod, DbusSignal, NotifyError, RawSignal, Result, SignalSink, Transport, Value};

/// Records every call and answers from a per-method script.
#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<(DbusMethod, Vec<Value>)>>,
    replies: Mutex<HashMap<DbusMethod, VecDeque<Result<Vec<Value>>>>>,
    sink: Mutex<Option<SignalSink>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, method: DbusMethod, values: Vec<Value>) -> Self {
        self.push(method, Ok(values));
        self
    }

    pub fn fail(self, method: DbusMethod, err: NotifyError) -> Self {
        self.push(method, Err(err));
        self
    }

    fn push(&self, method: DbusMethod, reply: Result<Vec<Value>>) {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<(DbusMethod, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: DbusMethod) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, args)| args)
            .collect()
    }

    pub fn emit_raw(&self, member: &str, args: Vec<Value>) {
        let sink = self.sink.lock().unwrap().clone().expect("nobody subscribed");
        sink(RawSignal { member: member.to_owned(), args });
    }

    pub fn emit(&self, signal: &DbusSignal) {
        self.emit_raw(signal.member(), signal.to_args());
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn call(&self, method: DbusMethod, args: Vec<Value>) -> Result<Vec<Value>> {
        self.calls.lock().unwrap().push((method, args));
        self.replies
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn subscribe(&self, sink: SignalSink) -> Result<()> {
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }
}
