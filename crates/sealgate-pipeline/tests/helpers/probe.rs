//! Engine wrapper that records handle traffic for assertions.

use async_trait::async_trait;
use sealgate_core::models::{ContentLabel, Label};
use sealgate_engine::{
    CommitTarget, EngineError, EngineResult, FileHandle, LabelingOptions, MemoryEngine,
    ProtectionEngine, ProtectionHandle, ProtectionSettings,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Counters and scripting knobs shared between a test and its engine.
#[derive(Default)]
pub struct Probe {
    pub opens: AtomicUsize,
    pub disposes: AtomicUsize,
    pub open_names: Mutex<Vec<String>>,
    /// Commit target kinds in call order: "buffer" or "path".
    pub commits: Mutex<Vec<&'static str>>,
    pub set_label_calls: AtomicUsize,
    pub labels_applied: Mutex<Vec<String>>,
    /// Fail this many `set_label` calls before letting one through.
    pub label_failures: AtomicUsize,
    /// Answer every commit with `Ok(false)`.
    pub decline_commit: AtomicBool,
    /// Cancel the token when the n-th open completes.
    pub cancel_at: Mutex<Option<(usize, CancellationToken)>>,
}

impl Probe {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn disposes(&self) -> usize {
        self.disposes.load(Ordering::SeqCst)
    }

    pub fn commit_kinds(&self) -> Vec<&'static str> {
        self.commits.lock().unwrap().clone()
    }

    pub fn open_names(&self) -> Vec<String> {
        self.open_names.lock().unwrap().clone()
    }

    pub fn labels_applied(&self) -> Vec<String> {
        self.labels_applied.lock().unwrap().clone()
    }

    pub fn fail_labeling(&self, times: usize) {
        self.label_failures.store(times, Ordering::SeqCst);
    }

    pub fn decline_commits(&self) {
        self.decline_commit.store(true, Ordering::SeqCst);
    }

    pub fn cancel_at_open(&self, nth: usize, token: CancellationToken) {
        *self.cancel_at.lock().unwrap() = Some((nth, token));
    }
}

/// Engine that fails the test if the pipeline ever consults it.
pub struct NeverEngine;

#[async_trait]
impl ProtectionEngine for NeverEngine {
    async fn open(
        &self,
        _content: &[u8],
        name: &str,
        _audit_discovery: bool,
    ) -> EngineResult<Box<dyn FileHandle>> {
        panic!("engine consulted for {}", name);
    }

    fn default_label(&self) -> Option<Label> {
        panic!("engine consulted for a default label");
    }

    fn labels(&self) -> Vec<Label> {
        panic!("engine consulted for the label catalog");
    }
}

/// [`MemoryEngine`] wrapper whose handles report into a shared [`Probe`].
pub struct InstrumentedEngine {
    inner: MemoryEngine,
    probe: Arc<Probe>,
}

impl InstrumentedEngine {
    pub fn new(inner: MemoryEngine) -> Self {
        InstrumentedEngine {
            inner,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn probe(&self) -> Arc<Probe> {
        self.probe.clone()
    }
}

#[async_trait]
impl ProtectionEngine for InstrumentedEngine {
    async fn open(
        &self,
        content: &[u8],
        name: &str,
        audit_discovery: bool,
    ) -> EngineResult<Box<dyn FileHandle>> {
        let handle = self.inner.open(content, name, audit_discovery).await?;
        let count = self.probe.opens.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.open_names.lock().unwrap().push(name.to_string());
        if let Some((nth, token)) = &*self.probe.cancel_at.lock().unwrap() {
            if count == *nth {
                token.cancel();
            }
        }
        Ok(Box::new(InstrumentedHandle {
            inner: handle,
            probe: self.probe.clone(),
        }))
    }

    fn default_label(&self) -> Option<Label> {
        self.inner.default_label()
    }

    fn labels(&self) -> Vec<Label> {
        self.inner.labels()
    }
}

pub struct InstrumentedHandle {
    inner: Box<dyn FileHandle>,
    probe: Arc<Probe>,
}

#[async_trait]
impl FileHandle for InstrumentedHandle {
    fn label(&self) -> Option<ContentLabel> {
        self.inner.label()
    }

    fn protection(&self) -> Option<&dyn ProtectionHandle> {
        self.inner.protection()
    }

    fn set_label(
        &mut self,
        label: &Label,
        options: &LabelingOptions,
        settings: &ProtectionSettings,
    ) -> EngineResult<()> {
        self.probe.set_label_calls.fetch_add(1, Ordering::SeqCst);
        if self.probe.label_failures.load(Ordering::SeqCst) > 0 {
            self.probe.label_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::JustificationRequired(
                "scripted labeling failure".to_string(),
            ));
        }
        self.inner.set_label(label, options, settings)?;
        self.probe
            .labels_applied
            .lock()
            .unwrap()
            .push(label.name.clone());
        Ok(())
    }

    async fn commit(&mut self, target: CommitTarget<'_>) -> EngineResult<bool> {
        let kind = match &target {
            CommitTarget::Buffer(_) => "buffer",
            CommitTarget::Path(_) => "path",
        };
        self.probe.commits.lock().unwrap().push(kind);
        if self.probe.decline_commit.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.commit(target).await
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        self.probe.disposes.fetch_add(1, Ordering::SeqCst);
        self.inner.dispose().await
    }
}
