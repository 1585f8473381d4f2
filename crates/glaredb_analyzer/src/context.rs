use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{AnalyzerError, Result};

/// Context threaded through a single analysis.
///
/// Cloning the context shares its cancellation state, so a clone handed to
/// another thread can cancel the analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    state: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    canceled: AtomicBool,
    /// Context this one was created from. Canceling a parent cancels every
    /// context below it.
    parent: Option<Arc<CancelState>>,
}

impl CancelState {
    fn is_canceled(&self) -> bool {
        if self.canceled.load(Ordering::Acquire) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_canceled(),
            None => false,
        }
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this context and every sub context created from it.
    pub fn cancel(&self) {
        self.state.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.state.is_canceled()
    }

    /// Return an error if this context or any of its parents were canceled.
    pub fn check_canceled(&self) -> Result<()> {
        if self.is_canceled() {
            return Err(AnalyzerError::Canceled);
        }
        Ok(())
    }

    /// Create a context for analyzing a nested query.
    ///
    /// The sub context is canceled when the returned guard is dropped, which
    /// happens on every exit path of the caller.
    pub fn new_sub_context(&self) -> (AnalysisContext, SubContextGuard) {
        let state = Arc::new(CancelState {
            canceled: AtomicBool::new(false),
            parent: Some(self.state.clone()),
        });
        let guard = SubContextGuard {
            state: state.clone(),
        };
        (AnalysisContext { state }, guard)
    }
}

/// Cancels a sub context on drop.
#[derive(Debug)]
#[must_use]
pub struct SubContextGuard {
    state: Arc<CancelState>,
}

impl Drop for SubContextGuard {
    fn drop(&mut self) {
        self.state.canceled.store(true, Ordering::Release);
    }
}
