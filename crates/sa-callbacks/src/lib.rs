//! Composable before/after callback chains (C4).
//!
//! Section 4.4 describes three independent chains — Agent, Model, Tool —
//! each with `before` and `after` hooks registered in order. This crate
//! implements one generic `CallbackChain<Ctx, R>` rather than three
//! hand-written chain types: `sa-agent` instantiates it once per seam with
//! its own context and result types. No virtual dispatch beyond the
//! trait-object hook list is needed, matching Design Note "Callbacks as
//! composable chains" (Section 9).
//!
//! Hooks are `async_trait` objects (not plain closures) so a hook can do
//! its own I/O — logging, a retry, an external policy check — the same way
//! every other pluggable seam in this workspace (`LlmProvider`, `Tool`,
//! `Session::Service`) is an async trait object rather than a function
//! pointer.

use async_trait::async_trait;
use sa_domain::error::{Error, Result};

/// Returned by a `before` hook: either let the step proceed, or short-circuit
/// it with a ready-made result.
pub enum BeforeOutcome<R> {
    Continue,
    Override(R),
}

#[async_trait]
pub trait BeforeHook<Ctx, R>: Send + Sync
where
    Ctx: Send + Sync,
    R: Send + Sync,
{
    async fn call(&self, ctx: &Ctx) -> Result<BeforeOutcome<R>>;
}

#[async_trait]
pub trait AfterHook<Ctx, R>: Send + Sync
where
    Ctx: Send + Sync,
    R: Send + Sync,
{
    /// `error` carries the run error, if the wrapped step failed; the hook
    /// may still replace the result (e.g. to substitute a fallback).
    async fn call(&self, ctx: &Ctx, result: &R, error: Option<&Error>) -> Option<R>;
}

/// One before/after chain for a single seam (Agent, Model, or Tool).
pub struct CallbackChain<Ctx, R> {
    before: Vec<Box<dyn BeforeHook<Ctx, R>>>,
    after: Vec<Box<dyn AfterHook<Ctx, R>>>,
}

impl<Ctx, R> Default for CallbackChain<Ctx, R> {
    fn default() -> Self {
        Self { before: Vec::new(), after: Vec::new() }
    }
}

impl<Ctx, R> CallbackChain<Ctx, R>
where
    Ctx: Send + Sync,
    R: Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_before(&mut self, hook: Box<dyn BeforeHook<Ctx, R>>) {
        self.before.push(hook);
    }

    pub fn register_after(&mut self, hook: Box<dyn AfterHook<Ctx, R>>) {
        self.after.push(hook);
    }

    /// Runs `before` hooks in registration order. Stops at the first
    /// `Override`, which becomes the result (still passed through `after`
    /// by the caller). Fails fast on the first hook error.
    pub async fn run_before(&self, ctx: &Ctx) -> Result<Option<R>> {
        for hook in &self.before {
            if let BeforeOutcome::Override(r) = hook.call(ctx).await? {
                return Ok(Some(r));
            }
        }
        Ok(None)
    }

    /// Runs `after` hooks in registration order, threading each hook's
    /// replacement (if any) into the next.
    pub async fn run_after(&self, ctx: &Ctx, result: R, error: Option<&Error>) -> R {
        let mut current = result;
        for hook in &self.after {
            if let Some(replacement) = hook.call(ctx, &current, error).await {
                current = replacement;
            }
        }
        current
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}
