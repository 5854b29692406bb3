/// Error hook: observes every failed request.
///
/// Called synchronously, once per failure, before the error is returned.
/// It cannot change or swallow the error.
use handoff_store::RequestContext;

use crate::error::HandoffError;

pub trait ErrorHook: Send + Sync {
    fn notify(&self, ctx: &RequestContext, err: &HandoffError);
}

impl<F> ErrorHook for F
where
    F: Fn(&RequestContext, &HandoffError) + Send + Sync,
{
    fn notify(&self, ctx: &RequestContext, err: &HandoffError) {
        self(ctx, err)
    }
}

/// Reports failures through `tracing`.
///
/// Operator problems (configuration, store) log at `warn`; caller problems
/// (bad input, failed authorization, cancellation) at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl ErrorHook for TracingHook {
    fn notify(&self, ctx: &RequestContext, err: &HandoffError) {
        match err {
            HandoffError::NotConfigured { .. } | HandoffError::Store { .. } => {
                tracing::warn!(request_id = %ctx.request_id(), "handoff failed: {err}");
            }
            HandoffError::BadRequest { .. }
            | HandoffError::Unauthorized
            | HandoffError::Cancelled => {
                tracing::debug!(request_id = %ctx.request_id(), "handoff rejected: {err}");
            }
        }
    }
}
