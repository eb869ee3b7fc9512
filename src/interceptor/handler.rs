//! Unary call interceptor producing audit requests.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::audit::{AuditRequest, CallStatus};
use crate::context::CallContext;
use crate::pipeline::{Client, PipelineError};
use crate::rules::{most_relevant, Rule};
use crate::security::{FromRawJwt, PrincipalError};

use super::method::MethodName;
use super::status::{Code, Status};
use super::structured::to_struct;

/// Errors returned by [`AuditInterceptor::intercept`].
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    /// The caller could not be identified; the handler did not run.
    #[error("failed to resolve principal: {0}")]
    Principal(#[from] PrincipalError),

    /// The handler itself failed. The status is passed through unchanged.
    #[error("handler failed: {0}")]
    Handler(Status),

    /// Audit logging failed in fail-close mode; the handler's result was discarded.
    #[error("audit logging failed: {0}")]
    AuditLog(#[from] PipelineError),
}

impl InterceptError {
    /// Convert into the status to return to the RPC client.
    #[must_use]
    pub fn into_status(self) -> Status {
        match self {
            Self::Principal(e) => Status::unauthenticated(e.to_string()),
            Self::Handler(status) => status,
            Self::AuditLog(e) => Status::internal(format!("audit logging failed: {e}")),
        }
    }
}

/// Wraps unary handlers with audit logging.
///
/// For every call the interceptor resolves the principal, picks the governing
/// rule, runs the handler and submits the resulting record to the [`Client`].
#[derive(Debug, Clone)]
pub struct AuditInterceptor {
    principal: FromRawJwt,
    rules: Vec<Rule>,
    client: Arc<Client>,
}

impl AuditInterceptor {
    #[must_use]
    pub fn new(principal: FromRawJwt, rules: Vec<Rule>, client: Arc<Client>) -> Self {
        Self {
            principal,
            rules,
            client,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Run `handler` for one unary call and audit it.
    ///
    /// Calls to methods without a governing rule are passed through without
    /// auditing. The handler's result is returned unchanged unless audit
    /// logging fails in fail-close mode.
    ///
    /// # Errors
    ///
    /// - [`InterceptError::Principal`] if the caller cannot be identified
    /// - [`InterceptError::Handler`] if the handler returned an error status
    /// - [`InterceptError::AuditLog`] if logging failed in fail-close mode
    pub async fn intercept<Req, Resp, F, Fut>(
        &self,
        ctx: &CallContext,
        full_method: &str,
        request: Req,
        handler: F,
    ) -> Result<Resp, InterceptError>
    where
        Req: Serialize,
        Resp: Serialize,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Resp, Status>>,
    {
        let principal = self.principal.request_principal(ctx).map_err(|e| {
            tracing::warn!(method = %full_method, error = %e, "Rejecting call without principal");
            e
        })?;

        let method = MethodName::parse(full_method);
        let rule = most_relevant(&method.full, &self.rules);
        if rule.is_unset() {
            tracing::debug!(method = %method.full, "No audit rule, passing call through");
            return handler(request).await.map_err(InterceptError::Handler);
        }

        let snapshot = if rule.directive.includes_request() {
            to_struct(&request)
        } else {
            None
        };
        let mut audit = AuditRequest::builder(method.full.as_str())
            .service_name(method.service.as_str())
            .resource_name(method.service.as_str())
            .principal_email(principal)
            .log_type(rule.log_type)
            .operation(Uuid::new_v4().to_string())
            .request(snapshot)
            .build();

        let outcome = handler(request).await;

        match &outcome {
            Ok(response) => {
                audit.payload.status = Some(CallStatus {
                    code: Code::Ok.value(),
                    message: String::new(),
                });
                if rule.directive.includes_response() {
                    audit.payload.response = to_struct(response);
                }
            }
            Err(status) => {
                audit.payload.status = Some(CallStatus {
                    code: status.code().value(),
                    message: status.message().to_string(),
                });
            }
        }

        if let Err(e) = self.client.log(ctx, &mut audit).await {
            tracing::error!(
                method = %method.full,
                principal = %audit.payload.principal_email,
                error = %e,
                "Fail-close audit logging failed, aborting call"
            );
            return Err(InterceptError::AuditLog(e));
        }

        outcome.map_err(InterceptError::Handler)
    }
}
