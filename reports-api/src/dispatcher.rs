//! Action Dispatcher
//!
//! Single entry point for every report action. For each request the
//! dispatcher decodes the payload, resolves the caller's [`AccessContext`],
//! runs the bound handler, maps the outcome to an [`ApiError`] and records
//! exactly one outcome counter next to the operation's `total`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reports_core::{
    AccessContext, DocumentCodec, Principal, ReportsResult, StreamCodec, WireFormat,
};

use crate::actions::{
    DeleteReportDefinitionRequest, DeleteReportDefinitionResponse, DeleteReportInstanceRequest,
    DeleteReportInstanceResponse, GetAllReportDefinitionsRequest, GetAllReportDefinitionsResponse,
    GetAllReportInstancesRequest, GetAllReportInstancesResponse, GetReportDefinitionRequest,
    GetReportDefinitionResponse, GetReportInstanceRequest, GetReportInstanceResponse,
    GetStatsRequest, GetStatsResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{get_stats, ReportHandlers};
use crate::telemetry::{Outcome, ReportsMetrics};

// ============================================================================
// ACTION TABLE
// ============================================================================

/// Every action the dispatcher knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    GetAllReportDefinitions,
    GetReportDefinition,
    DeleteReportDefinition,
    GetAllReportInstances,
    GetReportInstance,
    DeleteReportInstance,
    GetStats,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::GetAllReportDefinitions,
        ActionKind::GetReportDefinition,
        ActionKind::DeleteReportDefinition,
        ActionKind::GetAllReportInstances,
        ActionKind::GetReportInstance,
        ActionKind::DeleteReportInstance,
        ActionKind::GetStats,
    ];

    /// Transport action name.
    pub fn action_name(&self) -> &'static str {
        match self {
            ActionKind::GetAllReportDefinitions => {
                "cluster:admin/opendistro/reports/definition/list"
            }
            ActionKind::GetReportDefinition => "cluster:admin/opendistro/reports/definition/get",
            ActionKind::DeleteReportDefinition => {
                "cluster:admin/opendistro/reports/definition/delete"
            }
            ActionKind::GetAllReportInstances => "cluster:admin/opendistro/reports/instance/list",
            ActionKind::GetReportInstance => "cluster:admin/opendistro/reports/instance/get",
            ActionKind::DeleteReportInstance => {
                "cluster:admin/opendistro/reports/instance/delete"
            }
            ActionKind::GetStats => "cluster:admin/opendistro/reports/stats/get",
        }
    }

    /// Metrics operation prefix.
    pub fn operation(&self) -> &'static str {
        match self {
            ActionKind::GetAllReportDefinitions => "report_definition.list",
            ActionKind::GetReportDefinition => "report_definition.info",
            ActionKind::DeleteReportDefinition => "report_definition.delete",
            ActionKind::GetAllReportInstances => "report_instance.list",
            ActionKind::GetReportInstance => "report_instance.info",
            ActionKind::DeleteReportInstance => "report_instance.delete",
            ActionKind::GetStats => "stats.info",
        }
    }

    pub fn from_action_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.action_name() == name)
    }

    pub fn operations() -> Vec<&'static str> {
        Self::ALL.iter().map(ActionKind::operation).collect()
    }
}

// ============================================================================
// WIRE ENVELOPES
// ============================================================================

/// Encoded request as received from a transport caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub format: WireFormat,
    pub body: Bytes,
}

impl WireRequest {
    pub fn new(format: WireFormat, body: impl Into<Bytes>) -> Self {
        Self {
            format,
            body: body.into(),
        }
    }

    /// Encode a typed request.
    pub fn encode<T: StreamCodec + DocumentCodec>(format: WireFormat, request: &T) -> Self {
        Self::new(format, format.encode(request))
    }
}

/// Encoded response, in the same format as its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub format: WireFormat,
    pub body: Bytes,
}

impl WireResponse {
    pub fn decode<T: StreamCodec + DocumentCodec>(&self) -> ApiResult<T> {
        Ok(self.format.decode(&self.body)?)
    }
}

// ============================================================================
// ACTION BINDING
// ============================================================================

/// Binds a request type to its action and handler.
#[async_trait]
pub trait ReportAction: StreamCodec + DocumentCodec + Send + 'static {
    type Response: StreamCodec + DocumentCodec + Send;

    const KIND: ActionKind;

    async fn handle(
        self,
        dispatcher: &ActionDispatcher,
        access: AccessContext,
    ) -> ReportsResult<Self::Response>;
}

macro_rules! bind_action {
    ($request:ty => $response:ty, $kind:ident, $method:ident) => {
        #[async_trait]
        impl ReportAction for $request {
            type Response = $response;

            const KIND: ActionKind = ActionKind::$kind;

            async fn handle(
                self,
                dispatcher: &ActionDispatcher,
                access: AccessContext,
            ) -> ReportsResult<Self::Response> {
                dispatcher.handlers().$method(self, access).await
            }
        }
    };
}

bind_action!(
    GetAllReportDefinitionsRequest => GetAllReportDefinitionsResponse,
    GetAllReportDefinitions,
    get_all_report_definitions
);
bind_action!(
    GetReportDefinitionRequest => GetReportDefinitionResponse,
    GetReportDefinition,
    get_report_definition
);
bind_action!(
    DeleteReportDefinitionRequest => DeleteReportDefinitionResponse,
    DeleteReportDefinition,
    delete_report_definition
);
bind_action!(
    GetAllReportInstancesRequest => GetAllReportInstancesResponse,
    GetAllReportInstances,
    get_all_report_instances
);
bind_action!(
    GetReportInstanceRequest => GetReportInstanceResponse,
    GetReportInstance,
    get_report_instance
);
bind_action!(
    DeleteReportInstanceRequest => DeleteReportInstanceResponse,
    DeleteReportInstance,
    delete_report_instance
);

#[async_trait]
impl ReportAction for GetStatsRequest {
    type Response = GetStatsResponse;

    const KIND: ActionKind = ActionKind::GetStats;

    async fn handle(
        self,
        dispatcher: &ActionDispatcher,
        access: AccessContext,
    ) -> ReportsResult<Self::Response> {
        get_stats(dispatcher.metrics(), self, access)
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Runs report actions with uniform authorization, error mapping and metrics.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    handlers: ReportHandlers,
    metrics: Arc<ReportsMetrics>,
}

impl ActionDispatcher {
    pub fn new(handlers: ReportHandlers, metrics: Arc<ReportsMetrics>) -> Self {
        Self { handlers, metrics }
    }

    /// Dispatcher with a fresh metrics registry covering every action.
    pub fn with_fresh_metrics(handlers: ReportHandlers) -> ApiResult<Self> {
        let metrics = ReportsMetrics::new(&ActionKind::operations())?;
        Ok(Self::new(handlers, Arc::new(metrics)))
    }

    pub fn handlers(&self) -> &ReportHandlers {
        &self.handlers
    }

    pub fn metrics(&self) -> &ReportsMetrics {
        &self.metrics
    }

    pub fn metrics_handle(&self) -> Arc<ReportsMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Execute an encoded request by action name.
    ///
    /// Unknown names are rejected before any metric is touched since they
    /// have no operation to count against.
    pub async fn execute(
        &self,
        action_name: &str,
        request: WireRequest,
        principal: Option<&Principal>,
    ) -> ApiResult<WireResponse> {
        let Some(kind) = ActionKind::from_action_name(action_name) else {
            tracing::warn!(action_name, "Unknown action");
            return Err(ApiError::bad_request(format!(
                "Unknown action '{}'",
                action_name
            )));
        };
        match kind {
            ActionKind::GetAllReportDefinitions => {
                self.execute_as::<GetAllReportDefinitionsRequest>(request, principal)
                    .await
            }
            ActionKind::GetReportDefinition => {
                self.execute_as::<GetReportDefinitionRequest>(request, principal)
                    .await
            }
            ActionKind::DeleteReportDefinition => {
                self.execute_as::<DeleteReportDefinitionRequest>(request, principal)
                    .await
            }
            ActionKind::GetAllReportInstances => {
                self.execute_as::<GetAllReportInstancesRequest>(request, principal)
                    .await
            }
            ActionKind::GetReportInstance => {
                self.execute_as::<GetReportInstanceRequest>(request, principal)
                    .await
            }
            ActionKind::DeleteReportInstance => {
                self.execute_as::<DeleteReportInstanceRequest>(request, principal)
                    .await
            }
            ActionKind::GetStats => {
                self.execute_as::<GetStatsRequest>(request, principal)
                    .await
            }
        }
    }

    async fn execute_as<A: ReportAction>(
        &self,
        request: WireRequest,
        principal: Option<&Principal>,
    ) -> ApiResult<WireResponse> {
        let format = request.format;
        let decoded = format.decode::<A>(&request.body).map_err(ApiError::from);
        let response = self.dispatch(decoded, principal).await?;
        Ok(WireResponse {
            format,
            body: format.encode(&response),
        })
    }

    /// Run an already-decoded request, or record the failure to decode one.
    pub async fn dispatch<A: ReportAction>(
        &self,
        request: ApiResult<A>,
        principal: Option<&Principal>,
    ) -> ApiResult<A::Response> {
        let kind = A::KIND;
        let result = match request {
            Err(err) => Err(err),
            Ok(request) => {
                let access = AccessContext::resolve(principal);
                tracing::debug!(action = kind.action_name(), user = ?access.user, "Dispatching");
                request.handle(self, access).await.map_err(ApiError::from)
            }
        };

        let outcome = match &result {
            Ok(_) => Outcome::Count,
            Err(err) => Outcome::from_error_code(err.code),
        };
        self.metrics.record(kind.operation(), outcome);

        if let Err(err) = &result {
            if err.code.is_client_error() {
                tracing::warn!(action = kind.action_name(), error = %err, "Request rejected");
            }
        }
        result
    }
}
