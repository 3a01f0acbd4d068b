//! Argo CD application MCP server: render Application manifests and submit them to the cluster.

use std::sync::Arc;

use argocd_app_mcp::{
    tools, types::DEVTRON_INSTALLATION_NS, AppTemplate, ArgoApplicationClient, ClusterEndpoint, Error, Settings,
};
use rmcp::{
    handler::server::ServerHandler,
    model::{CallToolResult, Content},
    tool, tool_handler, tool_router,
    transport::stdio,
    ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct GenerateParams {
    /// Short description of the application
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    app: AppTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ValidateParams {
    /// Application manifest (YAML or JSON) to validate
    manifest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct CreateParams {
    #[serde(flatten)]
    app: AppTemplate,
    /// Target cluster (optional; the in-cluster API server is used)
    #[serde(default)]
    cluster: ClusterEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct GetParams {
    /// Namespace of the Application (default: devtroncd)
    #[serde(default = "default_namespace")]
    namespace: String,
    /// Name of the Application
    app_name: String,
    /// Target cluster (optional; the in-cluster API server is used)
    #[serde(default)]
    cluster: ClusterEndpoint,
}

fn default_namespace() -> String {
    DEVTRON_INSTALLATION_NS.to_string()
}

fn error_result(err: &Error) -> CallToolResult {
    let mut text = err.to_string();
    if let Error::ApplicationGet { resource, .. } = err {
        if let Ok(body) = serde_json::to_string_pretty(resource) {
            text.push('\n');
            text.push_str(&body);
        }
    }
    CallToolResult::error(vec![Content::text(text)])
}

#[derive(Clone)]
struct ArgoAppMcpService {
    argo: Arc<ArgoApplicationClient>,
    tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

#[tool_router]
impl ArgoAppMcpService {
    fn new(settings: Settings) -> Self {
        Self {
            argo: Arc::new(ArgoApplicationClient::in_cluster(settings)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Generate an Argo CD Application YAML manifest from the application fields")]
    async fn generate_application_manifest(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<GenerateParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;
        match tools::manifest::generate_application_manifest(&p.app, p.description.as_deref()) {
            Ok(out) => Ok(CallToolResult::success(vec![Content::text(out)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e)])),
        }
    }

    #[tool(description = "Render APPLICATION_TEMPLATE.JSON with the application fields, without submitting it")]
    async fn render_application_manifest(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<AppTemplate>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        match self.argo.render_application(&params.0).await {
            Ok(out) => Ok(CallToolResult::success(vec![Content::text(out)])),
            Err(e) => Ok(error_result(&e)),
        }
    }

    #[tool(description = "Validate an Argo CD Application manifest (apiVersion, kind, metadata.name, spec.destination, spec.source)")]
    async fn validate_application_manifest(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<ValidateParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        match tools::manifest::validate_application_manifest(&params.0.manifest) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text("Manifest is valid.")])),
            Err(errors) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Validation errors:\n{}",
                errors.join("\n")
            ))])),
        }
    }

    #[tool(description = "Render the Application template and create it in the cluster; returns the application name")]
    async fn create_application(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<CreateParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;
        match self.argo.create_application(&p.app, &p.cluster).await {
            Ok(name) => Ok(CallToolResult::success(vec![Content::text(name)])),
            Err(e) => Ok(error_result(&e)),
        }
    }

    #[tool(description = "Fetch an Argo CD Application from the cluster")]
    async fn get_application(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<GetParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;
        match self.argo.get_application(&p.namespace, &p.app_name, &p.cluster).await {
            Ok(app) => {
                let out = serde_json::to_string_pretty(&app).unwrap_or_else(|_| "{}".to_string());
                Ok(CallToolResult::success(vec![Content::text(out)]))
            }
            Err(e) => Ok(error_result(&e)),
        }
    }

    #[tool(description = "List the placeholders available in the application template")]
    async fn list_template_fields(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let out = tools::reference::template_fields_json();
        Ok(CallToolResult::success(vec![Content::text(out)]))
    }
}

#[tool_handler]
impl ServerHandler for ArgoAppMcpService {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
        )
        .with_instructions("MCP for Argo CD: render Application manifests, create them and read them back.")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    tracing::info!(template = %settings.template_path.display(), "starting argocd-app-mcp");
    let service = ArgoAppMcpService::new(settings);
    let transport = stdio();
    let server = service.serve(transport).await?;
    server.waiting().await?;
    Ok(())
}
