use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use abaqus_automation::{default_backend, GuiAutomator, GuiConfig};

pub use crate::utils::AbaqusWrapper;
use crate::utils::{EmptyArgs, ExecuteScriptArgs};

#[tool_router]
impl AbaqusWrapper {
    pub fn new() -> Result<Self, McpError> {
        Self::with_config(GuiConfig::default())
    }

    pub fn with_config(config: GuiConfig) -> Result<Self, McpError> {
        let backend = default_backend().map_err(|e| {
            McpError::internal_error(
                "Failed to initialize the GUI automation backend",
                serde_json::to_value(e.to_string()).ok(),
            )
        })?;
        Ok(Self::with_automator(GuiAutomator::new(backend, config)))
    }

    /// Constructor used by tests to inject an automator over a mock backend.
    pub fn with_automator(automator: GuiAutomator) -> Self {
        Self {
            automator: Arc::new(Mutex::new(automator)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Executes a Python script in an already running Abaqus/CAE GUI session by driving its 'File -> Run Script...' menu. Returns a submission confirmation only; the script's own output and errors land in the Abaqus message area, so call get_abaqus_gui_message_log afterwards. Not idempotent: every call runs the script again."
    )]
    pub async fn execute_script_in_abaqus_gui(
        &self,
        Parameters(args): Parameters<ExecuteScriptArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            script_bytes = args.python_code.len(),
            "execute_script_in_abaqus_gui requested"
        );
        let mut automator = self.automator.lock().await;
        match automator.execute_script(&args.python_code) {
            Ok(summary) => Ok(CallToolResult::success(vec![Content::text(summary)])),
            Err(err) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Error executing script in Abaqus GUI: {err}"
            ))])),
        }
    }

    #[tool(
        description = "Attempts to retrieve the text of the Abaqus/CAE message/log area. The message area carries script output, Abaqus status messages, warnings and errors. The control is located heuristically, so extraction is best effort and can pick up an adjacent pane on unusual UI layouts."
    )]
    pub async fn get_abaqus_gui_message_log(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        let mut automator = self.automator.lock().await;
        match automator.read_message_log() {
            Ok(log) => Ok(CallToolResult::success(vec![Content::text(log)])),
            Err(err) => Ok(CallToolResult::error(vec![Content::text(format!(
                "An error occurred while trying to retrieve the Abaqus message log: {err}"
            ))])),
        }
    }

    #[tool(
        description = "Returns the recommended strategy for working with an Abaqus/CAE GUI session through this server: how to submit scripts, how to verify their outcome and how to interpret tool failures."
    )]
    pub async fn abaqus_scripting_strategy(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            crate::prompt::scripting_strategy(),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for AbaqusWrapper {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(crate::prompt::get_server_instructions()),
        }
    }
}
