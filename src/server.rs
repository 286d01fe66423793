//! Tool server: the conversion tools over the Model Context Protocol.
//!
//! Two tools are exposed, `convert_pdfs` (a directory below the PDF root)
//! and `convert_pdf` (one file). Both answer with the conversion mapping as
//! structured content, with the same JSON repeated as text for clients that
//! only read `content`. An input outside the PDF root is a tool error
//! (`isError: true`), not a protocol error.
//!
//! Stdout carries protocol messages only; logs go to stderr and the log file.

use crate::convert::Converter;
use crate::error::Pdf2PicsError;
use crate::output::ConversionMapping;
use crate::pipeline::backend::{PdfiumBackend, RasterBackend};
use crate::pipeline::upload::{HttpStore, RemoteStore};
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use std::io;
use tracing::{info, warn};

/// Arguments of `convert_pdfs`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertPdfsArgs {
    /// Directory relative to the PDF root; empty for the root itself
    pub pdfs_dir: String,
    /// Upload the images and return URLs instead of local paths
    #[serde(default = "default_true")]
    pub return_pic_url: bool,
}

/// Arguments of `convert_pdf`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertPdfArgs {
    /// PDF file relative to the PDF root
    pub pdf_name: String,
    /// Upload the images and return URLs instead of local paths
    #[serde(default = "default_true")]
    pub return_pic_url: bool,
}

fn default_true() -> bool {
    true
}

/// Serves the conversion tools to one MCP client.
pub struct ToolServer<B = PdfiumBackend, S = HttpStore> {
    converter: Converter<B, S>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl<B: RasterBackend, S: RemoteStore + 'static> ToolServer<B, S> {
    pub fn new(converter: Converter<B, S>) -> Self {
        Self {
            converter,
            tool_router: Self::tool_router(),
        }
    }

    /// Convert every PDF below a directory
    #[tool(
        description = "Convert every PDF below a directory (relative to the PDF root) into one \
PNG per page. Returns a mapping from each PDF's relative path to its image URLs, or to local \
paths under the output root when return_pic_url is false."
    )]
    pub async fn convert_pdfs(
        &self,
        Parameters(args): Parameters<ConvertPdfsArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(
            pdfs_dir = %args.pdfs_dir,
            return_pic_url = args.return_pic_url,
            "Tool call convert_pdfs"
        );
        let result = self
            .converter
            .convert_directory(&args.pdfs_dir, args.return_pic_url)
            .await;
        tool_result(result)
    }

    /// Convert a single PDF
    #[tool(
        description = "Convert one PDF (relative to the PDF root) into one PNG per page. Returns \
a one-entry mapping from the PDF's relative path to its image URLs, or to local paths under the \
output root when return_pic_url is false."
    )]
    pub async fn convert_pdf(
        &self,
        Parameters(args): Parameters<ConvertPdfArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(
            pdf_name = %args.pdf_name,
            return_pic_url = args.return_pic_url,
            "Tool call convert_pdf"
        );
        let result = self
            .converter
            .convert_single(&args.pdf_name, args.return_pic_url)
            .await;
        tool_result(result)
    }
}

fn tool_result(
    result: Result<ConversionMapping, Pdf2PicsError>,
) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(mapping) => {
            let structured = serde_json::to_value(&mapping)
                .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
            Ok(CallToolResult::structured(structured))
        }
        Err(e) => {
            warn!("Tool call failed: {}", e);
            Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
        }
    }
}

#[tool_handler]
impl<B: RasterBackend, S: RemoteStore + 'static> ServerHandler for ToolServer<B, S> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Converts PDFs below the configured PDF root into one PNG per page and \
                 optionally publishes the images to the configured file host."
                    .into(),
            ),
        }
    }
}

/// Serve on the process's stdin/stdout until the client disconnects.
pub async fn serve_stdio<B: RasterBackend, S: RemoteStore + 'static>(
    server: ToolServer<B, S>,
) -> io::Result<()> {
    info!("Tool server ready on stdio");
    let service = server
        .serve(rmcp::transport::io::stdio())
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;
    let reason = service
        .waiting()
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;
    info!("Tool server stopped: {:?}", reason);
    Ok(())
}
