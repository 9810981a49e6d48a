//! JSON-RPC 2.0 server for IP consolidation
//!
//! Request layer in front of the consolidation engine. Each request is
//! handled independently; the server holds only its configuration.
//!
//! # Methods
//!
//! - `consolidate` - minimal CIDR covering of a list of addresses/blocks
//! - `calculate_complement` - subnet details plus everything not covered
//! - `subnet_details` - facts about a single block
//! - `ping` - liveness check
//!
//! # Examples
//!
//! ```
//! use ipcon_core::config::Config;
//! use ipcon_server::IpconServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = IpconServer::new(Config::default());
//!
//! let request = r#"{
//!     "jsonrpc": "2.0",
//!     "method": "consolidate",
//!     "params": {"lines": ["10.0.0.0", "10.0.0.1"]},
//!     "id": 1
//! }"#;
//!
//! let response = server.handle_request(request).await?;
//! println!("Response: {}", response);
//! # Ok(())
//! # }
//! ```

use ipcon_cidr::SubnetDetails;
use ipcon_core::config::Config;
use ipcon_engine::{complement_blocks, consolidate_report, parse_block};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod transport;

pub use transport::StdioTransport;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// JSON-RPC parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid method parameters
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Transport I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcResponse {
    fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn new(code: i32, msg: &str) -> Self {
        Self {
            code,
            message: msg.to_string(),
            data: None,
        }
    }

    fn parse_error(msg: &str) -> Self {
        Self::new(-32700, msg)
    }

    fn invalid_request(msg: &str) -> Self {
        Self::new(-32600, msg)
    }

    fn method_not_found(msg: &str) -> Self {
        Self::new(-32601, msg)
    }

    fn invalid_params(msg: &str) -> Self {
        Self::new(-32602, msg)
    }

    fn internal_error(msg: &str) -> Self {
        Self::new(-32603, msg)
    }
}

impl From<ServerError> for JsonRpcError {
    fn from(e: ServerError) -> Self {
        match e {
            ServerError::ParseError(msg) => JsonRpcError::parse_error(&msg),
            ServerError::InvalidRequest(msg) => JsonRpcError::invalid_request(&msg),
            ServerError::MethodNotFound(msg) => JsonRpcError::method_not_found(&msg),
            ServerError::InvalidParams(msg) => JsonRpcError::invalid_params(&msg),
            ServerError::InternalError(msg) => JsonRpcError::internal_error(&msg),
            ServerError::Io(e) => JsonRpcError::internal_error(&e.to_string()),
        }
    }
}

/// Address list, given either as separate lines or as one newline-separated text
#[derive(Debug, Default, Deserialize)]
struct LinesParams {
    #[serde(default, alias = "cidrs")]
    lines: Option<Vec<String>>,
    #[serde(default)]
    text: Option<String>,
}

impl LinesParams {
    /// Non-blank, trimmed lines from whichever field was supplied
    fn into_lines(self) -> Vec<String> {
        let mut lines: Vec<String> = self.lines.unwrap_or_default();
        if let Some(text) = self.text {
            lines.extend(text.lines().map(str::to_string));
        }
        lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// Subnet details request parameters
#[derive(Debug, Deserialize)]
struct SubnetDetailsParams {
    cidr: String,
}

/// JSON-RPC server for consolidation requests
pub struct IpconServer {
    config: Config,
}

impl IpconServer {
    /// Create a new server
    ///
    /// # Arguments
    ///
    /// * `config` - Limits applied to every request
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Handle a JSON-RPC 2.0 request
    ///
    /// Protocol and method errors are reported inside the returned response;
    /// `Err` means the response itself could not be produced.
    ///
    /// # Arguments
    ///
    /// * `request_str` - JSON-RPC request as string
    pub async fn handle_request(&self, request_str: &str) -> Result<String> {
        let response = match serde_json::from_str::<JsonRpcRequest>(request_str) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                warn!(error = %e, "unparseable request");
                JsonRpcResponse::failure(
                    serde_json::Value::Null,
                    ServerError::ParseError(e.to_string()).into(),
                )
            }
        };

        serde_json::to_string(&response).map_err(|e| ServerError::InternalError(e.to_string()))
    }

    fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::failure(
                request.id,
                ServerError::InvalidRequest("Invalid JSON-RPC version".to_string()).into(),
            );
        }

        debug!(method = %request.method, "handling request");

        let result = match request.method.as_str() {
            "consolidate" => self.handle_consolidate(&request.params),
            "calculate_complement" => self.handle_calculate_complement(&request.params),
            "subnet_details" => self.handle_subnet_details(&request.params),
            "ping" => Ok(serde_json::json!({"status": "ok"})),
            _ => Err(ServerError::MethodNotFound(request.method.clone())),
        };

        match result {
            Ok(data) => JsonRpcResponse::success(request.id, data),
            Err(e) => {
                debug!(method = %request.method, error = %e, "request failed");
                JsonRpcResponse::failure(request.id, e.into())
            }
        }
    }

    /// Handle consolidate method
    fn handle_consolidate(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let lines = self.lines_from(params)?;
        if lines.is_empty() {
            return Err(ServerError::InvalidParams(
                "No valid IP addresses found in input".to_string(),
            ));
        }

        let report = consolidate_report(&lines);
        let ranges = report.range_strings();

        Ok(serde_json::json!({
            "original_count": report.original_count,
            "rejected_count": report.rejected,
            "ranges_count": ranges.len(),
            "ranges": ranges,
        }))
    }

    /// Handle calculate_complement method
    fn handle_calculate_complement(
        &self,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let lines = self.lines_from(params)?;
        if lines.is_empty() {
            return Err(ServerError::InvalidParams(
                "At least one CIDR notation required".to_string(),
            ));
        }

        let subnets = lines
            .iter()
            .map(|line| {
                let block = parse_block(line).ok_or_else(|| {
                    ServerError::InvalidParams(format!("Invalid CIDR notation: {}", line))
                })?;
                Ok(SubnetDetails {
                    cidr: line.clone(),
                    ..block.details()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let complementary: Vec<serde_json::Value> = complement_blocks(&lines)
            .iter()
            .map(|block| serde_json::json!({"cidr": block.to_string()}))
            .collect();

        Ok(serde_json::json!({
            "subnets": subnets,
            "complementary": complementary,
        }))
    }

    /// Handle subnet_details method
    fn handle_subnet_details(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let params: SubnetDetailsParams = serde_json::from_value(params.clone())
            .map_err(|e| ServerError::InvalidParams(e.to_string()))?;

        let block = parse_block(&params.cidr).ok_or_else(|| {
            ServerError::InvalidParams(format!("Invalid CIDR notation: {}", params.cidr))
        })?;

        let mut details = serde_json::to_value(block.details())
            .map_err(|e| ServerError::InternalError(e.to_string()))?;
        details["binary_netmask"] = serde_json::Value::String(block.binary_netmask());
        Ok(details)
    }

    /// Extract input lines from params and enforce the line limit
    fn lines_from(&self, params: &serde_json::Value) -> Result<Vec<String>> {
        let params: LinesParams = if params.is_null() {
            LinesParams::default()
        } else {
            serde_json::from_value(params.clone())
                .map_err(|e| ServerError::InvalidParams(e.to_string()))?
        };

        let lines = params.into_lines();
        if lines.len() > self.config.max_input_lines {
            return Err(ServerError::InvalidParams(format!(
                "Too many lines: {} (limit {})",
                lines.len(),
                self.config.max_input_lines
            )));
        }
        Ok(lines)
    }
}

impl Default for IpconServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn call(
        server: &IpconServer,
        method: &str,
        params: serde_json::Value,
    ) -> JsonRpcResponse {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 7
        });
        let response = server.handle_request(&request.to_string()).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn test_parse_request() {
        let request = r#"{
            "jsonrpc": "2.0",
            "method": "ping",
            "params": {},
            "id": 1
        }"#;

        let parsed: JsonRpcRequest = serde_json::from_str(request).unwrap();
        assert_eq!(parsed.jsonrpc, "2.0");
        assert_eq!(parsed.method, "ping");
    }

    #[tokio::test]
    async fn test_ping_method() {
        let server = IpconServer::default();
        let request = r#"{"jsonrpc": "2.0", "method": "ping", "params": {}, "id": 1}"#;

        let response = server.handle_request(request).await.unwrap();
        assert!(response.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let server = IpconServer::default();
        let response = call(&server, "unknown_method", serde_json::json!({})).await;
        assert_eq!(response.error.unwrap().code, -32601);
        assert_eq!(response.id, serde_json::json!(7));
    }

    #[tokio::test]
    async fn test_invalid_jsonrpc_version() {
        let server = IpconServer::default();
        let request = r#"{"jsonrpc": "1.0", "method": "ping", "params": {}, "id": 1}"#;

        let response = server.handle_request(request).await.unwrap();
        assert!(response.contains("-32600"));
    }

    #[test]
    fn test_server_error_codes() {
        let cases = [
            (ServerError::ParseError("x".to_string()), -32700),
            (ServerError::InvalidRequest("x".to_string()), -32600),
            (ServerError::MethodNotFound("x".to_string()), -32601),
            (ServerError::InvalidParams("x".to_string()), -32602),
            (ServerError::InternalError("x".to_string()), -32603),
        ];
        for (error, code) in cases {
            let rpc: JsonRpcError = error.into();
            assert_eq!(rpc.code, code);
            assert_eq!(rpc.message, "x");
        }
    }

    #[tokio::test]
    async fn test_invalid_version_message() {
        let server = IpconServer::default();
        let request = r#"{"jsonrpc": "1.0", "method": "ping", "id": 4}"#;

        let response = server.handle_request(request).await.unwrap();
        let response: JsonRpcResponse = serde_json::from_str(&response).unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32600);
        assert_eq!(error.message, "Invalid JSON-RPC version");
        assert_eq!(response.id, serde_json::json!(4));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let server = IpconServer::default();
        let response = server.handle_request("{not json").await.unwrap();
        let response: JsonRpcResponse = serde_json::from_str(&response).unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
        assert!(response.id.is_null());
    }

    #[tokio::test]
    async fn test_consolidate_lines() {
        let server = IpconServer::default();
        let response = call(
            &server,
            "consolidate",
            serde_json::json!({"lines": ["10.0.0.0", "10.0.0.1", "10.0.0.3", "oops"]}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["original_count"], 4);
        assert_eq!(result["rejected_count"], 1);
        assert_eq!(result["ranges_count"], 2);
        assert_eq!(result["ranges"], serde_json::json!(["10.0.0.0/31", "10.0.0.3/32"]));
    }

    #[tokio::test]
    async fn test_consolidate_text() {
        let server = IpconServer::default();
        let response = call(
            &server,
            "consolidate",
            serde_json::json!({"text": "192.168.0.0/24\n\n  192.168.1.0/24  \n"}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["original_count"], 2);
        assert_eq!(result["ranges"], serde_json::json!(["192.168.0.0/23"]));
    }

    #[tokio::test]
    async fn test_consolidate_all_rejected_is_empty_success() {
        let server = IpconServer::default();
        let response = call(&server, "consolidate", serde_json::json!({"lines": ["a", "b"]})).await;

        let result = response.result.unwrap();
        assert_eq!(result["ranges_count"], 0);
        assert_eq!(result["original_count"], 2);
    }

    #[tokio::test]
    async fn test_consolidate_empty_input() {
        let server = IpconServer::default();
        let response = call(&server, "consolidate", serde_json::json!({"text": "\n  \n"})).await;

        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "No valid IP addresses found in input");
    }

    #[tokio::test]
    async fn test_line_limit() {
        let config = Config {
            max_input_lines: 2,
            ..Config::default()
        };
        let server = IpconServer::new(config);
        let response = call(
            &server,
            "consolidate",
            serde_json::json!({"lines": ["1.1.1.1", "1.1.1.2", "1.1.1.3"]}),
        )
        .await;

        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_calculate_complement() {
        let server = IpconServer::default();
        let response = call(
            &server,
            "calculate_complement",
            serde_json::json!({"cidrs": ["0.0.0.0/1"]}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["subnets"][0]["cidr"], "0.0.0.0/1");
        assert_eq!(result["subnets"][0]["firstIP"], "0.0.0.1");
        assert_eq!(result["subnets"][0]["lastIP"], "127.255.255.254");
        assert_eq!(
            result["complementary"],
            serde_json::json!([{"cidr": "128.0.0.0/1"}])
        );
    }

    #[tokio::test]
    async fn test_calculate_complement_rejects_bad_line() {
        let server = IpconServer::default();
        let response = call(
            &server,
            "calculate_complement",
            serde_json::json!({"text": "10.0.0.0/8\nbad/cidr"}),
        )
        .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Invalid CIDR notation: bad/cidr");
    }

    #[tokio::test]
    async fn test_calculate_complement_requires_input() {
        let server = IpconServer::default();
        let response = call(&server, "calculate_complement", serde_json::Value::Null).await;
        assert_eq!(
            response.error.unwrap().message,
            "At least one CIDR notation required"
        );
    }

    #[tokio::test]
    async fn test_subnet_details() {
        let server = IpconServer::default();
        let response = call(
            &server,
            "subnet_details",
            serde_json::json!({"cidr": "172.16.4.1/22"}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["cidr"], "172.16.4.0/22");
        assert_eq!(result["broadcast"], "172.16.7.255");
        assert_eq!(result["totalHosts"], 1022);
        assert_eq!(result["class"], "B");
        assert_eq!(result["binary_netmask"], "11111111.11111111.11111100.00000000");
    }

    #[tokio::test]
    async fn test_subnet_details_missing_param() {
        let server = IpconServer::default();
        let response = call(&server, "subnet_details", serde_json::json!({})).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
