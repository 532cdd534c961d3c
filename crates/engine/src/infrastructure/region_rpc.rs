//! HTTP/JSON client for the region description RPC.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use driftscape_shared::{DescribeRequest, DescribeResponse, DESCRIBE_PATH};

use crate::infrastructure::ports::{RegionRpcPort, RpcError, WorkerEndpoint};

/// Connect timeout for a single describe call. The overall call is bounded by the region client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct HttpRegionRpc {
    client: Client,
}

impl HttpRegionRpc {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for HttpRegionRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegionRpcPort for HttpRegionRpc {
    async fn describe(
        &self,
        endpoint: &WorkerEndpoint,
        request: DescribeRequest,
    ) -> Result<DescribeResponse, RpcError> {
        let response = self
            .client
            .post(format!("{}{}", endpoint.address, DESCRIBE_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Connect {
                endpoint: endpoint.address.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                endpoint: endpoint.address.clone(),
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<DescribeResponse>()
            .await
            .map_err(|e| RpcError::InvalidResponse {
                endpoint: endpoint.address.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftscape_domain::{GridCell, WorkerName};

    #[tokio::test]
    async fn unreachable_worker_is_connect_error() {
        // Bind then drop to get a loopback port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint =
            WorkerEndpoint::new(WorkerName::for_cell(GridCell::ORIGIN), format!("http://{}", addr));
        let err = HttpRegionRpc::new()
            .describe(&endpoint, DescribeRequest { x: 0, y: 0 })
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Connect { .. }));
    }
}
