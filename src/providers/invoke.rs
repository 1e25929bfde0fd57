//! Bounded, fault-isolated provider invocation

use super::traits::{Provider, RequestParams};
use crate::network::HttpClient;
use crate::results::{ProviderError, ProviderResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Invoke one provider within `timeout`, folding every fault into the result
///
/// Transport errors, bad statuses, undecodable bodies, the deadline and even
/// a panic inside the adapter all come back as `success = false`.
pub async fn invoke(
    provider: &dyn Provider,
    client: &HttpClient,
    params: &RequestParams,
    timeout: Duration,
) -> ProviderResult {
    let name = provider.name().to_string();
    let start = Instant::now();

    let call = AssertUnwindSafe(provider.call(client, params)).catch_unwind();
    let outcome = tokio::time::timeout(timeout, call).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(Ok(Ok(output))) => {
            debug!("Provider {} answered in {}ms", name, latency_ms);
            ProviderResult::success(&name, output.payload)
                .with_model(output.model)
                .with_total_results(output.total_results)
        }
        Ok(Ok(Err(failure))) => {
            warn!("Provider {} failed: {}", name, failure);
            ProviderResult::failure(&name, failure.kind, failure.message)
                .with_model(provider.model())
        }
        Ok(Err(panic)) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "adapter panicked".to_string());
            warn!("Provider {} panicked: {}", name, message);
            ProviderResult::failure(&name, ProviderError::Unknown, message)
                .with_model(provider.model())
        }
        Err(_) => {
            warn!("Provider {} timed out after {:?}", name, timeout);
            ProviderResult::failure(
                &name,
                ProviderError::Timeout,
                format!("no response within {:.1}s", timeout.as_secs_f64()),
            )
            .with_model(provider.model())
        }
    };

    result.with_latency(latency_ms)
}
