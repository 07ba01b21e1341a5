//! Health check command - checks a running KidSpark server.

use std::time::Duration;

use crate::cli::HealthArgs;

fn health_url(url: &str) -> String {
    let base = url.trim_end_matches('/');
    if base.ends_with("/health") {
        base.to_string()
    } else {
        format!("{base}/health")
    }
}

/// Run the health check command
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("unhealthy: failed to connect to {url}: {e}");
            std::process::exit(1);
        }
    };
    if !response.status().is_success() {
        eprintln!("unhealthy: server returned HTTP status {}", response.status());
        std::process::exit(1);
    }

    let body: serde_json::Value = response.json().await?;
    match body.get("status").and_then(|s| s.as_str()) {
        Some("healthy") => {
            let backend = body.get("backend").and_then(|b| b.as_str()).unwrap_or("unknown");
            println!("healthy (backend: {backend})");
            Ok(())
        }
        status => {
            eprintln!("unhealthy: server returned status {}", status.unwrap_or("<none>"));
            std::process::exit(1);
        }
    }
}
