use std::collections::{BTreeMap, HashMap};

use tracing_subscriber::EnvFilter;
use webtoy::{Application, Config, Method, Response, Server};

/// Renders a decoded map with sorted keys: `{action=Submit, name=John}`.
fn echo(map: Option<&HashMap<String, String>>) -> String {
    let sorted: BTreeMap<_, _> = map.into_iter().flatten().collect();
    let pairs: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{{{}}}", pairs.join(", "))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let mut app = Application::new();
    app.route("/foo", &[Method::GET, Method::POST], |req| {
        Ok(match req.method {
            Method::POST => Response::ok(echo(req.forms.as_ref())),
            _ => Response::ok(echo(req.queries.as_ref())),
        })
    });

    let server = Server::from_config(&cfg, app).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Have a nice day :)");
    Ok(())
}
