use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use polyjudge::api;
use polyjudge::config::JudgeConfig;
use polyjudge::core::languages::{get_supported_languages, init_languages};
use polyjudge::executor::{PistonClient, Throttle};
use polyjudge::judger::Judge;
use polyjudge::problems::ProblemRegistry;
use polyjudge::redis_manager::RedisManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyjudge=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = JudgeConfig::from_env()?;

    init_languages()?;
    info!("Loaded languages: {}", get_supported_languages().join(", "));

    let mut registry = ProblemRegistry::builtin()?;
    if let Some(path) = &config.problems_config {
        registry.merge_file(path)?;
    }
    info!("Problem registry ready with {} problem(s)", registry.len());

    let client = PistonClient::new(&config.sandbox_url, config.sandbox_timeout)?
        .with_stage_timeouts(config.sandbox_compile_timeout, config.sandbox_run_timeout);
    let throttle = Throttle::new(config.sandbox_max_concurrency, config.sandbox_min_interval);
    info!(
        "Sandbox at {} (max {} in flight, {:?} between calls)",
        config.sandbox_url, config.sandbox_max_concurrency, config.sandbox_min_interval
    );

    let judge = Arc::new(
        Judge::new(Arc::new(registry), Arc::new(client), Arc::new(throttle))
            .with_concurrency(config.sandbox_max_concurrency),
    );

    if let Some(bind) = config.http_bind.clone() {
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .with_context(|| format!("Failed to bind HTTP adapter on {}", bind))?;
        let app = api::router(judge.clone());
        info!("HTTP adapter listening on {}", bind);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("HTTP adapter stopped: {}", e);
            }
        });
    }

    let mut redis = RedisManager::with_url(&config.redis_url).await?;
    info!("Waiting for jobs...");

    loop {
        let job = redis.pop_job().await?;
        info!(
            "Received judge job: submission_id={}, problem={}, language={}, mode={:?}",
            job.submission_id, job.problem_title, job.language, job.mode
        );

        let report = judge.judge(&job).await;
        if let Err(e) = redis.store_report(&report).await {
            error!("Failed to store result for submission {}: {}", job.submission_id, e);
        }
    }
}
