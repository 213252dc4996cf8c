//! Load generator for the rowgate query endpoint.
//!
//! Simulates a number of users that each repeatedly issue `GET` requests
//! against one endpoint, pausing a uniformly random think time between
//! requests, and prints a summary when the run ends.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use tokio::{task::JoinSet, time::Instant};
use tracing::{debug, info, warn};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "rowgate-loadtest", about = "Repeatedly query a rowgate endpoint")]
struct Args {
    /// Base URL of the service.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    host: String,

    /// Endpoint path to request.
    #[arg(long, default_value = "/api/records")]
    path: String,

    /// Number of simulated users.
    #[arg(short, long, default_value_t = 10)]
    users: usize,

    /// Length of the run in seconds.
    #[arg(short, long, default_value_t = 60)]
    duration_secs: u64,

    /// Lower bound of the think time between requests.
    #[arg(long, default_value_t = 5000)]
    min_wait_ms: u64,

    /// Upper bound of the think time between requests.
    #[arg(long, default_value_t = 9000)]
    max_wait_ms: u64,
}

/// Inclusive range a user waits between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThinkTime {
    min_ms: u64,
    max_ms: u64,
}

impl ThinkTime {
    fn new(min_ms: u64, max_ms: u64) -> Result<Self> {
        if min_ms > max_ms {
            anyhow::bail!("min wait {min_ms}ms exceeds max wait {max_ms}ms");
        }
        Ok(Self { min_ms, max_ms })
    }

    fn sample(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

/// Request outcomes for one or more users.
#[derive(Debug, Default, Clone, PartialEq)]
struct Stats {
    requests: u64,
    failures: u64,
    total_latency: Duration,
    max_latency: Duration,
}

impl Stats {
    fn record(&mut self, latency: Duration, ok: bool) {
        self.requests += 1;
        if !ok {
            self.failures += 1;
        }
        self.total_latency += latency;
        self.max_latency = self.max_latency.max(latency);
    }

    fn merge(&mut self, other: &Self) {
        self.requests += other.requests;
        self.failures += other.failures;
        self.total_latency += other.total_latency;
        self.max_latency = self.max_latency.max(other.max_latency);
    }

    fn mean_latency(&self) -> Duration {
        if self.requests == 0 {
            return Duration::ZERO;
        }
        self.total_latency / u32::try_from(self.requests).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} failures={} mean_latency_ms={} max_latency_ms={}",
            self.requests,
            self.failures,
            millis(self.mean_latency()),
            millis(self.max_latency)
        )
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// One simulated user: request, think, repeat until the deadline.
async fn run_user(
    user: usize,
    client: reqwest::Client,
    url: String,
    think: ThinkTime,
    deadline: Instant,
) -> Stats {
    let mut stats = Stats::default();

    while Instant::now() < deadline {
        let started = Instant::now();
        let ok = match client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                // Drain the body so latency covers the full transfer.
                let body = response.bytes().await;
                status.is_success() && body.is_ok()
            },
            Err(e) => {
                warn!(user, error = %e, "Request failed");
                false
            },
        };
        stats.record(started.elapsed(), ok);

        let wait = think.sample(&mut rand::thread_rng());
        debug!(user, wait_ms = millis(wait), "Thinking");
        tokio::time::sleep_until((Instant::now() + wait).min(deadline)).await;
    }

    stats
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let think = ThinkTime::new(args.min_wait_ms, args.max_wait_ms)?;
    let url = format!("{}{}", args.host.trim_end_matches('/'), args.path);
    let client = reqwest::Client::builder().build().context("Failed to build HTTP client")?;
    let deadline = Instant::now() + Duration::from_secs(args.duration_secs);

    info!(url = %url, users = args.users, duration_secs = args.duration_secs, "Starting load test");

    let mut users = JoinSet::new();
    for user in 0..args.users {
        users.spawn(run_user(user, client.clone(), url.clone(), think, deadline));
    }

    let mut total = Stats::default();
    while let Some(result) = users.join_next().await {
        total.merge(&result.context("User task panicked")?);
    }

    info!("Load test finished");
    println!("{total}");
    Ok(())
}
