use std::io::BufRead;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use rustyline::config::Builder;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Editor};

use kv::cluster::LocalCluster;
use kv::coordinator::TransactionCoordinator;
use kv::local_transport::LocalTimestampTransport;
use kv::timestamp_oracle::AtomicTimestampOracle;
use kv::truetime::SystemTrueTime;

use crate::config::ClusterConfig;
use crate::rusty::CliHelper;

const DEFAULT_PROMPT: &str = "kvcli";

const KEYWORDS: &[&str] = &["BEGIN", "GET", "PUT", "COMMIT", "ABORT", "STATUS", "exit", "quit"];

pub struct Session {
    is_repl: bool,
    settings: ClusterConfig,
    cluster: LocalCluster,
    coordinator: TransactionCoordinator,
    in_transaction: bool,
    keywords: Arc<Vec<String>>,
}

impl Session {
    pub async fn try_new(settings: ClusterConfig, is_repl: bool) -> Result<Self> {
        if is_repl {
            println!("Welcome to kvcli.");
            println!();
        }

        let cluster = LocalCluster::new(settings.nshards);
        let truetime = Arc::new(SystemTrueTime::new(settings.truetime_uncertainty_micros));
        let timestamp_transport = Some(Arc::new(LocalTimestampTransport::new(Arc::new(AtomicTimestampOracle::new())))
            as Arc<dyn kv::transport::TimestampTransport>);
        let coordinator =
            TransactionCoordinator::new(settings.mode(), cluster.shard_transports(), truetime, timestamp_transport);

        let keywords = KEYWORDS.iter().map(|s| s.to_string()).collect();

        Ok(Self { is_repl, settings, cluster, coordinator, in_transaction: false, keywords: Arc::new(keywords) })
    }

    fn prompt(&self) -> String {
        if self.in_transaction {
            format!("{} (txn {}) > ", self.settings.prompt.as_deref().unwrap_or(DEFAULT_PROMPT), self.coordinator.t_id())
        } else if let Some(p) = &self.settings.prompt {
            format!("{} > ", p.trim_end())
        } else {
            format!("{} > ", DEFAULT_PROMPT)
        }
    }

    pub async fn handle_repl(&mut self) {
        let config = Builder::new().completion_prompt_limit(5).completion_type(CompletionType::Circular).build();
        let mut rl = Editor::<CliHelper, DefaultHistory>::with_config(config).unwrap();

        rl.set_helper(Some(CliHelper::with_keywords(self.keywords.clone())));
        rl.load_history(&get_history_path()).ok();

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let _ = rl.add_history_entry(&line);
                    match self.handle_query(true, &line).await {
                        Ok(false) => break,
                        Ok(true) => {}
                        Err(e) => eprintln!("error: {e}"),
                    }
                }
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("io err: {e}");
                    break;
                }
            }
        }

        println!("Bye~");
        let _ = rl.save_history(&get_history_path());
    }

    pub async fn handle_reader<R: BufRead>(&mut self, r: R) -> Result<()> {
        let start = std::time::Instant::now();
        for line in r.lines() {
            let line = line.map_err(|e| anyhow!("read lines err: {}", e))?;
            if !self.handle_query(false, &line).await? {
                break;
            }
        }
        if self.settings.show_stats.unwrap_or(false) {
            println!("{:.3}", start.elapsed().as_secs_f64());
        }
        Ok(())
    }

    /// Returns `Ok(false)` when the session should terminate.
    async fn handle_query(&mut self, is_repl: bool, line: &str) -> Result<bool> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }
        if is_repl && (line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")) {
            return Ok(false);
        }

        let mut parts = line.splitn(3, ' ');
        let cmd = parts.next().unwrap_or("").to_ascii_uppercase();

        match cmd.as_str() {
            "BEGIN" => {
                self.coordinator.begin().await;
                self.in_transaction = true;
                println!("OK txn {}", self.coordinator.t_id());
            }
            "GET" => {
                let key = parts.next().ok_or_else(|| anyhow!("GET requires a key"))?;
                match self.coordinator.get(key.as_bytes()).await {
                    Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                    Ok(None) => println!("N/A"),
                    Err(e) => println!("error: {e}"),
                }
            }
            "PUT" => {
                let key = parts.next().ok_or_else(|| anyhow!("PUT requires a key and a value"))?;
                let value = parts.next().ok_or_else(|| anyhow!("PUT requires a key and a value"))?;
                self.coordinator.put(key.as_bytes(), value.as_bytes().to_vec()).await?;
                println!("OK");
            }
            "COMMIT" => {
                if self.coordinator.commit().await {
                    println!("OK committed");
                } else {
                    println!("ABORTED");
                }
                if let Some(wait) = self.coordinator.commit_sleep {
                    if self.settings.show_stats.unwrap_or(false) {
                        println!("commit-wait: {}us", wait.as_micros());
                    }
                }
                self.in_transaction = false;
            }
            "ABORT" => {
                self.coordinator.abort().await;
                self.in_transaction = false;
                println!("OK aborted");
            }
            "STATUS" => {
                let shard: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(|| anyhow!("STATUS requires a shard index and a key"))?;
                let key = parts.next().ok_or_else(|| anyhow!("STATUS requires a shard index and a key"))?;
                match self.cluster.get_latest(shard, key.as_bytes()) {
                    Some((ts, v)) => println!("{} @ {}", String::from_utf8_lossy(&v), ts),
                    None => println!("N/A"),
                }
            }
            other => return Err(anyhow!("unknown command: {other}")),
        }

        Ok(true)
    }
}

fn get_history_path() -> String {
    format!("{}/.kvcli_history", std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}
