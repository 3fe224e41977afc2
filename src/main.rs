use clap::Parser;
use mcp_devstack::adapters::{Backends, OpenAiClient};
use mcp_devstack::config::cli::{AssistantArgs, CheckArgs, Command, QueryTarget};
use mcp_devstack::config::manifest::ComposeFile;
use mcp_devstack::config::settings;
use mcp_devstack::core::assistant::{self, ChatInput, ChatSession, Responder, SAMPLE_QUESTIONS};
use mcp_devstack::core::checks::{self, CheckReport, Finding};
use mcp_devstack::core::query::{self, ArticleQuery, ProductFilter};
use mcp_devstack::core::seed::SeedOutcome;
use mcp_devstack::core::status::{collect_summaries, StatusReport};
use mcp_devstack::core::{analysis, diagnosis, endpoints};
use mcp_devstack::domain::model::{ProductMatch, RedisValue};
use mcp_devstack::utils::logger;
use mcp_devstack::utils::validation::redact_userinfo;
use mcp_devstack::{CliConfig, Result, SeedEngine, StackConfig, StatusManager};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting mcp-devstack");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

fn load_config(cli: &CliConfig) -> Result<StackConfig> {
    let config = StackConfig::load(Some(&cli.env_file), Some(&cli.secrets_file))?;
    tracing::debug!(
        "Loaded configuration: redis={} postgres={} elastic={} qdrant={}",
        config.redis.url(),
        redact_userinfo(&config.postgres_url),
        config.elastic_url,
        config.qdrant_url
    );
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: CliConfig) -> Result<i32> {
    match &cli.command {
        Command::Status { watch, json } => {
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            let manager = StatusManager::new(backends.all(), config.status_cache_ttl());

            let Some(seconds) = watch else {
                let report = manager.check_all().await;
                print_status(&report, *json)?;
                return Ok(if report.all_healthy() { 0 } else { 2 });
            };

            let interval = Duration::from_secs((*seconds).max(1));
            loop {
                let report = manager.refresh().await;
                print_status(&report, *json)?;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => return Ok(0),
                }
            }
        }

        Command::Summary { detailed, json } => {
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            run_summary(&backends, *detailed, *json).await
        }

        Command::Seed { only, monitor } => {
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            if *monitor {
                tracing::info!("🔍 Process monitoring enabled");
            }

            let report = SeedEngine::new_with_monitoring(backends.seeders(), *monitor)
                .only(only)
                .run()
                .await;
            for result in &report.results {
                match &result.outcome {
                    SeedOutcome::Ok { items } => println!("✅ {}: {} items", result.service, items),
                    SeedOutcome::Failed { error } => println!("❌ {}: {}", result.service, error),
                }
            }
            let report = report.into_result()?;
            println!("🌱 Seeded {} items", report.total_items());
            Ok(0)
        }

        Command::Query { target } => {
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            run_query(&backends, target).await
        }

        Command::Analyze => {
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            let manager = StatusManager::new(backends.all(), config.status_cache_ttl());
            let status = manager.check_all().await;
            let report = analysis::run_analysis(&status, &backends.postgres, &backends.redis).await?;
            println!("{}", report);
            Ok(0)
        }

        Command::Ask {
            question,
            assistant: args,
        } => {
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            let mut session = build_session(&config, &backends, args).await?;
            println!("{}", session.ask(question).await?);
            Ok(0)
        }

        Command::Chat {
            assistant: args,
            samples,
        } => {
            if *samples {
                println!("💡 Sample questions:");
                for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
                    println!("  {}. {}", i + 1, question);
                }
                return Ok(0);
            }
            let config = load_config(&cli)?;
            let backends = Backends::from_config(&config)?;
            let session = build_session(&config, &backends, args).await?;
            run_chat(session).await
        }

        Command::Check(args) => run_checks(&cli, args).await,

        Command::Endpoints => {
            let config = load_config(&cli)?;
            let checks = endpoints::probe_endpoints(&config.mcp_endpoints, config.probe_timeout()).await?;
            for check in &checks {
                println!("{}: {} ({})", check.name, check.state, check.url);
            }
            Ok(0)
        }

        Command::Diagnose => {
            let config = load_config(&cli)?;
            let values = settings::collect_values(
                Some(&cli.env_file),
                Some(&cli.secrets_file),
                std::env::vars(),
            )?;
            let items = diagnosis::run_diagnosis(&config, &values).await;
            for item in &items {
                println!("{}", item);
            }
            Ok(if items.iter().all(|i| i.passed) { 0 } else { 1 })
        }
    }
}

fn print_status(report: &StatusReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    println!("🔍 Service status ({})", report.checked_at.format("%Y-%m-%d %H:%M:%S"));
    for status in &report.statuses {
        let mut line = format!("  {:<14} {} ({} ms)", status.service, status.label(), status.latency_ms);
        if !status.healthy {
            line.push_str(&format!(" - {}", status.details));
        }
        println!("{}", line);
    }
    println!(
        "{}/{} services connected",
        report.connected_count(),
        report.statuses.len()
    );
    Ok(())
}

async fn run_summary(backends: &Backends, detailed: bool, json: bool) -> Result<i32> {
    let summaries = collect_summaries(&backends.all()).await;
    if json && !detailed {
        print_json(&summaries)?;
        return Ok(0);
    }

    if !json {
        for summary in &summaries {
            let marker = if summary.complete { "" } else { " (partial)" };
            println!("📦 {}{}", summary.service, marker);
            for (key, value) in &summary.metrics {
                println!("  {}: {}", key, value);
            }
        }
    }
    if !detailed {
        return Ok(0);
    }

    let redis = backends.redis.details().await;
    let postgres = backends.postgres.details().await;

    if json {
        let redis = redis.map_err(|e| e.to_string());
        let postgres = postgres.map_err(|e| e.to_string());
        return print_json(&serde_json::json!({
            "summaries": summaries,
            "redis": redis.as_ref().ok(),
            "redis_error": redis.as_ref().err(),
            "postgres": postgres.as_ref().ok(),
            "postgres_error": postgres.as_ref().err(),
        }))
        .map(|_| 0);
    }

    match redis {
        Ok(details) => {
            println!("\n🔴 Redis sessions");
            for session in &details.sessions {
                let fields: Vec<String> = session.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                println!("  {}", fields.join(", "));
            }
            println!("🔴 Redis counters");
            for (name, value) in &details.counters {
                println!("  {}: {}", name, value);
            }
            println!("🔴 Categories: {}", details.categories.join(", "));
            println!("🔴 Recent searches: {}", details.search_history.join(", "));
        }
        Err(e) => println!("\n🔴 Redis details unavailable: {}", e),
    }

    match postgres {
        Ok(details) => {
            println!("\n🟦 Customers\n{}", details.customers.render());
            println!("\n🟦 Latest orders\n{}", details.orders.render());
            println!("\n🟦 Products\n{}", details.products.render());
            println!("\n💰 Total sales: {}", analysis::format_yen(details.total_sales));
        }
        Err(e) => println!("\n🟦 PostgreSQL details unavailable: {}", e),
    }
    Ok(0)
}

fn print_products(products: &[ProductMatch]) {
    if products.is_empty() {
        println!("No matching products");
        return;
    }
    for item in products {
        let score = item
            .score
            .map(|s| format!(" score={:.3}", s))
            .unwrap_or_default();
        println!(
            "#{} {} [{}] {}{}\n    {}",
            item.id,
            item.product.name,
            item.product.category,
            analysis::format_yen(item.product.price as i64),
            score,
            item.product.description
        );
    }
}

async fn run_query(backends: &Backends, target: &QueryTarget) -> Result<i32> {
    match target {
        QueryTarget::Redis { command } => {
            let command = query::parse_redis_command(&command.join(" "))?;
            match backends.redis.execute(&command).await? {
                RedisValue::Nil => println!("(nil)"),
                RedisValue::Text(value) => println!("{}", value),
                RedisValue::List(items) if items.is_empty() => println!("(empty list)"),
                RedisValue::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        println!("{}) {}", i + 1, item);
                    }
                }
                RedisValue::Map(map) => {
                    for (key, value) in &map {
                        println!("{}: {}", key, value);
                    }
                }
            }
        }
        QueryTarget::Sql { query, csv } => {
            let table = backends.postgres.run_select(query).await?;
            match csv {
                Some(dir) => {
                    let file_name = format!(
                        "query_result_{}.csv",
                        chrono::Local::now().format("%Y%m%d_%H%M%S")
                    );
                    let path = dir.join(file_name);
                    std::fs::write(&path, table.to_csv()?)?;
                    println!("📁 {} rows written to {}", table.len(), path.display());
                }
                None => {
                    println!("{}", table.render());
                    println!("({} rows)", table.len());
                }
            }
        }
        QueryTarget::Search { term, field } => {
            let query = ArticleQuery::new(term.clone(), (*field).into())?;
            let hits = backends.elastic.search_articles(&query).await?;
            if hits.is_empty() {
                println!("No articles found for '{}'", term);
            }
            for hit in &hits {
                println!(
                    "[{}] {} ({:.2}) - {} / {} / {}",
                    hit.id,
                    hit.article.title,
                    hit.score,
                    hit.article.author,
                    hit.article.category,
                    hit.article.published_date
                );
                for (field, fragment) in &hit.highlights {
                    println!("    {}: {}", field, fragment);
                }
            }
        }
        QueryTarget::Products(args) => {
            let filter = ProductFilter::from(args);
            print_products(&backends.qdrant.filter_products(&filter).await?);
        }
        QueryTarget::Similar { id, filter } => {
            let filter = ProductFilter::from(filter);
            print_products(&backends.qdrant.similar_products(*id, &filter).await?);
        }
    }
    Ok(0)
}

async fn build_session(
    config: &StackConfig,
    backends: &Backends,
    args: &AssistantArgs,
) -> Result<ChatSession> {
    let manager = StatusManager::new(backends.all(), config.status_cache_ttl());
    let status = manager.check_all().await;
    assistant::readiness_gate(&status, args.force)?;

    let responder = if args.offline {
        Responder::Offline
    } else {
        let api_key = config.openai_api_key()?;
        let client = OpenAiClient::new(&config.openai, api_key, COMPLETION_TIMEOUT)?;
        tracing::info!("Using model {}", client.model());
        Responder::Online(client)
    };

    let summaries = collect_summaries(&backends.all()).await;
    Ok(ChatSession::new(responder, assistant::system_prompt(&summaries)))
}

async fn run_chat(mut session: ChatSession) -> Result<i32> {
    println!("🤖 Ask about the demo data. /clear resets the history, /exit leaves.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(0);
        };
        match assistant::parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => return Ok(0),
            ChatInput::Clear => {
                session.clear();
                println!("🗑️ History cleared");
            }
            ChatInput::Prompt(prompt) => match session.ask(&prompt).await {
                Ok(answer) => println!("{}\n", answer),
                Err(e) => {
                    tracing::warn!("Assistant call failed: {}", e);
                    eprintln!("❌ {}", e.user_friendly_message());
                    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
                }
            },
        }
    }
}

async fn run_checks(cli: &CliConfig, args: &CheckArgs) -> Result<i32> {
    let mut report = CheckReport::default();

    match checks::check_template_parity(&args.env_template, &args.secrets_template) {
        Ok(findings) => report.extend(findings),
        Err(e) => report.extend([Finding::error("templates", e.to_string())]),
    }

    match ComposeFile::from_file(&args.compose) {
        Ok(manifest) => report.extend(checks::check_compose(&manifest)),
        Err(e) => report.extend([Finding::error(args.compose.display().to_string(), e.to_string())]),
    }

    let known = checks::known_secrets(&cli.env_file, &cli.secrets_file)?;
    tracing::debug!("Scanning {} for {} known secrets", args.scan_root.display(), known.len());
    report.extend(checks::scan_for_secrets(
        &args.scan_root,
        &known,
        &[cli.env_file.clone(), cli.secrets_file.clone()],
    )?);

    if args.live {
        let config = load_config(cli)?;
        let backends = Backends::from_config(&config)?;
        let status = StatusManager::new(backends.all(), config.status_cache_ttl())
            .refresh()
            .await;
        report.extend(checks::status_findings(&status));
    }

    println!("{}", report.render());
    Ok(if report.has_errors() { 1 } else { 0 })
}
