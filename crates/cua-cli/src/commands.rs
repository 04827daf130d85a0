//! CLI commands implementation

use std::time::Duration;

use anyhow::{Context, Result};
use cua_core::{Config, LlmReasoner, NativeActuator, OmniParserClient, PrimaryMonitorCapture};

use crate::agent::{StepLoop, Summary};

// ANSI color codes
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn print_status(ok: bool, msg: &str) {
    let icon = if ok {
        format!("{}✓{}", GREEN, RESET)
    } else {
        format!("{}✗{}", RED, RESET)
    };
    println!("  {} {}", icon, msg);
}

fn load_config() -> Config {
    Config::try_load().unwrap_or_else(|| {
        eprintln!(
            "{}No cua.toml found, using built-in defaults{}",
            YELLOW, RESET
        );
        Config::default_minimal()
    })
}

/// Execute a task against the live screen.
pub async fn run(task: &str, max_steps: Option<usize>, json: bool) -> Result<()> {
    let config = load_config();
    let max_steps = max_steps.unwrap_or(config.agent.max_steps);

    let capture = PrimaryMonitorCapture::new(Duration::from_millis(config.agent.settle_delay_ms));
    let parser = OmniParserClient::new(
        config.omniparser_url(),
        Duration::from_secs(config.omniparser.timeout_secs),
    );
    let reasoner = LlmReasoner::new(
        config.llm_url(),
        &config.llm.model,
        Duration::from_secs(config.llm.timeout_secs),
    )
    .max_tokens(config.llm.max_tokens)
    .temperature(config.llm.temperature);
    let actuator = NativeActuator::new().context("Failed to initialize input driver")?;

    if !json {
        println!("{}Task:{} {}", BOLD, RESET, task);
        println!("{}Max steps: {}{}", DIM, max_steps, RESET);
    }

    let agent = StepLoop::new(capture, parser, reasoner, actuator);
    let summary = agent.run(task, max_steps).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if summary.error.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("run failed: {}", summary.error)
    }
}

fn print_summary(summary: &Summary) {
    println!("\n{}Run Summary{}", BOLD, RESET);
    println!("  Task: {}", summary.task);
    if summary.completed {
        print_status(true, "Task completed");
    } else if summary.error.is_empty() {
        println!(
            "  {}Step budget exhausted after {} steps{}",
            YELLOW, summary.steps_executed, RESET
        );
    } else {
        print_status(false, &format!("Failed: {}", summary.error));
    }
    println!("  Steps executed: {}", summary.steps_executed);
    println!("  Elements on last screen: {}", summary.elements_found);
    if !summary.reasoning.is_empty() {
        println!("  Last reasoning: {}{}{}", DIM, summary.reasoning, RESET);
    }
    if !summary.history.is_empty() {
        println!("\n{}Actions{}", BOLD, RESET);
        for (i, action) in summary.history.iter().enumerate() {
            println!("  {}. {}", i + 1, action);
        }
    }
}

/// Show backing service reachability and effective settings.
pub async fn status() -> Result<()> {
    let config = load_config();

    println!("{}Computer Use Agent Status{}", BOLD, RESET);

    println!("\n{}OmniParser{}", BOLD, RESET);
    println!("  Endpoint: {}", config.omniparser_url());
    let parser = OmniParserClient::new(
        config.omniparser_url(),
        Duration::from_secs(config.omniparser.timeout_secs),
    );
    if parser.health_check().await {
        print_status(true, "OmniParser is reachable");
    } else {
        print_status(false, "OmniParser is not reachable");
    }

    println!("\n{}LLM{}", BOLD, RESET);
    println!("  Endpoint: {}", config.llm_url());
    println!("  Model: {}", config.llm.model);
    let reasoner = LlmReasoner::new(
        config.llm_url(),
        &config.llm.model,
        Duration::from_secs(config.llm.timeout_secs),
    );
    if reasoner.health_check().await {
        print_status(true, "LLM endpoint is reachable");
    } else {
        print_status(false, "LLM endpoint is not reachable");
    }

    println!("\n{}Agent{}", BOLD, RESET);
    println!("  Max steps: {}", config.agent.max_steps);
    println!("  Settle delay: {} ms", config.agent.settle_delay_ms);

    Ok(())
}
