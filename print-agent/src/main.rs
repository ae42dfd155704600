use std::sync::Arc;

use print_agent::{AgentConfig, AgentError, PrintOrchestrator, logger};
use tern_client::{HttpJobSource, SourceConfig};
use tern_printer::{LabelGeometry, UsbPrinter, discover_devices};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

type Agent = PrintOrchestrator<HttpJobSource, UsbPrinter>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = AgentConfig::from_env();
    logger::init(&config.log_level);

    tracing::info!(base_url = %config.base_url, "print agent starting");

    let source = HttpJobSource::new(
        &SourceConfig::new(&config.base_url, &config.api_key).with_timeout(config.request_timeout),
    );
    let agent: Arc<Agent> = Arc::new(PrintOrchestrator::new(source, LabelGeometry::default()));

    attach_printer(&agent, &config).await;

    if let Err(e) = agent.refresh_queue().await {
        tracing::warn!(error = %e, "initial queue refresh failed");
    }

    let shutdown = CancellationToken::new();
    let poll_task = tokio::spawn(
        agent
            .clone()
            .run_poll_loop(config.poll_interval, shutdown.clone()),
    );

    run_shell(&agent, &config).await;

    shutdown.cancel();
    let _ = poll_task.await;
    tracing::info!("print agent stopped");
    Ok(())
}

/// Attach the configured device, or the only discovered one
async fn attach_printer(agent: &Agent, config: &AgentConfig) {
    if let Some(device) = &config.device {
        agent
            .set_printer(UsbPrinter::new(device), device.clone())
            .await;
        return;
    }

    let devices = discover_devices(&config.device_dir);
    match devices.as_slice() {
        [] => tracing::warn!(
            dir = %config.device_dir.display(),
            "no printer attached; connect one and run 'printers'"
        ),
        [only] => {
            agent.set_printer(UsbPrinter::new(only), only.clone()).await;
        }
        many => tracing::info!(
            count = many.len(),
            "multiple printers found; select one with 'use <n>'"
        ),
    }
}

/// Minimal operator shell; the engine API is the real surface
async fn run_shell(agent: &Agent, config: &AgentConfig) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if !handle_command(agent, config, line.trim()).await {
                    break;
                }
            }
        }
    }
}

async fn handle_command(agent: &Agent, config: &AgentConfig, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let arg = parts.next();

    match command {
        "" => {}
        "help" => print_help(),
        "printers" => {
            let devices = discover_devices(&config.device_dir);
            if devices.is_empty() {
                println!("no printers found under {}", config.device_dir.display());
            }
            for (i, device) in devices.iter().enumerate() {
                println!("  {}. {}", i + 1, device.display());
            }
        }
        "use" => {
            let devices = discover_devices(&config.device_dir);
            match arg.and_then(|a| a.parse::<usize>().ok()) {
                Some(n) if n >= 1 && n <= devices.len() => {
                    let device = &devices[n - 1];
                    agent
                        .set_printer(UsbPrinter::new(device), device.clone())
                        .await;
                    println!("using {}", device.display());
                }
                _ => println!("usage: use <number from 'printers'>"),
            }
        }
        "calibrate" => match agent.calibrate().await {
            Ok(()) => println!("calibrated"),
            Err(e) => println!("calibration failed: {}", e),
        },
        "test" => match agent.print_test_label().await {
            Ok(()) => println!("test label sent; check the alignment"),
            Err(e) => println!("test print failed: {}", e),
        },
        "refresh" => match agent.refresh_queue().await {
            Ok(jobs) => println!("{} pending job(s)", jobs.len()),
            Err(e) => println!("refresh failed: {}", e),
        },
        "jobs" => {
            let jobs = agent.pending_jobs().await;
            if jobs.is_empty() {
                println!("queue is empty");
            }
            for job in jobs {
                println!(
                    "  #{:<5} {:<12} {:>4} labels  {}",
                    job.id,
                    format!("{:?}", job.source).to_lowercase(),
                    job.total_labels,
                    job.note.as_deref().unwrap_or("")
                );
            }
        }
        "print" => match arg.and_then(|a| a.parse::<i64>().ok()) {
            Some(id) => match agent.print_job(id).await {
                Ok(()) => {
                    let progress = agent.subscribe().borrow().clone();
                    println!(
                        "job #{} done: {}/{} labels",
                        id, progress.labels_printed, progress.labels_total
                    );
                }
                Err(AgentError::Busy) => println!("another print is in progress"),
                Err(e) => {
                    let progress = agent.subscribe().borrow().clone();
                    println!(
                        "job #{} failed after {}/{} labels: {}",
                        id, progress.labels_printed, progress.labels_total, e
                    );
                }
            },
            None => println!("usage: print <job id>"),
        },
        "status" => {
            match agent.device().await {
                Some(device) => println!(
                    "printer: {} ({})",
                    device.display(),
                    if agent.is_calibrated().await {
                        "calibrated"
                    } else {
                        "not calibrated"
                    }
                ),
                None => println!("printer: none selected"),
            }
            println!("pending jobs: {}", agent.pending_jobs().await.len());
            let owed = agent.unreported_jobs().await;
            if !owed.is_empty() {
                println!("completion reports owed: {:?}", owed);
            }
        }
        "quit" | "exit" => return false,
        other => println!("unknown command '{}'; try 'help'", other),
    }

    true
}

fn print_help() {
    println!("commands:");
    println!("  printers         list attached label printers");
    println!("  use <n>          select a printer");
    println!("  calibrate        re-sync the gap sensor");
    println!("  test             print an alignment test label");
    println!("  refresh          refresh the job queue now");
    println!("  jobs             show pending jobs");
    println!("  print <id>       print all labels for a job");
    println!("  status           printer and queue status");
    println!("  quit             exit");
}
