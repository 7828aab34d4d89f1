//! kata CLI - runs the roster and context runner demos.

use anyhow::Result;
use clap::{Parser, Subcommand};
use kata_context::{
    process_items, simulate_work, BasicContextManager, CancelPolicy, Context, ContextManager,
    RunnerConfig,
};
use kata_roster::{Employee, EmployeeId, Manager};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kata")]
#[command(about = "Employee roster and cancellable task runner demos", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the employee roster scenario
    Roster,
    /// Run the cancellable context scenario
    Context {
        /// Timeout for the batch run, in milliseconds
        #[arg(long, default_value = "150")]
        timeout_ms: u64,
        /// Processing time per item, in milliseconds
        #[arg(long, default_value = "100")]
        item_delay_ms: u64,
        /// Items to process
        #[arg(long, value_delimiter = ',', default_value = "item1,item2,item3")]
        items: Vec<String>,
        /// Abort tasks whose context is cancelled instead of detaching them
        #[arg(long)]
        abort_on_cancel: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Roster => run_roster(),
        Commands::Context {
            timeout_ms,
            item_delay_ms,
            items,
            abort_on_cancel,
        } => {
            let config = RunnerConfig::new()
                .with_item_delay(Duration::from_millis(item_delay_ms))
                .with_on_cancel(if abort_on_cancel {
                    CancelPolicy::Abort
                } else {
                    CancelPolicy::Detach
                });
            run_context(config, Duration::from_millis(timeout_ms), &items).await?;
        }
    }

    Ok(())
}

fn run_roster() {
    let mut manager = Manager::new();
    manager.add_employee(Employee::new(1, "Alice", 30, 70000.0));
    manager.add_employee(Employee::new(2, "Bob", 25, 65000.0));
    manager.remove_employee(EmployeeId(1));

    let average_salary = manager.average_salary();
    println!("Average Salary: {:.6}", average_salary);

    if let Some(employee) = manager.find_employee_by_id(EmployeeId(2)) {
        println!("Employee found: {}", employee);
    }
}

async fn run_context(config: RunnerConfig, timeout: Duration, items: &[String]) -> Result<()> {
    println!("Context Management Challenge");

    let cm = BasicContextManager::new().with_config(config);

    let (ctx, cancel) = cm.create_cancellable_context(&Context::background());
    let ctx = cm.add_value(&ctx, "user", "alice".into());
    let ctx = cm.add_value(&ctx, "requestID", "12345".into());

    println!("Context created with values!");
    for key in ["user", "requestID"] {
        match cm.get_value(&ctx, key) {
            Some(value) => println!("  {key} = {value}"),
            None => println!("  {key} not set"),
        }
    }

    let (batch_ctx, batch_cancel) = cm.create_timeout_context(&ctx, timeout);
    let output = process_items(&batch_ctx, items, cm.config()).await;
    batch_cancel.cancel();

    println!("Processed {}/{} items: {:?}", output.items.len(), items.len(), output.items);
    if let Some(reason) = output.error {
        println!("Batch stopped early: {reason}");
    }

    // The task watches the same context, so it stops with the caller.
    let (work_ctx, work_cancel) = cm.create_timeout_context(&ctx, timeout);
    let task_ctx = work_ctx.clone();
    let result = cm
        .execute_with_context(
            &work_ctx,
            Box::pin(async move {
                simulate_work(&task_ctx, Duration::from_millis(50), "quick task").await?;
                Ok::<(), anyhow::Error>(())
            }),
        )
        .await;
    work_cancel.cancel();

    match result {
        Ok(()) => println!("Task completed"),
        Err(e) => println!("Task stopped: {e}"),
    }

    match cm.wait_for_completion(&ctx, Duration::from_millis(10)).await {
        Ok(()) => println!("Wait completed"),
        Err(e) => println!("Wait stopped: {e}"),
    }

    cancel.cancel();
    info!(state = ?ctx.state(), "Root context cancelled");

    Ok(())
}
