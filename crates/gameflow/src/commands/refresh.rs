use colored::Colorize;
use gameflow_cloud::{Provider, ReadOutcome, StateManager, resource_key};

/// Pull the current attributes of every tracked resource into the state
pub async fn handle(provider: &dyn Provider, state_manager: &StateManager) -> anyhow::Result<()> {
    let lock = state_manager.acquire_lock("refresh").await?;
    let result = run(provider, state_manager).await;
    lock.release().await?;
    result
}

async fn run(provider: &dyn Provider, state_manager: &StateManager) -> anyhow::Result<()> {
    let mut state = state_manager.load().await?;
    if state.resources.is_empty() {
        println!("No tracked resources.");
        return Ok(());
    }

    println!("{}", "Refreshing tracked resources...".blue());
    let mut failures = 0;

    let tracked: Vec<(String, _)> = provider
        .catalog()
        .resource_types()
        .flat_map(|resource_type| {
            state
                .by_type(resource_type)
                .map(|(name, tracked)| (resource_key(resource_type, name), tracked.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    for (key, tracked) in tracked {
        let mut reconciler = provider.reconciler(&tracked.resource_type.clone(), Some(tracked))?;
        let outcome = reconciler.read().await;

        match outcome {
            Ok(ReadOutcome::Present) => println!("  {} {}", "✓".green(), key.cyan()),
            Ok(ReadOutcome::Tainted) => println!(
                "  {} {}: reports an error status, it will be replaced",
                "!".yellow(),
                key.cyan()
            ),
            Ok(ReadOutcome::Vanished) => println!(
                "  {} {}: no longer exists, it will be recreated",
                "!".yellow(),
                key.cyan()
            ),
            Err(e) => {
                failures += 1;
                println!("  {} {}: {}", "✗".red(), key.cyan(), e);
            }
        }
        state.record(&key, reconciler.into_tracked());
    }

    state_manager.save(&state).await?;

    if failures > 0 {
        anyhow::bail!("{} resources could not be refreshed", failures);
    }
    println!();
    println!("{}", "✓ State refreshed".green().bold());
    Ok(())
}
