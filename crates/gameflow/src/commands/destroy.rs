use super::apply::{execute_plan, report};
use super::plan::print_plan;
use colored::Colorize;
use gameflow_cloud::{Plan, Provider, ResourceSet, StateManager};

/// Delete every tracked resource, dependents first
pub async fn handle(provider: &dyn Provider, state_manager: &StateManager, yes: bool) -> anyhow::Result<()> {
    let lock = state_manager.acquire_lock("destroy").await?;
    let result = run(provider, state_manager, yes).await;
    lock.release().await?;
    result
}

async fn run(provider: &dyn Provider, state_manager: &StateManager, yes: bool) -> anyhow::Result<()> {
    let mut state = state_manager.load().await?;
    let nothing = ResourceSet::new();
    let plan = Plan::compute(&nothing, &state, provider.catalog())?;

    if !plan.has_changes {
        println!("No tracked resources.");
        return Ok(());
    }

    println!("{}", "Resources to delete:".bold());
    print_plan(&plan);

    if !yes {
        println!();
        println!(
            "{}",
            "Warning: the GameLift resources above will be deleted.".yellow()
        );
        println!("Run with --yes to delete them");
        return Ok(());
    }

    println!();
    let result = execute_plan(provider, &plan, &nothing, &mut state, state_manager).await?;
    report(&result)
}
