use super::plan::print_plan;
use colored::Colorize;
use gameflow_cloud::{
    Action, ActionType, ApplyResult, DesiredState, GlobalState, Plan, Provider, ReadOutcome,
    ResourceReconciler, ResourceSet, StateManager, UpdateOutcome,
};
use std::time::Instant;

pub async fn handle(
    provider: &dyn Provider,
    resources: &ResourceSet,
    state_manager: &StateManager,
    yes: bool,
) -> anyhow::Result<()> {
    let lock = state_manager.acquire_lock("apply").await?;
    let result = run(provider, resources, state_manager, yes).await;
    lock.release().await?;
    result
}

async fn run(
    provider: &dyn Provider,
    resources: &ResourceSet,
    state_manager: &StateManager,
    yes: bool,
) -> anyhow::Result<()> {
    let mut state = state_manager.load().await?;
    let plan = Plan::compute(resources, &state, provider.catalog())?;

    if !plan.has_changes {
        println!("{}", "No changes. Resources match the manifest.".green());
        return Ok(());
    }

    println!("{}", "Planned actions:".bold());
    print_plan(&plan);

    if !yes {
        println!();
        println!("Run with --yes to apply these changes");
        return Ok(());
    }

    println!();
    let result = execute_plan(provider, &plan, resources, &mut state, state_manager).await?;
    report(&result)
}

/// Run the plan's actions in order, persisting state after each one
///
/// Stops at the first failure since later actions may depend on it.
pub async fn execute_plan(
    provider: &dyn Provider,
    plan: &Plan,
    resources: &ResourceSet,
    state: &mut GlobalState,
    state_manager: &StateManager,
) -> anyhow::Result<ApplyResult> {
    let started = Instant::now();
    let mut result = ApplyResult::new();

    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        let key = action.key();
        let tracked = state.get_resource(&key).cloned();
        let mut reconciler = provider.reconciler(&action.resource_type, tracked)?;

        let outcome = execute(&mut reconciler, action, resources).await;
        // the reconciler may hold a new identifier even when the action failed
        state.record(&key, reconciler.into_tracked());
        state_manager.save(state).await?;

        match outcome {
            Ok(message) => {
                println!("  {} {}: {}", "✓".green(), key.cyan(), message);
                result.add_success(key, message);
            }
            Err(e) => {
                println!("  {} {}: {}", "✗".red(), key.cyan(), e);
                tracing::debug!(kind = ?e.kind(), "{} failed", key);
                result.add_failure(key, e.to_string());
                break;
            }
        }
    }

    result.duration_ms = started.elapsed().as_millis() as u64;
    Ok(result)
}

async fn execute(
    reconciler: &mut ResourceReconciler,
    action: &Action,
    resources: &ResourceSet,
) -> gameflow_cloud::Result<String> {
    let declared = move || {
        resources
            .get(&action.resource_type, &action.name)
            .map(|r| &r.desired)
            .ok_or_else(|| {
                gameflow_cloud::CloudError::StateError(format!(
                    "{} is not declared",
                    action.key()
                ))
            })
    };

    match action.action_type {
        ActionType::Create => {
            let outcome = reconciler.create(declared()?).await?;
            Ok(created(reconciler, outcome))
        }
        ActionType::Update => match reconciler.update(declared()?).await? {
            UpdateOutcome::Unchanged => Ok("already up to date".to_string()),
            UpdateOutcome::Updated(ReadOutcome::Vanished) => {
                Ok("updated, but it no longer exists; run apply again".to_string())
            }
            UpdateOutcome::Updated(ReadOutcome::Tainted) => {
                Ok("updated, but reports an error status".to_string())
            }
            UpdateOutcome::Updated(ReadOutcome::Present) => {
                Ok(format!("updated ({})", action.changed.join(", ")))
            }
        },
        ActionType::Replace => {
            let desired: &DesiredState = declared()?;
            reconciler.delete().await?;
            let outcome = reconciler.create(desired).await?;
            Ok(format!("replaced, {}", created(reconciler, outcome)))
        }
        ActionType::Delete => {
            reconciler.delete().await?;
            Ok("deleted".to_string())
        }
        ActionType::NoOp => Ok("unchanged".to_string()),
    }
}

fn created(reconciler: &ResourceReconciler, outcome: ReadOutcome) -> String {
    let id = reconciler.id().unwrap_or("-");
    match outcome {
        ReadOutcome::Present => format!("created {}", id),
        ReadOutcome::Tainted => format!("created {} with an error status", id),
        ReadOutcome::Vanished => "created, but it disappeared immediately".to_string(),
    }
}

pub fn report(result: &ApplyResult) -> anyhow::Result<()> {
    println!();
    if result.is_success() {
        println!(
            "{}",
            format!(
                "✓ Applied {} actions in {}ms",
                result.succeeded.len(),
                result.duration_ms
            )
            .green()
            .bold()
        );
        Ok(())
    } else {
        anyhow::bail!(
            "{} actions applied, {} failed; state was saved, run plan to see what remains",
            result.succeeded.len(),
            result.failed.len()
        )
    }
}
