use colored::Colorize;
use gameflow_cloud::{ActionType, Plan, ResourceSet, SchemaCatalog, StateManager};

pub fn print_plan(plan: &Plan) {
    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Replace => "±".magenta(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => " ".normal(),
        };
        let id = action
            .remote_id
            .as_deref()
            .map(|id| format!(" ({})", id).dimmed().to_string())
            .unwrap_or_default();
        println!("  {} {}{}", marker, action.description, id);
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}

/// Compare the manifest with the tracked state; GameLift is not contacted
pub async fn handle(
    resources: &ResourceSet,
    state_manager: &StateManager,
    catalog: &SchemaCatalog,
) -> anyhow::Result<()> {
    let state = state_manager.load().await?;
    let plan = Plan::compute(resources, &state, catalog)?;

    if !plan.has_changes {
        println!("{}", "No changes. Resources match the manifest.".green());
        return Ok(());
    }

    println!("{}", "Planned actions:".bold());
    print_plan(&plan);
    Ok(())
}
