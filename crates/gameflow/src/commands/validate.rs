use crate::declaration;
use colored::Colorize;
use gameflow_cloud::reconciler::check_cardinality;
use gameflow_cloud::{SchemaCatalog, expand, resource_key};
use gameflow_config::Manifest;
use std::path::Path;

/// Check every declared resource without contacting GameLift
pub fn handle(manifest_path: &Path, manifest: &Manifest, catalog: &SchemaCatalog) -> anyhow::Result<()> {
    println!("{}", "Validating manifest...".blue());
    println!("Manifest: {}", manifest_path.display().to_string().cyan());

    let mut errors = 0;
    for (resource_type, name, body) in manifest.instances() {
        let key = resource_key(resource_type, name);
        let checked = catalog
            .require(resource_type)
            .map_err(|e| e.to_string())
            .and_then(|schema| {
                let desired = declaration::desired_state(body).map_err(|e| e.to_string())?;
                check_cardinality(&desired, &schema)
                    .and_then(|_| expand(&desired, &schema).map(|_| ()))
                    .map_err(|e| e.to_string())
            });
        match checked {
            Ok(()) => println!("  {} {}", "✓".green(), key.cyan()),
            Err(e) => {
                errors += 1;
                println!("  {} {}: {}", "✗".red(), key.cyan(), e);
            }
        }
    }

    println!();
    if errors > 0 {
        anyhow::bail!("{} of {} resources are invalid", errors, manifest.len());
    }
    println!(
        "{}",
        format!("✓ Manifest is valid ({} resources)", manifest.len())
            .green()
            .bold()
    );
    Ok(())
}
