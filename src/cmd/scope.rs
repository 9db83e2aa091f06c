//! Scope listing and transition commands — `scopectl orgs|companies|products`,
//! `scopectl use`, `scopectl up`.

use anyhow::{Result, bail};
use console::style;
use dialoguer::Select;
use scopectl::context::{ActiveContextManager, ContextSnapshot};
use scopectl::ui;

use super::super::UseTarget;

fn print_list(title: &str, entries: &[(String, String)], selected: Option<&str>) {
    if entries.is_empty() {
        ui::notice(&format!("No {title} in the current scope."));
        return;
    }
    println!("{}", style(title).bold());
    for (id, name) in entries {
        let marker = if Some(id.as_str()) == selected {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!("  {marker} {name} {}", style(format!("({id})")).dim());
    }
}

pub async fn cmd_orgs() -> Result<()> {
    let manager = super::bootstrap().await?;
    let snap = manager.snapshot().await;
    let entries: Vec<_> = snap
        .organizations
        .iter()
        .map(|org| (org.id.clone(), org.name.clone()))
        .collect();
    let selected = snap
        .active_context
        .as_ref()
        .map(|ctx| ctx.organization_id.clone());
    print_list("Organizations", &entries, selected.as_deref());
    Ok(())
}

pub async fn cmd_companies() -> Result<()> {
    let manager = super::bootstrap().await?;
    let snap = manager.snapshot().await;
    if snap.active_context.is_none() {
        ui::notice("No scope selected; run `scopectl use org` first.");
        return Ok(());
    }
    let entries: Vec<_> = snap
        .companies
        .iter()
        .map(|company| (company.id.clone(), company.name.clone()))
        .collect();
    let selected = snap
        .active_context
        .as_ref()
        .and_then(|ctx| ctx.company_id.clone());
    print_list("Companies", &entries, selected.as_deref());
    Ok(())
}

pub async fn cmd_products() -> Result<()> {
    let manager = super::bootstrap().await?;
    let snap = manager.snapshot().await;
    match &snap.active_context {
        None => {
            ui::notice("No scope selected; run `scopectl use org` first.");
            return Ok(());
        }
        Some(ctx) if ctx.company_id.is_none() => {
            ui::notice("No company selected; run `scopectl use company` first.");
            return Ok(());
        }
        Some(_) => {}
    }
    let entries: Vec<_> = snap
        .products
        .iter()
        .map(|product| (product.id.clone(), product.name.clone()))
        .collect();
    let selected = snap
        .active_context
        .as_ref()
        .and_then(|ctx| ctx.product_id.clone());
    print_list("Products", &entries, selected.as_deref());
    Ok(())
}

/// Pick an id from the option list, either validating the one given or
/// prompting interactively.
fn resolve_id(
    what: &str,
    given: Option<String>,
    options: &[(String, String)],
) -> Result<String> {
    if options.is_empty() {
        bail!("No {what} available in the current scope");
    }
    if let Some(id) = given {
        if !options.iter().any(|(option_id, _)| option_id == &id) {
            bail!("Unknown {what} id '{id}'. Run the matching list command to see valid ids.");
        }
        return Ok(id);
    }
    let names: Vec<String> = options
        .iter()
        .map(|(id, name)| format!("{name} ({id})"))
        .collect();
    let choice = Select::new()
        .with_prompt(format!("Select {what}"))
        .items(&names)
        .default(0)
        .interact()?;
    Ok(options[choice].0.clone())
}

async fn report(manager: &ActiveContextManager) {
    let snap: ContextSnapshot = manager.snapshot().await;
    match snap.active_context {
        Some(ctx) => ui::success(&format!("Active scope: {}", ctx.breadcrumb())),
        None => ui::notice("No scope selected."),
    }
}

pub async fn cmd_use(target: UseTarget) -> Result<()> {
    let manager = super::bootstrap().await?;
    let snap = manager.snapshot().await;

    match target {
        UseTarget::Org { id } => {
            let options: Vec<_> = snap
                .organizations
                .iter()
                .map(|org| (org.id.clone(), org.name.clone()))
                .collect();
            let id = resolve_id("organization", id, &options)?;
            manager.set_organization_context(&id).await;
        }
        UseTarget::Company { id } => {
            if snap.active_context.is_none() {
                bail!("No scope selected; run `scopectl use org` first");
            }
            let options: Vec<_> = snap
                .companies
                .iter()
                .map(|company| (company.id.clone(), company.name.clone()))
                .collect();
            let id = resolve_id("company", id, &options)?;
            manager.set_company_context(&id).await;
        }
        UseTarget::Product { id } => {
            match &snap.active_context {
                Some(ctx) if ctx.company_id.is_some() => {}
                _ => bail!("No company selected; run `scopectl use company` first"),
            }
            let options: Vec<_> = snap
                .products
                .iter()
                .map(|product| (product.id.clone(), product.name.clone()))
                .collect();
            let id = resolve_id("product", id, &options)?;
            manager.set_product_context(&id).await;
        }
    }

    report(&manager).await;
    Ok(())
}

pub async fn cmd_up() -> Result<()> {
    let manager = super::bootstrap().await?;
    let before = manager.snapshot().await.active_context;
    manager.go_up_one_level().await;
    let after = manager.snapshot().await.active_context;
    if before == after {
        ui::notice("Already at the organization level.");
    } else {
        report(&manager).await;
    }
    Ok(())
}
