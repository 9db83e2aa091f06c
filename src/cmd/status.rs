//! Scope inspection commands — `scopectl status` and `scopectl permissions`.

use anyhow::Result;
use console::style;
use scopectl::context::Permissions;
use scopectl::ui;

pub async fn cmd_status() -> Result<()> {
    let manager = super::bootstrap().await?;
    let snap = manager.snapshot().await;

    let Some(ctx) = snap.active_context else {
        ui::notice("No scope selected. Sign in and run `scopectl use org`.");
        if !snap.organizations.is_empty() {
            println!();
            println!("Organizations available: {}", snap.organizations.len());
        }
        return Ok(());
    };

    println!("{}", style(ctx.breadcrumb()).bold());
    ui::detail("level", &ctx.level.to_string());
    ui::detail("organization", &ctx.organization_id);
    if let Some(company_id) = &ctx.company_id {
        ui::detail("company", company_id);
    }
    if let Some(product_id) = &ctx.product_id {
        ui::detail("product", product_id);
    }
    println!();
    ui::detail("companies in scope", &snap.companies.len().to_string());
    ui::detail("products in scope", &snap.products.len().to_string());
    Ok(())
}

pub async fn cmd_permissions() -> Result<()> {
    let manager = super::bootstrap().await?;
    let snap = manager.snapshot().await;

    let Some(ctx) = snap.active_context else {
        ui::notice("No scope selected; no permissions to show.");
        return Ok(());
    };
    let Some(perms) = snap.permissions else {
        ui::notice("Permissions not loaded.");
        return Ok(());
    };

    println!("Permissions in {}", style(ctx.breadcrumb()).bold());
    if perms == Permissions::conservative_default() {
        ui::notice("Degraded: the authorization service could not be reached; showing the read-only fallback.");
    }
    println!();
    let flag = |name: &str, allowed: bool| {
        let mark = if allowed {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {mark} {name}");
    };
    flag("read", perms.can_read);
    flag("create", perms.can_create);
    flag("update", perms.can_update);
    flag("delete", perms.can_delete);
    flag("publish", perms.can_publish);
    flag("manage-team", perms.can_manage_team);
    flag("view-analytics", perms.can_view_analytics);
    Ok(())
}
