//! Account commands: register, login, logout, whoami, profile

use clap::Args;

use crate::display::format::mask_email;
use crate::error::BudgetResult;
use crate::services::BudgetService;

use super::context::{password_or_prompt, CliContext};

#[derive(Args)]
pub struct RegisterArgs {
    /// Email address used to sign in
    pub email: String,
    /// Name shown on your member card
    #[arg(short, long)]
    pub name: Option<String>,
    /// Password (prompted for when omitted)
    #[arg(long, env = "FAMB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct LoginArgs {
    pub email: String,
    /// Password (prompted for when omitted)
    #[arg(long, env = "FAMB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// New display name
    #[arg(short, long)]
    pub name: Option<String>,
    /// Change the password (asks for the current and new one)
    #[arg(long)]
    pub change_password: bool,
}

pub fn handle_register(ctx: &CliContext, args: RegisterArgs) -> BudgetResult<()> {
    let password = password_or_prompt(args.password, "Password: ")?;
    let name = args.name.unwrap_or_default();
    let user = ctx.auth().register(&args.email, &password, &name)?;
    println!("Welcome, {}! You are signed in as {}.", user.display_name, user.email);

    let budget = ctx.active_budget(&user)?;
    println!("Your budget '{}' is ready. Invite code: {}", budget.name, budget.invite_code);
    Ok(())
}

pub fn handle_login(ctx: &CliContext, args: LoginArgs) -> BudgetResult<()> {
    let password = password_or_prompt(args.password, "Password: ")?;
    let user = ctx.auth().login(&args.email, &password)?;
    println!("Signed in as {} ({}).", user.display_name, user.email);
    Ok(())
}

pub fn handle_logout(ctx: &CliContext) -> BudgetResult<()> {
    if !ctx.auth().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    ctx.auth().logout()?;
    println!("Signed out.");
    Ok(())
}

pub fn handle_whoami(ctx: &CliContext) -> BudgetResult<()> {
    let Some(user) = ctx.auth().current_user()? else {
        println!("Not signed in. Run 'famb login <email>'.");
        return Ok(());
    };
    println!("{} <{}>", user.display_name, mask_email(&user.email));

    let budgets = BudgetService::new(ctx.storage()).get_user_budgets(user.id)?;
    let active = ctx.auth().active_budget_id()?;
    for budget in budgets {
        let marker = if Some(budget.id) == active { "*" } else { " " };
        println!("  {} {} ({})", marker, budget.name, budget.invite_code);
    }
    Ok(())
}

pub fn handle_profile(ctx: &CliContext, args: ProfileArgs) -> BudgetResult<()> {
    let mut user = ctx.user()?;
    if let Some(name) = args.name {
        user = ctx.auth().update_profile(&name)?;
        println!("Display name changed to '{}'.", user.display_name);
    }
    if args.change_password {
        let current = password_or_prompt(None, "Current password: ")?;
        let new = password_or_prompt(None, "New password: ")?;
        ctx.auth().change_password(&current, &new)?;
        println!("Password changed.");
    }

    println!("Name:    {}", user.display_name);
    println!("Email:   {}", user.email);
    println!("Joined:  {}", user.created_at.format("%Y-%m-%d"));
    Ok(())
}
