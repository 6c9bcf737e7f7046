use anyhow::Result;
use clap::{Parser, Subcommand};

use family_budget::cli::{
    handle_backup_command, handle_budget_command, handle_category_command, handle_export,
    handle_goal_command, handle_history, handle_limit_command, handle_local_command, handle_login,
    handle_logout, handle_profile, handle_rates_command, handle_register, handle_settings_command,
    handle_transaction_command, handle_watch, handle_whoami, BackupCommands, BudgetCommands,
    CategoryCommands, CliContext, ExportArgs, GoalCommands, HistoryArgs, LimitCommands,
    LocalCommands, LoginArgs, ProfileArgs, RatesCommands, RegisterArgs, SettingsCommands,
    TransactionCommands, WatchArgs,
};
use family_budget::config::{BudgetPaths, Settings};
use family_budget::logging;
use family_budget::storage::Storage;

#[derive(Parser)]
#[command(
    name = "famb",
    version,
    about = "Shared family budget in the terminal",
    long_about = "famb keeps one budget for up to four family members. Everyone \
                  records income and expenses, sees each other's balances and \
                  works toward shared savings goals."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register(RegisterArgs),

    /// Sign in
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show who is signed in
    Whoami,

    /// Change your display name or password
    Profile(ProfileArgs),

    /// Budgets and members
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Income and expenses
    #[command(subcommand, alias = "transaction")]
    Txn(TransactionCommands),

    /// Categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Savings goals
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Spending limits
    #[command(subcommand)]
    Limit(LimitCommands),

    /// Exchange rates
    #[command(subcommand)]
    Rates(RatesCommands),

    /// Preferences
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Data kept only on this machine
    #[command(subcommand)]
    Local(LocalCommands),

    /// Backups of all shared data
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Export the active budget
    Export(ExportArgs),

    /// Recent changes
    History(HistoryArgs),

    /// Print changes other members make as they happen
    Watch(WatchArgs),

    /// Launch the interactive TUI
    #[command(alias = "ui")]
    Tui,

    /// Show paths and settings
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = BudgetPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    if matches!(cli.command, Some(Commands::Tui)) {
        logging::init_file(&paths.log_file())?;
    } else {
        logging::init_stderr();
    }

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let Some(command) = cli.command else {
        println!("famb - shared family budget");
        println!();
        println!("Run 'famb register <email>' to get started,");
        println!("'famb --help' for all commands or 'famb tui' for the interactive interface.");
        return Ok(());
    };

    if let Commands::Tui = command {
        family_budget::tui::run_tui(&storage, settings)?;
        return Ok(());
    }

    let mut ctx = CliContext::new(&storage, settings)?;
    match command {
        Commands::Register(args) => handle_register(&ctx, args)?,
        Commands::Login(args) => handle_login(&ctx, args)?,
        Commands::Logout => handle_logout(&ctx)?,
        Commands::Whoami => handle_whoami(&ctx)?,
        Commands::Profile(args) => handle_profile(&ctx, args)?,
        Commands::Budget(cmd) => handle_budget_command(&ctx, cmd)?,
        Commands::Txn(cmd) => handle_transaction_command(&ctx, cmd)?,
        Commands::Category(cmd) => handle_category_command(&ctx, cmd)?,
        Commands::Goal(cmd) => handle_goal_command(&ctx, cmd)?,
        Commands::Limit(cmd) => handle_limit_command(&ctx, cmd)?,
        Commands::Rates(cmd) => handle_rates_command(&ctx, cmd)?,
        Commands::Settings(cmd) => handle_settings_command(&mut ctx, cmd)?,
        Commands::Local(cmd) => handle_local_command(&ctx, cmd)?,
        Commands::Backup(cmd) => handle_backup_command(&ctx, cmd)?,
        Commands::Export(args) => handle_export(&ctx, args)?,
        Commands::History(args) => handle_history(&ctx, args)?,
        Commands::Watch(args) => handle_watch(&ctx, args)?,
        Commands::Config => {
            let settings = ctx.settings();
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Log file:         {}", paths.log_file().display());
            println!();
            println!("Theme:            {}", settings.theme);
            println!("Display currency: {}", settings.display_currency);
            println!("Auto sync:        {}", settings.auto_sync);
        }
        Commands::Tui => {}
    }

    Ok(())
}
