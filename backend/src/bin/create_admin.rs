//! Bootstrap the first administrator account in the configured store.
//!
//! # Examples
//! ```sh
//! LOANS_DATABASE_URL=postgres://loans@localhost/loans \
//! LOANS_ADMIN_PASSWORD=s3cretpass \
//!   cargo run --bin create-admin -- --name "Ada Lovelace" --email ada@bank.test
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use zeroize::Zeroizing;

use loan_backend::domain::UserAdminService;
use loan_backend::outbound::persistence::DieselUserRepository;
use loan_backend::outbound::security::Argon2PasswordHasher;
use loan_backend::server::{AppSettings, Storage, connect_storage};

/// `create-admin` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "create-admin",
    about = "Create the first administrator account",
    version
)]
struct CliArgs {
    /// Display name.
    #[arg(long)]
    name: String,
    /// Login email.
    #[arg(long)]
    email: String,
    /// Password, at least 8 characters.
    #[arg(long, env = "LOANS_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
    /// Database URL. Falls back to `LOANS_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let mut settings = AppSettings::load_from_iter([OsString::from("create-admin")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    if args.database_url.is_some() {
        settings.database_url = args.database_url;
    }
    let password = Zeroizing::new(args.password);

    let pool = match connect_storage(&settings).await? {
        Storage::Postgres(pool) => pool,
        Storage::Memory { .. } => {
            return Err(eyre!(
                "a database URL is required; in-memory stores do not outlive this command"
            ));
        }
    };
    let service = UserAdminService::new(
        Arc::new(DieselUserRepository::new(pool)),
        Arc::new(Argon2PasswordHasher::default()),
        Arc::new(DefaultClock),
    );
    let user = service
        .bootstrap_admin(&args.name, &args.email, &password)
        .await
        .wrap_err("create administrator")?;

    println!("created administrator {} <{}> ({})", user.name, user.email, user.id);
    Ok(())
}
