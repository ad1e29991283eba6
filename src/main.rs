use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use parapluie_onboarding::auth_state::{resolve_route, AuthStore};
use parapluie_onboarding::config::AppConfig;
use parapluie_onboarding::logging::{init_logging, OperationTimer};
use parapluie_onboarding::memory::InMemoryBackend;
use parapluie_onboarding::models::ContactMethod;
use parapluie_onboarding::store::LocalStore;
use parapluie_onboarding::validation::{format_phone_input, InputValidator};
use parapluie_onboarding::{OnboardingFlow, OnboardingStep};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for the local flag store (overrides config)
    #[arg(long)]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full onboarding against the in-memory backend
    Simulate {
        /// User's first name
        #[arg(short, long, default_value = "Marie")]
        name: String,

        /// User's phone number (10 digits)
        #[arg(short, long, default_value = "5145551234")]
        phone: String,

        /// Email for account creation
        #[arg(short, long, default_value = "marie@example.com")]
        email: String,

        /// Trusted contact's name (omit to skip the invitation)
        #[arg(long)]
        contact_name: Option<String>,

        /// Trusted contact's relationship
        #[arg(long, default_value = "fils")]
        relationship: String,
    },

    /// Show the locally persisted onboarding flags
    Status,

    /// Clear the locally persisted onboarding flags
    Reset,

    /// Validate and format a phone number
    CheckPhone {
        /// Raw phone input
        phone: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let _guard = init_logging(Some(&config.get_log_level()), None)?;

    let cli = Cli::parse();
    let store_path = cli
        .store_path
        .unwrap_or_else(|| PathBuf::from(config.get_store_path()));

    match cli.command {
        Commands::Simulate {
            name,
            phone,
            email,
            contact_name,
            relationship,
        } => simulate(&config, &store_path, &name, &phone, &email, contact_name.as_deref(), &relationship).await,
        Commands::Status => status(&store_path),
        Commands::Reset => reset(&store_path),
        Commands::CheckPhone { phone } => check_phone(&phone),
    }
}

#[allow(clippy::too_many_arguments)]
async fn simulate(
    config: &AppConfig,
    store_path: &Path,
    name: &str,
    phone: &str,
    email: &str,
    contact_name: Option<&str>,
    relationship: &str,
) -> Result<()> {
    let timer = OperationTimer::new("simulate");
    let backend = Arc::new(InMemoryBackend::new());
    let store = Arc::new(LocalStore::open(store_path)?);
    let auth = Arc::new(AuthStore::new());
    auth.set_loading(false);

    let mut flow = OnboardingFlow::new(backend, Arc::clone(&store), Arc::clone(&auth), config);

    flow.submit_identity(name, phone)?;
    info!(step = flow.step().name(), "identity submitted");

    flow.create_account(email, "Parapluie2024", "Parapluie2024").await?;
    info!(step = flow.step().name(), "account created");

    flow.grant_permissions(parapluie_onboarding::PermissionGrants::all())?;

    match contact_name {
        Some(contact) => {
            flow.choose_invite()?;
            flow.submit_contact(contact, relationship, None, None, ContactMethod::Sms)
                .await?;

            if let OnboardingStep::ShareInvitation {
                invitation_code,
                expires_at,
                ..
            } = flow.step()
            {
                println!("Invitation code: {invitation_code} (expires {expires_at})");
            }

            flow.mark_invitation_shared(ContactMethod::Sms).await?;
        }
        None => flow.skip_invitation().await?,
    }

    let route = resolve_route(&auth.state());
    println!("Onboarding finished at step '{}', root renders {route:?}", flow.step().name());
    timer.finish();
    Ok(())
}

fn status(store_path: &Path) -> Result<()> {
    let store = LocalStore::open(store_path)?;
    println!("onboarding_completed: {}", store.onboarding_completed()?);
    println!("user_id: {}", store.user_id()?.unwrap_or_else(|| "-".to_string()));
    println!(
        "invitation_code: {}",
        store.invitation_code()?.unwrap_or_else(|| "-".to_string())
    );
    match store.cached_permissions()? {
        Some(grants) => println!("permissions: {grants:?}"),
        None => println!("permissions: -"),
    }
    Ok(())
}

fn reset(store_path: &Path) -> Result<()> {
    let store = LocalStore::open(store_path)?;
    store.clear()?;
    println!("Local onboarding state cleared");
    Ok(())
}

fn check_phone(phone: &str) -> Result<()> {
    println!("display: {}", format_phone_input(phone));
    match InputValidator::validate_phone(phone) {
        Ok(formatted) => println!("e164: {formatted}"),
        Err(e) => println!("invalid: {e}"),
    }
    Ok(())
}
