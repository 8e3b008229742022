use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info, warn};

use ovoo::db::UserRepository;
use ovoo::entities::{Role, User};
use ovoo::milter::AddressRewriter;
use ovoo::services::UserCreateCmd;
use ovoo::{dictionary, Config, Database, Result, Services, SqliteStore};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = ovoo::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        ovoo::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;
    info!("Ovoo - privacy-preserving mail relay");
    info!("Relay domain: {}", config.relay.domain);

    let db = Database::open(&config.database.path).await?;
    let words = dictionary::load(config.relay.dictionary_path.as_deref().map(Path::new))?;
    let services = Services::new(&config.relay.domain, words, db.store())?;

    bootstrap_admin(&services, &config).await?;
    let milter_user = ensure_milter_user(&services, &db.store(), &config.milter.login).await?;

    let _rewriter = AddressRewriter::new(services.chains.clone(), milter_user);
    info!(
        "Address rewriter ready for milter connections on {}",
        config.milter.listen_addr
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    db.pool().close().await;
    Ok(())
}

/// Create the configured administrator unless it already exists.
async fn bootstrap_admin(services: &Services<SqliteStore>, config: &Config) -> Result<()> {
    if config.admin.password.is_empty() {
        warn!("No admin password configured, skipping administrator bootstrap");
        return Ok(());
    }

    let cmd = UserCreateCmd {
        login: config.admin.login.clone(),
        role: Role::Admin,
        first_name: config.admin.first_name.clone(),
        last_name: config.admin.last_name.clone(),
        password: Some(config.admin.password.clone()),
    };
    match services.users.create_privileged(cmd).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_duplicate() => {
            info!("Administrator '{}' already exists", config.admin.login);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Fetch or create the account the milter creates chains as.
async fn ensure_milter_user(
    services: &Services<SqliteStore>,
    store: &SqliteStore,
    login: &str,
) -> Result<User> {
    match store.get_user_by_login(login).await {
        Ok(user) if user.role == Role::Milter => Ok(user),
        Ok(user) => {
            warn!("User '{}' exists but has role {}", login, user.role);
            Err(ovoo::OvooError::Config(format!(
                "milter login '{login}' belongs to a non-milter account"
            )))
        }
        Err(e) if e.is_not_found() => {
            let cmd = UserCreateCmd {
                login: login.to_string(),
                role: Role::Milter,
                ..Default::default()
            };
            services.users.create_privileged(cmd).await
        }
        Err(e) => Err(e),
    }
}
