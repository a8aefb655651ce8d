//! Drive account operations against a live API (or fixtures) and print the
//! resulting transitions and final account state.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use client::config::ClientSettings;
use ortho_config::OrthoConfig;
use client::domain::ports::{
    Collection, FixtureIdentityAuthority, FixtureLoginService, FixtureResourceGateway,
    LoginService, Record, ResourceGateway,
};
use client::domain::{
    AccountService, AccountState, AuthTokens, LoginCredentials, SettingsPatch, Store,
    Transition, UserId,
};
use client::outbound::{JsonApiGateway, OAuthClientCredentials, OAuthLoginService};
use tokio::runtime::Builder;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

/// `account-probe` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "account-probe",
    about = "Run account operations and print the transitions they emit",
    version
)]
struct CliArgs {
    /// Account email used for the password grant.
    #[arg(long, global = true, value_name = "email")]
    email: Option<String>,
    /// Account password used for the password grant.
    #[arg(long, global = true, value_name = "password")]
    password: Option<String>,
    /// Existing access token; skips the login step.
    #[arg(long, global = true, value_name = "token", conflicts_with = "email")]
    token: Option<String>,
    /// Use in-memory fixtures instead of the configured API.
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and load the profile.
    Login,
    /// Load the profile of the signed-in account.
    Whoami,
    /// Follow another user.
    Follow {
        /// Identifier of the user to follow.
        user_id: String,
    },
    /// Update library preferences.
    Library {
        /// `simple`, `regular` or `advanced`.
        #[arg(long, value_name = "system")]
        rating_system: Option<String>,
        /// `canonical`, `romanized` or `english`.
        #[arg(long, value_name = "preference")]
        title_language: Option<String>,
    },
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .init();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ClientSettings::load_from_iter([OsString::from("account-probe")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    if args.dry_run {
        let gateway = Arc::new(FixtureResourceGateway::with_records([(
            Collection::USERS,
            Record::new().with("id", "1").with("name", "Fixture User"),
        )]));
        return run(&args, &settings, gateway, Arc::new(FixtureLoginService)).await;
    }

    let timeout = settings.request_timeout();
    let base_url = settings.api_base_url().map_err(io::Error::other)?;
    let token_url = settings.oauth_token_url().map_err(io::Error::other)?;
    let gateway = JsonApiGateway::new(base_url, timeout)
        .map_err(|error| io::Error::other(format!("create API client: {error}")))?;
    let login = OAuthLoginService::new(
        token_url,
        timeout,
        OAuthClientCredentials {
            client_id: settings.oauth_client_id.clone(),
            client_secret: settings.oauth_client_secret.clone().map(Zeroizing::new),
        },
    )
    .map_err(|error| io::Error::other(format!("create OAuth client: {error}")))?;
    run(&args, &settings, Arc::new(gateway), Arc::new(login)).await
}

async fn run<G, L>(
    args: &CliArgs,
    settings: &ClientSettings,
    gateway: Arc<G>,
    login: Arc<L>,
) -> io::Result<()>
where
    G: ResourceGateway,
    L: LoginService,
{
    let mut state = AccountState::default();
    if let Some(token) = args.token.as_deref() {
        state.auth.tokens = Some(AuthTokens::bearer(token));
    }
    let store = Arc::new(Store::new(state, settings.transition_buffer()));
    let mut transitions = store.subscribe();
    let service = AccountService::new(
        Arc::clone(&store),
        gateway,
        Arc::new(FixtureIdentityAuthority::default()),
        login,
    );

    if let Some(endpoint) = settings.notification_endpoint_id.as_deref() {
        service.record_notification_endpoint(endpoint);
    }
    if args.token.is_none() {
        let credentials = credentials(args)?;
        print_transitions(&mut transitions);
        if service.login(credentials).await.failure().is_some() {
            print_transitions(&mut transitions);
            return Err(io::Error::other("login failed"));
        }
    }

    let fetched = service.fetch_current_user().await;
    print_transitions(&mut transitions);
    let outcome = if fetched.failure().is_some() {
        fetched
    } else {
        match &args.command {
            Command::Login | Command::Whoami => fetched,
            Command::Follow { user_id } => {
                let target = UserId::new(user_id.as_str()).map_err(io::Error::other)?;
                service.follow_user(target).await
            }
            Command::Library {
                rating_system,
                title_language,
            } => {
                let mut patch = SettingsPatch::new();
                if let Some(value) = rating_system {
                    patch = patch.with("ratingSystem", value.as_str());
                }
                if let Some(value) = title_language {
                    patch = patch.with("titleLanguagePreference", value.as_str());
                }
                service.update_library_settings(patch).await
            }
        }
    };
    print_transitions(&mut transitions);

    let rendered = serde_json::to_string_pretty(&store.snapshot())
        .map_err(|error| io::Error::other(format!("render state: {error}")))?;
    println!("{rendered}");
    if let Some(failure) = outcome.failure() {
        return Err(io::Error::other(format!("{}: {failure}", outcome.type_tag())));
    }
    Ok(())
}

fn credentials(args: &CliArgs) -> io::Result<LoginCredentials> {
    let (Some(email), Some(password)) = (args.email.as_deref(), args.password.as_deref()) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "either --token or both --email and --password are required",
        ));
    };
    LoginCredentials::try_from_parts(email, password)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))
}

fn print_transitions(receiver: &mut broadcast::Receiver<Transition>) {
    while let Ok(transition) = receiver.try_recv() {
        println!("{} {}", transition.invocation, transition.type_tag());
    }
}
