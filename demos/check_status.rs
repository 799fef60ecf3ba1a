//! Check allotment status for every PAN on an account
//!
//! Usage: `cargo run --example check_status -- <email> <password> <offering> [base_url]`
//!
//! Logs in, hands the profile to the poller through an in-memory session and
//! prints each row as it resolves.

use std::sync::Arc;

use ipo_status::{
    Authenticator, Config, Event, HttpClient, LoginForm, MemorySessionStore, StatusPoller,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password), Some(offering)) = (args.next(), args.next(), args.next())
    else {
        eprintln!("usage: check_status <email> <password> <offering> [base_url]");
        std::process::exit(2);
    };

    let mut config = Config::default();
    if let Some(base_url) = args.next() {
        config.api.base_url = base_url.parse()?;
    }
    config.validate()?;

    let api = Arc::new(HttpClient::new(&config.api)?);
    let store = MemorySessionStore::new();
    let auth = Authenticator::new(api.clone(), Arc::new(store.clone()), &config.session);

    let mut form = LoginForm::new(email, password);
    let profile = form.submit(&auth).await?;
    println!("Logged in as {} ({} PAN numbers)", profile.name, profile.pan_numbers.len());

    let poller = StatusPoller::mount(api, &store, config).await;
    poller.select_target(offering).await;

    let mut events = poller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Resolved {
                    identifier,
                    classification,
                } => println!("{identifier}: {classification}"),
                Event::Notice(notice) => eprintln!("! {}", notice.message),
                Event::RunAborted { pending, error } => {
                    eprintln!("stopped ({error}); still loading: {}", pending.join(", "));
                }
                _ => {}
            }
        }
    });

    match poller.poll_selected().await {
        Ok(report) => println!(
            "Checked {} PAN numbers for {} in {}s",
            report.resolved,
            report.target,
            (report.finished_at - report.started_at).num_seconds()
        ),
        Err(e) => eprintln!("status check failed: {e}"),
    }
    Ok(())
}
