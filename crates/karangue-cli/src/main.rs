use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use karangue_core::{
    CaptureForm, FeedPhase, GeoPoint, HistoryStore, HttpRemoteStore, IncidentKind,
    NotificationFeed, RemoteConfig, ResponderService, Session, SubmissionCoordinator,
    SubmitError,
};
use std::sync::Arc;
use tokio::signal;

#[derive(Parser)]
#[command(name = "karangue-cli")]
#[command(about = "CLI for the Karangue incident reporting core", long_about = None)]
struct Cli {
    /// Authenticated user id (falls back to KARANGUE_USER_ID)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture and submit a new incident report
    Report {
        /// What happened
        #[arg(long)]
        description: String,

        /// Incident category: theft, harassment, assault, vandalism,
        /// accident, fire, flood, electrocution, other
        #[arg(long, default_value = "theft")]
        kind: String,

        /// Responder service: police, gendarmerie, firefighters,
        /// private_security, other
        #[arg(long, default_value = "police")]
        service: String,

        /// Device-local photo URI
        #[arg(long)]
        image: Option<String>,

        #[arg(long, requires = "longitude")]
        latitude: Option<f64>,

        #[arg(long, requires = "latitude")]
        longitude: Option<f64>,
    },

    /// Show the locally stored report history
    History {
        /// Maximum number of reports to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show geotagged reports for the map view
    Map,

    /// List the incidents this user submitted to the server
    Mine,

    /// Follow the live notification feed until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            description,
            kind,
            service,
            image,
            latitude,
            longitude,
        } => {
            report_command(cli.user, description, kind, service, image, latitude, longitude)
                .await
        }
        Commands::History { limit } => history_command(limit),
        Commands::Map => map_command(),
        Commands::Mine => mine_command(cli.user).await,
        Commands::Watch => watch_command(cli.user).await,
    }
}

async fn report_command(
    user: Option<String>,
    description: String,
    kind: String,
    service: String,
    image: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<()> {
    let session = resolve_session(user)?;

    let mut form = CaptureForm::default();
    form.kind = parse_kind(&kind)?;
    form.service = parse_service(&service)?;
    form.description = description;
    form.image = image;
    form.location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let history = HistoryStore::open_default()?;
    let remote = Arc::new(HttpRemoteStore::new(&RemoteConfig::from_env()?));
    let coordinator = SubmissionCoordinator::new(history, remote);

    let outcome = coordinator.submit(&mut form, &session).await;
    match (outcome.error, outcome.local_ok) {
        (None, _) => println!("Signalement envoyé. Merci pour votre contribution."),
        (Some(SubmitError::Validation(_)), _) => {
            return Err(anyhow!("Veuillez entrer une description."));
        }
        (Some(err), true) => {
            // Kept locally, server never saw it.
            println!("Signalement enregistré sur l'appareil, envoi au serveur impossible: {err}");
        }
        (Some(err), false) => {
            return Err(anyhow!("Impossible d'enregistrer le signalement: {err}"));
        }
    }
    Ok(())
}

fn history_command(limit: usize) -> Result<()> {
    let history = HistoryStore::open_default()?;
    let reports = history.load_all();
    if reports.is_empty() {
        println!("Aucun signalement enregistré.");
        return Ok(());
    }
    for report in reports.iter().take(limit) {
        println!(
            "{} • {} ➜ {}",
            report.date,
            report.kind.label(),
            report.service.label()
        );
        println!("  {}", report.description);
        if let Some(location) = &report.location {
            println!("  position: {}, {}", location.latitude, location.longitude);
        }
    }
    Ok(())
}

fn map_command() -> Result<()> {
    let history = HistoryStore::open_default()?;
    let reports = history.load_geotagged();
    if reports.is_empty() {
        println!("Aucun signalement géolocalisé.");
        return Ok(());
    }
    for report in &reports {
        // load_geotagged only returns located reports
        if let Some(location) = &report.location {
            println!(
                "{} @ {}, {} — {}",
                report.kind.label(),
                location.latitude,
                location.longitude,
                report.description
            );
        }
    }
    Ok(())
}

async fn mine_command(user: Option<String>) -> Result<()> {
    use karangue_core::RemoteStore;

    let session = resolve_session(user)?;
    let remote = HttpRemoteStore::new(&RemoteConfig::from_env()?);
    let mine = remote.query_owned_incidents(&session.user_id).await?;
    println!("{}", serde_json::to_string_pretty(&mine)?);
    Ok(())
}

async fn watch_command(user: Option<String>) -> Result<()> {
    let session = resolve_session(user)?;
    let remote = Arc::new(HttpRemoteStore::new(&RemoteConfig::from_env()?));
    let feed = NotificationFeed::new(remote);
    let mut rx = feed.subscribe();
    feed.set_session(Some(session));

    println!("Notifications d'incidents (Ctrl-C pour quitter)");
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.phase != FeedPhase::Live {
                    continue;
                }
                println!(
                    "— {} notification(s), {} non lue(s)",
                    snapshot.notifications.len(),
                    snapshot.unread
                );
                for notification in &snapshot.notifications {
                    let marker = if notification.read { ' ' } else { '*' };
                    println!(
                        "{marker} {} — {} ({})",
                        notification.title,
                        notification.description,
                        notification.date_label()
                    );
                }
            }
        }
    }
    feed.set_session(None);
    Ok(())
}

fn resolve_session(flag: Option<String>) -> Result<Session> {
    if let Some(user) = flag {
        return Ok(Session::new(user));
    }
    let user = std::env::var("KARANGUE_USER_ID")
        .map_err(|_| anyhow!("KARANGUE_USER_ID missing; pass --user"))?;
    Ok(Session::new(user))
}

fn parse_kind(value: &str) -> Result<IncidentKind> {
    let kind = match value {
        "theft" => IncidentKind::Theft,
        "harassment" => IncidentKind::Harassment,
        "assault" => IncidentKind::Assault,
        "vandalism" => IncidentKind::Vandalism,
        "accident" => IncidentKind::Accident,
        "fire" => IncidentKind::Fire,
        "flood" => IncidentKind::Flood,
        "electrocution" => IncidentKind::Electrocution,
        "other" => IncidentKind::Other,
        other => return Err(anyhow!("unknown incident kind: {other}")),
    };
    Ok(kind)
}

fn parse_service(value: &str) -> Result<ResponderService> {
    let service = match value {
        "police" => ResponderService::Police,
        "gendarmerie" => ResponderService::Gendarmerie,
        "firefighters" => ResponderService::Firefighters,
        "private_security" => ResponderService::PrivateSecurity,
        "other" => ResponderService::Other,
        other => return Err(anyhow!("unknown responder service: {other}")),
    };
    Ok(service)
}
