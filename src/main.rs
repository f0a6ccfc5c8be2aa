use std::error::Error;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fdo_notify::capabilities::{ACTIONS, ACTION_ICONS, BODY, BODY_MARKUP, INLINE_REPLY};
use fdo_notify::hints::{self, Urgency};
use fdo_notify::{DbusSignal, Notification, Notifications, Settings, Timeout};

const APP_NAME: &str = "fdo-notify";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let summary = args.next().unwrap_or_else(|| "Hello from fdo-notify".to_owned());
    let body = args.next().unwrap_or_default();

    let client = Notifications::connect(&Settings::from_env()).await?;

    let server = client.server_information().await?;
    info!(name = %server.name, vendor = %server.vendor, version = %server.version, spec = %server.spec_version, "notification server");

    let caps = client.capabilities().await?;
    for cap in caps.iter() {
        info!(cap, "server capability");
    }

    let mut notification = Notification::new(summary)
        .app_name(APP_NAME)
        .app_icon("dialog-information")
        .hint(&hints::URGENCY, Urgency::Normal)
        .hint(&hints::X_KDE_DISPLAY_APPNAME, APP_NAME.to_owned());

    if caps.contains(BODY) {
        let body = if body.is_empty() || caps.contains(BODY_MARKUP) {
            body
        } else {
            strip_markup(&body)
        };
        notification = notification.body(body);
    }

    if caps.contains(INLINE_REPLY) {
        notification = notification.action(INLINE_REPLY, "Reply");
    }

    if caps.contains(ACTIONS) {
        // with action-icons the identifier doubles as an icon name
        let icons = caps.contains(ACTION_ICONS);
        notification = notification
            .action(if icons { "window-close" } else { "default" }, "Dismiss")
            .hint(&hints::ACTION_ICONS, icons)
            .hint(&hints::RESIDENT, true)
            .timeout(Timeout::Never);
    } else {
        notification = notification.timeout(Timeout::Milliseconds(5000));
    }

    let id = client.open(&notification).await?;
    info!(id, "notification sent");

    let mut signals = client.correlator().register_channel(id);
    while let Some(signal) = signals.recv().await {
        match signal {
            DbusSignal::NotificationClosed { reason, .. } => {
                info!(id, reason = reason.0, "notification closed");
                break;
            }
            DbusSignal::ActionInvoked { action, .. } => {
                info!(id, %action, "action invoked");
                client.close(id).await?;
            }
            DbusSignal::ActivationToken { token, .. } => info!(id, %token, "activation token"),
            DbusSignal::NotificationReplied { message, .. } => {
                info!(id, %message, "inline reply");
                client.close(id).await?;
            }
        }
    }

    if !client.correlator().unregister(id) {
        warn!(id, "notification was already unregistered");
    }
    Ok(())
}

/// Drops anything between `<` and `>` for servers that would show the tags verbatim.
fn strip_markup(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_tag = false;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
