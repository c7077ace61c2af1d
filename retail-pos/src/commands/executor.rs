use retail_api::endpoints::items::Item;
use retail_api::endpoints::Page;
use retail_api::{Client, Request, RetailApiError};
use retail_auth::{AuthClientError, AuthError, Authenticator};

use crate::commands::handlers::HELP;
use crate::events::AppCommand;
use crate::state::AppState;

/// Connections a command runs against
#[derive(Clone)]
pub struct Services {
    pub auth: Authenticator,
    pub client: Client,
}

impl Services {
    pub fn new(auth: Authenticator) -> Self {
        let client = Client::new(auth.api().clone());
        Self { auth, client }
    }
}

/// Run a command and return the lines to print
pub async fn execute_command(
    command: AppCommand,
    services: &Services,
    state: &mut AppState,
) -> Vec<String> {
    tracing::info!("Executing command: {:?}", redacted(&command));

    if command.requires_session() && !services.auth.store().is_authenticated() {
        return vec!["Not signed in. Type `login`.".to_string()];
    }

    let result = match command {
        AppCommand::ListStores => services
            .client
            .send(Request::stores().list())
            .await
            .map(|stores| {
                if stores.is_empty() {
                    return vec!["No stores".to_string()];
                }
                stores
                    .into_iter()
                    .map(|s| format!("{}  {}", s.id, s.name))
                    .collect()
            }),
        AppCommand::ShowStore(id) => services
            .client
            .send(Request::stores().get(id))
            .await
            .map(|s| {
                vec![
                    s.name,
                    s.address.unwrap_or_default(),
                    s.phone.unwrap_or_default(),
                ]
            }),
        AppCommand::ListItems { search, page } => {
            let mut req = Request::items().list();
            if let Some(search) = search {
                req = req.search(search);
            }
            if let Some(page) = page {
                req = req.page(page);
            }
            services.client.send(req).await.map(render_items)
        }
        AppCommand::ShowItem(id) => services
            .client
            .send(Request::items().get(id))
            .await
            .map(|item| vec![render_item(&item)]),
        AppCommand::SetStock { item_id, quantity } => services
            .client
            .send(Request::items().update(item_id).quantity(quantity))
            .await
            .map(|item| vec![format!("Updated: {}", render_item(&item))]),
        AppCommand::WhoAmI => services
            .client
            .send(Request::users().me())
            .await
            .map(|user| {
                let name = user.display_name.as_deref().unwrap_or(&user.username);
                let mut lines = vec![format!("{} ({})", name, user.id)];
                let permissions = services.auth.store().permissions();
                if !permissions.is_empty() {
                    lines.push(format!(
                        "Permissions: {}",
                        permissions.into_iter().collect::<Vec<_>>().join(", ")
                    ));
                }
                state.user = Some(user);
                lines
            }),
        AppCommand::SignIn { username, password } => {
            return match services.auth.login(&username, &password).await {
                Ok(user) => {
                    let line = format!("Signed in as {}", user.username);
                    state.signed_in(user);
                    vec![line]
                }
                Err(AuthError::AuthClient(AuthClientError::InvalidCredentials)) => {
                    vec!["Invalid username or password".to_string()]
                }
                Err(e) => {
                    tracing::error!("Sign-in failed: {}", e);
                    vec![format!("Sign-in failed: {}", e)]
                }
            };
        }
        AppCommand::RefreshSession => {
            return if services.auth.api().coordinator().refresh_now().await
                == retail_auth::RefreshOutcome::Refreshed
            {
                vec!["Session refreshed".to_string()]
            } else {
                state.signed_out();
                Vec::new()
            };
        }
        AppCommand::SignOut => {
            services.auth.logout().await;
            state.signed_out();
            return vec!["Signed out".to_string()];
        }
        AppCommand::SignInPrompt => return Vec::new(),
        AppCommand::Help => return HELP.lines().map(str::to_string).collect(),
        AppCommand::Quit => {
            state.should_quit = true;
            return Vec::new();
        }
    };

    result.unwrap_or_else(|e| render_error(&e))
}

fn render_items(page: Page<Item>) -> Vec<String> {
    let mut lines: Vec<String> = page.data.iter().map(render_item).collect();
    lines.push(format!(
        "Page {} ({} of {} items){}",
        page.page,
        page.data.len(),
        page.total,
        if page.has_more() { ", more available" } else { "" }
    ));
    lines
}

fn render_item(item: &Item) -> String {
    format!(
        "{}  {:<12} {:<24} {:>6}.{:02}  qty {}",
        item.id,
        item.sku,
        item.name,
        item.price / 100,
        (item.price % 100).abs(),
        item.quantity
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".to_string())
    )
}

fn render_error(error: &RetailApiError) -> Vec<String> {
    // The session-expired notice is printed from the event stream
    if error.is_unauthorized() {
        tracing::warn!("Request rejected: {}", error);
        return vec!["Not authorized".to_string()];
    }
    tracing::error!("Request failed: {}", error);
    vec![format!("Error: {}", error)]
}

fn redacted(command: &AppCommand) -> AppCommand {
    match command {
        AppCommand::SignIn { username, .. } => AppCommand::SignIn {
            username: username.clone(),
            password: "[REDACTED]".to_string(),
        },
        other => other.clone(),
    }
}
