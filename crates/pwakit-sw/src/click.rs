//! Routing notification clicks to a window.

use tracing::{debug, info};
use url::Url;

use crate::config::WorkerConfig;
use crate::env::Environment;
use crate::error::Result;
use crate::push::NotificationData;
use crate::types::{ClientId, ClientQuery, NotificationId, WindowClient};

/// A click on a displayed notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationClick {
    pub id: NotificationId,
    pub data: NotificationData,
}

/// What the router did with a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// An existing page was navigated and focused.
    Focused { client: ClientId, target: Url },
    /// No page matched; a new window was opened.
    Opened { client: ClientId, target: Url },
}

/// Routes notification clicks.
#[derive(Debug, Clone)]
pub struct NotificationClickRouter {
    config: WorkerConfig,
}

impl NotificationClickRouter {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Route for the notification's conversation, or the inbox when the id is
    /// missing or empty.
    pub fn target_route(&self, data: &NotificationData) -> String {
        match data.conversation_id.as_deref() {
            Some(id) if !id.is_empty() => format!("{}{}", self.config.chat_route_prefix, id),
            _ => self.config.inbox_route.clone(),
        }
    }

    /// First client whose URL contains the worker origin as a substring.
    ///
    /// Enumeration order decides ties. The containment check is deliberate:
    /// an exact or prefix match would route differently.
    pub fn find_client<'a>(&self, clients: &'a [WindowClient]) -> Option<&'a WindowClient> {
        let origin = self.config.origin_str();
        clients.iter().find(|c| c.url.contains(&origin))
    }

    /// Handle a notification click.
    ///
    /// The notification is closed before anything else, whatever happens
    /// afterwards.
    pub async fn handle<E: Environment + ?Sized>(
        &self,
        click: &NotificationClick,
        env: &E,
    ) -> Result<ClickOutcome> {
        env.close_notification(click.id).await;

        let route = self.target_route(&click.data);
        let target = self.config.resolve(&route)?;

        let clients = env
            .match_all(ClientQuery {
                include_uncontrolled: true,
            })
            .await?;
        debug!(notification = %click.id, %target, clients = clients.len(), "Routing click");

        if let Some(client) = self.find_client(&clients) {
            env.navigate(&client.id, &target).await?;
            env.focus(&client.id).await?;
            info!(client = %client.id, %target, "Focused existing window");
            return Ok(ClickOutcome::Focused {
                client: client.id.clone(),
                target,
            });
        }

        let client = env.open_window(&target).await?;
        info!(%client, %target, "Opened new window");
        Ok(ClickOutcome::Opened { client, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> NotificationClickRouter {
        let origin = Url::parse("https://app.example/").unwrap();
        NotificationClickRouter::new(WorkerConfig::for_origin(origin))
    }

    fn client(id: &str, url: &str) -> WindowClient {
        WindowClient {
            id: ClientId(id.to_string()),
            url: url.to_string(),
            controlled: true,
        }
    }

    #[test]
    fn test_target_route() {
        let router = router();
        let with_id = NotificationData {
            conversation_id: Some("42".into()),
        };
        assert_eq!(router.target_route(&with_id), "/chat/42");
        assert_eq!(router.target_route(&NotificationData::default()), "/messages");
    }

    #[test]
    fn test_empty_conversation_id_routes_to_inbox() {
        let empty = NotificationData {
            conversation_id: Some(String::new()),
        };
        assert_eq!(router().target_route(&empty), "/messages");
    }

    #[test]
    fn test_find_client_takes_first_match() {
        let clients = vec![
            client("a", "https://other.example/"),
            client("b", "https://app.example/messages"),
            client("c", "https://app.example/chat/42"),
        ];
        assert_eq!(router().find_client(&clients).unwrap().id.0, "b");
    }

    #[test]
    fn test_find_client_uses_containment() {
        let clients = vec![client(
            "a",
            "https://proxy.example/?u=https://app.example/messages",
        )];
        assert_eq!(router().find_client(&clients).unwrap().id.0, "a");
    }

    #[test]
    fn test_find_client_none() {
        let clients = vec![client("a", "https://other.example/")];
        assert!(router().find_client(&clients).is_none());
        assert!(router().find_client(&[]).is_none());
    }
}
