//! The example plugin: greetings, plus a counter persisted across runs.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use herald::prelude::*;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the plugin remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleState {
    /// Greetings sent, per greeted name.
    pub greetings: BTreeMap<String, u64>,
}

pub struct ExamplePlugin {
    data_dir: PathBuf,
    state: Arc<RwLock<ExampleState>>,
}

impl ExamplePlugin {
    pub const NAME: &'static str = "example";

    /// Creates the plugin; its state file is `<data_dir>/example`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            state: Arc::default(),
        }
    }

    pub fn state(&self) -> ExampleState {
        self.state.read().clone()
    }

    fn data_file(&self) -> PathBuf {
        self.data_dir.join(Self::NAME)
    }
}

#[async_trait]
impl Plugin for ExamplePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        let greet_state = Arc::clone(&self.state);
        let stats_state = Arc::clone(&self.state);

        vec![
            CommandDefinition::new("hello-command")
                .trigger("hello")
                .description("Displays hello world")
                .callback(|ctx| async move {
                    let _ = ctx.reply("Hello, World!").await;
                }),
            CommandDefinition::new("greet-command")
                .triggers(["greet", "hi"])
                .description("Greets someone, or you")
                .argument(CommandArgument::optional(r"\S+", "name"))
                .callback(move |ctx| {
                    let state = Arc::clone(&greet_state);
                    async move {
                        let name = match ctx.arg("name") {
                            Some(name) if !name.is_empty() => name.to_string(),
                            _ => ctx.message().user_name().to_string(),
                        };
                        *state.write().greetings.entry(name.clone()).or_default() += 1;
                        let _ = ctx.reply(&format!("Hello, {name}!")).await;
                    }
                }),
            CommandDefinition::new("greetings-command")
                .trigger("greetings")
                .description("Shows how often each name was greeted")
                .permission(PermissionLevel::Owner)
                .callback(move |ctx| {
                    let state = Arc::clone(&stats_state);
                    async move {
                        let summary = {
                            let state = state.read();
                            if state.greetings.is_empty() {
                                "Nobody has been greeted yet".to_string()
                            } else {
                                state
                                    .greetings
                                    .iter()
                                    .map(|(name, count)| format!("{name}: {count}"))
                                    .collect::<Vec<_>>()
                                    .join("\n")
                            }
                        };
                        let _ = ctx.reply(&summary).await;
                    }
                }),
        ]
    }

    async fn load(&self, _client: &BoxedClient) -> PluginResult {
        let path = self.data_file();
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No saved plugin data");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let state: ExampleState = serde_json::from_slice(&data)?;
        info!(path = %path.display(), names = state.greetings.len(), "Plugin data loaded");
        *self.state.write() = state;
        Ok(())
    }

    async fn save(&self) -> PluginResult {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let data = {
            let state = self.state.read();
            serde_json::to_vec_pretty(&*state)?
        };
        let path = self.data_file();
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), "Plugin data saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald::core::mock::MockClient;

    async fn run(bot: &Arc<Bot>, message: herald::core::mock::MockMessage) {
        for task in bot.dispatch(message.boxed()) {
            task.await.unwrap();
        }
    }

    fn bot(client: &Arc<MockClient>, plugin: ExamplePlugin) -> Arc<Bot> {
        let mut registry = Registry::new();
        registry.register_plugin(plugin);
        registry.into_bot(client.clone(), BotSettings::new()).unwrap()
    }

    #[tokio::test]
    async fn test_hello_and_greet() {
        let client = Arc::new(MockClient::new("herald"));
        let bot = bot(&client, ExamplePlugin::new("unused"));

        run(&bot, client.message("console", "alice", "?hello")).await;
        run(&bot, client.message("console", "alice", "?greet bob")).await;
        run(&bot, client.message("console", "alice", "<@herald> hi")).await;

        let texts: Vec<_> = client.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["Hello, World!", "Hello, bob!", "Hello, alice!"]);
    }

    #[tokio::test]
    async fn test_greetings_is_owner_only() {
        let client = Arc::new(MockClient::new("herald").owner("alice"));
        let bot = bot(&client, ExamplePlugin::new("unused"));

        run(&bot, client.message("console", "bob", "?greet carol")).await;
        run(&bot, client.message("console", "bob", "?greetings")).await;
        assert_eq!(client.sent().len(), 1);

        run(&bot, client.message("console", "alice", "?greetings")).await;
        assert_eq!(client.sent()[1].text, "carol: 1");
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let client: BoxedClient = Arc::new(MockClient::new("herald"));

        let first = ExamplePlugin::new(dir.path().join("data"));
        first.load(&client).await.unwrap();
        first.state.write().greetings.insert("bob".into(), 3);
        first.save().await.unwrap();

        let second = ExamplePlugin::new(dir.path().join("data"));
        second.load(&client).await.unwrap();
        assert_eq!(second.state().greetings.get("bob"), Some(&3));
    }

    #[tokio::test]
    async fn test_corrupt_data_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ExamplePlugin::NAME), b"not json").unwrap();
        let client: BoxedClient = Arc::new(MockClient::new("herald"));

        let plugin = ExamplePlugin::new(dir.path());
        assert!(plugin.load(&client).await.is_err());
        assert_eq!(plugin.state(), ExampleState::default());
    }
}
