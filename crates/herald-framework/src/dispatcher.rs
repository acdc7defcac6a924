//! Per-message dispatch and the receive loop.
//!
//! For every inbound message the bot:
//!
//! 1. resolves the bot-level prefix,
//! 2. answers a `commands` request with the listing and stops there,
//! 3. otherwise runs every plugin's [`message`](crate::Plugin::message) hook,
//! 4. and, unless the bot wrote the message itself, tries every plugin
//!    command and standalone command: trigger, then access, then arguments.
//!
//! Every hook call and every command attempt is its own task. Nothing waits
//! on them and a panic inside one is logged and contained to it.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use herald_core::{BoxedMessage, Message};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::access;
use crate::arguments::content_after_trigger;
use crate::bot::{Bot, CompiledCommand};
use crate::context::CommandContext;
use crate::error::OpenError;
use crate::help::send_help;
use crate::trigger::{find_trigger_match, is_commands_request, tokenize};

impl Bot {
    /// Dispatches one message and returns the spawned tasks.
    ///
    /// Callers normally drop the handles; tests await them.
    pub fn dispatch(self: &Arc<Self>, message: BoxedMessage) -> Vec<JoinHandle<()>> {
        let bot_prefix: Arc<str> = self.command_prefix(message.as_ref()).into();
        let parts: Arc<[String]> = tokenize(message.raw_message()).into();

        if !self.settings().command_lookup_disabled
            && is_commands_request(&bot_prefix, &parts, message.as_ref())
        {
            let bot = Arc::clone(self);
            return vec![self.spawn_isolated("commands".to_string(), async move {
                send_help(&bot, message.as_ref(), &bot_prefix).await;
            })];
        }

        let mut tasks = Vec::new();

        for entry in self.plugins() {
            let bot = Arc::clone(self);
            let plugin = Arc::clone(entry.plugin());
            let message = Arc::clone(&message);
            tasks.push(self.spawn_isolated(entry.name().to_string(), async move {
                if let Err(e) = plugin.message(&bot, &message).await {
                    warn!(plugin = %plugin.name(), error = %e, "Plugin message hook failed");
                }
            }));
        }

        if self.client().is_me(message.as_ref()) || message.message().is_empty() {
            return tasks;
        }

        let candidates = self
            .plugins()
            .iter()
            .flat_map(|entry| entry.commands().iter())
            .chain(self.commands().iter());

        for command in candidates {
            let bot = Arc::clone(self);
            let command = Arc::clone(command);
            let message = Arc::clone(&message);
            let parts = Arc::clone(&parts);
            let bot_prefix = Arc::clone(&bot_prefix);
            tasks.push(self.spawn_isolated(command.id().to_string(), async move {
                try_command(bot, &command, message, &parts, &bot_prefix).await;
            }));
        }

        tasks
    }

    /// Opens the transport, loads every plugin and starts the receive loop.
    ///
    /// The returned task ends when `cancel` fires or the stream closes.
    pub async fn open(self: &Arc<Self>, cancel: CancellationToken) -> Result<JoinHandle<()>, OpenError> {
        let mut stream = self.client().open().await?;
        info!("Transport opened");

        for entry in self.plugins() {
            match entry.plugin().load(self.client()).await {
                Ok(()) => debug!(plugin = %entry.name(), "Plugin loaded"),
                Err(e) => error!(plugin = %entry.name(), error = %e, "Plugin load failed"),
            }
        }

        let bot = Arc::clone(self);
        let listener = async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Receive loop stopped");
                        break;
                    }
                    next = stream.recv() => match next {
                        Some(message) => {
                            let bot = Arc::clone(&bot);
                            tokio::spawn(async move {
                                bot.dispatch(message);
                            });
                        }
                        None => {
                            info!("Message stream closed");
                            break;
                        }
                    },
                }
            }
        };

        Ok(tokio::spawn(listener.instrument(info_span!("listen"))))
    }

    /// Calls every plugin's [`save`](crate::Plugin::save) hook, logging failures.
    pub async fn save(&self) {
        for entry in self.plugins() {
            if let Err(e) = entry.plugin().save().await {
                error!(plugin = %entry.name(), error = %e, "Plugin save failed");
            }
        }
    }

    fn spawn_isolated<F>(&self, task: String, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let limiter = self.limiter.clone();
        tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => match limiter.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            if let Err(panic) = AssertUnwindSafe(future).catch_unwind().await {
                error!(task = %task, panic = %panic_message(panic.as_ref()), "Dispatch task panicked");
            }
        })
    }
}

async fn try_command(
    bot: Arc<Bot>,
    command: &CompiledCommand,
    message: BoxedMessage,
    parts: &[String],
    bot_prefix: &str,
) {
    let definition = &command.definition;
    let prefix = bot.definition_prefix(definition, message.as_ref(), bot_prefix);

    let Some((trigger, matched)) = definition.triggers.iter().find_map(|trigger| {
        find_trigger_match(definition, trigger, &prefix, parts, message.as_ref())
            .map(|matched| (trigger.clone(), matched))
    }) else {
        return;
    };

    if !access::allow(definition, message.as_ref(), bot.client().as_ref()) {
        trace!(command = %definition.command_id, "Access denied");
        return;
    }

    let Some(args) = command
        .arguments
        .extract(content_after_trigger(message.raw_message(), &matched))
    else {
        trace!(command = %definition.command_id, "Arguments did not match");
        return;
    };

    info!(
        channel = %message.channel(),
        user = %message.user_name(),
        command = %definition.command_id,
        "{}",
        message.raw_message()
    );

    let callback = Arc::clone(&command.callback);
    callback(CommandContext::new(bot, message, args, trigger)).await;
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use herald_core::mock::{MockClient, MockMessage};
    use parking_lot::Mutex;

    use crate::access::{ExposureLevel, PermissionLevel};
    use crate::bot::BotSettings;
    use crate::command::{CommandArgument, CommandDefinition};
    use crate::error::PluginResult;
    use crate::plugin::Plugin;
    use crate::registry::Registry;

    type Log = Arc<Mutex<Vec<String>>>;

    /// A command that records `id` plus its sorted arguments when invoked.
    fn recording(id: &str, trigger: &str, log: &Log) -> CommandDefinition {
        let log = Arc::clone(log);
        let tag = id.to_string();
        CommandDefinition::new(id)
            .trigger(trigger)
            .callback(move |ctx| {
                let log = Arc::clone(&log);
                let tag = tag.clone();
                async move {
                    let args: BTreeMap<_, _> = ctx.args().iter().collect();
                    let rendered: Vec<String> =
                        args.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    log.lock().push(format!("{tag}({})", rendered.join(",")));
                }
            })
    }

    #[derive(Default)]
    struct Observer {
        seen: Mutex<Vec<String>>,
        loads: AtomicUsize,
        saves: AtomicUsize,
        commands: Vec<CommandDefinition>,
    }

    #[async_trait]
    impl Plugin for Observer {
        fn name(&self) -> &str {
            "observer"
        }

        fn commands(&self) -> Vec<CommandDefinition> {
            self.commands.clone()
        }

        async fn message(&self, _bot: &Arc<Bot>, message: &BoxedMessage) -> PluginResult {
            self.seen.lock().push(message.raw_message().to_string());
            Ok(())
        }

        async fn load(&self, _client: &herald_core::BoxedClient) -> PluginResult {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn save(&self) -> PluginResult {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err("disk full".into())
        }
    }

    fn mock() -> Arc<MockClient> {
        Arc::new(
            MockClient::new("bot")
                .owner("owner")
                .channel_owner("admin")
                .moderator("mod")
                .private_channel("dm"),
        )
    }

    fn build(client: &Arc<MockClient>, registry: Registry) -> Arc<Bot> {
        registry.into_bot(client.clone(), BotSettings::new()).unwrap()
    }

    async fn run(bot: &Arc<Bot>, message: MockMessage) {
        for task in bot.dispatch(message.boxed()) {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_literal_trigger_dispatches_once() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(recording("hello", "hello", &log));
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?hello")).await;
        assert_eq!(*log.lock(), ["hello()"]);

        run(&bot, client.message("general", "u", "hello")).await;
        run(&bot, client.message("general", "u", "?hellothere")).await;
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_required_argument() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(
            recording("greet", "greet", &log).argument(CommandArgument::new(r"\w+", "name")),
        );
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?greet alice")).await;
        run(&bot, client.message("general", "u", "?greet")).await;
        assert_eq!(*log.lock(), ["greet(name=alice)"]);
    }

    #[tokio::test]
    async fn test_trailing_optional_argument() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(
            recording("roll", "roll", &log)
                .argument(CommandArgument::new(r"\d+", "sides"))
                .argument(CommandArgument::optional(r"\d+", "times")),
        );
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?roll 6")).await;
        run(&bot, client.message("general", "u", "?roll 6 2")).await;
        assert_eq!(*log.lock(), ["roll(sides=6,times=)", "roll(sides=6,times=2)"]);
    }

    #[tokio::test]
    async fn test_permission_ladder() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(
            recording("kick", "kick", &log).permission(PermissionLevel::Moderator),
        );
        registry.register_command_definition(
            recording("shutdown", "shutdown", &log).permission(PermissionLevel::Owner),
        );
        let bot = build(&client, registry);

        run(&bot, client.message("general", "admin", "?kick")).await;
        run(&bot, client.message("general", "nobody", "?kick")).await;
        run(&bot, client.message("general", "mod", "?shutdown")).await;
        run(&bot, client.message("general", "admin", "?shutdown")).await;
        run(&bot, client.message("general", "owner", "?shutdown")).await;
        assert_eq!(*log.lock(), ["kick()", "shutdown()"]);
    }

    #[tokio::test]
    async fn test_exposure() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(
            recording("whisper", "whisper", &log).exposure(ExposureLevel::Private),
        );
        registry.register_command_definition(
            recording("shout", "shout", &log).exposure(ExposureLevel::Public),
        );
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?whisper")).await;
        run(&bot, client.message("dm", "u", "?whisper")).await;
        run(&bot, client.message("dm", "u", "?shout")).await;
        run(&bot, client.message("general", "u", "?shout")).await;
        assert_eq!(*log.lock(), ["whisper()", "shout()"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_only_latest_fires() {
        let first = Log::default();
        let second = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(recording("dup", "dup", &first));
        registry.register_command_definition(recording("dup", "dup", &second));
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?dup")).await;
        assert!(first.lock().is_empty());
        assert_eq!(second.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_own_messages_reach_hooks_but_not_commands() {
        let log = Log::default();
        let client = mock();
        let observer = Arc::new(Observer {
            commands: vec![recording("plugin-hello", "hello", &log)],
            ..Default::default()
        });
        let mut registry = Registry::new();
        registry.register_plugin_arc(observer.clone());
        registry.register_command_definition(recording("hello", "hello", &log));
        let bot = build(&client, registry);

        run(&bot, client.own_message("general", "?hello")).await;
        assert!(log.lock().is_empty());
        assert_eq!(*observer.seen.lock(), ["?hello"]);

        run(&bot, client.message("general", "u", "?hello")).await;
        let mut fired = log.lock().clone();
        fired.sort();
        assert_eq!(fired, ["hello()", "plugin-hello()"]);
        assert_eq!(observer.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_mention_trigger_ignores_prefix() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(
            recording("greet", "greet", &log).argument(CommandArgument::new(r"\w+", "name")),
        );
        registry.register_command_definition(
            recording("quiet", "quiet", &log).disable_trigger_on_mention(true),
        );
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "<@bot> greet bob")).await;
        run(&bot, client.message("general", "u", "<@bot> quiet now")).await;
        assert_eq!(*log.lock(), ["greet(name=bob)"]);
    }

    #[tokio::test]
    async fn test_callback_receives_matched_trigger() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let client = mock();
        let mut registry = Registry::new();
        let sink = Arc::clone(&seen);
        registry.register_command_definition(
            CommandDefinition::new("hi")
                .triggers(["hello", "hi"])
                .callback(move |ctx| {
                    let sink = Arc::clone(&sink);
                    async move { sink.lock().push(ctx.trigger().to_string()) }
                }),
        );
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?hi")).await;
        run(&bot, client.message("general", "u", "?hello")).await;
        assert_eq!(*seen.lock(), ["hi", "hello"]);
    }

    #[tokio::test]
    async fn test_commands_request_short_circuits() {
        let log = Log::default();
        let client = mock();
        let observer = Arc::new(Observer::default());
        let mut registry = Registry::new();
        registry.register_plugin_arc(observer.clone());
        registry.register_command("commands", "Shadowed", {
            let log = Arc::clone(&log);
            move |_| {
                let log = Arc::clone(&log);
                async move { log.lock().push("shadowed".to_string()) }
            }
        });
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?commands")).await;
        assert!(observer.seen.lock().is_empty());
        assert!(log.lock().is_empty());
        assert_eq!(client.sent()[0].text, "`?commands` - Shadowed");
    }

    #[tokio::test]
    async fn test_commands_listing_can_be_disabled() {
        let client = mock();
        let observer = Arc::new(Observer::default());
        let mut registry = Registry::new();
        registry.register_plugin_arc(observer.clone());
        let bot = registry
            .into_bot(client.clone(), BotSettings::new().command_lookup_disabled(true))
            .unwrap();

        run(&bot, client.message("general", "u", "?commands")).await;
        assert!(client.sent().is_empty());
        assert_eq!(observer.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_processed_text_skips_commands() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(recording("hello", "hello", &log));
        let bot = build(&client, registry);

        run(&bot, client.message("general", "u", "?hello").processed("")).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_callback_is_contained() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        registry.register_command_definition(
            CommandDefinition::new("boom")
                .trigger("go")
                .callback(|_| async {
                    panic!("callback exploded");
                }),
        );
        registry.register_command_definition(recording("fine", "go", &log));
        let bot = build(&client, registry);

        // `run` unwraps every join result, so a leaked panic fails here.
        run(&bot, client.message("general", "u", "?go")).await;
        assert_eq!(*log.lock(), ["fine()"]);
    }

    #[tokio::test]
    async fn test_bounded_in_flight_still_runs_everything() {
        let log = Log::default();
        let client = mock();
        let mut registry = Registry::new();
        for id in ["a", "b", "c"] {
            registry.register_command_definition(recording(id, "go", &log));
        }
        let bot = registry
            .into_bot(client.clone(), BotSettings::new().max_in_flight(1))
            .unwrap();

        run(&bot, client.message("general", "u", "?go")).await;
        assert_eq!(log.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_open_loads_plugins_and_listens() {
        let client = mock();
        let observer = Arc::new(Observer::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut registry = Registry::new();
        registry.register_plugin_arc(observer.clone());
        registry.register_command("ping", "Replies pong", move |ctx| {
            let tx = tx.clone();
            async move {
                let _ = ctx.reply("pong").await;
                let _ = tx.send(());
            }
        });
        let bot = build(&client, registry);

        let cancel = CancellationToken::new();
        let listener = bot.open(cancel.clone()).await.unwrap();
        assert_eq!(observer.loads.load(Ordering::SeqCst), 1);

        assert!(client.injector().push(client.message("general", "u", "?ping")).await);
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.sent()[0].text, "pong");

        cancel.cancel();
        listener.await.unwrap();
    }

    #[tokio::test]
    async fn test_open_twice_is_a_transport_error() {
        let client = mock();
        let bot = build(&client, Registry::new());
        let _listener = tokio_test::assert_ok!(bot.open(CancellationToken::new()).await);
        let err = tokio_test::assert_err!(bot.open(CancellationToken::new()).await);
        assert!(matches!(err, OpenError::Transport(_)));
    }

    #[tokio::test]
    async fn test_save_reaches_every_plugin() {
        let client = mock();
        let observer = Arc::new(Observer::default());
        let mut registry = Registry::new();
        registry.register_plugin_arc(observer.clone());
        let bot = build(&client, registry);

        bot.save().await;
        assert_eq!(observer.saves.load(Ordering::SeqCst), 1);
    }
}
