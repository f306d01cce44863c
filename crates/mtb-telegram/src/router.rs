use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use mtb_core::{
    cancellation::CancellationRegistry,
    commands::{BotProfile, CommandRouter},
    config::Config,
    domain::UserId,
    messaging::port::ChatClient,
    roster::MemberRoster,
};

use crate::handlers;
use crate::TelegramClient;

#[derive(Clone)]
pub struct AppState {
    pub me: UserId,
    pub profile: Arc<BotProfile>,
    pub client: Arc<dyn ChatClient>,
    pub router: Arc<CommandRouter>,
    pub registry: Arc<CancellationRegistry>,
    pub roster: Arc<MemberRoster>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    // An invalid token fails here, before any update is processed.
    let me = bot.get_me().await?;
    let username = cfg
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!(username = %username, app_id = ?cfg.app_id, "bot started");

    let profile = BotProfile {
        name: me.user.first_name.clone(),
        username,
        owner_username: cfg.owner_username.clone(),
    };
    let router = CommandRouter::new(Some(&profile.username))?;

    let roster = Arc::new(MemberRoster::new());
    let client: Arc<dyn ChatClient> = Arc::new(TelegramClient::new(
        bot.clone(),
        roster.clone(),
        cfg.message_limit,
    ));

    let state = Arc::new(AppState {
        me: UserId(me.user.id.0 as i64),
        profile: Arc::new(profile),
        client,
        router: Arc::new(router),
        registry: Arc::new(CancellationRegistry::new()),
        roster,
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_chat_member().endpoint(handlers::handle_chat_member))
        .branch(Update::filter_my_chat_member().endpoint(handlers::handle_my_chat_member));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("bot stopped");
    Ok(())
}
