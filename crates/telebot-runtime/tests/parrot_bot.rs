//! End-to-end run of a parrot + command bot against a scripted transport.

use std::time::Duration;

use serde_json::json;
use telebot_core::testing::MockTransport;
use telebot_runtime::prelude::*;

async fn parrot(api: Api, message: Message) {
    let text = message.text.clone().unwrap_or_default();
    api.send_message(message.chat_id(), format!("Parrot Says: {text}"))
        .await;
}

async fn command(api: Api, message: Message, Args(args): Args) {
    let cmd = args.first().cloned().unwrap_or_default();
    api.send_message(message.chat_id(), format!("Command Recieved: {cmd}"))
        .await;
}

fn scripted_transport() -> MockTransport {
    let transport = MockTransport::new();
    transport
        .respond(
            "getMe",
            json!({"ok": true, "result": {"id": 1, "is_bot": true, "first_name": "Parrot", "username": "parrot_bot"}}),
        )
        .respond(
            "getUpdates",
            json!({"ok": true, "result": [
                {"update_id": 1, "message": {"message_id": 10, "text": "hello", "chat": {"id": 42}}},
                {"update_id": 2, "message": {"message_id": 11, "text": "/command arg", "chat": {"id": 42}}},
                {"update_id": 3, "message": {"message_id": 12, "chat": {"id": 42}, "sticker": {}}}
            ]}),
        );
    transport.when_exhausted("sendMessage", json!({"ok": true, "result": {"message_id": 99}}));
    transport.when_exhausted("getUpdates", json!({"ok": false, "error": "no more updates"}));
    transport
}

fn new_bot(transport: &MockTransport) -> TeleBot {
    let mut bot = TeleBot::with_transport(
        "parrot",
        TelebotConfig::with_api_key("xxxxxxxx:test"),
        transport.clone().boxed(),
    );
    bot.route("/command ?(.*)", command).unwrap();
    bot.route("(?!/).+", parrot).unwrap();
    bot
}

fn sent_texts(transport: &MockTransport) -> Vec<(i64, String)> {
    transport
        .calls_to("sendMessage")
        .into_iter()
        .map(|call| {
            let params = call.params.unwrap();
            (
                params["chat_id"].as_i64().unwrap(),
                params["text"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn debug_poll_dispatches_batch_then_surfaces_failure() {
    let transport = scripted_transport();
    let mut bot = new_bot(&transport);

    let options = PollOptions::default()
        .poll_timeout(Duration::from_secs(30))
        .debug(true);
    let err = bot.poll(options).await.unwrap_err();

    assert!(matches!(err, BotError::PollFetch(_)));
    assert!(err.to_string().contains("no more updates"));

    assert_eq!(
        sent_texts(&transport),
        [
            (42, "Parrot Says: hello".to_string()),
            (42, "Command Recieved: arg".to_string()),
        ]
    );
    assert_eq!(bot.offset(), 4);
    assert_eq!(bot.whoami().and_then(|u| u.username.as_deref()), Some("parrot_bot"));
    assert_eq!(bot.state(), PollState::Idle);

    let fetches = transport.calls_to("getUpdates");
    assert_eq!(fetches.len(), 2);
    assert_eq!(fetches[0].params.as_ref().unwrap()["offset"], json!(0));
    assert_eq!(fetches[1].params.as_ref().unwrap()["offset"], json!(4));
    assert_eq!(fetches[0].long_poll, Some(Duration::from_secs(30)));
}

#[tokio::test]
async fn process_updates_without_polling() {
    let transport = scripted_transport();
    let mut bot = new_bot(&transport);

    let batch = bot
        .api()
        .get_updates(Duration::from_secs(0), bot.offset())
        .await;
    bot.process_updates(batch).await.unwrap();

    assert_eq!(bot.offset(), 4);
    assert_eq!(sent_texts(&transport).len(), 2);
    assert!(bot.whoami().is_none());
}

#[tokio::test(start_paused = true)]
async fn production_poll_keeps_running_after_failures() {
    let transport = scripted_transport();
    let mut bot = new_bot(&transport);
    let mut state = bot.subscribe_state();

    let options = PollOptions::default()
        .poll_timeout(Duration::from_secs(30))
        .cooldown(Duration::from_secs(60));

    tokio::select! {
        result = bot.poll(options) => panic!("poll returned: {result:?}"),
        _ = tokio::time::sleep(Duration::from_secs(150)) => {}
    }

    assert_eq!(*state.borrow_and_update(), PollState::Backoff);
    // One successful fetch, then failures at t=0, 60 and 120.
    assert_eq!(transport.calls_to("getUpdates").len(), 4);
    assert_eq!(sent_texts(&transport).len(), 2);
}
