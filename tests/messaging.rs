mod common;

use axum::http::StatusCode;
use meetup_network::db;
use serde_json::json;
use uuid::Uuid;

use common::spawn_app;

#[tokio::test]
async fn messaging_needs_an_accepted_connection() {
    let app = spawn_app().await;
    let (alice, alice_token) = app.sign_in_with_profile("alice@example.com", "Alice", true).await;
    let (bob, bob_token) = app.sign_in_with_profile("bob@example.com", "Bob", true).await;

    // a conversation row alone is not enough
    db::conversations::create_for_pair(&app.db_pool, alice.id, bob.id).await.unwrap();
    let listed = app.get("/api/conversations", &alice_token).await;
    let conversation_id = listed.body["data"]["conversations"][0]["id"].as_str().unwrap().to_owned();

    let reply = app
        .post(
            &format!("/api/conversations/{conversation_id}/messages"),
            &alice_token,
            json!({ "content": "too early" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["detail"], "Cannot send message - connection not established");

    let sent = app
        .post("/api/connections/request", &alice_token, json!({ "receiver_id": bob.id, "message": "" }))
        .await;
    let request_id = sent.body["data"]["request"]["id"].as_str().unwrap();
    app.put(
        &format!("/api/connections/requests/{request_id}/respond"),
        &bob_token,
        json!({ "status": "accepted" }),
    )
    .await;

    // accepting reused the existing conversation
    assert_eq!(db::conversations::count_between(&app.db_pool, alice.id, bob.id).await.unwrap(), 1);

    let reply = app
        .post(
            &format!("/api/conversations/{conversation_id}/messages"),
            &alice_token,
            json!({ "content": "now it works" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
}

#[tokio::test]
async fn conversation_round_trip() {
    let app = spawn_app().await;
    let (_, alice_token) = app.sign_in_with_profile("alice@example.com", "Alice", true).await;
    let (bob, bob_token) = app.sign_in_with_profile("bob@example.com", "Bob", true).await;
    let conversation_id = app.connect_pair(&alice_token, &bob, &bob_token).await;
    let messages_uri = format!("/api/conversations/{conversation_id}/messages");

    for content in ["  first  ", "second", "third"] {
        let reply = app.post(&messages_uri, &alice_token, json!({ "content": content })).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Message sent successfully");
    }

    let mails = app.sent_mails();
    let last = mails.last().unwrap();
    assert_eq!(last["subject"], "New Message from Alice");
    assert_eq!(last["personalizations"][0]["to"][0]["email"], "bob@example.com");
    assert!(last["content"][0]["value"]
        .as_str()
        .unwrap()
        .contains(&format!("http://frontend.test/messaging?conversation={conversation_id}")));

    let overview = app.get(&format!("/api/conversations/{conversation_id}"), &bob_token).await;
    assert_eq!(overview.status, StatusCode::OK);
    let conversation = &overview.body["data"]["conversation"];
    assert_eq!(conversation["other_user_name"], "Alice");
    assert_eq!(conversation["last_message"], "third");
    assert_eq!(conversation["unread_count"], 3);

    // newest page, oldest first
    let page = app.get(&format!("{messages_uri}?limit=2"), &bob_token).await;
    let messages = page.body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "second");
    assert_eq!(messages[1]["content"], "third");
    assert_eq!(
        page.body["data"]["pagination"],
        json!({ "skip": 0, "limit": 2, "total": 3, "has_more": true })
    );

    let page = app.get(&format!("{messages_uri}?skip=2&limit=2"), &bob_token).await;
    assert_eq!(page.body["data"]["messages"][0]["content"], "first");

    // reading marked everything alice sent
    let overview = app.get(&format!("/api/conversations/{conversation_id}"), &bob_token).await;
    assert_eq!(overview.body["data"]["conversation"]["unread_count"], 0);

    let reply = app.post(&messages_uri, &bob_token, json!({ "content": "hey" })).await;
    assert_eq!(reply.status, StatusCode::OK);
    let overview = app.get(&format!("/api/conversations/{conversation_id}"), &alice_token).await;
    assert_eq!(overview.body["data"]["conversation"]["unread_count"], 1);
    assert_eq!(overview.body["data"]["conversation"]["other_user_name"], "Bob");
}

#[tokio::test]
async fn blank_messages_are_refused() {
    let app = spawn_app().await;
    let (_, alice_token) = app.sign_in_with_profile("alice@example.com", "Alice", true).await;
    let (bob, bob_token) = app.sign_in_with_profile("bob@example.com", "Bob", true).await;
    let conversation_id = app.connect_pair(&alice_token, &bob, &bob_token).await;

    let reply = app
        .post(
            &format!("/api/conversations/{conversation_id}/messages"),
            &alice_token,
            json!({ "content": "   \n " }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn outsiders_cannot_see_a_conversation() {
    let app = spawn_app().await;
    let (_, alice_token) = app.sign_in_with_profile("alice@example.com", "Alice", true).await;
    let (bob, bob_token) = app.sign_in_with_profile("bob@example.com", "Bob", true).await;
    let (_, eve_token) = app.sign_in("eve@example.com", "Eve").await;
    let conversation_id = app.connect_pair(&alice_token, &bob, &bob_token).await;

    for uri in [
        format!("/api/conversations/{conversation_id}"),
        format!("/api/conversations/{conversation_id}/messages"),
        format!("/api/conversations/{}", Uuid::now_v7()),
        "/api/conversations/not-an-id".to_owned(),
    ] {
        let reply = app.get(&uri, &eve_token).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(reply.body["detail"], "Conversation not found or access denied");
    }

    let reply = app
        .post(
            &format!("/api/conversations/{conversation_id}/messages"),
            &eve_token,
            json!({ "content": "let me in" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let listed = app.get("/api/conversations", &eve_token).await;
    assert_eq!(listed.body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn conversations_follow_last_activity() {
    let app = spawn_app().await;
    let (alice, alice_token) = app.sign_in_with_profile("alice@example.com", "Alice", true).await;
    let (bob, bob_token) = app.sign_in_with_profile("bob@example.com", "Bob", true).await;
    let (carol, carol_token) = app.sign_in_with_profile("carol@example.com", "Carol", true).await;

    let with_bob = app.connect_pair(&alice_token, &bob, &bob_token).await;
    let with_carol = app.connect_pair(&alice_token, &carol, &carol_token).await;
    assert_ne!(with_bob, with_carol);

    let listed = app.get("/api/conversations", &alice_token).await;
    assert_eq!(listed.body["data"]["conversations"][0]["id"], with_carol.as_str());

    // push the bob conversation's activity past carol's
    let later = db::now() + time::Duration::minutes(5);
    db::conversations::touch(&app.db_pool, with_bob.parse().unwrap(), later)
        .await
        .unwrap();

    let listed = app.get("/api/conversations", &alice_token).await;
    let conversations = listed.body["data"]["conversations"].as_array().unwrap();
    assert_eq!(conversations[0]["id"], with_bob.as_str());
    assert_eq!(conversations[0]["other_user_id"], json!(bob.id));
    assert_eq!(conversations[1]["other_user_id"], json!(carol.id));
    assert_ne!(conversations[0]["other_user_id"], json!(alice.id));

    let reply = app.get("/api/conversations/x/messages?limit=101", &alice_token).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
}
