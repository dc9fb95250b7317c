mod common;

use common::{spawn_server, TestClient};

#[tokio::test]
async fn bot_greets_new_channel_and_answers_ping() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.register("alice").await;

    alice.send("JOIN #room").await;
    alice.recv().await; // own JOIN broadcast
    let bot_join = alice.recv().await;
    assert!(bot_join.contains("JOIN #room") && bot_join.contains("relaybot"));
    let greeting = alice.recv().await;
    assert!(greeting.contains("PRIVMSG #room") && greeting.contains("relaybot"));
    alice.recv_until(|l| l.contains(" 366 ")).await;

    alice.send("PRIVMSG #room :!ping").await;
    let reply = alice.recv_until(|l| l.contains("PRIVMSG #room") && l.contains("relaybot")).await;
    assert!(reply.contains("pong"));
}

#[tokio::test]
async fn bot_calc_and_roll_reply() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.register("alice").await;
    alice.send("JOIN #room").await;
    alice.recv().await;
    alice.recv().await;
    alice.recv().await;
    alice.recv_until(|l| l.contains(" 366 ")).await;

    alice.send("PRIVMSG #room :!calc 2 + 3 * 4").await;
    let reply = alice.recv_until(|l| l.contains("relaybot")).await;
    assert!(reply.contains(":14"), "expected calc result 14, got {reply}");

    alice.send("PRIVMSG #room :!roll 2d6").await;
    let reply = alice.recv_until(|l| l.contains("relaybot")).await;
    assert!(reply.contains('['), "expected roll breakdown, got {reply}");
}

#[tokio::test]
async fn bot_poll_vote_and_show() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.register("alice").await;
    alice.send("JOIN #room").await;
    alice.recv().await;
    alice.recv().await;
    alice.recv().await;
    alice.recv_until(|l| l.contains(" 366 ")).await;

    alice.send("PRIVMSG #room :!poll new Best color? | red | blue").await;
    let created = alice.recv_until(|l| l.contains("relaybot")).await;
    assert!(created.contains("poll #1 created"));

    alice.send("PRIVMSG #room :!poll vote 1 2").await;
    let voted = alice.recv_until(|l| l.contains("relaybot")).await;
    assert!(voted.contains("vote recorded"));

    alice.send("PRIVMSG #room :!poll show 1").await;
    let shown = alice.recv_until(|l| l.contains("relaybot")).await;
    assert!(shown.contains("blue (1)"), "expected blue to have 1 vote, got {shown}");
}
