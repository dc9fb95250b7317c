mod common;

use common::{spawn_server, TestClient};

#[tokio::test]
async fn welcome_sent_once_then_pass_after_registration_fails() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;

    alice.send("PASS secret").await;
    alice.send("NICK alice").await;
    alice.send("USER alice 0 * :Alice").await;

    let welcome = alice.recv_until(|l| l.contains(" 001 ")).await;
    assert!(welcome.contains("alice"));

    alice.send("PASS wrong").await;
    let reply = alice.recv().await;
    assert!(reply.contains(" 462 "), "expected already-registered numeric, got {reply}");
}

#[tokio::test]
async fn commands_before_registration_are_refused() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.send("JOIN #room").await;
    let reply = alice.recv().await;
    assert!(reply.contains(" 451 "), "expected not-registered numeric, got {reply}");
}

#[tokio::test]
async fn nick_collision_is_rejected() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.register("alice").await;

    let mut bob = TestClient::connect(addr).await;
    bob.send("PASS secret").await;
    bob.send("NICK alice").await;
    let reply = bob.recv().await;
    assert!(reply.contains(" 433 "), "expected nick-in-use numeric, got {reply}");
}

#[tokio::test]
async fn bad_password_is_rejected() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.send("PASS wrongpass").await;
    let reply = alice.recv().await;
    assert!(reply.contains(" 464 "), "expected password-mismatch numeric, got {reply}");
}

#[tokio::test]
async fn invalid_nickname_is_rejected() {
    let addr = spawn_server().await;
    let mut alice = TestClient::connect(addr).await;
    alice.send("PASS secret").await;
    alice.send("NICK bad:nick").await;
    let reply = alice.recv().await;
    assert!(reply.contains(" 432 "), "expected erroneous-nickname numeric, got {reply}");
}
