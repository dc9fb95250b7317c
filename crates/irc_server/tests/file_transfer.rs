mod common;

use common::{spawn_server_with_uploads, TestClient};
use std::sync::Mutex;

/// The transfer engine resolves source paths relative to the process's
/// working directory, so these tests serialize around `set_current_dir`
/// rather than racing each other's chdir.
static CWD_LOCK: Mutex<()> = Mutex::new(());

/// End-to-end scenario 6 from spec §8: a five-byte file streamed through
/// FILESEND/FILEACCEPT, checked against the known CRC32 for "hello".
#[tokio::test]
async fn file_transfer_round_trip_reports_correct_crc() {
    let _guard = CWD_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
    let prev = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let addr = spawn_server_with_uploads("uploads").await;

    let mut alice = TestClient::connect(addr).await;
    alice.register("alice").await;
    let mut bob = TestClient::connect(addr).await;
    bob.register("bob").await;

    alice.send("FILESEND bob 5 :hello.txt").await;
    let sent = alice.recv().await;
    assert!(sent.contains(" 739 "));
    let offer = bob.recv().await;
    assert!(offer.contains(" 738 ") && offer.contains("hello.txt"));

    bob.send("FILEACCEPT 1").await;
    bob.recv().await; // 742 RPL_FILEACCEPTED

    let begin_alice = alice.recv().await;
    assert!(begin_alice.contains(" 746 "));
    let begin_bob = bob.recv().await;
    assert!(begin_bob.contains(" 746 "));

    let chunk = bob.recv().await;
    assert!(chunk.contains(" 740 "));
    assert!(chunk.contains("aGVsbG8="), "expected base64 of 'hello', got {chunk}");

    let done_alice = alice.recv().await;
    assert!(done_alice.contains(" 741 "));
    let done_bob = bob.recv().await;
    assert!(done_bob.contains(" 741 "));

    let saved_alice = alice.recv().await;
    assert!(saved_alice.contains(" 744 ") && saved_alice.contains("uploads/1_hello.txt"));
    let saved_bob = bob.recv().await;
    assert!(saved_bob.contains(" 744 "));

    let hash_alice = alice.recv().await;
    assert!(hash_alice.contains(" 745 ") && hash_alice.contains("3610A686"));
    let hash_bob = bob.recv().await;
    assert!(hash_bob.contains(" 745 ") && hash_bob.contains("3610A686"));

    std::env::set_current_dir(prev).unwrap();
}

#[tokio::test]
async fn cancel_by_non_participant_is_refused() {
    let _guard = CWD_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("f.bin"), b"x").unwrap();
    let prev = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let addr = spawn_server_with_uploads("uploads").await;
    let mut alice = TestClient::connect(addr).await;
    alice.register("alice").await;
    let mut bob = TestClient::connect(addr).await;
    bob.register("bob").await;
    let mut carol = TestClient::connect(addr).await;
    carol.register("carol").await;

    alice.send("FILESEND bob 1 :f.bin").await;
    alice.recv().await;
    bob.recv().await;

    carol.send("FILECANCEL 1").await;
    let reply = carol.recv().await;
    assert!(reply.contains(" 400 "), "expected generic error for non-participant cancel, got {reply}");

    std::env::set_current_dir(prev).unwrap();
}
