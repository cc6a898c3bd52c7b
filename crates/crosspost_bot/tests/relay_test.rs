//! End-to-end tests of relay sequences against mock collaborators.

mod common;

use common::{
    Call, MockPublisher, harness, harness_with, media_event, redaction_event, staged_files,
    text_event,
};
use crosspost_bot::{BridgeConfig, RelayOutcome};
use crosspost_core::{ActionKind, EventId, EventPayload, InboundEvent, Network, RemoteId, UserId};
use crosspost_error::{CrosspostErrorKind, StagingErrorKind};
use crosspost_interface::Visibility;
use crosspost_storage::EntryType;
use std::sync::Arc;
use std::time::Duration;

const ALICE: &str = "@alice:example.org";
const BOB: &str = "@bob:example.org";
const TWO_MB: usize = 2 * 1024 * 1024;

fn defaults() -> BridgeConfig {
    BridgeConfig::from_toml_str("").unwrap()
}

fn both_networks() -> BridgeConfig {
    BridgeConfig::from_toml_str("[networks.twitter]\nenabled = true\n").unwrap()
}

#[tokio::test]
async fn test_stage_publish_and_purge() {
    let h = harness(defaults(), TWO_MB).await;
    let alice = UserId::from(ALICE);

    // 2 MB image under the 4 MiB mastodon ceiling.
    let staged = h
        .relay
        .stage_media(&media_event(ALICE, "$e1", Some(TWO_MB as u64)))
        .await
        .unwrap();
    assert!(staged.exists());
    assert_eq!(std::fs::metadata(&staged).unwrap().len(), TWO_MB as u64);

    let post = text_event(ALICE, "$e2", "Look at this", None);
    let report = h.relay.publish(&post, "Look at this").await.unwrap();
    assert!(report.is_complete());
    assert!(*report.purged());
    assert_eq!(*report.attachments(), 1);

    let calls = h.publisher.calls();
    assert_eq!(
        calls,
        vec![Call::Post {
            network: Network::Mastodon,
            text: "Look at this".to_string(),
            attachments: vec![(TWO_MB as u64, None)],
            reply_to: None,
        }]
    );

    let record = h
        .relay
        .ledger()
        .retrieve(&EventId::from("$e2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.owner(), &alice);
    assert_eq!(*record.action(), ActionKind::Post);
    assert_eq!(
        record.remote_id(Network::Mastodon),
        report.posted().get(&Network::Mastodon)
    );

    assert!(h.relay.media().list(&alice, EntryType::Media).await.unwrap().is_empty());
    assert!(!staged.exists());
}

#[tokio::test]
async fn test_redaction_deletes_own_post_only() {
    let h = harness(defaults(), 16).await;

    let post = text_event(ALICE, "$post", "hello", None);
    let report = h.relay.publish(&post, "hello").await.unwrap();
    let remote = report.posted()[&Network::Mastodon].clone();

    // Bob may not undo Alice's post.
    let err = h
        .relay
        .redact(&redaction_event(BOB, "$r1", "$post"), &EventId::from("$post"))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), CrosspostErrorKind::Authorization(_)));
    assert!(
        !h.publisher
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Delete(..)))
    );

    let report = h
        .relay
        .redact(&redaction_event(ALICE, "$r2", "$post"), &EventId::from("$post"))
        .await
        .unwrap();
    assert_eq!(*report.action(), Some(ActionKind::Post));
    assert_eq!(report.undone(), &vec![Network::Mastodon]);
    assert!(
        h.publisher
            .calls()
            .contains(&Call::Delete(Network::Mastodon, remote))
    );
}

#[tokio::test]
async fn test_admin_override_allows_foreign_redaction() {
    let config = BridgeConfig::from_toml_str("admins_can_redact = true").unwrap();
    let h = harness(config, 16).await;

    h.relay
        .publish(&text_event(ALICE, "$post", "hello", None), "hello")
        .await
        .unwrap();
    let report = h
        .relay
        .redact(&redaction_event(BOB, "$r", "$post"), &EventId::from("$post"))
        .await
        .unwrap();
    assert_eq!(report.undone().len(), 1);
}

#[tokio::test]
async fn test_redacting_untracked_message_is_harmless() {
    let h = harness(defaults(), 16).await;

    let report = h
        .relay
        .redact(&redaction_event(ALICE, "$r", "$unknown"), &EventId::from("$unknown"))
        .await
        .unwrap();
    assert_eq!(*report.action(), None);
    assert!(!*report.media_removed());
    assert!(h.publisher.calls().is_empty());
}

#[tokio::test]
async fn test_redacting_staged_media_removes_it() {
    let h = harness(defaults(), 16).await;
    let alice = UserId::from(ALICE);

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();
    let report = h
        .relay
        .redact(&redaction_event(ALICE, "$r", "$img"), &EventId::from("$img"))
        .await
        .unwrap();

    assert!(*report.media_removed());
    assert_eq!(*report.action(), Some(ActionKind::MediaAttach));
    assert!(h.relay.media().list(&alice, EntryType::Media).await.unwrap().is_empty());
    assert!(h.publisher.calls().is_empty());
}

#[tokio::test]
async fn test_stage_media_rejects_bad_input_before_download() {
    let h = harness(defaults(), 16).await;

    let event = InboundEvent::new(
        ALICE,
        "!room:example.org",
        "$img",
        EventPayload::Media {
            content_uri: "https://example.org/cat.png".to_string(),
            declared_size: None,
        },
    );
    let err = h.relay.stage_media(&event).await.unwrap_err();
    assert!(matches!(err.kind(), CrosspostErrorKind::Reference(_)));

    // 5 MiB declared against the 4 MiB mastodon ceiling.
    let err = h
        .relay
        .stage_media(&media_event(ALICE, "$big", Some(5 * 1024 * 1024)))
        .await
        .unwrap_err();
    match err.kind() {
        CrosspostErrorKind::Staging(e) => assert!(matches!(
            e.kind(),
            StagingErrorKind::SizeLimitExceeded { ceiling, .. } if ceiling == "mastodon"
        )),
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(
        h.downloader.calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert!(staged_files(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_oversized_download_leaves_nothing_behind() {
    // Mastodon's 4 MiB stays the tightest ceiling with twitter enabled.
    let h = harness(both_networks(), 4 * 1024 * 1024 + 1).await;

    let err = h
        .relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), CrosspostErrorKind::Staging(_)));
    assert!(staged_files(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_partial_publish_keeps_media() {
    let h = harness(both_networks(), 16).await;
    let alice = UserId::from(ALICE);
    h.publisher.fail_on(Network::Twitter);

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();
    let report = h
        .relay
        .publish(&text_event(ALICE, "$post", "hi", None), "hi")
        .await
        .unwrap();

    assert!(report.posted().contains_key(&Network::Mastodon));
    assert!(report.failed().contains_key(&Network::Twitter));
    assert!(!report.is_complete());
    assert!(!*report.purged());
    assert_eq!(h.relay.media().list(&alice, EntryType::Media).await.unwrap().len(), 1);

    let record = h
        .relay
        .ledger()
        .retrieve(&EventId::from("$post"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.remote_ids().len(), 1);
}

#[tokio::test]
async fn test_failed_publish_is_upstream_error() {
    let h = harness(defaults(), 16).await;
    let alice = UserId::from(ALICE);
    h.publisher.fail_on(Network::Mastodon);

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();
    let err = h
        .relay
        .publish(&text_event(ALICE, "$post", "hi", None), "hi")
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), CrosspostErrorKind::Upstream(_)));
    assert_eq!(h.relay.media().list(&alice, EntryType::Media).await.unwrap().len(), 1);
    assert_eq!(
        h.relay.ledger().retrieve(&EventId::from("$post")).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_text_over_tightest_char_limit_is_rejected() {
    let h = harness(both_networks(), 16).await;

    let text = "x".repeat(281);
    let err = h
        .relay
        .publish(&text_event(ALICE, "$post", &text, None), &text)
        .await
        .unwrap_err();
    match err.kind() {
        CrosspostErrorKind::Validation(e) => assert!(e.message.contains("twitter")),
        other => panic!("unexpected error: {}", other),
    }
    assert!(h.publisher.calls().is_empty());
}

#[tokio::test]
async fn test_reply_to_own_media_becomes_description() {
    let h = harness(defaults(), 16).await;

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();

    let outcome = h
        .relay
        .handle(&text_event(ALICE, "$desc", "a cat", Some("$img")))
        .await
        .unwrap();
    assert!(matches!(outcome, RelayOutcome::Described(_)));
    assert!(h.publisher.calls().is_empty());

    let outcome = h
        .relay
        .handle(&text_event(ALICE, "$post", "my cat", None))
        .await
        .unwrap();
    assert!(matches!(outcome, RelayOutcome::Published(_)));
    assert_eq!(
        h.publisher.calls(),
        vec![Call::Post {
            network: Network::Mastodon,
            text: "my cat".to_string(),
            attachments: vec![(16, Some("a cat".to_string()))],
            reply_to: None,
        }]
    );
}

#[tokio::test]
async fn test_reply_to_someone_elses_media_is_published() {
    let h = harness(defaults(), 16).await;

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();

    let outcome = h
        .relay
        .handle(&text_event(BOB, "$bob", "nice dog", Some("$img")))
        .await
        .unwrap();
    assert!(matches!(outcome, RelayOutcome::Published(_)));
    assert_eq!(
        h.publisher.calls(),
        vec![Call::Post {
            network: Network::Mastodon,
            text: "nice dog".to_string(),
            attachments: vec![],
            reply_to: None,
        }]
    );

    // Alice's media stays staged and undescribed.
    let alice = UserId::from(ALICE);
    assert_eq!(h.relay.media().list(&alice, EntryType::Media).await.unwrap().len(), 1);
    assert!(h.relay.descriptions().list(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reply_to_already_posted_media_is_published() {
    let h = harness(defaults(), 16).await;

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();
    let first = h
        .relay
        .handle(&text_event(ALICE, "$p1", "my cat", None))
        .await
        .unwrap();
    assert!(matches!(first, RelayOutcome::Published(ref r) if *r.purged()));

    let outcome = h
        .relay
        .handle(&text_event(ALICE, "$p2", "forgot: she is called Mia", Some("$img")))
        .await
        .unwrap();
    assert!(matches!(outcome, RelayOutcome::Published(_)));

    let calls = h.publisher.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        Call::Post {
            network: Network::Mastodon,
            text: "forgot: she is called Mia".to_string(),
            attachments: vec![],
            reply_to: None,
        }
    );
}

#[tokio::test]
async fn test_direct_toot_threads_and_purges_media() {
    let h = harness(both_networks(), 16).await;
    let alice = UserId::from(ALICE);

    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();

    let target = RemoteId::from("109876");
    let id = h
        .relay
        .toot(
            &text_event(ALICE, "$dm", "@bob@example.social see this", None),
            "@bob@example.social see this",
            Visibility::Direct,
            Some(target.clone()),
        )
        .await
        .unwrap();

    let drafts = h.publisher.drafts();
    assert_eq!(drafts.len(), 1);
    assert_eq!(*drafts[0].visibility(), Visibility::Direct);
    assert_eq!(drafts[0].reply_to(), &Some(target));
    assert_eq!(drafts[0].attachments().len(), 1);
    // Mastodon only, even with twitter enabled.
    assert!(matches!(
        &h.publisher.calls()[0],
        Call::Post { network: Network::Mastodon, .. }
    ));

    let record = h
        .relay
        .ledger()
        .retrieve(&EventId::from("$dm"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*record.action(), ActionKind::Post);
    assert_eq!(record.remote_id(Network::Mastodon), Some(&id));
    assert!(h.relay.media().list(&alice, EntryType::Media).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_direct_toot_needs_a_recipient() {
    let h = harness(defaults(), 16).await;

    let err = h
        .relay
        .toot(
            &text_event(ALICE, "$dm", "hello nobody", None),
            "hello nobody",
            Visibility::Direct,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), CrosspostErrorKind::Validation(_)));
    assert!(h.publisher.drafts().is_empty());

    // A public reply needs no mention.
    h.relay
        .toot(
            &text_event(ALICE, "$reply", "agreed", None),
            "agreed",
            Visibility::Public,
            Some(RemoteId::from("42")),
        )
        .await
        .unwrap();
    assert_eq!(*h.publisher.drafts()[0].visibility(), Visibility::Public);
}

#[tokio::test]
async fn test_toot_refused_when_mastodon_disabled() {
    let config = BridgeConfig::from_toml_str(
        "[networks.mastodon]\nenabled = false\n[networks.twitter]\nenabled = true\n",
    )
    .unwrap();
    let h = harness(config, 16).await;

    let err = h
        .relay
        .toot(
            &text_event(ALICE, "$dm", "@bob hi", None),
            "@bob hi",
            Visibility::Direct,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), CrosspostErrorKind::Validation(_)));
}

#[tokio::test]
async fn test_reply_to_tracked_post_threads_the_status() {
    let h = harness(defaults(), 16).await;

    let first = h
        .relay
        .publish(&text_event(ALICE, "$first", "thread 1/2", None), "thread 1/2")
        .await
        .unwrap();
    let outcome = h
        .relay
        .handle(&text_event(ALICE, "$second", "thread 2/2", Some("$first")))
        .await
        .unwrap();
    assert!(matches!(outcome, RelayOutcome::Published(_)));

    let calls = h.publisher.calls();
    assert!(matches!(
        &calls[1],
        Call::Post { reply_to: Some(id), .. } if Some(id) == first.posted().get(&Network::Mastodon)
    ));
}

#[tokio::test]
async fn test_reblog_and_favourite_are_undoable() {
    let h = harness(defaults(), 16).await;
    let status = RemoteId::from("109");

    h.relay
        .reblog(&text_event(ALICE, "$rb", "", None), Network::Mastodon, &status)
        .await
        .unwrap();
    h.relay
        .favourite(&text_event(ALICE, "$fav", "", None), Network::Mastodon, &status)
        .await
        .unwrap();

    h.relay
        .redact(&redaction_event(ALICE, "$r1", "$rb"), &EventId::from("$rb"))
        .await
        .unwrap();
    h.relay
        .redact(&redaction_event(ALICE, "$r2", "$fav"), &EventId::from("$fav"))
        .await
        .unwrap();

    assert_eq!(
        h.publisher.calls(),
        vec![
            Call::Reblog(Network::Mastodon, status.clone()),
            Call::Favourite(Network::Mastodon, status.clone()),
            Call::Unreblog(Network::Mastodon, status.clone()),
            Call::Unfavourite(Network::Mastodon, status),
        ]
    );

    // Twitter is disabled by default.
    let err = h
        .relay
        .reblog(&text_event(ALICE, "$rb2", "", None), Network::Twitter, &RemoteId::from("1"))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), CrosspostErrorKind::Validation(_)));
}

#[tokio::test]
async fn test_same_user_publishes_never_interleave() {
    let publisher = MockPublisher {
        delay: Duration::from_millis(30),
        ..MockPublisher::default()
    };
    let h = harness_with(defaults(), 16, publisher).await;

    let mut handles = Vec::new();
    for n in 0..3 {
        let relay = Arc::clone(&h.relay);
        handles.push(tokio::spawn(async move {
            let text = format!("post {}", n);
            relay
                .publish(&text_event(ALICE, &format!("$p{}", n), &text, None), &text)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let timeline = h.publisher.timeline.lock().clone();
    assert_eq!(timeline.len(), 6);
    for pair in timeline.chunks(2) {
        assert!(pair[0].starts_with("start "));
        assert_eq!(pair[0].replacen("start", "end", 1), pair[1], "{:?}", timeline);
    }
}

#[tokio::test]
async fn test_different_users_publish_in_parallel() {
    let publisher = MockPublisher {
        delay: Duration::from_millis(200),
        ..MockPublisher::default()
    };
    let h = harness_with(defaults(), 16, publisher).await;

    let started = std::time::Instant::now();
    let event_a = text_event(ALICE, "$a", "from alice", None);
    let event_b = text_event(BOB, "$b", "from bob", None);
    let (a, b) = tokio::join!(
        h.relay.publish(&event_a, "from alice"),
        h.relay.publish(&event_b, "from bob"),
    );
    a.unwrap();
    b.unwrap();
    assert!(started.elapsed() < Duration::from_millis(390));
}

#[tokio::test]
async fn test_stale_media_warning() {
    let config = BridgeConfig::from_toml_str("[staging]\nmedia_max_age_secs = 0").unwrap();
    let h = harness(config, 16).await;
    let alice = UserId::from(ALICE);

    assert!(!h.relay.has_stale_media(&alice).await.unwrap());
    h.relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.relay.has_stale_media(&alice).await.unwrap());

    let fresh = harness(defaults(), 16).await;
    fresh
        .relay
        .stage_media(&media_event(ALICE, "$img", None))
        .await
        .unwrap();
    assert!(!fresh.relay.has_stale_media(&alice).await.unwrap());
}

#[tokio::test]
async fn test_mirror_link_and_lock_reclamation() {
    let h = harness(defaults(), 16).await;

    let upload = h
        .relay
        .mirror_link("https://img.example.org/cat.png")
        .await
        .unwrap();
    assert_eq!(upload.content_uri(), "mxc://hs/mirrored");

    h.relay
        .publish(&text_event(ALICE, "$post", "hi", None), "hi")
        .await
        .unwrap();
    assert_eq!(h.relay.locks().len(), 1);
    assert_eq!(h.relay.reclaim_idle_locks(), 1);
    assert!(h.relay.locks().is_empty());
}
