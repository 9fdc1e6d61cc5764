//! Reconciliation integration tests
//!
//! Drive the services end to end against the scripted in-memory gateway:
//! snapshot diffing, exactly-once grants, attribution, nickname idempotence,
//! and scheduler cadence.

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{TestHarness, GUILD, OTHER_GUILD, STAFF_ROLE, VERIFY_ROLE};
use sentinel_core::{
    Attribution, AuditAction, AuditLogEntry, ChatGateway, GuildMember, InviteUsage, Snowflake,
};
use sentinel_sync::{
    AttributionService, NicknameService, PollScheduler, StatusRotator, SyncOutcome,
    VerificationService,
};

fn invite(code: &str, inviter: i64, uses: u32) -> InviteUsage {
    InviteUsage::new(code, GUILD, Some(Snowflake::new(inviter)), uses)
}

// ============================================================================
// Reaction Verification
// ============================================================================

#[tokio::test]
async fn test_first_poll_never_grants_preexisting_reactors() {
    let hx = TestHarness::new();
    let alice = Snowflake::new(1);
    hx.seed_member(alice, "alice");
    hx.gateway.set_reactors([alice]);

    let service = VerificationService::new(&hx.ctx);
    assert_eq!(service.poll().await.unwrap(), 0);
    assert!(hx.gateway.grants().is_empty());

    // The reactor stays put; later polls must not treat it as new either
    assert_eq!(service.poll().await.unwrap(), 0);
    assert!(hx.gateway.grants().is_empty());
}

#[tokio::test]
async fn test_grant_fires_exactly_once_while_reaction_persists() {
    let hx = TestHarness::new();
    let bob = Snowflake::new(2);
    hx.seed_member(bob, "bob");

    let service = VerificationService::new(&hx.ctx);
    // Poll 1: baseline with nobody reacting
    service.poll().await.unwrap();

    // Bob reacts and the reaction persists through polls 2..=5
    hx.gateway.add_reactor(bob);
    assert_eq!(service.poll().await.unwrap(), 1);
    for _ in 0..3 {
        assert_eq!(service.poll().await.unwrap(), 0);
    }

    assert_eq!(hx.gateway.grants(), vec![(GUILD, bob, VERIFY_ROLE)]);
}

#[tokio::test]
async fn test_removed_then_readded_reaction_does_not_regrant() {
    let hx = TestHarness::new();
    let carol = Snowflake::new(3);
    hx.seed_member(carol, "carol");

    let service = VerificationService::new(&hx.ctx);
    service.poll().await.unwrap();

    hx.gateway.add_reactor(carol);
    assert_eq!(service.poll().await.unwrap(), 1);

    // Carol removes and re-adds her reaction: fresh delta, but the
    // processed set makes the grant exactly-once for the process lifetime
    hx.gateway.remove_reactor(carol);
    service.poll().await.unwrap();
    hx.gateway.add_reactor(carol);
    assert_eq!(service.poll().await.unwrap(), 0);

    assert_eq!(hx.gateway.grants().len(), 1);
}

#[tokio::test]
async fn test_reactor_who_left_is_skipped_not_fatal() {
    let hx = TestHarness::new();
    let ghost = Snowflake::new(4);
    let dave = Snowflake::new(5);
    hx.seed_member(dave, "dave");

    let service = VerificationService::new(&hx.ctx);
    service.poll().await.unwrap();

    // Ghost reacted but has no member record; dave is fine
    hx.gateway.set_reactors([ghost, dave]);
    assert_eq!(service.poll().await.unwrap(), 1);
    assert_eq!(hx.gateway.grants(), vec![(GUILD, dave, VERIFY_ROLE)]);
}

#[tokio::test]
async fn test_already_held_role_is_not_regranted() {
    let hx = TestHarness::new();
    let erin = Snowflake::new(6);
    let mut member = hx.seed_member(erin, "erin");
    member.role_ids.push(VERIFY_ROLE);
    hx.gateway.put_member(member);

    let mut events = hx.ctx.events().subscribe();
    let service = VerificationService::new(&hx.ctx);
    service.poll().await.unwrap();

    hx.gateway.add_reactor(erin);
    assert_eq!(service.poll().await.unwrap(), 1);

    // No write, but the verification still completes and announces
    assert!(hx.gateway.grants().is_empty());
    let event = events.try_recv().unwrap();
    assert_eq!(event.event_type(), "MEMBER_VERIFIED");
}

#[tokio::test]
async fn test_transient_fetch_failure_preserves_diff_baseline() {
    let hx = TestHarness::new();
    let frank = Snowflake::new(7);
    hx.seed_member(frank, "frank");

    let service = VerificationService::new(&hx.ctx);
    service.poll().await.unwrap();

    // Frank reacts during an outage; the failed poll must not re-baseline
    hx.gateway.add_reactor(frank);
    hx.gateway.set_fail_reactor_fetch(true);
    assert!(service.poll().await.is_err());
    assert!(hx.gateway.grants().is_empty());

    hx.gateway.set_fail_reactor_fetch(false);
    assert_eq!(service.poll().await.unwrap(), 1);
    assert_eq!(hx.gateway.grants(), vec![(GUILD, frank, VERIFY_ROLE)]);
}

#[tokio::test]
async fn test_denied_grant_is_logged_not_retried() {
    let hx = TestHarness::new();
    let gina = Snowflake::new(8);
    hx.seed_member(gina, "gina");
    hx.gateway.set_deny_grants(true);

    let service = VerificationService::new(&hx.ctx);
    service.poll().await.unwrap();

    hx.gateway.add_reactor(gina);
    assert_eq!(service.poll().await.unwrap(), 0);

    // Permission restored later: no retry happens on its own
    hx.gateway.set_deny_grants(false);
    assert_eq!(service.poll().await.unwrap(), 0);
    assert!(hx.gateway.grants().is_empty());
}

#[tokio::test]
async fn test_verification_applies_nickname_prefix() {
    let hx = TestHarness::new();
    let hana = Snowflake::new(9);
    hx.seed_member(hana, "hana");

    let service = VerificationService::new(&hx.ctx);
    service.poll().await.unwrap();

    hx.gateway.add_reactor(hana);
    service.poll().await.unwrap();

    assert_eq!(
        hx.gateway.nickname_writes(),
        vec![(GUILD, hana, "[Verified] hana".to_string())]
    );
}

// ============================================================================
// Invite Attribution
// ============================================================================

#[tokio::test]
async fn test_join_attributed_to_increased_invite() {
    let hx = TestHarness::new();
    hx.gateway
        .set_invites(vec![invite("A", 50, 3), invite("B", 51, 7)]);

    let service = AttributionService::new(&hx.ctx);
    service.refresh_snapshot(GUILD).await.unwrap();

    // Someone joins through B
    hx.gateway.bump_invite("B");
    let joiner = GuildMember::new(GUILD, Snowflake::new(60), "newbie");
    let attribution = service.handle_member_join(&joiner).await.unwrap();

    assert_eq!(
        attribution,
        Attribution::Credited {
            inviter_id: Snowflake::new(51),
            code: "B".to_string()
        }
    );
    let stats = service.inviter_stats(GUILD, Snowflake::new(51)).unwrap();
    assert_eq!(stats.joins, 1);
}

#[tokio::test]
async fn test_join_without_count_increase_is_unknown() {
    let hx = TestHarness::new();
    hx.gateway
        .set_invites(vec![invite("A", 50, 3), invite("B", 51, 7)]);

    let service = AttributionService::new(&hx.ctx);
    service.refresh_snapshot(GUILD).await.unwrap();

    // Vanity URL or lost race: nothing moved
    let joiner = GuildMember::new(GUILD, Snowflake::new(61), "drifter");
    let attribution = service.handle_member_join(&joiner).await.unwrap();

    assert_eq!(attribution, Attribution::Unknown);
    assert!(service.inviter_stats(GUILD, Snowflake::new(50)).is_none());
    assert!(service.inviter_stats(GUILD, Snowflake::new(51)).is_none());
}

#[tokio::test]
async fn test_snapshot_refreshes_after_each_join() {
    let hx = TestHarness::new();
    hx.gateway.set_invites(vec![invite("A", 50, 0)]);

    let service = AttributionService::new(&hx.ctx);
    service.refresh_snapshot(GUILD).await.unwrap();

    // Two joins through the same invite, back to back; the second must
    // compare against the snapshot taken at the first
    for n in 1..=2 {
        hx.gateway.bump_invite("A");
        let joiner = GuildMember::new(GUILD, Snowflake::new(70 + n), "joiner");
        let attribution = service.handle_member_join(&joiner).await.unwrap();
        assert!(attribution.is_credited(), "join {n} should credit A");
    }

    let stats = service.inviter_stats(GUILD, Snowflake::new(50)).unwrap();
    assert_eq!(stats.joins, 2);
}

#[tokio::test]
async fn test_invite_created_rebaselines_snapshot() {
    let hx = TestHarness::new();
    hx.gateway.set_invites(vec![invite("A", 50, 3)]);

    let service = AttributionService::new(&hx.ctx);
    service.refresh_snapshot(GUILD).await.unwrap();

    // A new invite appears, already used once before we hear of the join.
    // The create notification re-baselines, so the join is not mis-credited.
    hx.gateway.set_invites(vec![invite("A", 50, 3), invite("C", 52, 1)]);
    service.handle_invite_created(GUILD).await.unwrap();

    let joiner = GuildMember::new(GUILD, Snowflake::new(80), "latecomer");
    let attribution = service.handle_member_join(&joiner).await.unwrap();
    assert_eq!(attribution, Attribution::Unknown);
}

#[tokio::test]
async fn test_leave_charged_heuristically_to_surplus_inviter() {
    let hx = TestHarness::new();
    hx.gateway.set_invites(vec![invite("B", 51, 0)]);

    let service = AttributionService::new(&hx.ctx);
    service.refresh_snapshot(GUILD).await.unwrap();

    hx.gateway.bump_invite("B");
    let joiner = GuildMember::new(GUILD, Snowflake::new(90), "shortstay");
    service.handle_member_join(&joiner).await.unwrap();

    let charged = service
        .handle_member_leave(GUILD, Snowflake::new(90))
        .await
        .unwrap();
    assert_eq!(charged, Some(Snowflake::new(51)));

    // Nobody has surplus anymore: further leaves go unattributed
    let charged = service
        .handle_member_leave(GUILD, Snowflake::new(91))
        .await
        .unwrap();
    assert_eq!(charged, None);
}

#[tokio::test]
async fn test_other_guilds_are_inert_for_attribution() {
    let hx = TestHarness::new();
    let service = AttributionService::new(&hx.ctx);

    let joiner = GuildMember::new(OTHER_GUILD, Snowflake::new(95), "outsider");
    let attribution = service.handle_member_join(&joiner).await.unwrap();
    assert_eq!(attribution, Attribution::Unknown);
    assert!(service.approximate_leaderboard(OTHER_GUILD).is_empty());
}

#[tokio::test]
async fn test_leaderboard_orders_by_joins() {
    let hx = TestHarness::new();
    hx.gateway.set_invites(vec![invite("A", 50, 0), invite("B", 51, 0)]);

    let service = AttributionService::new(&hx.ctx);
    service.refresh_snapshot(GUILD).await.unwrap();

    for (code, user) in [("B", 1), ("B", 2), ("A", 3)] {
        hx.gateway.bump_invite(code);
        let joiner = GuildMember::new(GUILD, Snowflake::new(500 + user), "joiner");
        service.handle_member_join(&joiner).await.unwrap();
    }

    let board = service.approximate_leaderboard(GUILD);
    assert_eq!(board[0].0, Snowflake::new(51));
    assert_eq!(board[0].1.joins, 2);
    assert_eq!(board[1].0, Snowflake::new(50));
}

// ============================================================================
// Nickname Synchronization
// ============================================================================

#[tokio::test]
async fn test_nickname_applied_then_idempotent() {
    let hx = TestHarness::new();
    let mina = Snowflake::new(10);
    let mut member = hx.seed_member(mina, "mina");
    member.role_ids.push(STAFF_ROLE);
    hx.gateway.put_member(member.clone());

    let service = NicknameService::new(&hx.ctx);
    let outcome = service.sync_member(&member).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Updated("[Staff] mina".to_string()));

    // Second application with no role change: zero additional writes
    let live = hx.gateway.fetch_member(GUILD, mina).await.unwrap().unwrap();
    assert_eq!(
        service.sync_member(&live).await.unwrap(),
        SyncOutcome::Unchanged
    );
    assert_eq!(hx.gateway.nickname_writes().len(), 1);
}

#[tokio::test]
async fn test_highest_priority_role_wins() {
    let hx = TestHarness::new();
    let nia = Snowflake::new(11);
    let mut member = hx.seed_member(nia, "nia");
    // Holds both tracked roles; Staff sits earlier in the priority list
    member.role_ids = vec![VERIFY_ROLE, STAFF_ROLE];
    hx.gateway.put_member(member.clone());

    let service = NicknameService::new(&hx.ctx);
    service.sync_member(&member).await.unwrap();

    assert_eq!(
        hx.gateway.nickname_writes(),
        vec![(GUILD, nia, "[Staff] nia".to_string())]
    );
}

#[tokio::test]
async fn test_untracked_member_is_left_alone() {
    let hx = TestHarness::new();
    let omar = Snowflake::new(12);
    let member = hx.seed_member(omar, "omar");

    let service = NicknameService::new(&hx.ctx);
    assert_eq!(
        service.sync_member(&member).await.unwrap(),
        SyncOutcome::Skipped
    );
    assert!(hx.gateway.nickname_writes().is_empty());
}

#[tokio::test]
async fn test_prefix_never_stacks_across_role_changes() {
    let hx = TestHarness::new();
    let pia = Snowflake::new(13);
    let mut member = hx.seed_member(pia, "pia");
    member.role_ids = vec![VERIFY_ROLE];
    hx.gateway.put_member(member.clone());

    let service = NicknameService::new(&hx.ctx);
    service.sync_member(&member).await.unwrap();

    // Promotion: recompute from the already prefixed nickname
    let mut promoted = hx.gateway.fetch_member(GUILD, pia).await.unwrap().unwrap();
    promoted.role_ids.push(STAFF_ROLE);
    hx.gateway.put_member(promoted.clone());
    service.sync_member(&promoted).await.unwrap();

    let writes = hx.gateway.nickname_writes();
    assert_eq!(writes[0].2, "[Verified] pia");
    assert_eq!(writes[1].2, "[Staff] pia");
}

#[tokio::test]
async fn test_role_change_and_audit_paths_converge_safely() {
    let hx = TestHarness::new();
    let rudy = Snowflake::new(14);
    let before = hx.seed_member(rudy, "rudy");
    let mut after = before.clone();
    after.role_ids.push(STAFF_ROLE);
    hx.gateway.put_member(after.clone());

    let service = NicknameService::new(&hx.ctx);

    // Both signals fire for the same underlying change
    let first = service.on_role_change(&before, &after).await.unwrap();
    assert!(matches!(first, SyncOutcome::Updated(_)));

    let entry = AuditLogEntry::new(GUILD, AuditAction::MemberRoleAdd, rudy);
    assert_eq!(
        service.on_audit_log(&entry).await.unwrap(),
        SyncOutcome::Unchanged
    );

    assert_eq!(hx.gateway.nickname_writes().len(), 1);
}

#[tokio::test]
async fn test_role_change_with_equal_sets_is_a_no_op() {
    let hx = TestHarness::new();
    let sara = Snowflake::new(15);
    let mut member = hx.seed_member(sara, "sara");
    member.role_ids = vec![STAFF_ROLE];
    hx.gateway.put_member(member.clone());

    let reordered = {
        let mut m = member.clone();
        m.role_ids = vec![STAFF_ROLE];
        m
    };

    let service = NicknameService::new(&hx.ctx);
    assert_eq!(
        service.on_role_change(&member, &reordered).await.unwrap(),
        SyncOutcome::Unchanged
    );
    assert!(hx.gateway.nickname_writes().is_empty());
}

#[tokio::test]
async fn test_audit_entries_for_other_actions_are_ignored() {
    let hx = TestHarness::new();
    let tess = Snowflake::new(16);
    let mut member = hx.seed_member(tess, "tess");
    member.role_ids = vec![STAFF_ROLE];
    hx.gateway.put_member(member);

    let service = NicknameService::new(&hx.ctx);
    let entry = AuditLogEntry::new(GUILD, AuditAction::MemberNicknameUpdate, tess);
    assert_eq!(
        service.on_audit_log(&entry).await.unwrap(),
        SyncOutcome::Skipped
    );
    assert!(hx.gateway.nickname_writes().is_empty());
}

#[tokio::test]
async fn test_resync_all_counts_and_survives_denials() {
    let hx = TestHarness::new();
    for (id, name, roles) in [
        (20, "ava", vec![STAFF_ROLE]),
        (21, "ben", vec![VERIFY_ROLE]),
        (22, "cy", vec![]),
    ] {
        let mut member = hx.seed_member(Snowflake::new(id), name);
        member.role_ids = roles;
        hx.gateway.put_member(member);
    }

    let service = NicknameService::new(&hx.ctx);
    let report = service.resync_all(GUILD).await.unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(report.unchanged, 1);

    // Re-running changes nothing: the pass is idempotent
    let report = service.resync_all(GUILD).await.unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 3);

    // A denied write never aborts the batch
    let dana = Snowflake::new(23);
    let mut member = hx.seed_member(dana, "dana");
    member.role_ids = vec![STAFF_ROLE];
    hx.gateway.put_member(member);
    hx.gateway.set_deny_nicknames(true);

    let report = service.resync_all(GUILD).await.unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 4);
}

// ============================================================================
// Events surface
// ============================================================================

#[tokio::test]
async fn test_verification_and_attribution_events_reach_subscribers() {
    let hx = TestHarness::new();
    let mut events = hx.ctx.events().subscribe();

    let uma = Snowflake::new(30);
    hx.seed_member(uma, "uma");
    hx.gateway.set_invites(vec![invite("A", 50, 0)]);

    let verification = VerificationService::new(&hx.ctx);
    let attribution = AttributionService::new(&hx.ctx);
    attribution.refresh_snapshot(GUILD).await.unwrap();
    verification.poll().await.unwrap();

    hx.gateway.add_reactor(uma);
    verification.poll().await.unwrap();

    hx.gateway.bump_invite("A");
    let joiner = GuildMember::new(GUILD, Snowflake::new(31), "vic");
    attribution.handle_member_join(&joiner).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event.event_type().to_string());
    }
    assert!(seen.contains(&"MEMBER_VERIFIED".to_string()));
    assert!(seen.contains(&"NICKNAME_UPDATED".to_string()));
    assert!(seen.contains(&"INVITE_ATTRIBUTED".to_string()));
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_polls_do_not_overlap() {
    let hx = TestHarness::new();
    // Each fetch takes longer than the poll interval
    hx.gateway
        .set_reactor_fetch_delay(Duration::from_millis(2500));

    let scheduler = PollScheduler::new(Arc::clone(&hx.ctx));
    scheduler.start().await;

    tokio::time::sleep(Duration::from_secs(12)).await;
    scheduler.shutdown();
    scheduler.join().await;

    assert!(hx.gateway.reactor_fetch_count() >= 3);
    assert_eq!(hx.gateway.max_concurrent_reactor_fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_baseline_suppression_and_steady_state() {
    let hx = TestHarness::new();
    let walt = Snowflake::new(40);
    let yuna = Snowflake::new(41);
    hx.seed_member(walt, "walt");
    hx.seed_member(yuna, "yuna");
    // Walt reacted before the process started
    hx.gateway.set_reactors([walt]);

    let scheduler = PollScheduler::new(Arc::clone(&hx.ctx));
    scheduler.start().await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(hx.gateway.grants().is_empty());

    // Yuna reacts while the loops are live
    hx.gateway.add_reactor(yuna);
    tokio::time::sleep(Duration::from_secs(3)).await;

    scheduler.shutdown();
    scheduler.join().await;

    assert_eq!(hx.gateway.grants(), vec![(GUILD, yuna, VERIFY_ROLE)]);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_shutdown_stops_polling() {
    let hx = TestHarness::new();
    let scheduler = PollScheduler::new(Arc::clone(&hx.ctx));
    scheduler.start().await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    scheduler.shutdown();
    scheduler.join().await;

    let fetches = hx.gateway.reactor_fetch_count();
    assert!(fetches >= 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(hx.gateway.reactor_fetch_count(), fetches);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_survives_poll_failures() {
    let hx = TestHarness::new();
    let zoe = Snowflake::new(42);
    hx.seed_member(zoe, "zoe");
    hx.gateway.set_fail_reactor_fetch(true);

    let scheduler = PollScheduler::new(Arc::clone(&hx.ctx));
    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    // Outage ends; the loop is still alive, baselines, then grants
    hx.gateway.set_fail_reactor_fetch(false);
    tokio::time::sleep(Duration::from_secs(2)).await;
    hx.gateway.add_reactor(zoe);
    tokio::time::sleep(Duration::from_secs(3)).await;

    scheduler.shutdown();
    scheduler.join().await;
    assert_eq!(hx.gateway.grants(), vec![(GUILD, zoe, VERIFY_ROLE)]);
}

// ============================================================================
// Status rotation
// ============================================================================

#[tokio::test]
async fn test_status_rotation_alternates_messages() {
    let hx = TestHarness::new();
    hx.seed_member(Snowflake::new(60), "m1");
    hx.seed_member(Snowflake::new(61), "m2");

    let rotator = StatusRotator::new(Arc::clone(&hx.ctx));
    rotator.rotate().await.unwrap();
    rotator.rotate().await.unwrap();
    rotator.rotate().await.unwrap();

    let updates = hx.gateway.presence_updates();
    assert_eq!(
        updates,
        vec![
            "Watching over 2 members".to_string(),
            "Guarding the guild".to_string(),
            "Watching over 2 members".to_string(),
        ]
    );
}
