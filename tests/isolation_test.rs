use futures::future::join_all;
use staffgate::accounts::Account;
use staffgate::audit::AuditAction;
use staffgate::testing::{TestIdentity, fake};
use staffgate::{StaffgateError, StartImpersonation};

#[tokio::test]
async fn test_sessions_of_same_operator_are_independent() {
    let identity = TestIdentity::new();
    let controller = identity.controller();

    let first = identity.login("1").await;
    let second = identity.login("1").await;

    controller
        .start_impersonation(&first, StartImpersonation::new("42"))
        .await
        .unwrap();

    let a = controller.effective_account(&first).await.unwrap();
    let b = controller.effective_account(&second).await.unwrap();
    assert_eq!(a.id.as_str(), "42");
    assert_eq!(b.id.as_str(), "1");

    controller
        .start_impersonation(&second, StartImpersonation::new("50"))
        .await
        .unwrap();
    assert_eq!(
        controller.effective_account(&first).await.unwrap().id.as_str(),
        "42"
    );
    assert_eq!(
        controller.effective_account(&second).await.unwrap().id.as_str(),
        "50"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operators_never_cross() {
    let identity = TestIdentity::new();

    let targets: Vec<Account> = (0..16).map(|_| fake::account("staff")).collect();
    for target in &targets {
        identity.accounts.insert(target.clone());
    }

    let tasks = targets.iter().map(|target| {
        let identity = identity.clone();
        let target_id = target.id.clone();
        tokio::spawn(async move {
            let token = identity.login("1").await;
            identity
                .controller()
                .start_impersonation(&token, StartImpersonation::new(target_id.clone()))
                .await
                .unwrap();

            for _ in 0..5 {
                let effective = identity.controller().effective_account(&token).await.unwrap();
                assert_eq!(effective.id, target_id);
                tokio::task::yield_now().await;
            }

            let (rotated, restored) = identity
                .controller()
                .stop_impersonation(&token)
                .await
                .unwrap();
            assert!(!restored.is_impersonating());
            assert_eq!(restored.effective_account_id().as_str(), "1");
            rotated
        })
    });

    let rotated: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    assert_eq!(identity.store.len(), targets.len());
    for token in &rotated {
        let account = identity.controller().effective_account(token).await.unwrap();
        assert_eq!(account.id.as_str(), "1");
    }

    let actions = identity.audit.actions();
    assert_eq!(actions.iter().filter(|a| **a == AuditAction::Start).count(), 16);
    assert_eq!(actions.iter().filter(|a| **a == AuditAction::Stop).count(), 16);
}

#[tokio::test]
async fn test_repeated_cycles_restore_original_permissions() {
    let identity = TestIdentity::new();
    let controller = identity.controller();

    let mut token = identity.login("1").await;
    let baseline = controller.resolve_session(&token).await.unwrap().permissions;

    for target in ["42", "50", "3", "42"] {
        controller
            .start_impersonation(&token, StartImpersonation::new(target))
            .await
            .unwrap();
        let (rotated, _) = controller.stop_impersonation(&token).await.unwrap();
        token = rotated;

        let resolved = controller.resolve_session(&token).await.unwrap();
        assert_eq!(resolved.effective.id.as_str(), "1");
        assert_eq!(resolved.permissions, baseline);
        assert!(resolved.original.is_none());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_starts_on_one_token_admit_one() {
    let identity = TestIdentity::new();
    let token = identity.login("1").await;

    // Losers must be turned away by the session lock, seeing the winner's
    // state, not by the store's version check.
    let attempts = ["42", "50", "42", "50", "42", "50"].map(|target| {
        let identity = identity.clone();
        let token = token.clone();
        tokio::spawn(async move {
            identity
                .controller()
                .start_impersonation(&token, StartImpersonation::new(target))
                .await
        })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StaffgateError::InvalidState(msg) if msg.contains("already impersonating")))
    );
    assert_eq!(identity.audit.actions(), vec![AuditAction::Start]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_stops_on_one_token_rotate_once() {
    let identity = TestIdentity::new();
    let token = identity.login("1").await;
    identity
        .controller()
        .start_impersonation(&token, StartImpersonation::new("42"))
        .await
        .unwrap();

    let attempts = (0..4).map(|_| {
        let identity = identity.clone();
        let token = token.clone();
        tokio::spawn(async move { identity.controller().stop_impersonation(&token).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    // The winner rotates the token away; later attempts find no session.
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StaffgateError::Unauthenticated(_)))
    );
    assert_eq!(identity.store.len(), 1);
    assert_eq!(
        identity.audit.actions(),
        vec![AuditAction::Start, AuditAction::Stop]
    );
}

#[tokio::test]
async fn test_impersonating_never_nests() {
    let identity = TestIdentity::new();
    let controller = identity.controller();
    let token = identity.login("1").await;

    controller
        .start_impersonation(&token, StartImpersonation::new("42"))
        .await
        .unwrap();
    let err = controller
        .start_impersonation(&token, StartImpersonation::new("50"))
        .await
        .unwrap_err();
    assert!(matches!(err, StaffgateError::InvalidState(_)));

    // One stop fully restores the operator.
    let (token, restored) = controller.stop_impersonation(&token).await.unwrap();
    assert_eq!(restored.effective_account_id().as_str(), "1");
    assert_eq!(restored.original_account_id().as_str(), "1");
    let err = controller.stop_impersonation(&token).await.unwrap_err();
    assert!(matches!(err, StaffgateError::InvalidState(_)));
}

#[tokio::test]
async fn test_expired_impersonation_ends_session() {
    let identity = TestIdentity::with_config(
        staffgate::ImpersonationConfig::default().max_duration(std::time::Duration::ZERO),
    );
    let controller = identity.controller();
    let token = identity.login("1").await;

    controller
        .start_impersonation(&token, StartImpersonation::new("42"))
        .await
        .unwrap();

    let err = controller.effective_account(&token).await.unwrap_err();
    assert!(matches!(err, StaffgateError::Unauthenticated(_)));
    assert!(identity.store.is_empty());
    assert_eq!(
        identity.audit.actions(),
        vec![AuditAction::Start, AuditAction::Expired]
    );
}
