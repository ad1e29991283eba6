//! Unit tests for the local flag store

use parapluie_onboarding::models::PermissionGrants;
use parapluie_onboarding::store::LocalStore;

fn open_store(dir: &tempfile::TempDir) -> LocalStore {
    LocalStore::open(dir.path()).unwrap()
}

#[test]
fn test_onboarding_flag_defaults_to_false() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    assert!(!store.onboarding_completed().unwrap());
}

#[test]
fn test_onboarding_flag_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open_store(&dir);
        store.set_onboarding_completed().unwrap();
    }
    let store = open_store(&dir);
    assert!(store.onboarding_completed().unwrap());
}

#[test]
fn test_user_id_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    assert!(store.user_id().unwrap().is_none());
    store.set_user_id("user-123").unwrap();
    assert_eq!(store.user_id().unwrap().as_deref(), Some("user-123"));
}

#[test]
fn test_invitation_code_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.set_invitation_code("A2B4").unwrap();
    assert_eq!(store.invitation_code().unwrap().as_deref(), Some("A2B4"));
}

#[test]
fn test_permission_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    assert!(store.cached_permissions().unwrap().is_none());

    let grants = PermissionGrants {
        call_protection: true,
        sms_protection: true,
        location_alerts: false,
        notifications: true,
    };
    store.cache_permissions(grants).unwrap();
    assert_eq!(store.cached_permissions().unwrap(), Some(grants));
}

#[test]
fn test_clear_removes_all_flags() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.set_onboarding_completed().unwrap();
    store.set_user_id("user-123").unwrap();
    store.set_invitation_code("A2B4").unwrap();
    store.cache_permissions(PermissionGrants::all()).unwrap();

    store.clear().unwrap();

    assert!(!store.onboarding_completed().unwrap());
    assert!(store.user_id().unwrap().is_none());
    assert!(store.invitation_code().unwrap().is_none());
    assert!(store.cached_permissions().unwrap().is_none());
}
