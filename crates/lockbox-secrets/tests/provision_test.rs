//! Integration test: session secret provisioning across simulated restarts
//!
//! Each test gets its own temp directory for the secret file and passes the
//! environment override explicitly, so tests never race on process env.

use lockbox_secrets::{SecretProvisioner, SecretSource, SessionSigner};
use proptest::prelude::*;
use secrecy::ExposeSecret;
use tempfile::TempDir;

fn provisioner(dir: &TempDir) -> SecretProvisioner {
    SecretProvisioner::new("LOCKBOX_TEST_UNSET", dir.path().join(".session_secret"))
}

#[test]
fn fresh_deployment_generates_and_persists() {
    let tmp = TempDir::new().unwrap();
    let prov = provisioner(&tmp);

    let first = prov.obtain_with_override(None);
    assert_eq!(first.source(), SecretSource::Generated { persisted: true });

    let value = first.secret().expose_secret();
    assert_eq!(value.len(), 64);
    assert!(value.chars().all(|c| c.is_ascii_hexdigit()));

    let on_disk = std::fs::read_to_string(prov.path()).unwrap();
    assert_eq!(on_disk.trim(), value);
}

#[test]
fn restart_reuses_persisted_secret() {
    let tmp = TempDir::new().unwrap();

    let first = provisioner(&tmp).obtain_with_override(None);
    let written_at = std::fs::metadata(provisioner(&tmp).path())
        .unwrap()
        .modified()
        .unwrap();

    // Second "process start"
    let second = provisioner(&tmp).obtain_with_override(None);

    assert_eq!(second.source(), SecretSource::File, "restart must read, not write");
    assert_eq!(
        first.secret().expose_secret(),
        second.secret().expose_secret()
    );
    let after = std::fs::metadata(provisioner(&tmp).path())
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(written_at, after, "secret file must not be rewritten");
}

#[test]
fn override_takes_precedence_over_file() {
    let tmp = TempDir::new().unwrap();
    let prov = provisioner(&tmp);
    std::fs::write(prov.path(), "persisted-value\n").unwrap();

    let secret = prov.obtain_with_override(Some("from-env"));

    assert_eq!(secret.source(), SecretSource::Environment);
    assert_eq!(secret.secret().expose_secret(), "from-env");
    assert_eq!(
        std::fs::read_to_string(prov.path()).unwrap(),
        "persisted-value\n",
        "override must leave the file alone"
    );
}

#[test]
fn override_does_not_create_file() {
    let tmp = TempDir::new().unwrap();
    let prov = provisioner(&tmp);

    prov.obtain_with_override(Some("from-env"));
    assert!(!prov.path().exists());
}

#[test]
fn empty_override_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let prov = provisioner(&tmp);
    std::fs::write(prov.path(), "persisted-value").unwrap();

    let secret = prov.obtain_with_override(Some(""));
    assert_eq!(secret.source(), SecretSource::File);
    assert_eq!(secret.secret().expose_secret(), "persisted-value");
}

#[test]
fn empty_file_is_regenerated() {
    let tmp = TempDir::new().unwrap();
    let prov = provisioner(&tmp);
    std::fs::write(prov.path(), "\n").unwrap();

    let secret = prov.obtain_with_override(None);
    assert_eq!(secret.source(), SecretSource::Generated { persisted: true });
    assert_eq!(
        std::fs::read_to_string(prov.path()).unwrap(),
        secret.secret().expose_secret()
    );
}

#[test]
fn corrupt_file_is_regenerated() {
    let tmp = TempDir::new().unwrap();
    let prov = provisioner(&tmp);
    std::fs::write(prov.path(), [0xc3, 0x28, 0xa0, 0xa1]).unwrap();

    let secret = prov.obtain_with_override(None);
    assert_eq!(secret.source(), SecretSource::Generated { persisted: true });
    assert_eq!(secret.secret().expose_secret().len(), 64);
}

#[test]
fn persist_failure_falls_back_to_memory() {
    let tmp = TempDir::new().unwrap();
    // A regular file where a directory is expected: read and write both fail,
    // even when running as root.
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let prov = SecretProvisioner::new("LOCKBOX_TEST_UNSET", blocker.join(".session_secret"));

    let first = prov.obtain_with_override(None);
    assert_eq!(first.source(), SecretSource::Generated { persisted: false });
    assert_eq!(first.secret().expose_secret().len(), 64);

    // Nothing persisted, so the next start generates a different secret
    let second = prov.obtain_with_override(None);
    assert_eq!(second.source(), SecretSource::Generated { persisted: false });
    assert_ne!(
        first.secret().expose_secret(),
        second.secret().expose_secret()
    );
}

#[test]
fn obtain_reads_process_env() {
    let tmp = TempDir::new().unwrap();
    let var = "LOCKBOX_TEST_OBTAIN_READS_PROCESS_ENV";
    std::env::set_var(var, "env-secret");

    let prov = SecretProvisioner::new(var, tmp.path().join(".session_secret"));
    let secret = prov.obtain();

    std::env::remove_var(var);
    assert_eq!(secret.source(), SecretSource::Environment);
    assert_eq!(secret.secret().expose_secret(), "env-secret");
}

#[test]
fn signer_tokens_survive_restart() {
    let tmp = TempDir::new().unwrap();
    let id = lockbox_core::SessionId::new("sess-1");

    let token = SessionSigner::new(&provisioner(&tmp).obtain_with_override(None)).sign(&id);
    let restarted = SessionSigner::new(&provisioner(&tmp).obtain_with_override(None));

    assert_eq!(restarted.verify(&token).unwrap(), id);
}

proptest! {
    #[test]
    fn any_nonempty_override_is_returned_unchanged(value in ".+") {
        let tmp = TempDir::new().unwrap();
        let prov = provisioner(&tmp);

        let secret = prov.obtain_with_override(Some(&value));

        prop_assert_eq!(secret.source(), SecretSource::Environment);
        prop_assert_eq!(secret.secret().expose_secret(), value.as_str());
        prop_assert!(!prov.path().exists());
    }
}
