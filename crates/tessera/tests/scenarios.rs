//! end-to-end scenarios across the public api

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tessera::gf256::{exp_table, log_table};
use tessera::{
    combine, split, write, Error, ManualClock, NonceConfig, NonceStore, SeededRandom,
};

/// every 3-subset of a 5-share split recovers "test"
#[test]
fn test_shamir_round_trip_all_subsets() {
    let shares = split(b"test", 5, 3).unwrap();
    assert_eq!(shares.len(), 5);
    assert!(shares.iter().all(|s| s.len() == 5));

    let mut combos = 0;
    for a in 0..5 {
        for b in (a + 1)..5 {
            for c in (b + 1)..5 {
                let subset = vec![shares[a].clone(), shares[b].clone(), shares[c].clone()];
                assert_eq!(combine(&subset).unwrap(), b"test");
                combos += 1;
            }
        }
    }
    assert_eq!(combos, 10);
}

#[test]
fn test_shamir_rejects_bad_parameters() {
    for (secret, parts, threshold) in [
        (&b"test"[..], 0, 0),
        (&b"test"[..], 2, 3),
        (&b"test"[..], 1000, 3),
        (&b"test"[..], 10, 1),
        (&b""[..], 3, 2),
    ] {
        assert!(matches!(
            split(secret, parts, threshold),
            Err(Error::InvalidParameters(_))
        ));
    }
}

#[test]
fn test_shamir_combine_rejects_ill_formed() {
    let none: Vec<Vec<u8>> = vec![];
    assert!(matches!(combine(&none), Err(Error::NotEnoughShares { .. })));
    assert!(matches!(
        combine(&["foo", "ba"]),
        Err(Error::ShareLengthMismatch { .. })
    ));
    assert!(matches!(combine(&["f", "b"]), Err(Error::ShareTooShort { .. })));
    assert!(matches!(combine(&["foo", "foo"]), Err(Error::DuplicateShare { .. })));
}

#[test]
fn test_field_tables_self_consistent() {
    for i in 1..=255usize {
        assert_eq!(exp_table()[log_table()[i] as usize] as usize, i);
    }
}

#[test]
fn test_sink_write_then_read_then_probe() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent-token");
    assert!(!path.exists());

    write(&path, b"secret-token", 0o640).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"secret-token");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o640);
    }

    write(&path, b"", 0o640).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"secret-token");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o640);
    }

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("agent-token")]);
}

/// concurrent publishers: every read sees one complete token
#[test]
fn test_sink_readers_never_see_partial_tokens() {
    let dir = tempdir().unwrap();
    let path = Arc::new(dir.path().join("token"));
    let tokens: Vec<Vec<u8>> = (0..4u8).map(|i| vec![b'a' + i; 64 * 1024]).collect();
    write(&*path, &tokens[0], 0o600).unwrap();

    let writers: Vec<_> = tokens
        .iter()
        .cloned()
        .map(|token| {
            let path = path.clone();
            std::thread::spawn(move || {
                for _ in 0..20 {
                    write(&*path, &token, 0o600).unwrap();
                }
            })
        })
        .collect();

    for _ in 0..200 {
        let read = fs::read(&*path).unwrap();
        assert!(tokens.contains(&read), "torn read of {} bytes", read.len());
    }
    for w in writers {
        w.join().unwrap();
    }
}

#[test]
fn test_nonce_lifecycle() {
    let clock = Arc::new(ManualClock::new());
    let store = NonceStore::with_parts(
        NonceConfig::default(),
        clock.clone(),
        Arc::new(SeededRandom::seed_from_u64(2024)),
    );

    let (n1, e1) = store.issue().unwrap();
    assert!(store.redeem(&n1));
    assert!(!store.redeem(&n1));

    let (n2, e2) = store.issue().unwrap();
    assert!(e2 >= e1);
    clock.advance(store.ttl() + Duration::from_secs(1));
    assert!(!store.redeem(&n2));
}
