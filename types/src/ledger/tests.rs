use super::*;
use commonware_codec::{Encode, ReadExt, Write};
use commonware_cryptography::{sha256::Digest, Hasher, Sha256};

fn record(id: u64, src: u64, dst: u64, amount: u64) -> TransactionRecord {
    let mut record = TransactionRecord {
        id: TransactionId(id),
        src: AccountId(src),
        dst: AccountId(dst),
        coin: DEFAULT_COIN,
        amount,
        kind: TransactionKind::None,
        reason: TRANSFER_REASON.to_string(),
        inner_hash: None,
        created_at: 1_700_000_000,
        self_hash: Digest([0u8; 32]),
    };
    record.self_hash = Sha256::hash(&record.payload());
    record
}

#[test]
fn test_coin_equality_by_id() {
    let a = Coin {
        id: CoinId(3),
        unique_name: "gold".to_string(),
        display_name: "Gold".to_string(),
    };
    let b = Coin {
        id: CoinId(3),
        unique_name: "renamed".to_string(),
        display_name: "Renamed".to_string(),
    };
    let c = Coin {
        id: CoinId(4),
        ..a.clone()
    };
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_account_apply_delta() {
    let mut account = Account::new(AccountId(7), HolderId(2));
    assert_eq!(account.balance(DEFAULT_COIN), 0);
    assert_eq!(account.apply_delta(DEFAULT_COIN, 40), Some(40));
    assert_eq!(account.apply_delta(DEFAULT_COIN, -15), Some(25));
    assert_eq!(account.balance(CoinId(9)), 0);

    // Overflow leaves the balance untouched
    assert_eq!(account.apply_delta(DEFAULT_COIN, i64::MAX), None);
    assert_eq!(account.balance(DEFAULT_COIN), 25);
}

#[test]
fn test_holder_accounts_sorted() {
    let mut holder = Holder::new(HolderId(1));
    holder.add_account(AccountId(9));
    holder.add_account(AccountId(3));
    holder.add_account(AccountId(5));
    holder.add_account(AccountId(3));
    assert_eq!(holder.accounts, vec![AccountId(3), AccountId(5), AccountId(9)]);
    assert!(holder.owns(AccountId(5)));
    assert!(!holder.owns(AccountId(4)));
}

#[test]
fn test_account_rejects_duplicate_coin() {
    let mut encoded = Vec::new();
    AccountId(1).write(&mut encoded);
    HolderId(1).write(&mut encoded);
    2u32.write(&mut encoded);
    for _ in 0..2 {
        DEFAULT_COIN.write(&mut encoded);
        10i64.write(&mut encoded);
    }
    assert!(Account::read(&mut &encoded[..]).is_err());
}

#[test]
fn test_record_roundtrip() {
    let mut original = record(12, 4, 0, 250);
    original.kind = TransactionKind::Game;
    original.inner_hash = Some(Sha256::hash(b"detail"));
    let encoded = original.encode();
    let decoded = TransactionRecord::read(&mut &encoded[..]).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn test_payload_excludes_self_hash() {
    let original = record(1, 0, 1, 1_000);
    let mut tampered = original.clone();
    tampered.self_hash = Digest([0xff; 32]);
    assert_eq!(original.payload(), tampered.payload());

    // Every other field is covered
    let mut changed = original.clone();
    changed.amount += 1;
    assert_ne!(original.payload(), changed.payload());
    assert_ne!(Sha256::hash(&changed.payload()), original.self_hash);
}

#[test]
fn test_delta_for() {
    let record = record(1, 4, 5, 30);
    assert_eq!(record.delta_for(AccountId(4)), -30);
    assert_eq!(record.delta_for(AccountId(5)), 30);
    assert_eq!(record.delta_for(AccountId(6)), 0);
    assert_eq!(record.delta_for(AccountId(4)) + record.delta_for(AccountId(5)), 0);
}

#[test]
fn test_invalid_kind_rejected() {
    let encoded = [9u8];
    assert!(matches!(
        TransactionKind::read(&mut &encoded[..]),
        Err(commonware_codec::Error::InvalidEnum(9))
    ));
}

#[test]
fn test_game_detail_payload_binds_outcome() {
    let win = GameDetail::payload("server", "client", true);
    let loss = GameDetail::payload("server", "client", false);
    assert_ne!(win, loss);
    assert_ne!(
        GameDetail::payload("serverc", "lient", true),
        GameDetail::payload("server", "client", true)
    );
}

#[test]
fn test_digest_hex() {
    let digest = Digest([0xab; 32]);
    let rendered = digest_hex(&digest);
    assert_eq!(rendered.len(), DIGEST_HEX_LENGTH);
    assert!(rendered.starts_with("abababab"));
}

#[test]
fn test_string_too_long() {
    let mut encoded = Vec::new();
    write_string(&"x".repeat(MAX_NAME_LENGTH + 1), &mut encoded);
    assert!(read_string(&mut &encoded[..], MAX_NAME_LENGTH).is_err());
}
