//! Native-currency payment channel lifecycle.

use rill_common::{keylet, AccountId, Amount, FeatureSet, FeeSchedule, Hash256, HookParams};
use rill_crypto::SecretKey;
use rill_tx::state::{
    AccountEntry, LedgerEntry, ACCOUNT_DEPOSIT_AUTH, ACCOUNT_REQUIRE_DEST_TAG,
};
use rill_tx::{
    apply_transaction, sign_claim, ChannelClaim, ChannelCreate, ChannelFund, HookRuntime, Ledger,
    LedgerInfo, ResultCode, Transaction, TxBody, TF_CLOSE, TF_RENEW,
};

const CLOSE_TIME: u64 = 700_000_000;
const SETTLE_DELAY: u32 = 86_400;

fn owner() -> AccountId {
    AccountId([1; 20])
}

fn destination() -> AccountId {
    AccountId([2; 20])
}

fn channel_key_pair() -> SecretKey {
    SecretKey::from_bytes(&[7; 32])
}

/// Zero base fee keeps the scenario arithmetic exact.
fn test_fees() -> FeeSchedule {
    FeeSchedule {
        base_fee: 0,
        reserve_base: 100_000,
        reserve_increment: 100_000,
    }
}

fn test_ledger() -> Ledger {
    let mut ledger = Ledger::new(
        LedgerInfo {
            sequence: 1,
            parent_close_time: CLOSE_TIME,
        },
        test_fees(),
        FeatureSet::all(),
        HookParams::default(),
    );
    seed_account(&mut ledger, owner(), 1_000_000, 0);
    seed_account(&mut ledger, destination(), 500_000, 0);
    ledger
}

fn seed_account(ledger: &mut Ledger, id: AccountId, balance: i64, flags: u32) {
    ledger.put(
        keylet::account(&id).key,
        LedgerEntry::Account(AccountEntry {
            id,
            balance,
            sequence: 0,
            owner_count: 0,
            flags,
        }),
    );
}

fn next_sequence(ledger: &Ledger, id: &AccountId) -> u32 {
    ledger.account(id).unwrap().sequence + 1
}

fn create_tx(ledger: &Ledger, amount: i64, cancel_after: Option<u64>) -> Transaction {
    Transaction {
        account: owner(),
        sequence: next_sequence(ledger, &owner()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelCreate(ChannelCreate {
            destination: destination(),
            amount: Amount::drops(amount),
            settle_delay: SETTLE_DELAY,
            public_key: channel_key_pair().public_key().to_tagged_bytes(),
            cancel_after,
            source_tag: None,
            destination_tag: None,
        }),
    }
}

fn claim_tx(
    ledger: &Ledger,
    account: AccountId,
    channel: Hash256,
    balance: Option<i64>,
    signed: bool,
    flags: u32,
) -> Transaction {
    let balance = balance.map(Amount::drops);
    let (signature, public_key) = if signed {
        let secret = channel_key_pair();
        let authorized = balance.expect("signed claims carry a balance");
        (
            Some(sign_claim(&secret, &channel, &authorized).as_bytes().to_vec()),
            Some(secret.public_key().to_tagged_bytes()),
        )
    } else {
        (None, None)
    };
    Transaction {
        account,
        sequence: next_sequence(ledger, &account),
        fee: 0,
        flags,
        body: TxBody::ChannelClaim(ChannelClaim {
            channel,
            balance,
            amount: None,
            signature,
            public_key,
        }),
    }
}

/// Create a funded channel and return its id.
fn open_channel(ledger: &mut Ledger, hooks: &HookRuntime, amount: i64) -> Hash256 {
    let tx = create_tx(ledger, amount, None);
    let channel = keylet::channel(&owner(), &destination(), tx.sequence).key;
    let applied = apply_transaction(ledger, &tx, hooks);
    assert_eq!(applied.code, ResultCode::Success);
    channel
}

#[test]
fn happy_path_create_claim_close() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());

    // Create: 100k drops move from the owner into the channel.
    let channel = open_channel(&mut ledger, &hooks, 100_000);
    let sle = ledger.account(&owner()).unwrap();
    assert_eq!(sle.balance, 900_000);
    assert_eq!(sle.owner_count, 1);
    let chan = ledger.channel(&channel).unwrap();
    assert_eq!(chan.amount, Amount::drops(100_000));
    assert_eq!(chan.balance, Amount::drops(0));

    // Destination claims 40k with a valid signature.
    let tx = claim_tx(&ledger, destination(), channel, Some(40_000), true, 0);
    let applied = apply_transaction(&mut ledger, &tx, &hooks);
    assert_eq!(applied.code, ResultCode::Success);
    assert_eq!(ledger.channel(&channel).unwrap().balance, Amount::drops(40_000));
    assert_eq!(ledger.account(&destination()).unwrap().balance, 540_000);

    // Owner requests close: expiration is scheduled one settle delay out.
    let tx = claim_tx(&ledger, owner(), channel, None, false, TF_CLOSE);
    let applied = apply_transaction(&mut ledger, &tx, &hooks);
    assert_eq!(applied.code, ResultCode::Success);
    assert_eq!(
        ledger.channel(&channel).unwrap().expiration,
        Some(CLOSE_TIME + SETTLE_DELAY as u64)
    );

    // Past the expiration, any touch closes the channel and refunds the
    // remainder.
    ledger.info.parent_close_time = CLOSE_TIME + SETTLE_DELAY as u64 + 1;
    let tx = claim_tx(&ledger, owner(), channel, None, false, 0);
    let applied = apply_transaction(&mut ledger, &tx, &hooks);
    assert_eq!(applied.code, ResultCode::Success);
    assert!(ledger.channel(&channel).is_none());

    let sle = ledger.account(&owner()).unwrap();
    assert_eq!(sle.balance, 960_000);
    assert_eq!(sle.owner_count, 0);
}

#[test]
fn destination_close_is_immediate() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = claim_tx(&ledger, destination(), channel, Some(40_000), true, 0);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);

    // Destination closes with no balance field: immediate close.
    let tx = claim_tx(&ledger, destination(), channel, None, false, TF_CLOSE);
    let applied = apply_transaction(&mut ledger, &tx, &hooks);
    assert_eq!(applied.code, ResultCode::Success);
    assert!(ledger.channel(&channel).is_none());
    assert_eq!(ledger.account(&owner()).unwrap().balance, 960_000);
    assert_eq!(ledger.account(&owner()).unwrap().owner_count, 0);
}

#[test]
fn over_claim_is_rejected() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = claim_tx(&ledger, destination(), channel, Some(150_000), true, 0);
    let applied = apply_transaction(&mut ledger, &tx, &hooks);
    assert_eq!(applied.code, ResultCode::UnfundedPayment);

    // Fee-only: no channel or balance movement.
    assert_eq!(ledger.channel(&channel).unwrap().balance, Amount::drops(0));
    assert_eq!(ledger.account(&destination()).unwrap().balance, 500_000);
}

#[test]
fn claim_of_already_delivered_balance_is_rejected() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = claim_tx(&ledger, destination(), channel, Some(40_000), true, 0);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);

    // Claiming the same cumulative balance again requests nothing.
    let tx = claim_tx(&ledger, destination(), channel, Some(40_000), true, 0);
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::UnfundedPayment
    );
}

#[test]
fn destination_claim_requires_signature() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = claim_tx(&ledger, destination(), channel, Some(40_000), false, 0);
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::BadSignature
    );
}

#[test]
fn owner_claim_needs_no_signature() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = claim_tx(&ledger, owner(), channel, Some(25_000), false, 0);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert_eq!(ledger.account(&destination()).unwrap().balance, 525_000);
}

#[test]
fn tampered_signature_is_rejected() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let mut tx = claim_tx(&ledger, destination(), channel, Some(40_000), true, 0);
    if let TxBody::ChannelClaim(op) = &mut tx.body {
        op.balance = Some(Amount::drops(60_000));
    }
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::BadSignature
    );
}

#[test]
fn wrong_channel_key_is_rejected() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    // Sign correctly with a key that is not the channel's pinned key.
    let intruder = SecretKey::from_bytes(&[9; 32]);
    let balance = Amount::drops(40_000);
    let tx = Transaction {
        account: destination(),
        sequence: next_sequence(&ledger, &destination()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelClaim(ChannelClaim {
            channel,
            balance: Some(balance),
            amount: None,
            signature: Some(sign_claim(&intruder, &channel, &balance).as_bytes().to_vec()),
            public_key: Some(intruder.public_key().to_tagged_bytes()),
        }),
    };
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::BadSigner
    );
}

#[test]
fn fund_raises_amount_and_respects_floor() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = Transaction {
        account: owner(),
        sequence: next_sequence(&ledger, &owner()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelFund(ChannelFund {
            channel,
            amount: Amount::drops(50_000),
            expiration: None,
        }),
    };
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert_eq!(ledger.channel(&channel).unwrap().amount, Amount::drops(150_000));
    assert_eq!(ledger.account(&owner()).unwrap().balance, 850_000);

    // An expiration below the settle-delay floor is malformed.
    let tx = Transaction {
        account: owner(),
        sequence: next_sequence(&ledger, &owner()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelFund(ChannelFund {
            channel,
            amount: Amount::drops(1_000),
            expiration: Some(CLOSE_TIME + 10),
        }),
    };
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::MalformedExpiration
    );

    // An already-advertised earlier close lowers the floor.
    let tx = claim_tx(&ledger, owner(), channel, None, false, TF_CLOSE);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    let advertised = ledger.channel(&channel).unwrap().expiration.unwrap();

    let tx = Transaction {
        account: owner(),
        sequence: next_sequence(&ledger, &owner()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelFund(ChannelFund {
            channel,
            amount: Amount::drops(1_000),
            expiration: Some(advertised),
        }),
    };
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert_eq!(ledger.channel(&channel).unwrap().expiration, Some(advertised));
}

#[test]
fn fund_by_non_owner_is_refused() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = Transaction {
        account: destination(),
        sequence: next_sequence(&ledger, &destination()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelFund(ChannelFund {
            channel,
            amount: Amount::drops(50_000),
            expiration: None,
        }),
    };
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::NoPermission
    );
}

#[test]
fn fund_after_cancel_after_closes_without_deducting() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());

    let tx = create_tx(&ledger, 100_000, Some(CLOSE_TIME + 1_000));
    let channel = keylet::channel(&owner(), &destination(), tx.sequence).key;
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);

    ledger.info.parent_close_time = CLOSE_TIME + 1_000;
    let funder_balance = ledger.account(&destination()).unwrap().balance;

    // Anyone's fund attempt now closes the channel instead of funding it.
    let tx = Transaction {
        account: destination(),
        sequence: next_sequence(&ledger, &destination()),
        fee: 0,
        flags: 0,
        body: TxBody::ChannelFund(ChannelFund {
            channel,
            amount: Amount::drops(50_000),
            expiration: None,
        }),
    };
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert!(ledger.channel(&channel).is_none());
    assert_eq!(ledger.account(&destination()).unwrap().balance, funder_balance);
    assert_eq!(ledger.account(&owner()).unwrap().balance, 1_000_000);
    assert_eq!(ledger.account(&owner()).unwrap().owner_count, 0);
}

#[test]
fn owner_close_of_drained_channel_is_immediate() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    // Owner delivers everything, then closes: nothing left to wait for.
    let tx = claim_tx(&ledger, owner(), channel, Some(100_000), false, TF_CLOSE);
    let applied = apply_transaction(&mut ledger, &tx, &hooks);
    assert_eq!(applied.code, ResultCode::Success);
    assert!(ledger.channel(&channel).is_none());
    assert_eq!(ledger.account(&destination()).unwrap().balance, 600_000);
    assert_eq!(ledger.account(&owner()).unwrap().balance, 900_000);
}

#[test]
fn renew_clears_expiration_owner_only() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    let tx = claim_tx(&ledger, owner(), channel, None, false, TF_CLOSE);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert!(ledger.channel(&channel).unwrap().expiration.is_some());

    let tx = claim_tx(&ledger, destination(), channel, None, false, TF_RENEW);
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::NoPermission
    );

    let tx = claim_tx(&ledger, owner(), channel, None, false, TF_RENEW);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert!(ledger.channel(&channel).unwrap().expiration.is_none());
}

#[test]
fn create_to_self_is_malformed() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());

    let mut tx = create_tx(&ledger, 100_000, None);
    if let TxBody::ChannelCreate(op) = &mut tx.body {
        op.destination = owner();
    }
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::DestinationIsSource
    );
}

#[test]
fn create_without_reserve_or_funds() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());

    // reserve(1) = 200_000; the channel would leave less than that.
    let tx = create_tx(&ledger, 900_000, None);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Unfunded);

    seed_account(&mut ledger, AccountId([3; 20]), 150_000, 0);
    let tx = Transaction {
        account: AccountId([3; 20]),
        sequence: 1,
        fee: 0,
        flags: 0,
        body: TxBody::ChannelCreate(ChannelCreate {
            destination: destination(),
            amount: Amount::drops(10_000),
            settle_delay: SETTLE_DELAY,
            public_key: channel_key_pair().public_key().to_tagged_bytes(),
            cancel_after: None,
            source_tag: None,
            destination_tag: None,
        }),
    };
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::InsufficientReserve
    );
}

#[test]
fn destination_tag_is_enforced() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    seed_account(
        &mut ledger,
        destination(),
        500_000,
        ACCOUNT_REQUIRE_DEST_TAG,
    );

    let tx = create_tx(&ledger, 100_000, None);
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::DestinationTagRequired
    );

    let mut tx = create_tx(&ledger, 100_000, None);
    if let TxBody::ChannelCreate(op) = &mut tx.body {
        op.destination_tag = Some(42);
    }
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
}

#[test]
fn deposit_auth_gates_owner_claims() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    // Destination turns on deposit authorization after the channel opened.
    let mut sled = ledger.account(&destination()).unwrap().clone();
    sled.flags |= ACCOUNT_DEPOSIT_AUTH;
    let balance = sled.balance;
    ledger.put(
        keylet::account(&destination()).key,
        LedgerEntry::Account(sled),
    );

    let tx = claim_tx(&ledger, owner(), channel, Some(40_000), false, 0);
    assert_eq!(
        apply_transaction(&mut ledger, &tx, &hooks).code,
        ResultCode::NoPermission
    );
    assert_eq!(ledger.account(&destination()).unwrap().balance, balance);

    // A preauthorized depositor may push the claim in.
    ledger.put(
        keylet::deposit_preauth(&destination(), &owner()).key,
        LedgerEntry::DepositPreauth(rill_tx::state::DepositPreauthEntry {
            account: destination(),
            authorized: owner(),
            owner_node: 0,
        }),
    );
    let tx = claim_tx(&ledger, owner(), channel, Some(25_000), false, 0);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);

    // The destination itself can always pull the claim.
    let tx = claim_tx(&ledger, destination(), channel, Some(40_000), true, 0);
    assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, ResultCode::Success);
    assert_eq!(
        ledger.account(&destination()).unwrap().balance,
        balance + 40_000
    );
}

#[test]
fn replay_is_deterministic() {
    let hooks = HookRuntime::new(HookParams::default());
    let mut first = test_ledger();
    let mut second = test_ledger();

    for ledger in [&mut first, &mut second] {
        let tx = create_tx(ledger, 100_000, None);
        let channel = keylet::channel(&owner(), &destination(), tx.sequence).key;
        assert_eq!(apply_transaction(ledger, &tx, &hooks).code, ResultCode::Success);

        let tx = claim_tx(ledger, destination(), channel, Some(40_000), true, 0);
        assert_eq!(apply_transaction(ledger, &tx, &hooks).code, ResultCode::Success);

        let tx = claim_tx(ledger, owner(), channel, None, false, TF_CLOSE);
        assert_eq!(apply_transaction(ledger, &tx, &hooks).code, ResultCode::Success);
    }

    assert_eq!(first, second);
}

#[test]
fn balance_is_monotonic_across_claims() {
    let mut ledger = test_ledger();
    let hooks = HookRuntime::new(HookParams::default());
    let channel = open_channel(&mut ledger, &hooks, 100_000);

    for (claimed, expect) in [
        (10_000, ResultCode::Success),
        (30_000, ResultCode::Success),
        (20_000, ResultCode::UnfundedPayment),
        (30_000, ResultCode::UnfundedPayment),
        (90_000, ResultCode::Success),
    ] {
        let tx = claim_tx(&ledger, destination(), channel, Some(claimed), true, 0);
        assert_eq!(apply_transaction(&mut ledger, &tx, &hooks).code, expect);
    }
    assert_eq!(ledger.channel(&channel).unwrap().balance, Amount::drops(90_000));
    assert_eq!(ledger.account(&destination()).unwrap().balance, 590_000);
}
