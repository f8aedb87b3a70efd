//! Property tests for value conservation.
//!
//! Random operation sequences, including ones that fail and wallets that
//! refuse transfers, must never create or destroy value: everything received
//! minus everything sent equals the pool, and the pool always equals what the
//! engine owes.

use custody_core::{
    Amount, Custody, CustodyConfig, ListingId, LockTerms, ManualClock, MemorySink, Principal,
    SimulatedTransfer,
};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["owner", "alice", "bob", "carol"];

#[derive(Debug, Clone)]
enum Op {
    Deposit(usize, u64),
    Withdraw(usize, u64),
    Distribute(u64, Vec<usize>),
    Fund(u64),
    Lock(usize, u64),
    Unlock(usize),
    List(usize, u64),
    Purchase(usize, u64, u64),
    Advance(u64),
    Reject(usize),
    Accept(usize),
}

fn who() -> impl Strategy<Value = usize> {
    0..NAMES.len()
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (who(), 0..2_000u64).prop_map(|(w, a)| Op::Deposit(w, a)),
        (who(), 0..2_000u64).prop_map(|(w, a)| Op::Withdraw(w, a)),
        (0..500u64, prop::collection::vec(who(), 0..5)).prop_map(|(a, r)| Op::Distribute(a, r)),
        (0..200u64).prop_map(Op::Fund),
        (who(), 0..1_000u64).prop_map(|(w, a)| Op::Lock(w, a)),
        who().prop_map(Op::Unlock),
        (who(), 0..300u64).prop_map(|(w, a)| Op::List(w, a)),
        (who(), 0..6u64, 0..300u64).prop_map(|(w, id, v)| Op::Purchase(w, id, v)),
        (0..200u64).prop_map(Op::Advance),
        who().prop_map(Op::Reject),
        who().prop_map(Op::Accept),
    ]
}

fn p(index: usize) -> Principal {
    Principal::new(NAMES[index])
}

proptest! {
    #[test]
    fn value_is_conserved(ops in prop::collection::vec(op(), 1..60)) {
        let config = CustodyConfig::builder("owner")
            .fee(250, "treasury")
            .lock_terms(LockTerms { duration_secs: 100, rate_percent: 7 })
            .build()
            .expect("config");
        let clock = ManualClock::at(0);
        let mut custody = Custody::with_parts(
            config,
            SimulatedTransfer::new(),
            clock.clone(),
            MemorySink::new(),
        )
        .expect("engine");
        let owner = p(0);
        let mut received = Amount::ZERO;

        for op in ops {
            let inbound = match op {
                Op::Deposit(w, a) => custody.deposit(&p(w), Amount::new(a)).ok().map(|_| a),
                Op::Withdraw(w, a) => {
                    let _ = custody.withdraw(&p(w), Amount::new(a));
                    None
                }
                Op::Distribute(a, r) => {
                    let recipients: Vec<Principal> = r.into_iter().map(p).collect();
                    custody
                        .distribute(&owner, Amount::new(a), &recipients)
                        .ok()
                        .map(|_| a)
                }
                Op::Fund(a) => custody.fund_reserve(&owner, Amount::new(a)).ok().map(|_| a),
                Op::Lock(w, a) => custody.lock(&p(w), Amount::new(a)).ok().map(|_| a),
                Op::Unlock(w) => {
                    let _ = custody.unlock(&p(w));
                    None
                }
                Op::List(w, a) => {
                    let _ = custody.list(&p(w), Amount::new(a));
                    None
                }
                Op::Purchase(w, id, v) => custody
                    .purchase(&p(w), ListingId::new(id), Amount::new(v))
                    .ok()
                    .map(|_| v),
                Op::Advance(secs) => {
                    clock.advance(secs);
                    None
                }
                Op::Reject(w) => {
                    custody.transfer_mut().reject(p(w));
                    None
                }
                Op::Accept(w) => {
                    custody.transfer_mut().accept(&p(w));
                    None
                }
            };
            if let Some(a) = inbound {
                received = received.checked_add(Amount::new(a)).expect("no overflow");
            }

            let sent = custody.transfer().total_sent();
            prop_assert_eq!(custody.pool(), custody.liabilities());
            prop_assert_eq!(received.checked_sub(sent), Some(custody.pool()));
        }
    }

    #[test]
    fn failed_withdrawals_change_nothing(deposit in 1..10_000u64, extra in 1..10_000u64) {
        let config = CustodyConfig::builder("owner").build().expect("config");
        let mut custody = Custody::with_parts(
            config,
            SimulatedTransfer::new(),
            ManualClock::at(0),
            MemorySink::new(),
        )
        .expect("engine");
        let alice = Principal::new("alice");
        custody.deposit(&alice, Amount::new(deposit)).expect("deposit");
        let before = custody.snapshot();

        prop_assert!(custody.withdraw(&alice, Amount::new(deposit + extra)).is_err());
        custody.transfer_mut().reject("alice");
        prop_assert!(custody.withdraw(&alice, Amount::new(deposit)).is_err());

        prop_assert_eq!(custody.snapshot(), before);
        prop_assert_eq!(custody.transfer().total_sent(), Amount::ZERO);
    }
}
