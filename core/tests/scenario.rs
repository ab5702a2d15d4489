//! End-to-end pool scenarios driving the real note crypto through the
//! ledger and the indexer mirror.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use x25519_dalek::{PublicKey, StaticSecret};

use umbra_core::indexer::Indexer;
use umbra_core::ledger::ShieldedLedger;
use umbra_core::ledger::error::LedgerError;
use umbra_core::ledger::ops::{Operation, ShieldOp, SwapOp, TransferOp, UnshieldOp};
use umbra_shielded::{
    Commitment, EncryptedNote, MockVerifier, Note, Proof, SpendingKey, TokenId, encrypt_note,
    try_decrypt_note,
};

const DEPTH: usize = 16;
const HISTORY: usize = 30;

fn pool(tokens: impl IntoIterator<Item = TokenId>) -> (ShieldedLedger, Indexer) {
    let ledger = ShieldedLedger::new(DEPTH, HISTORY, tokens, Arc::new(MockVerifier::accept_all()));
    (ledger, Indexer::new(DEPTH))
}

fn shield(
    ledger: &mut ShieldedLedger,
    indexer: &mut Indexer,
    note: &Note,
    amount: u64,
) -> u64 {
    let record = ledger
        .apply(&Operation::Shield(ShieldOp {
            commitment: note.commitment(),
            token: note.token,
            amount,
        }))
        .expect("shield should succeed");
    let seq = record.seq;
    indexer.apply(record);
    seq
}

#[test]
fn test_shield_transfer_unshield_lifecycle() {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut ledger, mut indexer) = pool([]);

    // Alice shields 100 native
    let alice = SpendingKey::random(&mut rng);
    let deposit = Note::new(100, TokenId::NATIVE, alice.owner_pk(), &mut rng);
    shield(&mut ledger, &mut indexer, &deposit, 100);

    assert_eq!(ledger.total_shielded(&TokenId::NATIVE), 100);
    assert_eq!(indexer.current_root(), ledger.current_root());

    // Alice transfers 40 to Bob, keeping 60 as change
    let deposit = deposit.with_leaf_index(0);
    let nullifier = deposit.nullifier(&alice).expect("leaf index is set");

    let bob = SpendingKey::random(&mut rng);
    let bob_view_sk = StaticSecret::from([41u8; 32]);
    let bob_view_pk = PublicKey::from(&bob_view_sk);

    let to_bob = Note::new(40, TokenId::NATIVE, bob.owner_pk(), &mut rng);
    let change = Note::new(60, TokenId::NATIVE, alice.owner_pk(), &mut rng);

    let record = ledger
        .apply(&Operation::Transfer(TransferOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            nullifier_hash: nullifier.hash(),
            out_commitment_1: to_bob.commitment(),
            out_commitment_2: change.commitment(),
            relayer: [0u8; 32],
            fee: 0,
            memo_1: encrypt_note(&to_bob, bob_view_pk.as_bytes(), Some(b"lunch")),
            memo_2: EncryptedNote::empty(),
        }))
        .expect("transfer should succeed");
    indexer.apply(record);

    // Pool totals unchanged by an internal transfer
    assert_eq!(ledger.total_shielded(&TokenId::NATIVE), 100);
    assert_eq!(ledger.actual_custody(&TokenId::NATIVE), 100);
    assert!(ledger.is_nullifier_spent(&nullifier.hash()));
    assert_eq!(indexer.current_root(), ledger.current_root());

    // Bob scans the encrypted outputs and recovers his note
    let outputs = indexer.encrypted_outputs(0);
    assert_eq!(outputs.len(), 1);
    let (leaf_index, encrypted) = &outputs[0];
    let (recovered, memo) = try_decrypt_note(
        encrypted,
        bob_view_sk.as_bytes(),
        bob.owner_pk(),
        to_bob.commitment().as_bytes(),
    )
    .expect("bob can decrypt his output");
    assert_eq!(recovered.value.as_u64(), 40);
    assert_eq!(memo, b"lunch");

    // The membership path for Bob's leaf verifies against the live root
    let path = indexer.path(*leaf_index).expect("leaf is indexed");
    assert!(path.verify(&to_bob.commitment(), &ledger.current_root()));

    // Bob unshields his 40 in full
    let to_bob = recovered.with_leaf_index(*leaf_index);
    let bob_nullifier = to_bob.nullifier(&bob).expect("leaf index is set");

    let record = ledger
        .apply(&Operation::Unshield(UnshieldOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            nullifier_hash: bob_nullifier.hash(),
            recipient: [7u8; 32],
            token: TokenId::NATIVE,
            amount: 40,
            change_commitment: Commitment::ZERO,
            relayer: [0u8; 32],
            fee: 0,
        }))
        .expect("unshield should succeed");
    indexer.apply(record);

    assert_eq!(ledger.total_shielded(&TokenId::NATIVE), 60);
    assert_eq!(ledger.actual_custody(&TokenId::NATIVE), 60);
    assert!(ledger.custody_invariant_holds());
    assert_eq!(indexer.current_root(), ledger.current_root());
}

#[test]
fn test_double_spend_is_rejected_without_side_effects() {
    let mut rng = StdRng::seed_from_u64(11);
    let (mut ledger, mut indexer) = pool([]);

    let alice = SpendingKey::random(&mut rng);
    let deposit = Note::new(50, TokenId::NATIVE, alice.owner_pk(), &mut rng);
    shield(&mut ledger, &mut indexer, &deposit, 50);

    let deposit = deposit.with_leaf_index(0);
    let nullifier = deposit.nullifier(&alice).unwrap();

    let spend = |out: &Note, root: [u8; 32]| {
        Operation::Transfer(TransferOp {
            proof: Proof::zero(),
            root,
            nullifier_hash: nullifier.hash(),
            out_commitment_1: out.commitment(),
            out_commitment_2: Commitment::ZERO,
            relayer: [0u8; 32],
            fee: 0,
            memo_1: EncryptedNote::empty(),
            memo_2: EncryptedNote::empty(),
        })
    };

    let first_out = Note::new(50, TokenId::NATIVE, alice.owner_pk(), &mut rng);
    let record = ledger.apply(&spend(&first_out, ledger.current_root())).unwrap();
    indexer.apply(record);

    let root_before = ledger.current_root();
    let second_out = Note::new(50, TokenId::NATIVE, alice.owner_pk(), &mut rng);
    let err = ledger
        .apply(&spend(&second_out, ledger.current_root()))
        .unwrap_err();

    assert_eq!(err, LedgerError::AlreadySpent);
    assert_eq!(ledger.current_root(), root_before);
    assert_eq!(ledger.leaf_count(), 2);
    assert_eq!(indexer.current_root(), ledger.current_root());
}

#[test]
fn test_shielded_swap_against_surplus() {
    let mut rng = StdRng::seed_from_u64(13);
    let token_a = TokenId([0xaau8; 32]);
    let token_b = TokenId([0xbbu8; 32]);
    let (mut ledger, mut indexer) = pool([token_a, token_b]);

    let alice = SpendingKey::random(&mut rng);
    let deposit = Note::new(100, token_a, alice.owner_pk(), &mut rng);
    shield(&mut ledger, &mut indexer, &deposit, 100);

    let deposit = deposit.with_leaf_index(0);
    let nullifier = deposit.nullifier(&alice).unwrap();

    let out_b = Note::new(45, token_b, alice.owner_pk(), &mut rng);
    let change_a = Note::new(50, token_a, alice.owner_pk(), &mut rng);

    let swap = Operation::Swap(SwapOp {
        proof: Proof::zero(),
        root: ledger.current_root(),
        input_nullifier_hash: nullifier.hash(),
        out_commitment_1: out_b.commitment(),
        out_commitment_2: change_a.commitment(),
        token_in: token_a,
        token_out: token_b,
        swap_amount: 50,
        output_amount: 45,
        min_amount_out: 40,
        memo: EncryptedNote::empty(),
    });

    // Without token B surplus the swap cannot be backed
    assert_eq!(
        ledger.apply(&swap).unwrap_err(),
        LedgerError::InsufficientLiquidity
    );
    assert!(ledger.custody_invariant_holds());

    ledger.fund(token_b, 60);
    let record = ledger.apply(&swap).unwrap();
    indexer.apply(record);

    assert_eq!(ledger.total_shielded(&token_a), 50);
    assert_eq!(ledger.total_shielded(&token_b), 45);
    assert_eq!(ledger.surplus(&token_b), 15);
    assert!(ledger.custody_invariant_holds());
    assert_eq!(indexer.current_root(), ledger.current_root());

    // The nullifier is burned for both paths
    assert!(ledger.is_nullifier_spent(&nullifier.hash()));
    assert!(indexer.is_nullifier_spent(&nullifier.hash()));
}

#[test]
fn test_swap_round_trip_consumes_retained_surplus() {
    let mut rng = StdRng::seed_from_u64(17);
    let token_a = TokenId([0xaau8; 32]);
    let token_b = TokenId([0xbbu8; 32]);
    let (mut ledger, mut indexer) = pool([token_a, token_b]);

    let alice = SpendingKey::random(&mut rng);
    let deposit = Note::new(100, token_a, alice.owner_pk(), &mut rng);
    shield(&mut ledger, &mut indexer, &deposit, 100);
    ledger.fund(token_b, 60);

    // Swap 1: 50 A out of the liability, 45 B into it
    let deposit = deposit.with_leaf_index(0);
    let out_b = Note::new(45, token_b, alice.owner_pk(), &mut rng);
    let change_a = Note::new(50, token_a, alice.owner_pk(), &mut rng);
    let record = ledger
        .apply(&Operation::Swap(SwapOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            input_nullifier_hash: deposit.nullifier(&alice).unwrap().hash(),
            out_commitment_1: out_b.commitment(),
            out_commitment_2: change_a.commitment(),
            token_in: token_a,
            token_out: token_b,
            swap_amount: 50,
            output_amount: 45,
            min_amount_out: 40,
            memo: EncryptedNote::empty(),
        }))
        .unwrap();
    indexer.apply(record);

    assert_eq!(ledger.total_shielded(&token_a), 50);
    assert_eq!(ledger.total_shielded(&token_b), 45);
    // Custody never moved, so the A that left the liability is now surplus
    assert_eq!(ledger.surplus(&token_a), 50);
    assert_eq!(ledger.surplus(&token_b), 15);
    assert!(ledger.custody_invariant_holds());

    // Swap 2: the reverse direction, backed entirely by the surplus the
    // first swap retained in A
    let out_b = out_b.with_leaf_index(1);
    let bob = SpendingKey::random(&mut rng);
    let out_a = Note::new(40, token_a, bob.owner_pk(), &mut rng);
    let record = ledger
        .apply(&Operation::Swap(SwapOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            input_nullifier_hash: out_b.nullifier(&alice).unwrap().hash(),
            out_commitment_1: out_a.commitment(),
            out_commitment_2: Commitment::ZERO,
            token_in: token_b,
            token_out: token_a,
            swap_amount: 45,
            output_amount: 40,
            min_amount_out: 38,
            memo: EncryptedNote::empty(),
        }))
        .unwrap();
    indexer.apply(record);

    assert_eq!(ledger.total_shielded(&token_a), 90);
    assert_eq!(ledger.total_shielded(&token_b), 0);
    assert_eq!(ledger.actual_custody(&token_a), 100);
    assert_eq!(ledger.actual_custody(&token_b), 60);
    assert_eq!(ledger.surplus(&token_a), 10);
    assert_eq!(ledger.surplus(&token_b), 60);
    assert!(ledger.custody_invariant_holds());
    assert_eq!(indexer.current_root(), ledger.current_root());

    // A third A->B swap can ride the surplus swap 2 released back into B
    let out_a = out_a.with_leaf_index(3);
    let out_b2 = Note::new(35, token_b, bob.owner_pk(), &mut rng);
    ledger
        .apply(&Operation::Swap(SwapOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            input_nullifier_hash: out_a.nullifier(&bob).unwrap().hash(),
            out_commitment_1: out_b2.commitment(),
            out_commitment_2: Commitment::ZERO,
            token_in: token_a,
            token_out: token_b,
            swap_amount: 40,
            output_amount: 35,
            min_amount_out: 30,
            memo: EncryptedNote::empty(),
        }))
        .unwrap();

    assert_eq!(ledger.total_shielded(&token_a), 50);
    assert_eq!(ledger.total_shielded(&token_b), 35);
    assert!(ledger.custody_invariant_holds());
}
