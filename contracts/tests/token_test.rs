//! Integration tests for the ERC-20 token.
//!
//! Mirrors the deployment story: one owner receives the default supply and
//! funds everyone else from there.

use tandem_contracts::token::{Erc20Token, TokenError};
use tandem_protocol::config::DEFAULT_INITIAL_SUPPLY;
use tandem_protocol::crypto::{Address, ChannelKeypair};

fn accounts() -> (Address, Address, Address) {
    (
        ChannelKeypair::generate().address(),
        ChannelKeypair::generate().address(),
        ChannelKeypair::generate().address(),
    )
}

#[test]
fn owner_holds_initial_supply() {
    let (owner, _, _) = accounts();
    let token = Erc20Token::deploy(owner, DEFAULT_INITIAL_SUPPLY);
    assert_eq!(token.total_supply(), 2_000_000);
    assert_eq!(token.balance_of(&owner), token.total_supply());
}

#[test]
fn approve_sets_allowance() {
    let (owner, account1, _) = accounts();
    let mut token = Erc20Token::deploy(owner, DEFAULT_INITIAL_SUPPLY);
    token.approve(&owner, &account1, 4_500);
    assert_eq!(token.allowance(&owner, &account1), 4_500);

    // A second approval replaces, it does not add.
    token.approve(&owner, &account1, 100);
    assert_eq!(token.allowance(&owner, &account1), 100);
}

#[test]
fn approved_spender_moves_owner_tokens() {
    let (owner, account1, account2) = accounts();
    let mut token = Erc20Token::deploy(owner, DEFAULT_INITIAL_SUPPLY);
    token.approve(&owner, &account1, 4_500);

    token
        .transfer_from(&account1, &owner, &account2, 3_000)
        .unwrap();

    assert_eq!(token.balance_of(&owner), DEFAULT_INITIAL_SUPPLY - 3_000);
    assert_eq!(token.balance_of(&account2), 3_000);
    assert_eq!(token.balance_of(&account1), 0);
    assert_eq!(token.allowance(&owner, &account1), 1_500);
}

#[test]
fn unapproved_spender_is_rejected() {
    let (owner, account1, account2) = accounts();
    let mut token = Erc20Token::deploy(owner, DEFAULT_INITIAL_SUPPLY);
    let err = token
        .transfer_from(&account1, &owner, &account2, 1)
        .unwrap_err();
    assert!(matches!(err, TokenError::InsufficientAllowance { allowance: 0, .. }));
    assert_eq!(token.balance_of(&owner), DEFAULT_INITIAL_SUPPLY);
}

#[test]
fn direct_transfer_to_other_account() {
    let (owner, _, account2) = accounts();
    let mut token = Erc20Token::deploy(owner, DEFAULT_INITIAL_SUPPLY);
    token.transfer(&owner, &account2, 8_000).unwrap();
    assert_eq!(token.balance_of(&owner), DEFAULT_INITIAL_SUPPLY - 8_000);
    assert_eq!(token.balance_of(&account2), 8_000);
    assert_eq!(token.total_supply(), DEFAULT_INITIAL_SUPPLY);
}
